//! Portable signal using std::sync::Condvar
//!
//! Used on platforms without futex support. One mutex-guarded flag plus a
//! condvar; slower than the futex path but behaviorally identical.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Condvar-based binary semaphore (fallback)
pub struct CondvarSignal {
    /// true = signaled
    flag: Mutex<bool>,
    condvar: Condvar,
}

impl CondvarSignal {
    pub fn new() -> Self {
        Self {
            flag: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Latch the signal and wake one waiter
    pub fn notify(&self) {
        {
            let mut flag = self.flag.lock().unwrap();
            *flag = true;
        }
        self.condvar.notify_one();
    }

    /// Block until signaled, consuming the signal
    pub fn wait(&self) {
        let mut flag = self.flag.lock().unwrap();
        while !*flag {
            flag = self.condvar.wait(flag).unwrap();
        }
        *flag = false;
    }

    /// Block until signaled or the timeout expires
    ///
    /// Returns `true` if the signal was consumed, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let flag = self.flag.lock().unwrap();
        let (mut flag, result) = self
            .condvar
            .wait_timeout_while(flag, timeout, |signaled| !*signaled)
            .unwrap();
        if result.timed_out() {
            false
        } else {
            *flag = false;
            true
        }
    }

    /// Clear any latched signal
    pub fn reset(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = false;
    }
}

impl Default for CondvarSignal {
    fn default() -> Self {
        Self::new()
    }
}
