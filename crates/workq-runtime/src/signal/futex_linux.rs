//! Linux futex-based signal
//!
//! One atomic word, one syscall per sleep/wake. No mutex, no condvar.
//!
//! Futex word semantics:
//! - 0 = not signaled
//! - 1 = signaled (a waiter should consume it and return)
//!
//! `notify` swaps the word to 1 and issues FUTEX_WAKE only on the 0 -> 1
//! transition. `wait` swaps the word back to 0; a successful swap from 1
//! means the signal was consumed, otherwise FUTEX_WAIT sleeps until the
//! word changes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Linux futex-based binary semaphore
pub struct FutexSignal {
    /// 0 = not signaled, 1 = signaled
    word: AtomicU32,
}

impl FutexSignal {
    pub fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Latch the signal and wake one waiter
    pub fn notify(&self) {
        if self.word.swap(1, Ordering::Release) == 0 {
            self.futex_wake();
        }
    }

    /// Block until signaled, consuming the signal
    pub fn wait(&self) {
        loop {
            if self.word.swap(0, Ordering::Acquire) == 1 {
                return;
            }
            self.futex_wait(None);
        }
    }

    /// Block until signaled or the timeout expires
    ///
    /// Returns `true` if the signal was consumed, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.word.swap(0, Ordering::Acquire) == 1 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.futex_wait(Some(deadline - now));
        }
    }

    /// Clear any latched signal
    pub fn reset(&self) {
        self.word.store(0, Ordering::Release);
    }

    /// FUTEX_WAIT: sleep while the word is 0
    ///
    /// Spurious returns (EINTR, EAGAIN, ETIMEDOUT) are fine; callers loop
    /// and re-check the word.
    fn futex_wait(&self, timeout: Option<Duration>) {
        let timespec = timeout.map(|d| libc::timespec {
            tv_sec: d.as_secs() as libc::time_t,
            tv_nsec: d.subsec_nanos() as libc::c_long,
        });

        let timespec_ptr = match &timespec {
            Some(ts) => ts as *const libc::timespec,
            None => std::ptr::null(),
        };

        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.word.as_ptr(),
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                0u32,                    // sleep only while word == 0
                timespec_ptr,
                std::ptr::null::<u32>(), // uaddr2 (unused)
                0u32,                    // val3 (unused)
            );
        }
    }

    /// FUTEX_WAKE: wake at most one waiter
    fn futex_wake(&self) {
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.word.as_ptr(),
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                1i32,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }
}

impl Default for FutexSignal {
    fn default() -> Self {
        Self::new()
    }
}
