//! Binary-semaphore signals for dispatcher coordination
//!
//! The executor uses three of these, one per signaling direction: the
//! dispatcher announces readiness (`start` blocks on it), producers announce
//! queued work, and the dispatcher announces exit (`stop` blocks on it).
//! Keeping the three directions separate avoids spurious-wakeup races
//! between "new work" and "shutdown".
//!
//! Semantics are latch-then-consume: `notify` sets a flag and wakes one
//! waiter; `wait` blocks until the flag is set and clears it on the way out.
//! A notify with no waiter is remembered, not lost.
//!
//! Platform-specific implementations use the most efficient primitive
//! available: a raw futex word on Linux, `Mutex` + `Condvar` elsewhere.

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexSignal as Signal;
    } else {
        mod fallback;
        pub use fallback::CondvarSignal as Signal;
    }
}

// Both implementations expose the same inherent API:
//
//   fn new() -> Self
//   fn notify(&self)
//   fn wait(&self)
//   fn wait_timeout(&self, timeout: Duration) -> bool   // true = signaled
//   fn reset(&self)
