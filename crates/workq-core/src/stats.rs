//! Executor statistics counters
//!
//! Plain relaxed atomics bumped on the submission and dispatch paths. Cheap
//! enough to leave always-on; the demos print them and the pool tests read
//! `entries_allocated` to verify the pool cap holds.

use core::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for one queue instance
///
/// All counters are monotonic across restarts; `start()` does not zero them.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Tasks accepted onto the live queue (sentinels included)
    pub submitted: AtomicU64,

    /// Tasks the dispatcher ran to completion
    pub executed: AtomicU64,

    /// Submissions refused (gate closed, depth bound, not running, fatal)
    pub rejected: AtomicU64,

    /// Entries discarded unexecuted by stop/reset/fatal drain
    pub discarded: AtomicU64,

    /// Fresh QueueEntry allocations (pool was empty)
    pub entries_allocated: AtomicU64,

    /// QueueEntry reuses out of the pool
    pub entries_recycled: AtomicU64,
}

impl QueueStats {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            entries_allocated: AtomicU64::new(0),
            entries_recycled: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters at once (values may be mid-update relative to
    /// each other; fine for reporting)
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            entries_allocated: self.entries_allocated.load(Ordering::Relaxed),
            entries_recycled: self.entries_recycled.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub executed: u64,
    pub rejected: u64,
    pub discarded: u64,
    pub entries_allocated: u64,
    pub entries_recycled: u64,
}
