//! Capped free list of recycled queue entries
//!
//! Submissions are a hot path for callers marshaling event callbacks, so
//! executed entries are recycled instead of freed. The free list is a
//! lock-free `ArrayQueue` sized at the cap: a push into a full pool fails
//! and the entry is simply dropped, which is exactly the overflow behavior
//! the cap requires. Worst-case idle memory stays bounded even after a
//! burst of submissions.

use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use workq_core::stats::QueueStats;
use workq_core::task::{QueueEntry, Task};

/// Pool of previously-executed `QueueEntry` boxes
pub struct EntryPool {
    entries: ArrayQueue<Box<QueueEntry>>,
    stats: Arc<QueueStats>,
}

impl EntryPool {
    /// Create a pool capped at `capacity` entries
    ///
    /// `capacity` must be at least 1; config validation enforces this.
    pub fn new(capacity: usize, stats: Arc<QueueStats>) -> Self {
        Self {
            entries: ArrayQueue::new(capacity),
            stats,
        }
    }

    /// Get an entry holding `task`, reusing a pooled one when available
    pub fn acquire(&self, task: Task) -> Box<QueueEntry> {
        match self.entries.pop() {
            Some(mut entry) => {
                entry.install(task);
                QueueStats::bump(&self.stats.entries_recycled);
                entry
            }
            None => {
                QueueStats::bump(&self.stats.entries_allocated);
                Box::new(QueueEntry::new(task))
            }
        }
    }

    /// Return an executed or discarded entry
    ///
    /// Drops the entry when the pool is already at capacity.
    pub fn release(&self, mut entry: Box<QueueEntry>) {
        entry.recycle();
        let _ = self.entries.push(entry);
    }

    /// Destroy every pooled entry
    pub fn clear(&self) {
        while self.entries.pop().is_some() {}
    }

    /// Number of entries currently pooled
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(cap: usize) -> EntryPool {
        EntryPool::new(cap, Arc::new(QueueStats::new()))
    }

    #[test]
    fn test_acquire_allocates_when_empty() {
        let p = pool(4);
        let entry = p.acquire(Box::new(|| {}));
        assert_eq!(p.stats.snapshot().entries_allocated, 1);
        assert_eq!(p.stats.snapshot().entries_recycled, 0);
        p.release(entry);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_acquire_reuses_released_entry() {
        let p = pool(4);
        let entry = p.acquire(Box::new(|| {}));
        p.release(entry);

        let mut entry = p.acquire(Box::new(|| {}));
        assert_eq!(p.stats.snapshot().entries_recycled, 1);
        assert!(entry.take_task().is_some());
        assert!(entry.barrier().is_none());
    }

    #[test]
    fn test_release_beyond_cap_drops() {
        let p = pool(2);
        let a = p.acquire(Box::new(|| {}));
        let b = p.acquire(Box::new(|| {}));
        let c = p.acquire(Box::new(|| {}));
        p.release(a);
        p.release(b);
        p.release(c); // pool full, dropped
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_clear_empties_pool() {
        let p = pool(4);
        let entry = p.acquire(Box::new(|| {}));
        p.release(entry);
        p.clear();
        assert!(p.is_empty());
    }
}
