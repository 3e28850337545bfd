//! The work queue executor
//!
//! One private dispatcher thread drains a FIFO of submitted closures;
//! any number of producer threads feed it. The dispatcher is the only
//! thread that ever executes tasks, which gives callers a single-threaded
//! execution context for mutating shared state without their own locks.
//!
//! The critical section (a spinlock over the live queue) is held only for
//! entry pushes and pops, never while a task runs and never across a
//! blocking wait. Tasks may therefore call `submit` re-entrantly from
//! inside the dispatcher without deadlocking.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use workq_core::error::{QueueError, QueueResult};
use workq_core::spinlock::SpinLock;
use workq_core::stats::{QueueStats, StatsSnapshot};
use workq_core::task::{BarrierHandle, QueueEntry, Task};
use workq_core::{qdebug, qerror, qtrace, qwarn};

use crate::config::QueueConfig;
use crate::pool::EntryPool;
use crate::signal::Signal;

/// Live queue plus the intake gate, guarded by one spinlock
struct QueueState {
    entries: VecDeque<Box<QueueEntry>>,
    allow_submissions: bool,
}

/// State shared between producer threads and the dispatcher
struct Shared {
    queue: SpinLock<QueueState>,
    pool: EntryPool,
    running: AtomicBool,
    fatal: AtomicBool,
    max_depth: AtomicUsize,

    /// Dispatcher -> start(): "I am in my loop"
    sig_ready: Signal,
    /// Producers -> dispatcher: "work is queued" (also pulses on stop)
    sig_work: Signal,
    /// Dispatcher -> stop(): "I have exited"
    sig_done: Signal,

    stats: Arc<QueueStats>,
}

/// Bounded, single-dispatcher task executor
///
/// Tasks execute strictly in submission order, one at a time, on a private
/// thread. Multiple independent queues may coexist; share one across
/// producer threads via `Arc<WorkQueue>` (all methods take `&self`).
///
/// Lifecycle is `start` -> `stop`, both idempotent. `stop` discards any
/// work still queued; callers that need a guaranteed drain should issue a
/// `submit_and_wait` barrier before stopping.
pub struct WorkQueue {
    shared: Arc<Shared>,
    /// Dispatcher join handle; doubles as the lifecycle lock so concurrent
    /// start/stop/restart calls serialize
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    config: QueueConfig,
}

impl WorkQueue {
    /// Create a queue with default configuration (not yet running)
    pub fn new() -> Self {
        // Default config always validates
        Self::with_config(QueueConfig::default()).unwrap()
    }

    /// Create a queue with the given configuration (not yet running)
    pub fn with_config(config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        let stats = Arc::new(QueueStats::new());
        Ok(Self {
            shared: Arc::new(Shared {
                queue: SpinLock::new(QueueState {
                    entries: VecDeque::new(),
                    allow_submissions: true,
                }),
                pool: EntryPool::new(config.pool_capacity, Arc::clone(&stats)),
                running: AtomicBool::new(false),
                fatal: AtomicBool::new(false),
                max_depth: AtomicUsize::new(config.max_depth),
                sig_ready: Signal::new(),
                sig_work: Signal::new(),
                sig_done: Signal::new(),
                stats,
            }),
            dispatcher: Mutex::new(None),
            config,
        })
    }

    /// Start the dispatcher thread
    ///
    /// Blocks until the dispatcher has entered its loop, so a returned
    /// `Ok(())` means the queue can accept and eventually process
    /// submissions. Calling `start` on a running queue is a no-op.
    pub fn start(&self) -> QueueResult<()> {
        let mut slot = self.dispatcher.lock().unwrap();
        if self.shared.running.load(Ordering::Acquire) {
            return Ok(());
        }

        // A stale handle here means a previous start timed out or the
        // dispatcher latched a fatal error; it exits on its own once
        // scheduled. Join it before touching the signals so its late
        // sig_ready/sig_done pulses cannot leak into this start.
        if let Some(stale) = slot.take() {
            let _ = stale.join();
        }

        self.shared.fatal.store(false, Ordering::Release);
        self.shared.sig_ready.reset();
        self.shared.sig_work.reset();
        self.shared.sig_done.reset();
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || shared.dispatcher_loop())
            .map_err(|_| {
                self.shared.running.store(false, Ordering::Release);
                QueueError::SpawnFailed
            })?;
        *slot = Some(handle);

        if !self.shared.sig_ready.wait_timeout(self.config.start_timeout) {
            qwarn!(
                "workq: dispatcher '{}' not ready within {:?}",
                self.config.thread_name,
                self.config.start_timeout
            );
            self.shared.running.store(false, Ordering::Release);
            return Err(QueueError::StartTimeout);
        }

        qdebug!("workq: dispatcher '{}' started", self.config.thread_name);
        Ok(())
    }

    /// Stop the dispatcher and discard all pending work
    ///
    /// Blocks until the in-flight task (if any) finishes and the dispatcher
    /// exits, then destroys both the live queue and the entry pool. Pending
    /// `submit_and_wait` callers are woken with `Cancelled` rather than
    /// left hanging. Calling `stop` on a stopped queue is a no-op.
    ///
    /// Must not be called from inside a task; the dispatcher would be
    /// waiting on itself.
    pub fn stop(&self) {
        let mut slot = self.dispatcher.lock().unwrap();
        if let Some(handle) = slot.take() {
            if self.shared.running.swap(false, Ordering::AcqRel) {
                self.shared.sig_work.notify();
                self.shared.sig_done.wait();
            }
            let _ = handle.join();
            qdebug!("workq: dispatcher '{}' stopped", self.config.thread_name);
        }
        self.shared.discard_pending();
        self.shared.pool.clear();
    }

    /// Stop, then start again
    pub fn restart(&self) -> QueueResult<()> {
        self.stop();
        self.start()
    }

    /// Submit a task for asynchronous execution
    ///
    /// Never blocks: any gating condition (not running, fatal error latched,
    /// intake gate closed, queue at `max_depth`) rejects immediately and the
    /// caller decides whether to retry, drop, or escalate.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> QueueResult<()> {
        self.submit_boxed(Box::new(task))
    }

    fn submit_boxed(&self, task: Task) -> QueueResult<()> {
        let shared = &self.shared;
        shared.check_accepting()?;

        {
            let mut q = shared.queue.lock();
            // Re-check under the lock: stop() may have completed between
            // the fast check and here, and a push now would land after the
            // final drain, stranding the entry until the next start
            if let Err(e) = shared.check_accepting() {
                drop(q);
                return Err(e);
            }
            if !q.allow_submissions {
                drop(q);
                QueueStats::bump(&shared.stats.rejected);
                return Err(QueueError::SubmissionsDisabled);
            }
            let depth = shared.max_depth.load(Ordering::Relaxed);
            if depth > 0 && q.entries.len() >= depth {
                drop(q);
                QueueStats::bump(&shared.stats.rejected);
                return Err(QueueError::QueueFull);
            }
            let entry = shared.pool.acquire(task);
            q.entries.push_back(entry);
        }

        QueueStats::bump(&shared.stats.submitted);
        shared.sig_work.notify();

        // Advisory: a fatal error may have latched between enqueue and here
        if shared.fatal.load(Ordering::Acquire) {
            return Err(QueueError::Fatal);
        }
        Ok(())
    }

    /// Submit a task and block until it has fully executed
    ///
    /// Piggybacks on FIFO single-consumer ordering: a sentinel entry is
    /// enqueued directly behind the task, and by the time the sentinel
    /// completes this call's barrier, the task is guaranteed done. Both
    /// entries are admitted against `max_depth` together or not at all.
    ///
    /// If the queue is stopped, reset, or latches a fatal error before the
    /// sentinel runs, the call returns `Cancelled` (or `Fatal`) instead of
    /// hanging. Must not be called from inside a task; the dispatcher
    /// cannot run work while blocked in it.
    pub fn submit_and_wait(&self, task: impl FnOnce() + Send + 'static) -> QueueResult<()> {
        let shared = &self.shared;
        shared.check_accepting()?;

        let barrier = Arc::new(BarrierHandle::new());
        {
            let mut q = shared.queue.lock();
            // Same re-check as submit: without it, a stop() racing this
            // enqueue could finish its drain first, and wait() below would
            // block on a sentinel nothing will ever run or cancel
            if let Err(e) = shared.check_accepting() {
                drop(q);
                return Err(e);
            }
            if !q.allow_submissions {
                drop(q);
                QueueStats::bump(&shared.stats.rejected);
                return Err(QueueError::SubmissionsDisabled);
            }
            let depth = shared.max_depth.load(Ordering::Relaxed);
            if depth > 0 && q.entries.len() + 2 > depth {
                drop(q);
                QueueStats::bump(&shared.stats.rejected);
                return Err(QueueError::QueueFull);
            }

            q.entries.push_back(shared.pool.acquire(Box::new(task)));

            let handle = Arc::clone(&barrier);
            let mut sentinel = shared.pool.acquire(Box::new(move || handle.complete()));
            sentinel.set_barrier(Arc::clone(&barrier));
            q.entries.push_back(sentinel);
        }

        QueueStats::bump(&shared.stats.submitted);
        QueueStats::bump(&shared.stats.submitted);
        shared.sig_work.notify();

        match barrier.wait() {
            Ok(()) => Ok(()),
            // Distinguish "a task panicked" from an orderly stop/reset
            Err(QueueError::Cancelled) if shared.fatal.load(Ordering::Acquire) => {
                Err(QueueError::Fatal)
            }
            Err(e) => Err(e),
        }
    }

    /// Discard queued-but-not-started work, keeping the dispatcher running
    ///
    /// Entries go back to the pool (up to its cap). Pending
    /// `submit_and_wait` callers whose sentinels are discarded are woken
    /// with `Cancelled`.
    pub fn reset(&self) {
        self.shared.discard_pending();
    }

    /// Open the intake gate (default state)
    pub fn enable_submissions(&self) {
        self.shared.queue.lock().allow_submissions = true;
    }

    /// Close the intake gate: refuse new work while queued work drains
    ///
    /// Independent of the running state; the dispatcher keeps executing
    /// whatever is already queued.
    pub fn disable_submissions(&self) {
        self.shared.queue.lock().allow_submissions = false;
    }

    /// Set the queue depth bound (0 = unbounded); takes effect immediately
    pub fn set_max_depth(&self, depth: usize) {
        self.shared.max_depth.store(depth, Ordering::Relaxed);
    }

    /// Current queue depth bound (0 = unbounded)
    pub fn max_depth(&self) -> usize {
        self.shared.max_depth.load(Ordering::Relaxed)
    }

    /// Whether the dispatcher is accepting work
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether a task panic has latched the fatal-error state
    ///
    /// Latched until the next `start()`.
    pub fn has_fatal_error(&self) -> bool {
        self.shared.fatal.load(Ordering::Acquire)
    }

    /// Number of entries waiting in the live queue
    pub fn depth(&self) -> usize {
        self.shared.queue.lock().entries.len()
    }

    /// Number of recycled entries currently held by the pool
    pub fn pooled_entries(&self) -> usize {
        self.shared.pool.len()
    }

    /// Snapshot of the lifetime counters
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    /// Pre-checks shared by both submission paths
    ///
    /// Fatal wins over not-running: the panic path clears the running flag
    /// as well, and callers should learn work was lost rather than see an
    /// orderly-looking stop.
    fn check_accepting(&self) -> QueueResult<()> {
        if self.fatal.load(Ordering::Acquire) {
            QueueStats::bump(&self.stats.rejected);
            return Err(QueueError::Fatal);
        }
        if !self.running.load(Ordering::Acquire) {
            QueueStats::bump(&self.stats.rejected);
            return Err(QueueError::NotRunning);
        }
        Ok(())
    }

    /// Drain the live queue without executing anything
    ///
    /// Barrier waiters are cancelled so nobody blocks on a task that will
    /// never run; entries are recycled through the pool.
    fn discard_pending(&self) {
        let mut discarded = 0u64;
        loop {
            // Pop one entry per lock acquisition; cancel() takes the
            // barrier's own mutex and has no business inside the spinlock
            let entry = self.queue.lock().entries.pop_front();
            let Some(entry) = entry else { break };
            if let Some(barrier) = entry.barrier() {
                barrier.cancel();
            }
            self.pool.release(entry);
            QueueStats::bump(&self.stats.discarded);
            discarded += 1;
        }
        if discarded > 0 {
            qwarn!("workq: discarded {} pending entries", discarded);
        }
    }

    /// Dispatcher thread body: the only place tasks ever execute
    fn dispatcher_loop(&self) {
        self.sig_ready.notify();
        qtrace!("workq: dispatcher loop entered");

        while self.running.load(Ordering::Acquire) && !self.fatal.load(Ordering::Acquire) {
            self.sig_work.wait();

            while self.running.load(Ordering::Acquire) {
                let entry = self.queue.lock().entries.pop_front();
                let Some(mut entry) = entry else { break };

                // Live-queue invariant: every queued entry holds a task
                let task = entry.take_task().expect("queued entry without a task");

                // Execute outside the critical section so the task can
                // itself submit more work
                match catch_unwind(AssertUnwindSafe(task)) {
                    Ok(()) => {
                        QueueStats::bump(&self.stats.executed);
                        self.pool.release(entry);
                    }
                    Err(_) => {
                        qerror!("workq: task panicked, latching fatal error");
                        // Clear running before latching fatal: anyone who
                        // observes the fatal flag must also see the
                        // dispatcher as gone, so a bare start() recovers
                        // without an intervening stop()
                        self.running.store(false, Ordering::Release);
                        self.fatal.store(true, Ordering::Release);
                        self.pool.release(entry);
                        // Nothing else will run; release anyone blocked in
                        // submit_and_wait instead of stranding them
                        self.discard_pending();
                        break;
                    }
                }
            }
        }

        qtrace!("workq: dispatcher loop exiting");
        self.sig_done.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn started_queue() -> WorkQueue {
        let q = WorkQueue::new();
        q.start().unwrap();
        q
    }

    #[test]
    fn test_submit_executes_task() {
        let q = started_queue();
        let hits = Arc::new(AtomicU32::new(0));

        let h = Arc::clone(&hits);
        q.submit(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        q.submit_and_wait(|| {}).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        q.stop();
    }

    #[test]
    fn test_submit_before_start_rejected() {
        let q = WorkQueue::new();
        assert_eq!(q.submit(|| {}), Err(QueueError::NotRunning));
        assert_eq!(q.stats().rejected, 1);
    }

    #[test]
    fn test_submit_and_wait_sees_side_effect() {
        let q = started_queue();
        let hits = Arc::new(AtomicU32::new(0));

        let h = Arc::clone(&hits);
        q.submit_and_wait(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        // The barrier guarantees the effect is visible right now
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        q.stop();
    }

    #[test]
    fn test_reentrant_submit_from_task() {
        let q = Arc::new(started_queue());
        let hits = Arc::new(AtomicU32::new(0));

        let q2 = Arc::clone(&q);
        let h = Arc::clone(&hits);
        q.submit(move || {
            let h = Arc::clone(&h);
            q2.submit(move || {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        })
        .unwrap();

        q.submit_and_wait(|| {}).unwrap();
        // The inner task was queued behind the barrier pair; flush again
        q.submit_and_wait(|| {}).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        q.stop();
    }

    #[test]
    fn test_intake_gate() {
        let q = started_queue();
        q.disable_submissions();
        assert_eq!(q.submit(|| {}), Err(QueueError::SubmissionsDisabled));
        assert_eq!(
            q.submit_and_wait(|| {}),
            Err(QueueError::SubmissionsDisabled)
        );
        q.enable_submissions();
        assert_eq!(q.submit(|| {}), Ok(()));
        q.stop();
    }

    #[test]
    fn test_max_depth_setter() {
        let q = WorkQueue::new();
        assert_eq!(q.max_depth(), 512);
        q.set_max_depth(0);
        assert_eq!(q.max_depth(), 0);
    }

    #[test]
    fn test_panic_latches_fatal() {
        let q = started_queue();
        q.submit(|| panic!("boom")).unwrap();

        // Wait for the dispatcher to hit the panic
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !q.has_fatal_error() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(q.has_fatal_error());
        assert_eq!(q.submit(|| {}), Err(QueueError::Fatal));

        // A fresh start clears the latch
        q.restart().unwrap();
        assert!(!q.has_fatal_error());
        assert_eq!(q.submit_and_wait(|| {}), Ok(()));
        q.stop();
    }

    #[test]
    fn test_start_alone_recovers_after_fatal() {
        let q = started_queue();
        q.submit(|| panic!("boom")).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !q.has_fatal_error() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(q.has_fatal_error());
        // The dispatcher is gone; the running flag must say so
        assert!(!q.is_running());

        // start() by itself, no stop() first, must revive the queue
        q.start().unwrap();
        assert!(!q.has_fatal_error());
        assert!(q.is_running());
        assert_eq!(q.submit_and_wait(|| {}), Ok(()));
        q.stop();
    }

    #[test]
    fn test_stop_racing_submit_and_wait_never_hangs() {
        // Hammer the stop/submit window: every submit_and_wait must come
        // back, either completed or cancelled, never blocked forever
        for _ in 0..50 {
            let q = Arc::new(started_queue());
            let q2 = Arc::clone(&q);
            let waiter = thread::spawn(move || {
                let _ = q2.submit_and_wait(|| {});
            });
            thread::yield_now();
            q.stop();
            waiter.join().unwrap();
        }
    }

    #[test]
    fn test_stop_cancels_blocked_waiter() {
        let q = Arc::new(started_queue());

        // Occupy the dispatcher so the waiter's entries stay queued
        let gate = Arc::new(Signal::new());
        let g = Arc::clone(&gate);
        q.submit(move || g.wait()).unwrap();
        thread::sleep(Duration::from_millis(50));

        let q2 = Arc::clone(&q);
        let waiter = thread::spawn(move || q2.submit_and_wait(|| {}));
        thread::sleep(Duration::from_millis(50));

        // Release the in-flight task only after stop() has cleared the
        // running flag, so the waiter's entries are guaranteed discarded
        let g2 = Arc::clone(&gate);
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            g2.notify();
        });

        q.stop();
        releaser.join().unwrap();
        // Waiter must come back with Cancelled, not hang
        assert_eq!(waiter.join().unwrap(), Err(QueueError::Cancelled));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = QueueConfig::new().pool_capacity(0);
        assert!(WorkQueue::with_config(config).is_err());
    }
}
