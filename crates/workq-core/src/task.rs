//! Task and queue-entry types
//!
//! A `Task` is a boxed zero-arg closure owned by the queue from submission
//! until it finishes executing. `QueueEntry` is the unit stored in the live
//! FIFO and recycled through the entry pool. `BarrierHandle` is the
//! completion handle behind `submit_and_wait`: the caller blocks on it, the
//! dispatcher completes it, and shutdown paths cancel it so no waiter is
//! ever stranded.

use std::sync::{Arc, Condvar, Mutex};

use crate::error::{QueueError, QueueResult};

/// A unit of work: runs once, returns nothing
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Outcome recorded on a barrier handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BarrierState {
    /// Sentinel not yet executed
    Pending,
    /// Sentinel ran; the task ahead of it has fully completed
    Complete,
    /// Queue discarded the sentinel without running it
    Cancelled,
}

/// Completion handle for a synchronous barrier
///
/// One handle exists per `submit_and_wait` call, shared between the calling
/// thread and the sentinel entry sitting in the live queue. FIFO plus the
/// single consumer guarantee that by the time `complete` fires, the caller's
/// task has already run.
pub struct BarrierHandle {
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

impl BarrierHandle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BarrierState::Pending),
            condvar: Condvar::new(),
        }
    }

    /// Mark the barrier complete and wake the waiter
    pub fn complete(&self) {
        self.finish(BarrierState::Complete);
    }

    /// Release the waiter without the task having run
    ///
    /// Called when the queue discards pending entries (stop, reset, or the
    /// fatal-error drain). Idempotent; a completed barrier stays completed.
    pub fn cancel(&self) {
        self.finish(BarrierState::Cancelled);
    }

    fn finish(&self, outcome: BarrierState) {
        {
            let mut state = self.state.lock().unwrap();
            if *state == BarrierState::Pending {
                *state = outcome;
            }
        }
        self.condvar.notify_one();
    }

    /// Block until the barrier is completed or cancelled
    pub fn wait(&self) -> QueueResult<()> {
        let mut state = self.state.lock().unwrap();
        while *state == BarrierState::Pending {
            state = self.condvar.wait(state).unwrap();
        }
        match *state {
            BarrierState::Complete => Ok(()),
            BarrierState::Cancelled => Err(QueueError::Cancelled),
            BarrierState::Pending => unreachable!(),
        }
    }
}

impl Default for BarrierHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One slot in the live queue
///
/// Invariants:
/// - an entry in the live queue always holds a task
/// - `barrier` is set only on sentinel entries created by `submit_and_wait`;
///   ordinary `submit` entries leave it `None`
pub struct QueueEntry {
    task: Option<Task>,
    barrier: Option<Arc<BarrierHandle>>,
}

impl QueueEntry {
    /// Create a fresh entry holding the given task
    pub fn new(task: Task) -> Self {
        Self {
            task: Some(task),
            barrier: None,
        }
    }

    /// Re-arm a recycled entry with a new task
    ///
    /// Clears any stale barrier reference from the entry's previous life.
    pub fn install(&mut self, task: Task) {
        self.task = Some(task);
        self.barrier = None;
    }

    /// Attach a barrier handle, marking this entry as a sentinel
    pub fn set_barrier(&mut self, barrier: Arc<BarrierHandle>) {
        self.barrier = Some(barrier);
    }

    /// Take the task out for execution
    pub fn take_task(&mut self) -> Option<Task> {
        self.task.take()
    }

    /// The barrier handle, if this is a sentinel entry
    pub fn barrier(&self) -> Option<&Arc<BarrierHandle>> {
        self.barrier.as_ref()
    }

    /// Strip task and barrier before the entry goes back to the pool
    pub fn recycle(&mut self) {
        self.task = None;
        self.barrier = None;
    }
}
