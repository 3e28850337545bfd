//! # workq - Bounded Single-Dispatcher Work Queue
//!
//! Serializes arbitrary closures onto one private dispatcher thread while
//! accepting submissions concurrently from any number of caller threads.
//! Gives a larger system a single-threaded execution context for mutating
//! shared state without per-caller locks: callers enqueue closures, the
//! queue runs them one at a time, in submission order, off the caller's
//! thread.
//!
//! ## Guarantees
//!
//! - **Strict FIFO**: tasks run in submission order, totally ordered across
//!   all producer threads by enqueue time under one critical section
//! - **Single consumer**: no two tasks ever execute concurrently
//! - **Bounded**: submissions past `max_depth` are rejected, never queued
//! - **Non-blocking submit**: `submit` fails fast on every gating condition
//! - **Synchronous barrier**: `submit_and_wait` returns only after its task
//!   has observably completed
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use workq::WorkQueue;
//!
//! fn main() -> workq::QueueResult<()> {
//!     let queue = Arc::new(WorkQueue::new());
//!     queue.start()?;
//!
//!     // Fire-and-forget from any thread
//!     queue.submit(|| println!("on the dispatcher thread"))?;
//!
//!     // Happens-before barrier: returns after the task has run
//!     queue.submit_and_wait(|| println!("definitely done"))?;
//!
//!     queue.stop(); // discards anything still queued
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  producer threads                       dispatcher thread
//!  ┌─────────┐ ┌─────────┐
//!  │ submit  │ │ submit_ │        ┌──────────────────────────┐
//!  │         │ │ and_wait│        │  loop:                   │
//!  └────┬────┘ └────┬────┘        │    wait(sig_work)        │
//!       │           │             │    pop entry (spinlock)  │
//!       ▼           ▼             │    run task (no lock)    │
//!  ┌──────────────────────┐       │    recycle entry -> pool │
//!  │  live FIFO (bounded) │──────▶│                          │
//!  └──────────────────────┘       └──────────────────────────┘
//! ```

// Re-export the full public surface
pub use workq_core::{
    constants, set_log_level, BarrierHandle, LogLevel, QueueError, QueueResult, QueueStats,
    StatsSnapshot, Task,
};
pub use workq_runtime::{QueueConfig, WorkQueue};

// Log macros re-exported at the facade root via #[macro_export] in workq-core
pub use workq_core::{qdebug, qerror, qinfo, qprintln, qtrace, qwarn};
