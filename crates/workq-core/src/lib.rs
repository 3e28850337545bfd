//! # workq-core
//!
//! Core types for the workq serialized executor.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! The dispatcher thread, platform signal primitives, and the executor
//! itself live in `workq-runtime`.
//!
//! ## Modules
//!
//! - `task` - Task, queue entry, and barrier-handle types
//! - `error` - Error types
//! - `spinlock` - Internal spinlock primitive
//! - `stats` - Executor statistics counters
//! - `qlog` - Leveled debug printing macros

pub mod error;
pub mod qlog;
pub mod spinlock;
pub mod stats;
pub mod task;

// Re-exports for convenience
pub use error::{QueueError, QueueResult};
pub use qlog::{set_log_level, LogLevel};
pub use spinlock::SpinLock;
pub use stats::{QueueStats, StatsSnapshot};
pub use task::{BarrierHandle, QueueEntry, Task};

/// Queue-wide constants
pub mod constants {
    /// Default bound on live queue depth (0 would mean unbounded)
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    /// Default cap on pooled queue entries
    pub const DEFAULT_POOL_CAPACITY: usize = 100;

    /// Default dispatcher thread name
    pub const DEFAULT_THREAD_NAME: &str = "workq-dispatch";
}
