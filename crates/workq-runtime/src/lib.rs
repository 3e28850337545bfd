//! # workq-runtime
//!
//! Runtime implementation for the workq serialized executor.
//!
//! This crate provides:
//! - The `WorkQueue` executor and its dispatcher thread
//! - Platform signal primitives (futex on Linux, condvar elsewhere)
//! - The capped entry pool
//! - Queue configuration

pub mod config;
pub mod executor;
pub mod pool;
pub mod signal;

// Re-exports
pub use config::QueueConfig;
pub use executor::WorkQueue;
pub use pool::EntryPool;
pub use signal::Signal;
