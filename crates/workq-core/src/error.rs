//! Error types for the work queue

use core::fmt;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in queue operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is not running (submit before start, or after stop)
    NotRunning,

    /// A task panicked; the queue refuses work until restarted
    Fatal,

    /// Intake gate is closed (disable_submissions was called)
    SubmissionsDisabled,

    /// Live queue is at max_depth
    QueueFull,

    /// A blocked submit_and_wait was released without its task running
    /// (queue stopped, reset, or entered the fatal state)
    Cancelled,

    /// Failed to spawn the dispatcher thread
    SpawnFailed,

    /// Dispatcher did not signal readiness within the start timeout
    StartTimeout,

    /// Invalid configuration value
    InvalidConfig(&'static str),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::NotRunning => write!(f, "queue not running"),
            QueueError::Fatal => write!(f, "queue in fatal-error state"),
            QueueError::SubmissionsDisabled => write!(f, "submissions disabled"),
            QueueError::QueueFull => write!(f, "queue at max depth"),
            QueueError::Cancelled => write!(f, "waiter cancelled before task ran"),
            QueueError::SpawnFailed => write!(f, "failed to spawn dispatcher thread"),
            QueueError::StartTimeout => write!(f, "dispatcher not ready within start timeout"),
            QueueError::InvalidConfig(what) => write!(f, "invalid configuration: {}", what),
        }
    }
}

impl std::error::Error for QueueError {}
