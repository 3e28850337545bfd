//! Queue configuration

use std::time::Duration;

use workq_core::constants::{DEFAULT_MAX_DEPTH, DEFAULT_POOL_CAPACITY, DEFAULT_THREAD_NAME};
use workq_core::error::{QueueError, QueueResult};

/// Configuration for a work queue
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Bound on live queue depth; 0 = unbounded (default: 512)
    pub max_depth: usize,

    /// Cap on pooled queue entries (default: 100)
    pub pool_capacity: usize,

    /// Name given to the dispatcher thread (default: "workq-dispatch")
    pub thread_name: String,

    /// How long `start()` waits for the dispatcher to come up (default: 5s)
    pub start_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            start_timeout: Duration::from_secs(5),
        }
    }
}

impl QueueConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the queue depth bound (0 = unbounded)
    pub fn max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    /// Set the entry pool cap
    pub fn pool_capacity(mut self, n: usize) -> Self {
        self.pool_capacity = n;
        self
    }

    /// Set the dispatcher thread name
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the `start()` readiness timeout
    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Check the configuration for nonsense values
    pub fn validate(&self) -> QueueResult<()> {
        if self.pool_capacity == 0 {
            return Err(QueueError::InvalidConfig("pool_capacity must be at least 1"));
        }
        if self.thread_name.is_empty() {
            return Err(QueueError::InvalidConfig("thread_name must not be empty"));
        }
        if self.start_timeout.is_zero() {
            return Err(QueueError::InvalidConfig("start_timeout must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(QueueConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_builder_chains() {
        let config = QueueConfig::new()
            .max_depth(8)
            .pool_capacity(16)
            .thread_name("events")
            .start_timeout(Duration::from_secs(1));
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.pool_capacity, 16);
        assert_eq!(config.thread_name, "events");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_pool() {
        let config = QueueConfig::new().pool_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(QueueError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unbounded_depth_is_valid() {
        assert_eq!(QueueConfig::new().max_depth(0).validate(), Ok(()));
    }
}
