//! Worker pool configuration.

use std::num::NonZeroUsize;

use alarmpool_common::error::{CommonError, CommonResult};
use serde::{Deserialize, Serialize};

/// Default worker thread name prefix
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "alarmpool-worker";

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued tasks; `None` leaves the queue unbounded.
    pub queue_capacity: Option<usize>,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: None,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl PoolConfig {
    /// Set the worker count
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Bound the task queue
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Remove any queue bound
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.queue_capacity = None;
        self
    }

    /// Set the thread name prefix
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    ///
    /// # Errors
    /// Returns `CommonError::Config` for a zero worker count, a zero queue
    /// capacity, or an empty thread name prefix.
    pub fn validate(&self) -> CommonResult<()> {
        if self.workers == 0 {
            return Err(CommonError::config_field("workers", "must be greater than 0"));
        }
        if self.queue_capacity == Some(0) {
            return Err(CommonError::config_field(
                "queue_capacity",
                "must be greater than 0 when set",
            ));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err(CommonError::config_field("thread_name_prefix", "must not be empty"));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    //! Unit tests for pool::config.
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PoolConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.queue_capacity, None);
        assert_eq!(config.thread_name_prefix, "alarmpool-worker");
        assert!(config.validate().is_ok());
    }

    /// Validates `PoolConfig::validate` behavior for the rejected values
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms zero workers, zero capacity, and a blank prefix are
    ///   `Config` errors naming the field.
    #[test]
    fn validate_rejects_degenerate_values() {
        let cases = [
            (PoolConfig::default().with_workers(0), "workers"),
            (PoolConfig::default().with_queue_capacity(0), "queue_capacity"),
            (PoolConfig::default().with_thread_name_prefix("  "), "thread_name_prefix"),
        ];

        for (config, expected_field) in cases {
            match config.validate() {
                Err(CommonError::Config { field, .. }) => {
                    assert_eq!(field.as_deref(), Some(expected_field));
                }
                other => panic!("expected config error for {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: PoolConfig = toml::from_str("workers = 3").unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);

        let bounded = config.with_queue_capacity(8).unbounded();
        assert_eq!(bounded.queue_capacity, None);
    }
}
