//! Configuration loading and management
//!
//! [`RuntimeConfig`] bundles the pool and scheduler settings. The
//! [`loader`] module reads it from environment variables or a TOML/JSON file.

pub mod loader;

use alarmpool_common::error::CommonResult;
use serde::{Deserialize, Serialize};

use crate::pool::PoolConfig;
use crate::scheduler::SchedulerConfig;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

/// Complete runtime configuration
///
/// ```toml
/// [pool]
/// workers = 4
/// queue_capacity = 1024
///
/// [scheduler]
/// shutdown_mode = "drop_pending"
/// drain_pool_on_shutdown = true
/// late_fire_warning_ms = 50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub pool: PoolConfig,
    pub scheduler: SchedulerConfig,
}

impl RuntimeConfig {
    /// Replace the pool section
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Replace the scheduler section
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Validate both sections
    ///
    /// # Errors
    /// The first `CommonError::Config` found.
    pub fn validate(&self) -> CommonResult<()> {
        self.pool.validate()?;
        self.scheduler.validate()
    }
}
