//! Scheduler configuration.

use std::time::Duration;

use alarmpool_common::error::{CommonError, CommonResult};
use alarmpool_common::{duration_millis, impl_status_conversions};
use serde::{Deserialize, Serialize};

/// Default scheduling thread name
pub const DEFAULT_THREAD_NAME: &str = "alarmpool-scheduler";

/// What [`AlarmScheduler::shutdown`](super::AlarmScheduler::shutdown) does
/// with alarms that have not come due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    /// Drop pending alarms without running them. Shutdown time does not
    /// depend on how far out the pending deadlines are.
    #[default]
    DropPending,
    /// Hand every pending alarm to the pool, earliest first, ignoring its
    /// deadline.
    FirePending,
}

impl_status_conversions!(ShutdownMode {
    DropPending => "drop_pending",
    FirePending => "fire_pending",
});

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Pending-alarm policy at shutdown.
    pub shutdown_mode: ShutdownMode,
    /// Whether the pool finishes queued callbacks when the scheduler shuts
    /// it down.
    pub drain_pool_on_shutdown: bool,
    /// Name of the scheduling thread.
    pub thread_name: String,
    /// Alarms handed to the pool later than this past their deadline are
    /// logged at `warn` and counted.
    #[serde(with = "duration_millis", rename = "late_fire_warning_ms")]
    pub late_fire_warning: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            shutdown_mode: ShutdownMode::DropPending,
            drain_pool_on_shutdown: true,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            late_fire_warning: Duration::from_millis(50),
        }
    }
}

impl SchedulerConfig {
    /// Set the shutdown policy
    #[must_use]
    pub fn with_shutdown_mode(mut self, mode: ShutdownMode) -> Self {
        self.shutdown_mode = mode;
        self
    }

    /// Set whether the pool drains on shutdown
    #[must_use]
    pub fn with_drain_pool_on_shutdown(mut self, drain: bool) -> Self {
        self.drain_pool_on_shutdown = drain;
        self
    }

    /// Set the scheduling thread name
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the late-fire warning threshold
    #[must_use]
    pub fn with_late_fire_warning(mut self, threshold: Duration) -> Self {
        self.late_fire_warning = threshold;
        self
    }

    /// Validate configuration
    ///
    /// # Errors
    /// Returns `CommonError::Config` for an empty thread name.
    pub fn validate(&self) -> CommonResult<()> {
        if self.thread_name.trim().is_empty() {
            return Err(CommonError::config_field("thread_name", "must not be empty"));
        }
        Ok(())
    }
}
