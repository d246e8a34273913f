//! Scheduler errors.

use std::io;

use alarmpool_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use alarmpool_common::impl_error_classification;
use thiserror::Error;

use crate::pool::PoolError;

/// Result alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors returned to callers of [`AlarmScheduler`](super::AlarmScheduler)
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Shutdown has been requested; the alarm would never fire.
    #[error("scheduler is shutting down; alarm rejected")]
    ShutdownInProgress,

    /// The OS refused to start the scheduling thread.
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[source] io::Error),

    /// Building or using the worker pool failed.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The scheduler configuration was rejected.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl_error_classification!(SchedulerError, Common,
    Self::ShutdownInProgress => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Spawn(_) => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    },
    Self::Pool(err) => {
        retryable: err.is_retryable(),
        severity: err.severity(),
        critical: err.is_critical(),
        retry_after: err.retry_after(),
    }
);
