//! Worker pool errors.

use std::any::Any;
use std::io;
use std::time::Duration;

use alarmpool_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use alarmpool_common::impl_error_classification;
use thiserror::Error;

/// Result alias for worker pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors returned to callers of [`WorkerPool`](super::WorkerPool)
#[derive(Debug, Error)]
pub enum PoolError {
    /// Shutdown has begun; the task was not enqueued.
    #[error("worker pool is shut down")]
    Closed,

    /// A bounded queue was at capacity and the caller asked not to block.
    #[error("worker pool queue is full")]
    QueueFull,

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// The pool configuration was rejected.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl_error_classification!(PoolError, Common,
    Self::Closed => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::QueueFull => {
        retryable: true,
        severity: ErrorSeverity::Warning,
        critical: false,
        retry_after: Some(Duration::from_millis(10)),
    },
    Self::Spawn(_) => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    }
);

/// A callback that failed while running on a worker.
///
/// Failures are isolated at the worker boundary and handed to the pool's
/// [`FailureSink`](super::FailureSink); they never reach the submitter or
/// other tasks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackFailure {
    /// The callback panicked; carries the panic message.
    #[error("callback panicked: {0}")]
    Panicked(String),

    /// A fallible callback returned `Err`; carries its display form.
    #[error("callback returned an error: {0}")]
    Errored(String),
}

impl CallbackFailure {
    /// Builds a [`CallbackFailure::Panicked`] from a `catch_unwind` payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }

    /// Short label used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Panicked(_) => "panicked",
            Self::Errored(_) => "errored",
        }
    }

    /// The panic message or error text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Panicked(message) | Self::Errored(message) => message,
        }
    }
}

impl ErrorClassification for CallbackFailure {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Why a [`TaskHandle`](super::TaskHandle) produced no value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("task failed: {0}")]
    Failed(#[from] CallbackFailure),

    /// The pool shut down without draining before the task ran.
    #[error("task was discarded before it ran")]
    Discarded,

    #[error("timed out waiting for task result")]
    Timeout,
}

impl ErrorClassification for JoinError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Failed(_) => ErrorSeverity::Error,
            Self::Discarded | Self::Timeout => ErrorSeverity::Warning,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
