//! Integration tests for `alarmpool_common::error`.
//!
//! These suites validate classification and module error delegation so the
//! pool and scheduler crates report failures consistently.

#![allow(clippy::doc_lazy_continuation)]

use std::time::Duration;

use alarmpool_common::error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
use alarmpool_common::impl_error_classification;
use alarmpool_common::WorkQueue;
use thiserror::Error;

#[derive(Debug, Error)]
enum LoaderError {
    #[error("no configuration source found")]
    NotFound,

    #[error("source busy")]
    Busy,

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl_error_classification!(LoaderError, Common,
    Self::NotFound => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::Busy => {
        retryable: true,
        severity: ErrorSeverity::Warning,
        critical: false,
        retry_after: Some(Duration::from_millis(50)),
    }
);

fn workers_from(raw: &str) -> Result<usize, LoaderError> {
    let workers = raw
        .parse::<usize>()
        .map_err(|e| CommonError::config_field("workers", e.to_string()))?;
    if workers == 0 {
        return Err(LoaderError::NotFound);
    }
    Ok(workers)
}

/// Validates `impl_error_classification!` behavior for the module error
/// delegating to `CommonError` scenario.
///
/// Assertions:
/// - Confirms module variants use their declared classification.
/// - Confirms `retry_after` defaults to `None` where none is declared.
/// - Confirms wrapped common errors keep their own classification and
///   message.
#[test]
fn module_errors_delegate_to_common() {
    assert_eq!(LoaderError::NotFound.severity(), ErrorSeverity::Error);
    assert!(LoaderError::Busy.is_retryable());
    assert_eq!(LoaderError::Busy.retry_after(), Some(Duration::from_millis(50)));
    assert_eq!(LoaderError::NotFound.retry_after(), None);

    let wrapped = workers_from("four").unwrap_err();
    assert!(matches!(wrapped, LoaderError::Common(CommonError::Config { .. })));
    assert!(!wrapped.is_retryable());
    assert!(!wrapped.is_critical());
    assert!(wrapped.to_string().starts_with("Configuration error in field 'workers'"));

    assert_eq!(workers_from("3").unwrap(), 3);
}

#[test]
fn rejected_queue_capacity_is_a_validation_error() {
    fn build(capacity: usize) -> CommonResult<WorkQueue<u8>> {
        WorkQueue::bounded(capacity)
    }

    let err = build(0).unwrap_err();
    assert_eq!(err.field(), Some("capacity"));
    assert_eq!(err.severity(), ErrorSeverity::Error);
    assert!(err.to_string().contains("(value: '0')"));
    assert!(build(1).is_ok());
}
