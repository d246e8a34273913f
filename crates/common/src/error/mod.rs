//! Error types shared by the queue, pool, scheduler and config layers
//!
//! - **`CommonError`**: failures that more than one crate reports, namely bad
//!   configuration and rejected arguments.
//! - **`ErrorClassification`**: asks an error whether retrying can help, how
//!   severe it is, and whether it is critical.
//! - **`ErrorSeverity`**: the scale used when logging a classified error.
//!
//! Module errors embed `CommonError` and classify their own variants with
//! [`impl_error_classification!`](crate::impl_error_classification):
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum PoolError {
//!     #[error("worker pool is closed")]
//!     Closed,
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl_error_classification!(PoolError, Common,
//!     Self::Closed => {
//!         retryable: false,
//!         severity: ErrorSeverity::Warning,
//!         critical: false,
//!     }
//! );
//! ```
//!
//! | Level | Examples |
//! |-------|----------|
//! | **Warning** | Pool closed, queue full, registration during shutdown |
//! | **Error** | Invalid config, failed callback |
//! | **Critical** | Worker or scheduler thread could not be spawned |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias for operations that fail with [`CommonError`]
pub type CommonResult<T> = Result<T, CommonError>;

/// Failures shared across crates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    /// A configuration source is missing, unreadable or holds a bad value
    #[error("Configuration error{}: {message}", in_field(.field))]
    Config { message: String, field: Option<String> },

    /// An argument was rejected before any work started
    #[error("Validation error for field '{field}' (value: '{value}'): {message}")]
    Validation { field: String, message: String, value: String },
}

fn in_field(field: &Option<String>) -> String {
    field.as_ref().map(|field| format!(" in field '{field}'")).unwrap_or_default()
}

impl CommonError {
    /// Configuration error not tied to one field
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Configuration error for `field` (a struct field or environment variable)
    pub fn config_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Validation error carrying the rejected value
    pub fn validation<F: Into<String>, M: Into<String>, V: Into<String>>(
        field: F,
        message: M,
        value: V,
    ) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: value.into() }
    }

    /// The offending field, if the error names one
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Config { field, .. } => field.as_deref(),
            Self::Validation { field, .. } => Some(field),
        }
    }
}

// Bad input stays bad on retry.
impl ErrorClassification for CommonError {
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

/// Uniform questions every module error can answer
pub trait ErrorClassification {
    /// Whether the same call may succeed later (a full queue may drain; a
    /// closed pool never reopens)
    fn is_retryable(&self) -> bool;

    /// Severity used when logging the error
    fn severity(&self) -> ErrorSeverity;

    /// Whether the error leaves the component unable to do its job
    fn is_critical(&self) -> bool;

    /// Suggested delay before retrying
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity scale, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Degraded but operational
    Warning,
    /// The operation failed
    Error,
    /// The component cannot continue
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        })
    }
}

/// Implements [`ErrorClassification`] for a module error that embeds
/// `CommonError`
///
/// The embedded variant delegates; every other variant lists its
/// classification inline. `retry_after` defaults to `None`.
///
/// ```rust,ignore
/// impl_error_classification!(PoolError, Common,
///     Self::Closed => {
///         retryable: false,
///         severity: ErrorSeverity::Warning,
///         critical: false,
///     },
///     Self::QueueFull => {
///         retryable: true,
///         severity: ErrorSeverity::Warning,
///         critical: false,
///         retry_after: Some(Duration::from_millis(10)),
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_error_classification {
    (
        $error_type:ty,
        $common_variant:ident
        $(,
            $variant:pat => {
                retryable: $retryable:expr,
                severity: $severity:expr,
                critical: $critical:expr
                $(, retry_after: $retry_after:expr)?
                $(,)?
            }
        )*
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn is_retryable(&self) -> bool {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::is_retryable(e),
                    $(
                        $variant => $retryable,
                    )*
                }
            }

            fn severity(&self) -> $crate::error::ErrorSeverity {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::severity(e),
                    $(
                        $variant => $severity,
                    )*
                }
            }

            fn is_critical(&self) -> bool {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::is_critical(e),
                    $(
                        $variant => $critical,
                    )*
                }
            }

            fn retry_after(&self) -> Option<std::time::Duration> {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::retry_after(e),
                    $(
                        $(
                            $variant => $retry_after,
                        )?
                    )*
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }
    };
}
