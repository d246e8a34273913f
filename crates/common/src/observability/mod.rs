//! Observability primitives
//!
//! Everything in the workspace logs through `tracing`. This module installs
//! the process-wide subscriber for binaries, benches, and tests that want to
//! see those events.
//!
//! ```rust,no_run
//! use alarmpool_common::observability::{init_tracing, LogFormat};
//!
//! // RUST_LOG overrides the default directive when set.
//! init_tracing("alarmpool_core=debug", LogFormat::Compact);
//! ```

use tracing_subscriber::EnvFilter;

use crate::impl_status_conversions;

/// Output format for the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// Newline-delimited JSON records
    Json,
}

impl_status_conversions!(LogFormat {
    Compact => "compact",
    Json => "json",
});

/// Builds the filter: `RUST_LOG` when set and valid, otherwise `default`.
#[must_use]
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs a global fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed, so it is
/// safe to call from every test.
pub fn init_tracing(default: &str, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_thread_names(true)
        .with_target(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .is_ok();
    if installed {
        tracing::debug!(%format, directive = default, "tracing subscriber installed");
    }
    installed
}

/// Installs a compact subscriber writing through the libtest capture.
///
/// Intended for `#[test]` functions; repeated calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_test_writer()
        .compact()
        .try_init();
}
