//! Testing utilities and helpers
//!
//! - **[`assertions`]**: timing and ordering assertions with explicit
//!   tolerances
//! - **[`recorder`]**: cross-thread callback recorders
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use alarmpool_common::testing::{assertions::assert_non_decreasing, FireRecorder};
//!
//! let recorder = FireRecorder::new();
//! recorder.record("first");
//! recorder.record("second");
//!
//! assert!(recorder.wait_for(2, Duration::from_millis(10)));
//! let stamps: Vec<_> = recorder.fires().into_iter().map(|fire| fire.at).collect();
//! assert_non_decreasing(&stamps);
//! ```

pub mod assertions;
pub mod recorder;

pub use assertions::{assert_duration_at_least, assert_duration_in_range, assert_non_decreasing};
pub use recorder::{ConcurrencyGauge, Fire, FireRecorder, GaugeGuard};
