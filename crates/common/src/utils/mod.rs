//! Common utility functions and helper macros
//!
//! - **[`macros`]**: status-enum conversions shared by lifecycle and config
//!   enums
//! - **[`serde`]**: serde helpers for durations expressed in milliseconds

#[macro_use]
pub mod macros;
pub mod serde;

pub use self::serde::duration_millis;
