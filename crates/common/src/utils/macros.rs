//! Macros for reducing boilerplate code

/// Implements `Display` and `FromStr` for fieldless status enums
///
/// - `Display` writes the mapped string.
/// - `FromStr` is case-insensitive and treats `-` and `_` as the same
///   character, so `"fire-pending"`, `"FIRE_PENDING"`, and `"fire_pending"`
///   all parse to the same variant. This matters for values read from
///   environment variables.
///
/// # Example
///
/// ```rust
/// use alarmpool_common::impl_status_conversions;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// pub enum Phase {
///     Running,
///     ShuttingDown,
///     Stopped,
/// }
///
/// impl_status_conversions!(Phase {
///     Running => "running",
///     ShuttingDown => "shutting_down",
///     Stopped => "stopped",
/// });
///
/// assert_eq!(Phase::ShuttingDown.to_string(), "shutting_down");
/// assert_eq!("Shutting-Down".parse::<Phase>(), Ok(Phase::ShuttingDown));
/// ```
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    //! Unit tests for utils::macros.
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestMode {
        DropPending,
        FirePending,
    }

    impl_status_conversions!(TestMode {
        DropPending => "drop_pending",
        FirePending => "fire_pending",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestMode::DropPending.to_string(), "drop_pending");
        assert_eq!(TestMode::FirePending.to_string(), "fire_pending");
    }

    /// Validates `TestMode::from_str` behavior for the separator and case
    /// normalization scenario.
    ///
    /// Assertions:
    /// - Confirms hyphenated, upper-case, and padded spellings parse.
    #[test]
    fn test_fromstr_normalizes_case_and_separators() {
        assert_eq!(TestMode::from_str("fire-pending").unwrap(), TestMode::FirePending);
        assert_eq!(TestMode::from_str("DROP_PENDING").unwrap(), TestMode::DropPending);
        assert_eq!(TestMode::from_str("  Fire_Pending ").unwrap(), TestMode::FirePending);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestMode::from_str("flush");
        assert_eq!(result.unwrap_err(), "Invalid TestMode: flush");
        assert!(TestMode::from_str("").is_err());
    }

    #[test]
    fn test_roundtrip() {
        for mode in [TestMode::DropPending, TestMode::FirePending] {
            assert_eq!(TestMode::from_str(&mode.to_string()).unwrap(), mode);
        }
    }
}
