//! Custom assertions for testing
//!
//! Timing assertions take explicit tolerances because scheduler tests run on
//! shared CI machines where wake-ups are routinely late by a few
//! milliseconds.

// Allow missing panics docs for test utilities - these assertions are designed to panic
// on failure which is their core purpose in test contexts
#![allow(clippy::missing_panics_doc)]

use std::fmt::Debug;
use std::time::Duration;

/// Assert that an error contains a specific substring
///
/// # Examples
///
/// ```
/// let result: Result<(), String> = Err("worker pool is shut down".to_string());
/// alarmpool_common::assert_error_contains!(result, "shut down");
/// ```
#[macro_export]
macro_rules! assert_error_contains {
    ($result:expr, $substring:expr) => {
        match &$result {
            Ok(_) => panic!("Expected error but got Ok"),
            Err(e) => {
                let error_msg = format!("{}", e);
                assert!(
                    error_msg.contains($substring),
                    "Error message '{}' does not contain '{}'",
                    error_msg,
                    $substring
                );
            }
        }
    };
}

/// Assert that a condition becomes true within a timeout
///
/// Polls every 5ms.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let flag = Arc::new(AtomicBool::new(false));
/// let setter = Arc::clone(&flag);
/// std::thread::spawn(move || setter.store(true, Ordering::SeqCst));
///
/// alarmpool_common::assert_eventually!(Duration::from_secs(1), flag.load(Ordering::SeqCst));
/// ```
#[macro_export]
macro_rules! assert_eventually {
    ($timeout:expr, $condition:expr) => {{
        let start = std::time::Instant::now();
        let timeout = $timeout;
        let mut last_value = false;

        while start.elapsed() < timeout {
            last_value = $condition;
            if last_value {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert!(last_value, "Condition did not become true within {:?}", timeout);
    }};
}

/// Assert that a duration is within an acceptable range
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use alarmpool_common::testing::assertions::assert_duration_in_range;
///
/// let actual = Duration::from_millis(105);
/// assert_duration_in_range(actual, Duration::from_millis(100), Duration::from_millis(10));
/// ```
pub fn assert_duration_in_range(actual: Duration, expected: Duration, tolerance: Duration) {
    let min = expected.saturating_sub(tolerance);
    let max = expected.saturating_add(tolerance);

    assert!(
        actual >= min && actual <= max,
        "Duration {:?} not in range [{:?}, {:?}]",
        actual,
        min,
        max
    );
}

/// Assert that a duration is at least `minimum`
///
/// Used for "never fires early" checks where lateness is unbounded.
pub fn assert_duration_at_least(actual: Duration, minimum: Duration) {
    assert!(actual >= minimum, "Duration {:?} is shorter than {:?}", actual, minimum);
}

/// Assert that a sequence never decreases
///
/// Unlike a strict sort check this accepts equal neighbours, which is what
/// fire timestamps look like when two alarms share a deadline.
///
/// # Examples
///
/// ```
/// use alarmpool_common::testing::assertions::assert_non_decreasing;
///
/// assert_non_decreasing(&[1, 2, 2, 5]);
/// ```
pub fn assert_non_decreasing<T>(items: &[T])
where
    T: PartialOrd + Debug,
{
    for window in items.windows(2) {
        assert!(window[0] <= window[1], "Sequence decreases: {:?} > {:?}", window[0], window[1]);
    }
}
