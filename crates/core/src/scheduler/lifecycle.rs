//! Scheduler lifecycle state.

use alarmpool_common::impl_status_conversions;
use serde::{Deserialize, Serialize};

/// Where an [`AlarmScheduler`](super::AlarmScheduler) is in its lifecycle.
///
/// Transitions only move forward: `Running` → `ShuttingDown` → `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Accepting alarms and firing them as they come due.
    Running,
    /// Shutdown requested; new alarms are rejected.
    ShuttingDown,
    /// Scheduling thread joined and pool shut down.
    Stopped,
}

impl_status_conversions!(LifecycleState {
    Running => "running",
    ShuttingDown => "shutting_down",
    Stopped => "stopped",
});

impl LifecycleState {
    /// Returns `true` only while alarms are accepted.
    #[must_use]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        assert_eq!(LifecycleState::ShuttingDown.to_string(), "shutting_down");
        assert_eq!("Stopped".parse::<LifecycleState>(), Ok(LifecycleState::Stopped));
        assert_eq!("shutting-down".parse::<LifecycleState>(), Ok(LifecycleState::ShuttingDown));
        assert!("paused".parse::<LifecycleState>().is_err());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&LifecycleState::ShuttingDown).unwrap();
        assert_eq!(json, "\"shutting_down\"");
        assert!(LifecycleState::Running.is_running());
        assert!(!LifecycleState::Stopped.is_running());
    }
}
