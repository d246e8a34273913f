//! Alarm handles and the boxed callback type.

use std::fmt;
use std::time::Instant;

use alarmpool_common::collections::EntryId;

/// A registered callback, owned by the scheduler until it fires.
pub(crate) type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle for a registered alarm.
///
/// Only useful for [`AlarmScheduler::cancel`](super::AlarmScheduler::cancel).
/// A handle is tied to the scheduler that issued it; cancelling through a
/// different scheduler is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmHandle {
    pub(crate) scheduler_id: u64,
    pub(crate) entry: EntryId,
    pub(crate) deadline: Instant,
}

impl AlarmHandle {
    /// Sequence number of the alarm within its scheduler.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.entry.as_u64()
    }

    /// The deadline the alarm was registered with.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl fmt::Display for AlarmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alarm{}@{}", self.entry, self.scheduler_id)
    }
}
