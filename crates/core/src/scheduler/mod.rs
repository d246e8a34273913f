//! Deadline-ordered alarm scheduling with pooled dispatch.
//!
//! - **[`AlarmScheduler`]**: registers, cancels, and fires alarms
//! - **[`SchedulerConfig`]** / **[`ShutdownMode`]**: shutdown policy and
//!   thread naming
//! - **[`LifecycleState`]**: `Running` → `ShuttingDown` → `Stopped`
//!
//! ## Shutdown semantics
//!
//! By default, alarms still pending at shutdown are dropped and never fire,
//! so shutdown takes bounded time no matter how far out the deadlines are.
//! [`ShutdownMode::FirePending`] flushes them to the pool instead. This is
//! separate from the pool's own drain flag, which only decides whether
//! callbacks already handed to the pool get to run.

pub mod alarm;
pub mod alarm_scheduler;
pub mod config;
pub mod error;
pub mod lifecycle;

pub use alarm::AlarmHandle;
pub use alarm_scheduler::{AlarmScheduler, SchedulerMetrics};
pub use config::{SchedulerConfig, ShutdownMode};
pub use error::{SchedulerError, SchedulerResult};
pub use lifecycle::LifecycleState;
