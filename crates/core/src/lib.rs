//! # alarmpool core
//!
//! Deadline-ordered alarm scheduling with pooled dispatch.
//!
//! This crate contains:
//! - [`pool`]: a fixed-size worker pool that isolates callback failures
//! - [`scheduler`]: a single-thread alarm scheduler that fires due
//!   callbacks onto the pool
//! - [`config`]: runtime configuration and its env/file loader
//!
//! ## Architecture Principles
//! - Only depends on `alarmpool-common` plus the workspace stack
//! - Schedulers and pools are plain values; nothing is global
//! - Callbacks never run on the scheduling thread
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use alarmpool_core::{AlarmScheduler, PoolConfig, SchedulerConfig, WorkerPool};
//!
//! let pool = Arc::new(WorkerPool::new(PoolConfig::default().with_workers(2))?);
//! let scheduler = AlarmScheduler::new(SchedulerConfig::default(), Arc::clone(&pool))?;
//!
//! let handle = scheduler.register_after(Duration::from_secs(30), || unreachable!())?;
//! assert!(scheduler.cancel(&handle));
//!
//! scheduler.shutdown();
//! assert!(pool.is_shut_down());
//! # Ok::<(), alarmpool_core::SchedulerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod pool;
pub mod scheduler;

// Re-export specific items to keep call sites short
pub use config::RuntimeConfig;
pub use pool::{
    CallbackFailure, FailureSink, JoinError, PoolConfig, PoolError, PoolMetrics, PoolResult,
    TaskHandle, TracingFailureSink, WorkerPool,
};
pub use scheduler::{
    AlarmHandle, AlarmScheduler, LifecycleState, SchedulerConfig, SchedulerError,
    SchedulerMetrics, SchedulerResult, ShutdownMode,
};
