//! Fixed-size worker pool with panic isolation.
//!
//! - **[`WorkerPool`]**: the pool itself
//! - **[`PoolConfig`]**: worker count, queue bound, thread naming
//! - **[`FailureSink`]**: where failed callbacks are reported
//! - **[`TaskHandle`]**: result of a task submitted with
//!   [`WorkerPool::submit_with_result`]

pub mod config;
pub mod error;
pub mod handle;
pub mod sink;
pub mod worker_pool;

pub use config::PoolConfig;
pub use error::{CallbackFailure, JoinError, PoolError, PoolResult};
pub use handle::TaskHandle;
pub use sink::{FailureSink, TracingFailureSink};
pub use worker_pool::{PoolMetrics, WorkerPool};
