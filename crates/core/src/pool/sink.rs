//! Failure reporting for callbacks that fail on a worker.

use super::error::CallbackFailure;

/// Receives every [`CallbackFailure`] raised on a worker thread.
///
/// Implementations are called from worker threads and must not block for
/// long. A sink that panics is contained the same way a callback is.
///
/// Any `Fn(&CallbackFailure) + Send + Sync` closure is a sink:
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use alarmpool_core::pool::{CallbackFailure, FailureSink};
///
/// let failures = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&failures);
/// let sink = move |_: &CallbackFailure| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// };
///
/// sink.report(&CallbackFailure::Errored("bad".into()));
/// assert_eq!(failures.load(Ordering::SeqCst), 1);
/// ```
pub trait FailureSink: Send + Sync {
    /// Called once per failed callback.
    fn report(&self, failure: &CallbackFailure);
}

impl<F> FailureSink for F
where
    F: Fn(&CallbackFailure) + Send + Sync,
{
    fn report(&self, failure: &CallbackFailure) {
        self(failure);
    }
}

/// Default sink: logs each failure at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn report(&self, failure: &CallbackFailure) {
        tracing::error!(
            kind = failure.kind(),
            message = failure.message(),
            thread = std::thread::current().name().unwrap_or("unnamed"),
            "callback failed on worker"
        );
    }
}
