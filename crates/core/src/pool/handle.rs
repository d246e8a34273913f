//! Result handles for tasks submitted with
//! [`WorkerPool::submit_with_result`](super::WorkerPool::submit_with_result).

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::error::JoinError;

struct Slot<T> {
    outcome: Mutex<Option<Result<T, JoinError>>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn fill(&self, outcome: Result<T, JoinError>) {
        let mut guard = self.outcome.lock();
        if guard.is_none() {
            *guard = Some(outcome);
        }
        drop(guard);
        self.ready.notify_all();
    }
}

/// Creates the worker-side and caller-side ends of one task result.
pub(crate) fn task_channel<T>() -> (Completer<T>, TaskHandle<T>) {
    let slot = Arc::new(Slot { outcome: Mutex::new(None), ready: Condvar::new() });
    (Completer { slot: Some(Arc::clone(&slot)) }, TaskHandle { slot })
}

/// Worker-side end. Dropping it unfilled resolves the handle to
/// [`JoinError::Discarded`].
pub(crate) struct Completer<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, outcome: Result<T, JoinError>) {
        if let Some(slot) = self.slot.take() {
            slot.fill(outcome);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.fill(Err(JoinError::Discarded));
        }
    }
}

/// Handle to the eventual result of a pooled task.
///
/// ```
/// use alarmpool_core::pool::{PoolConfig, WorkerPool};
///
/// let pool = WorkerPool::new(PoolConfig::default().with_workers(2)).unwrap();
/// let handle = pool.submit_with_result(|| 6 * 7).unwrap();
/// assert_eq!(handle.join(), Ok(42));
/// ```
pub struct TaskHandle<T> {
    slot: Arc<Slot<T>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task has finished, failed, or been discarded.
    pub fn join(self) -> Result<T, JoinError> {
        let mut guard = self.slot.outcome.lock();
        loop {
            if let Some(outcome) = guard.take() {
                return outcome;
            }
            self.slot.ready.wait(&mut guard);
        }
    }

    /// Like [`join`](Self::join) but gives up after `timeout`.
    ///
    /// The handle is consumed either way; a task that finishes after the
    /// timeout still runs, its result is just dropped.
    pub fn join_timeout(self, timeout: Duration) -> Result<T, JoinError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.slot.outcome.lock();
        loop {
            if let Some(outcome) = guard.take() {
                return outcome;
            }
            match deadline {
                Some(deadline) => {
                    if self.slot.ready.wait_until(&mut guard, deadline).timed_out() {
                        return guard.take().unwrap_or(Err(JoinError::Timeout));
                    }
                }
                None => self.slot.ready.wait(&mut guard),
            }
        }
    }

    /// Returns `true` once a result (or failure) is available.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.slot.outcome.lock().is_some()
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("finished", &self.is_finished()).finish()
    }
}
