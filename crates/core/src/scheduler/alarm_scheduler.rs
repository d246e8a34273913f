//! Deadline-ordered alarm scheduler.
//!
//! One scheduling thread owns the timing loop:
//!
//! 1. Lock the pending set.
//! 2. Nothing pending: wait until an alarm is registered or shutdown is
//!    requested.
//! 3. Earliest deadline has passed: pop it, release the lock, submit the
//!    callback to the pool, and go straight back to step 1 so a burst of due
//!    alarms drains before the thread sleeps again.
//! 4. Otherwise: wait until that deadline, or until an earlier alarm is
//!    registered, then re-peek.
//!
//! Callbacks never run on the scheduling thread. The pending-set lock is
//! never held across a pool submission, so the scheduler and pool locks are
//! never held together.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use alarmpool_common::collections::{DeadlineHeap, EntryId};
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::alarm::{AlarmHandle, Callback};
use super::config::{SchedulerConfig, ShutdownMode};
use super::error::{SchedulerError, SchedulerResult};
use super::lifecycle::LifecycleState;
use crate::config::RuntimeConfig;
use crate::pool::WorkerPool;

// Used by `register_after` when `now + delay` overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

static NEXT_SCHEDULER_ID: AtomicU64 = AtomicU64::new(1);

/// Point-in-time scheduler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerMetrics {
    /// Alarms accepted by `register_alarm`
    pub registered: u64,
    /// Alarms handed to the pool
    pub fired: u64,
    /// Alarms removed by `cancel`
    pub cancelled: u64,
    /// Alarms discarded by a `DropPending` shutdown
    pub dropped_at_shutdown: u64,
    /// Fired alarms the pool refused because it was closed
    pub rejected_by_pool: u64,
    /// Fired alarms that missed their deadline by more than the warning
    /// threshold
    pub late: u64,
    /// Alarms waiting for their deadline
    pub pending: usize,
}

#[derive(Default)]
struct Counters {
    registered: AtomicU64,
    fired: AtomicU64,
    cancelled: AtomicU64,
    dropped_at_shutdown: AtomicU64,
    rejected_by_pool: AtomicU64,
    late: AtomicU64,
}

struct State {
    pending: DeadlineHeap<Callback>,
    lifecycle: LifecycleState,
}

struct Inner {
    id: u64,
    config: SchedulerConfig,
    pool: Arc<WorkerPool>,
    state: Mutex<State>,
    wake: Condvar,
    counters: Counters,
}

impl Inner {
    fn run(&self) {
        debug!(scheduler = self.id, "scheduling thread started");
        let mut state = self.state.lock();

        while state.lifecycle.is_running() {
            let now = Instant::now();
            match state.pending.peek_deadline() {
                None => self.wake.wait(&mut state),
                Some(deadline) if deadline <= now => {
                    if let Some((entry, deadline, callback)) = state.pending.pop_earliest() {
                        MutexGuard::unlocked(&mut state, || {
                            self.dispatch(entry, deadline, callback);
                        });
                    }
                }
                Some(deadline) => {
                    // Timeouts and notifications are handled the same way:
                    // loop and re-peek.
                    let _ = self.wake.wait_until(&mut state, deadline);
                }
            }
        }

        let remaining = state.pending.drain();
        drop(state);
        self.finish_pending(remaining);
        debug!(scheduler = self.id, "scheduling thread exiting");
    }

    fn dispatch(&self, entry: EntryId, deadline: Instant, callback: Callback) {
        let lateness = Instant::now().saturating_duration_since(deadline);
        if lateness > self.config.late_fire_warning {
            self.counters.late.fetch_add(1, Ordering::Relaxed);
            let late_ms = u64::try_from(lateness.as_millis()).unwrap_or(u64::MAX);
            warn!(scheduler = self.id, alarm = %entry, late_ms, "alarm fired late");
        }

        match self.pool.submit(callback) {
            Ok(()) => {
                self.counters.fired.fetch_add(1, Ordering::Relaxed);
                debug!(scheduler = self.id, alarm = %entry, "alarm fired");
            }
            Err(err) => {
                self.counters.rejected_by_pool.fetch_add(1, Ordering::Relaxed);
                warn!(
                    scheduler = self.id,
                    alarm = %entry,
                    error = %err,
                    "pool rejected fired alarm; dropping it"
                );
            }
        }
    }

    fn finish_pending(&self, remaining: Vec<Callback>) {
        if remaining.is_empty() {
            return;
        }
        match self.config.shutdown_mode {
            ShutdownMode::DropPending => {
                let dropped = remaining.len();
                self.counters.dropped_at_shutdown.fetch_add(dropped as u64, Ordering::Relaxed);
                drop(remaining);
                warn!(scheduler = self.id, dropped, "dropped pending alarms at shutdown");
            }
            ShutdownMode::FirePending => {
                info!(
                    scheduler = self.id,
                    count = remaining.len(),
                    "firing pending alarms at shutdown"
                );
                for callback in remaining {
                    match self.pool.submit(callback) {
                        Ok(()) => {
                            self.counters.fired.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            self.counters.rejected_by_pool.fetch_add(1, Ordering::Relaxed);
                            warn!(scheduler = self.id, error = %err, "pool rejected flushed alarm");
                        }
                    }
                }
            }
        }
    }
}

/// Fires registered callbacks on a [`WorkerPool`] once their deadlines pass.
///
/// ```
/// use std::sync::mpsc;
/// use std::time::Duration;
///
/// use alarmpool_core::config::RuntimeConfig;
/// use alarmpool_core::scheduler::AlarmScheduler;
///
/// let scheduler = AlarmScheduler::with_pool(RuntimeConfig::default()).unwrap();
/// let (tx, rx) = mpsc::channel();
/// scheduler
///     .register_after(Duration::from_millis(10), move || tx.send("rang").unwrap())
///     .unwrap();
///
/// assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("rang"));
/// scheduler.shutdown();
/// ```
pub struct AlarmScheduler {
    inner: Arc<Inner>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl AlarmScheduler {
    /// Starts a scheduler that fires onto `pool`.
    ///
    /// The scheduler shuts `pool` down as part of its own shutdown.
    ///
    /// # Errors
    /// `SchedulerError::Common` for an invalid config,
    /// `SchedulerError::Spawn` if the scheduling thread cannot be started.
    #[instrument(skip_all, fields(shutdown_mode = %config.shutdown_mode))]
    pub fn new(config: SchedulerConfig, pool: Arc<WorkerPool>) -> SchedulerResult<Self> {
        config.validate()?;

        let thread_name = config.thread_name.clone();
        let inner = Arc::new(Inner {
            id: NEXT_SCHEDULER_ID.fetch_add(1, Ordering::Relaxed),
            config,
            pool,
            state: Mutex::new(State {
                pending: DeadlineHeap::new(),
                lifecycle: LifecycleState::Running,
            }),
            wake: Condvar::new(),
            counters: Counters::default(),
        });

        let thread_inner = Arc::clone(&inner);
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || thread_inner.run())
            .map_err(SchedulerError::Spawn)?;

        info!(scheduler = inner.id, workers = inner.pool.worker_count(), "alarm scheduler started");
        Ok(Self { inner, thread: Mutex::new(Some(handle)) })
    }

    /// Builds a pool from `config.pool` and a scheduler that owns it.
    ///
    /// # Errors
    /// Any pool construction error, wrapped in `SchedulerError::Pool`, or
    /// the errors of [`AlarmScheduler::new`].
    pub fn with_pool(config: RuntimeConfig) -> SchedulerResult<Self> {
        let RuntimeConfig { pool, scheduler } = config;
        let pool = Arc::new(WorkerPool::new(pool)?);
        Self::new(scheduler, pool)
    }

    /// Registers `callback` to run on the pool no earlier than `deadline`.
    ///
    /// A deadline in the past fires on the next pass of the scheduling loop.
    ///
    /// # Errors
    /// `SchedulerError::ShutdownInProgress` once shutdown has been requested.
    pub fn register_alarm<F>(&self, deadline: Instant, callback: F) -> SchedulerResult<AlarmHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.state.lock();
        if !state.lifecycle.is_running() {
            drop(state);
            debug!(scheduler = self.inner.id, "rejected alarm registered during shutdown");
            return Err(SchedulerError::ShutdownInProgress);
        }

        let previous = state.pending.peek_deadline();
        let entry = state.pending.push(deadline, Box::new(callback));
        drop(state);

        self.inner.counters.registered.fetch_add(1, Ordering::Relaxed);
        // Only a new earliest deadline changes what the thread waits for.
        if previous.map_or(true, |earliest| deadline <= earliest) {
            self.inner.wake.notify_one();
        }

        let handle = AlarmHandle { scheduler_id: self.inner.id, entry, deadline };
        debug!(scheduler = self.inner.id, alarm = %entry, "alarm registered");
        Ok(handle)
    }

    /// Registers `callback` to run `delay` from now.
    ///
    /// A delay too large to represent is clamped to the far future.
    ///
    /// # Errors
    /// Same as [`register_alarm`](Self::register_alarm).
    pub fn register_after<F>(&self, delay: Duration, callback: F) -> SchedulerResult<AlarmHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        self.register_alarm(deadline, callback)
    }

    /// Cancels a pending alarm.
    ///
    /// Returns `true` if the alarm was still pending; it will never fire.
    /// Returns `false` if it already fired, was already cancelled, was
    /// dropped at shutdown, or belongs to another scheduler.
    pub fn cancel(&self, handle: &AlarmHandle) -> bool {
        if handle.scheduler_id != self.inner.id {
            return false;
        }

        let removed = self.inner.state.lock().pending.cancel(handle.entry);
        match removed {
            Some(callback) => {
                drop(callback);
                self.inner.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(scheduler = self.inner.id, alarm = %handle.entry, "alarm cancelled");
                true
            }
            None => false,
        }
    }

    /// Stops the scheduler, then shuts down the pool.
    ///
    /// Pending alarms are handled per [`ShutdownMode`]; the default drops
    /// them. The pool is shut down with
    /// [`SchedulerConfig::drain_pool_on_shutdown`]. Idempotent; concurrent
    /// callers all return once the scheduler is `Stopped`.
    #[instrument(skip(self), fields(scheduler = self.inner.id))]
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.lifecycle.is_running() {
                state.lifecycle = LifecycleState::ShuttingDown;
                info!(pending = state.pending.len(), "alarm scheduler shutting down");
            }
        }
        self.inner.wake.notify_all();

        let mut thread = self.thread.lock();
        let Some(handle) = thread.take() else {
            return;
        };
        if handle.join().is_err() {
            error!("scheduling thread terminated abnormally");
        }

        self.inner.pool.shutdown(self.inner.config.drain_pool_on_shutdown);
        self.inner.state.lock().lifecycle = LifecycleState::Stopped;
        info!("alarm scheduler stopped");
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.state.lock().lifecycle
    }

    /// Alarms waiting for their deadline.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// The pool fired alarms are submitted to.
    #[must_use]
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.inner.pool
    }

    /// Snapshot of the scheduler counters.
    #[must_use]
    pub fn metrics(&self) -> SchedulerMetrics {
        let counters = &self.inner.counters;
        SchedulerMetrics {
            registered: counters.registered.load(Ordering::Relaxed),
            fired: counters.fired.load(Ordering::Relaxed),
            cancelled: counters.cancelled.load(Ordering::Relaxed),
            dropped_at_shutdown: counters.dropped_at_shutdown.load(Ordering::Relaxed),
            rejected_by_pool: counters.rejected_by_pool.load(Ordering::Relaxed),
            late: counters.late.load(Ordering::Relaxed),
            pending: self.pending_count(),
        }
    }
}

impl Drop for AlarmScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for AlarmScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("AlarmScheduler")
            .field("id", &self.inner.id)
            .field("state", &state.lifecycle)
            .field("pending", &state.pending.len())
            .finish()
    }
}
