//! Fixed-size worker pool.
//!
//! Workers block on a shared [`WorkQueue`] and run one task at a time. A
//! task that panics or returns an error is caught at the worker boundary and
//! reported to the pool's [`FailureSink`]; the worker then moves on to the
//! next task.
//!
//! # Shutdown
//! [`WorkerPool::shutdown`] closes the queue and joins every worker. With
//! `drain = true` queued tasks still run; with `drain = false` they are
//! dropped and any [`TaskHandle`] waiting on them resolves to
//! [`JoinError::Discarded`]. Only the first call decides the mode.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use alarmpool_common::collections::{CloseMode, PushError, TryPushError, WorkQueue};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::config::PoolConfig;
use super::error::{CallbackFailure, JoinError, PoolError, PoolResult};
use super::handle::{task_channel, TaskHandle};
use super::sink::{FailureSink, TracingFailureSink};

type Job = Box<dyn FnOnce() -> Result<(), CallbackFailure> + Send + 'static>;

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolMetrics {
    /// Worker threads started
    pub workers: usize,
    /// Tasks accepted into the queue
    pub submitted: u64,
    /// Tasks that ran to completion
    pub completed: u64,
    /// Tasks that panicked or returned an error
    pub failed: u64,
    /// Submissions refused because the pool was closed or full
    pub rejected: u64,
    /// Queued tasks dropped by a non-draining shutdown
    pub discarded: u64,
    /// Tasks executing right now
    pub in_flight: usize,
    /// Tasks waiting in the queue
    pub queued: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    discarded: AtomicU64,
    in_flight: AtomicUsize,
}

struct Shared {
    queue: WorkQueue<Job>,
    sink: Arc<dyn FailureSink>,
    counters: Counters,
    // Tasks accepted but not yet finished or discarded.
    outstanding: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    fn begin(&self) {
        *self.outstanding.lock() += 1;
    }

    fn finish(&self, count: usize) {
        let mut outstanding = self.outstanding.lock();
        *outstanding = outstanding.saturating_sub(count);
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }

    fn report(&self, failure: &CallbackFailure) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
        let reported = panic::catch_unwind(AssertUnwindSafe(|| self.sink.report(failure)));
        if reported.is_err() {
            error!(kind = failure.kind(), "failure sink panicked while reporting");
        }
    }
}

/// A fixed set of worker threads executing submitted tasks.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use alarmpool_core::pool::{PoolConfig, WorkerPool};
///
/// let pool = WorkerPool::new(PoolConfig::default().with_workers(2)).unwrap();
/// let hits = Arc::new(AtomicUsize::new(0));
/// for _ in 0..8 {
///     let hits = Arc::clone(&hits);
///     pool.submit(move || {
///         hits.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
/// }
///
/// pool.shutdown(true);
/// assert_eq!(hits.load(Ordering::SeqCst), 8);
/// assert!(pool.submit(|| {}).is_err());
/// ```
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_ids: Vec<ThreadId>,
    worker_count: usize,
}

impl WorkerPool {
    /// Starts a pool that logs callback failures through `tracing`.
    ///
    /// # Errors
    /// `PoolError::Common` for an invalid config, `PoolError::Spawn` if a
    /// worker thread cannot be started.
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        Self::with_sink(config, Arc::new(TracingFailureSink))
    }

    /// Starts a pool that reports callback failures to `sink`.
    ///
    /// # Errors
    /// Same as [`WorkerPool::new`]. Workers started before a spawn failure
    /// are shut down before the error is returned.
    #[instrument(skip_all, fields(workers = config.workers, queue_capacity = ?config.queue_capacity))]
    pub fn with_sink(config: PoolConfig, sink: Arc<dyn FailureSink>) -> PoolResult<Self> {
        config.validate()?;

        let queue = match config.queue_capacity {
            Some(capacity) => WorkQueue::bounded(capacity)?,
            None => WorkQueue::unbounded(),
        };
        let shared = Arc::new(Shared {
            queue,
            sink,
            counters: Counters::default(),
            outstanding: Mutex::new(0),
            idle: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index))
                .spawn(move || run_worker(&worker_shared));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    error!(index, error = %err, "failed to spawn worker; stopping started workers");
                    shared.queue.close(CloseMode::Discard);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(PoolError::Spawn(err));
                }
            }
        }

        let worker_ids = handles.iter().map(|handle| handle.thread().id()).collect();
        info!(workers = config.workers, "worker pool started");

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
            worker_ids,
            worker_count: config.workers,
        })
    }

    /// Enqueues `task`, blocking while a bounded queue is full.
    ///
    /// # Errors
    /// `PoolError::Closed` once shutdown has begun.
    pub fn submit<F>(&self, task: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(move || {
            task();
            Ok(())
        }))
    }

    /// Enqueues `task` without blocking.
    ///
    /// # Errors
    /// `PoolError::QueueFull` if a bounded queue is at capacity,
    /// `PoolError::Closed` once shutdown has begun.
    pub fn try_submit<F>(&self, task: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let job: Job = Box::new(move || {
            task();
            Ok(())
        });

        self.shared.begin();
        match self.shared.queue.try_push(job) {
            Ok(()) => {
                self.shared.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                self.shared.finish(1);
                self.shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
                match err {
                    TryPushError::Full(_) => Err(PoolError::QueueFull),
                    TryPushError::Closed(_) => Err(PoolError::Closed),
                }
            }
        }
    }

    /// Enqueues a task whose `Err` is reported as
    /// [`CallbackFailure::Errored`].
    ///
    /// # Errors
    /// `PoolError::Closed` once shutdown has begun.
    pub fn submit_fallible<F, E>(&self, task: F) -> PoolResult<()>
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        self.enqueue(Box::new(move || {
            task().map_err(|err| CallbackFailure::Errored(err.to_string()))
        }))
    }

    /// Enqueues `task` and returns a handle to its return value.
    ///
    /// # Errors
    /// `PoolError::Closed` once shutdown has begun.
    pub fn submit_with_result<F, T>(&self, task: F) -> PoolResult<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (completer, handle) = task_channel();
        self.enqueue(Box::new(move || match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(value) => {
                completer.complete(Ok(value));
                Ok(())
            }
            Err(payload) => {
                let failure = CallbackFailure::from_panic(payload.as_ref());
                completer.complete(Err(JoinError::Failed(failure.clone())));
                Err(failure)
            }
        }))?;
        Ok(handle)
    }

    fn enqueue(&self, job: Job) -> PoolResult<()> {
        self.shared.begin();
        match self.shared.queue.push(job) {
            Ok(()) => {
                self.shared.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(PushError::Closed(_job)) => {
                self.shared.finish(1);
                self.shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(PoolError::Closed)
            }
        }
    }

    /// Stops accepting tasks and waits for every worker to exit.
    ///
    /// `drain = true` runs everything already queued first; `drain = false`
    /// drops it. Repeated and concurrent calls are safe: each returns once
    /// the workers are gone. Called from one of this pool's own workers it
    /// only closes the queue, since a thread cannot join itself.
    #[instrument(skip(self), fields(workers = self.worker_count))]
    pub fn shutdown(&self, drain: bool) {
        let mode = if drain { CloseMode::Drain } else { CloseMode::Discard };
        let discarded = self.shared.queue.close(mode);
        if discarded > 0 {
            warn!(discarded, "discarded queued tasks on shutdown");
            self.shared.counters.discarded.fetch_add(discarded as u64, Ordering::Relaxed);
            self.shared.finish(discarded);
        }

        if self.worker_ids.contains(&thread::current().id()) {
            debug!("shutdown requested from a worker thread; not joining");
            return;
        }

        // Held across the joins so concurrent callers also wait for exit.
        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
        info!("worker pool stopped");
    }

    /// Blocks until no task is queued or running.
    ///
    /// Must not be called from a task running on this pool.
    pub fn wait_idle(&self) {
        let mut outstanding = self.shared.outstanding.lock();
        while *outstanding > 0 {
            self.shared.idle.wait(&mut outstanding);
        }
    }

    /// Like [`wait_idle`](Self::wait_idle) with a timeout; returns `true` if
    /// the pool went idle in time.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_idle();
            return true;
        };
        let mut outstanding = self.shared.outstanding.lock();
        while *outstanding > 0 {
            if self.shared.idle.wait_until(&mut outstanding, deadline).timed_out() {
                return *outstanding == 0;
            }
        }
        true
    }

    /// Returns `true` once shutdown has begun.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.queue.is_closed()
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let counters = &self.shared.counters;
        PoolMetrics {
            workers: self.worker_count,
            submitted: counters.submitted.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
            in_flight: counters.in_flight.load(Ordering::Relaxed),
            queued: self.shared.queue.len(),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown(true);
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.worker_count)
            .field("queued", &self.shared.queue.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

fn run_worker(shared: &Shared) {
    while let Some(job) = shared.queue.pop() {
        shared.counters.in_flight.fetch_add(1, Ordering::Relaxed);
        let outcome = panic::catch_unwind(AssertUnwindSafe(job));
        shared.counters.in_flight.fetch_sub(1, Ordering::Relaxed);

        match outcome {
            Ok(Ok(())) => {
                shared.counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(failure)) => shared.report(&failure),
            Err(payload) => shared.report(&CallbackFailure::from_panic(payload.as_ref())),
        }
        shared.finish(1);
    }
    debug!("worker exiting");
}
