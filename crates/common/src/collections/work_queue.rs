#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

//! Thread-safe FIFO work queue with blocking semantics and two close modes.
//!
//! [`WorkQueue`] is the hand-off point between producers (pool submitters)
//! and consumers (pool workers).
//!
//! **Complexity**
//! - `push`, `try_push`, `pop`, and `pop_timeout` complete in `O(1)`.
//! - `close(CloseMode::Discard)` is `O(n)` in the number of buffered items.
//!
//! **Thread Safety**
//! - All operations take `&self` and may be invoked concurrently by multiple
//!   producers and consumers.
//! - Synchronization relies on `parking_lot::Mutex` and
//!   `parking_lot::Condvar`; waits loop on their predicate so spurious wakeups
//!   are harmless. The lock is never held while an item is being processed.
//!
//! **Semantics of `close()`**
//! - Closing prevents new pushes (blocking or non-blocking) and wakes every
//!   waiter.
//! - [`CloseMode::Drain`] keeps buffered items; consumers keep receiving them
//!   until the queue is empty and only then observe `None`.
//! - [`CloseMode::Discard`] drops buffered items on the spot; consumers observe
//!   `None` immediately.
//! - Only the first call has an effect; repeated calls return `0`.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{CommonError, CommonResult};

/// How [`WorkQueue::close`] treats items that are still buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Keep buffered items so consumers can finish them.
    Drain,
    /// Drop buffered items immediately.
    Discard,
}

/// Error returned by [`WorkQueue::push`] once the queue has been closed.
#[derive(PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue has been closed; the item is returned to the caller.
    Closed(T),
}

impl<T> PushError<T> {
    /// Returns the item that failed to be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            PushError::Closed(item) => item,
        }
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Closed(_) => f.write_str("PushError::Closed(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Closed(_) => f.write_str("work queue is closed"),
        }
    }
}

impl<T> std::error::Error for PushError<T> {}

/// Error returned by [`WorkQueue::try_push`] when the item cannot be queued
/// immediately.
#[derive(PartialEq, Eq)]
pub enum TryPushError<T> {
    /// The queue was at capacity; the item is returned to the caller.
    Full(T),
    /// The queue has been closed; the item is returned to the caller.
    Closed(T),
}

impl<T> TryPushError<T> {
    /// Returns the item that failed to be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            TryPushError::Full(item) | TryPushError::Closed(item) => item,
        }
    }
}

// Items are usually boxed closures, so Debug never requires `T: Debug`.
impl<T> fmt::Debug for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryPushError::Full(_) => f.write_str("TryPushError::Full(..)"),
            TryPushError::Closed(_) => f.write_str("TryPushError::Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryPushError::Full(_) => f.write_str("work queue is full"),
            TryPushError::Closed(_) => f.write_str("work queue is closed"),
        }
    }
}

impl<T> std::error::Error for TryPushError<T> {}

struct Inner<T> {
    items: VecDeque<T>,
    capacity: Option<usize>,
    closed: bool,
}

impl<T> Inner<T> {
    fn has_room(&self) -> bool {
        self.capacity.map_or(true, |capacity| self.items.len() < capacity)
    }
}

/// Thread-safe FIFO work queue, optionally bounded.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use alarmpool_common::collections::{CloseMode, WorkQueue};
///
/// let queue = Arc::new(WorkQueue::unbounded());
/// queue.push(1).unwrap();
///
/// let worker = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || queue.pop())
/// };
///
/// queue.push(2).unwrap();
/// queue.close(CloseMode::Drain);
///
/// assert_eq!(worker.join().unwrap(), Some(1));
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct WorkQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> WorkQueue<T> {
    /// Creates a queue without a capacity limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Creates a queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns `CommonError::Validation` when `capacity` is zero.
    pub fn bounded(capacity: usize) -> CommonResult<Self> {
        if capacity == 0 {
            return Err(CommonError::validation(
                "capacity",
                "work queue capacity must be greater than zero",
                "0",
            ));
        }
        Ok(Self::with_capacity(Some(capacity)))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        let items = capacity.map_or_else(VecDeque::new, VecDeque::with_capacity);
        Self {
            inner: Mutex::new(Inner { items, capacity, closed: false }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Returns the capacity limit, `None` for an unbounded queue.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.inner.lock().capacity
    }

    /// Returns the current element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Returns `true` when the queue has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Closes the queue and wakes all waiters.
    ///
    /// Returns the number of buffered items dropped, which is always `0` for
    /// [`CloseMode::Drain`] and for every call after the first.
    pub fn close(&self, mode: CloseMode) -> usize {
        let mut guard = self.inner.lock();
        if guard.closed {
            return 0;
        }
        guard.closed = true;
        let discarded = match mode {
            CloseMode::Drain => VecDeque::new(),
            CloseMode::Discard => std::mem::take(&mut guard.items),
        };
        drop(guard);

        self.not_full.notify_all();
        self.not_empty.notify_all();

        // Dropped outside the lock: an item's destructor may touch this queue.
        let count = discarded.len();
        drop(discarded);
        count
    }

    /// Pushes an item, blocking while a bounded queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] with the item once the queue is closed.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let mut guard = self.inner.lock();
        loop {
            if guard.closed {
                return Err(PushError::Closed(item));
            }
            if guard.has_room() {
                guard.items.push_back(item);
                drop(guard);
                self.not_empty.notify_one();
                return Ok(());
            }
            self.not_full.wait(&mut guard);
        }
    }

    /// Attempts to push an item without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`TryPushError::Closed`] after close and [`TryPushError::Full`]
    /// when a bounded queue is at capacity.
    pub fn try_push(&self, item: T) -> Result<(), TryPushError<T>> {
        let mut guard = self.inner.lock();
        if guard.closed {
            return Err(TryPushError::Closed(item));
        }
        if !guard.has_room() {
            return Err(TryPushError::Full(item));
        }
        guard.items.push_back(item);
        drop(guard);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pops the oldest item, blocking until one is available.
    ///
    /// Returns `None` once the queue is closed and holds nothing more to hand
    /// out.
    pub fn pop(&self) -> Option<T> {
        let mut guard = self.inner.lock();
        loop {
            if let Some(item) = self.take_front(&mut guard) {
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            self.not_empty.wait(&mut guard);
        }
    }

    /// Attempts to pop an item without blocking.
    #[must_use]
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock();
        self.take_front(&mut guard)
    }

    /// Pops an item, blocking for at most `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.inner.lock();

        loop {
            if let Some(item) = self.take_front(&mut guard) {
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut guard, deadline).timed_out() {
                        return self.take_front(&mut guard);
                    }
                }
                None => self.not_empty.wait(&mut guard),
            }
        }
    }

    fn take_front(&self, guard: &mut MutexGuard<'_, Inner<T>>) -> Option<T> {
        let item = guard.items.pop_front();
        if item.is_some() && guard.capacity.is_some() {
            self.not_full.notify_one();
        }
        item
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.lock();
        f.debug_struct("WorkQueue")
            .field("len", &guard.items.len())
            .field("capacity", &guard.capacity)
            .field("closed", &guard.closed)
            .finish()
    }
}
