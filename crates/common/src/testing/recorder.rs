//! Recorders for observing callbacks that run on other threads.
//!
//! [`FireRecorder`] captures which callbacks ran and when, and lets a test
//! block until a given number have run. [`ConcurrencyGauge`] tracks how many
//! callbacks are running at once and the highest value seen.

#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One recorded callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fire {
    /// Label passed to [`FireRecorder::record`]
    pub label: String,
    /// When the callback ran
    pub at: Instant,
}

#[derive(Debug)]
struct RecorderInner {
    origin: Instant,
    fires: Mutex<Vec<Fire>>,
    changed: Condvar,
}

/// Thread-safe log of callback invocations.
///
/// Cloning is cheap; every clone writes to the same log.
///
/// ```
/// use std::time::Duration;
///
/// use alarmpool_common::testing::FireRecorder;
///
/// let recorder = FireRecorder::new();
/// let fire = recorder.callback("tick");
/// std::thread::spawn(fire);
///
/// assert!(recorder.wait_for(1, Duration::from_secs(1)));
/// assert_eq!(recorder.labels(), vec!["tick".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct FireRecorder {
    inner: Arc<RecorderInner>,
}

impl FireRecorder {
    /// Creates an empty recorder whose origin is "now".
    #[must_use]
    pub fn new() -> Self {
        Self::with_origin(Instant::now())
    }

    /// Creates an empty recorder measuring offsets from `origin`.
    #[must_use]
    pub fn with_origin(origin: Instant) -> Self {
        Self {
            inner: Arc::new(RecorderInner {
                origin,
                fires: Mutex::new(Vec::new()),
                changed: Condvar::new(),
            }),
        }
    }

    /// Instant offsets are measured from.
    #[must_use]
    pub fn origin(&self) -> Instant {
        self.inner.origin
    }

    /// Appends an invocation of `label` stamped with the current instant.
    pub fn record(&self, label: impl Into<String>) {
        let fire = Fire { label: label.into(), at: Instant::now() };
        self.inner.fires.lock().push(fire);
        self.inner.changed.notify_all();
    }

    /// Returns a closure that records `label` when called.
    pub fn callback(&self, label: impl Into<String>) -> impl FnOnce() + Send + 'static {
        let recorder = self.clone();
        let label = label.into();
        move || recorder.record(label)
    }

    /// Blocks until at least `count` invocations are recorded.
    ///
    /// Returns `false` if `timeout` elapses first.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut fires = self.inner.fires.lock();
        while fires.len() < count {
            if self.inner.changed.wait_until(&mut fires, deadline).timed_out() {
                return fires.len() >= count;
            }
        }
        true
    }

    /// Snapshot of every invocation in recording order.
    #[must_use]
    pub fn fires(&self) -> Vec<Fire> {
        self.inner.fires.lock().clone()
    }

    /// Labels in recording order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.inner.fires.lock().iter().map(|fire| fire.label.clone()).collect()
    }

    /// Offset from the origin of the first invocation of `label`.
    #[must_use]
    pub fn offset_of(&self, label: &str) -> Option<Duration> {
        self.inner
            .fires
            .lock()
            .iter()
            .find(|fire| fire.label == label)
            .map(|fire| fire.at.saturating_duration_since(self.inner.origin))
    }

    /// Number of recorded invocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.fires.lock().len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FireRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct GaugeInner {
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// Tracks concurrent executions and the high-water mark.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyGauge {
    inner: Arc<GaugeInner>,
}

impl ConcurrencyGauge {
    /// Creates a gauge at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one execution as running until the guard is dropped.
    #[must_use = "the execution ends when the guard is dropped"]
    pub fn enter(&self) -> GaugeGuard {
        let now = self.inner.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard { inner: Arc::clone(&self.inner) }
    }

    /// Executions running right now.
    #[must_use]
    pub fn current(&self) -> usize {
        self.inner.current.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous executions observed.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }
}

/// Guard returned by [`ConcurrencyGauge::enter`].
#[derive(Debug)]
pub struct GaugeGuard {
    inner: Arc<GaugeInner>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.inner.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::recorder.
    use std::thread;

    use super::*;

    #[test]
    fn records_in_order_and_measures_offsets() {
        let recorder = FireRecorder::new();
        recorder.record("a");
        recorder.record("b");

        assert_eq!(recorder.labels(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(recorder.len(), 2);
        assert!(recorder.offset_of("a").is_some());
        assert!(recorder.offset_of("missing").is_none());

        let fires = recorder.fires();
        assert!(fires[0].at <= fires[1].at);
    }

    #[test]
    fn wait_for_times_out_when_nothing_fires() {
        let recorder = FireRecorder::new();
        assert!(recorder.is_empty());
        assert!(!recorder.wait_for(1, Duration::from_millis(20)));
        assert!(recorder.wait_for(0, Duration::ZERO));
    }

    #[test]
    fn wait_for_wakes_on_cross_thread_record() {
        let recorder = FireRecorder::new();
        let handles: Vec<_> =
            (0..4).map(|i| thread::spawn(recorder.callback(format!("t{i}")))).collect();

        assert!(recorder.wait_for(4, Duration::from_secs(2)));
        for handle in handles {
            handle.join().unwrap();
        }
    }

    /// Validates `ConcurrencyGauge::enter` behavior for the overlapping
    /// executions scenario.
    ///
    /// Assertions:
    /// - Confirms the peak reflects the largest overlap.
    /// - Confirms `current` returns to zero once guards drop.
    #[test]
    fn gauge_tracks_peak_overlap() {
        let gauge = ConcurrencyGauge::new();
        {
            let _a = gauge.enter();
            let _b = gauge.enter();
            assert_eq!(gauge.current(), 2);
        }
        let _c = gauge.enter();
        assert_eq!(gauge.current(), 1);
        assert_eq!(gauge.peak(), 2);
    }
}
