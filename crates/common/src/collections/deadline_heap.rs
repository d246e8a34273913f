#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

//! Deadline-ordered min-heap with index-stable cancellation.
//!
//! Keys `(deadline, seq)` live in a [`std::collections::BinaryHeap`] wrapped
//! in [`Reverse`]; payloads live in a map keyed by the same `seq`. Cancelling
//! removes the payload and leaves the key behind as a tombstone, which is
//! discarded the next time it reaches the top of the heap. Once tombstones
//! outnumber live keys (plus a small slack) the heap is rebuilt without them,
//! so repeated register-then-cancel keeps memory proportional to `len()`.
//!
//! # Complexity
//! - `push`: `O(log n)`
//! - `pop_due` / `pop_earliest`: `O(log n)` amortized over tombstones
//! - `peek_deadline`: `O(1)` amortized over tombstones
//! - `cancel`: `O(1)` amortized over compactions
//!
//! # Ordering
//! Entries with equal deadlines come out in insertion order, because `seq`
//! grows monotonically and breaks ties.
//!
//! # Examples
//! ```
//! use std::time::{Duration, Instant};
//!
//! use alarmpool_common::collections::DeadlineHeap;
//!
//! let now = Instant::now();
//! let mut heap = DeadlineHeap::new();
//! heap.push(now + Duration::from_secs(2), "late");
//! let early = heap.push(now + Duration::from_secs(1), "early");
//! heap.push(now, "due");
//!
//! assert_eq!(heap.cancel(early), Some("early"));
//! let (_, _, item) = heap.pop_due(now).unwrap();
//! assert_eq!(item, "due");
//! assert!(heap.pop_due(now).is_none());
//! assert_eq!(heap.drain(), vec!["late"]);
//! ```

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::time::Instant;

/// Stable identifier for an entry in a [`DeadlineHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    /// Returns the raw sequence number.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Key = Reverse<(Instant, EntryId)>;

/// Tombstones tolerated beyond the live count before a rebuild.
const COMPACT_SLACK: usize = 16;

/// A min-heap of payloads keyed by deadline.
pub struct DeadlineHeap<T> {
    keys: BinaryHeap<Key>,
    entries: HashMap<EntryId, T>,
    next_seq: u64,
}

impl<T> DeadlineHeap<T> {
    /// Creates an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self { keys: BinaryHeap::new(), entries: HashMap::new(), next_seq: 0 }
    }

    /// Inserts `item` to become due at `deadline`.
    pub fn push(&mut self, deadline: Instant, item: T) -> EntryId {
        let id = EntryId(self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1);
        self.keys.push(Reverse((deadline, id)));
        self.entries.insert(id, item);
        id
    }

    /// Returns the earliest live deadline.
    ///
    /// Takes `&mut self` because tombstones at the top are discarded first.
    pub fn peek_deadline(&mut self) -> Option<Instant> {
        self.discard_tombstones();
        self.keys.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Removes the earliest entry if its deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(EntryId, Instant, T)> {
        match self.peek_deadline() {
            Some(deadline) if deadline <= now => self.pop_earliest(),
            _ => None,
        }
    }

    /// Removes the earliest live entry regardless of its deadline.
    pub fn pop_earliest(&mut self) -> Option<(EntryId, Instant, T)> {
        while let Some(Reverse((deadline, id))) = self.keys.pop() {
            if let Some(item) = self.entries.remove(&id) {
                return Some((id, deadline, item));
            }
        }
        None
    }

    /// Cancels a pending entry, returning its payload if it was still here.
    pub fn cancel(&mut self, id: EntryId) -> Option<T> {
        let item = self.entries.remove(&id)?;
        if self.entries.is_empty() {
            self.keys.clear();
        } else if self.keys.len() > 2 * self.entries.len() + COMPACT_SLACK {
            self.compact();
        }
        Some(item)
    }

    /// Returns `true` if `id` is still pending.
    #[must_use]
    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every live entry, returning payloads in deadline order.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.entries.len());
        while let Some((_, _, item)) = self.pop_earliest() {
            items.push(item);
        }
        self.keys.clear();
        items
    }

    fn compact(&mut self) {
        let entries = &self.entries;
        self.keys.retain(|Reverse((_, id))| entries.contains_key(id));
    }

    fn discard_tombstones(&mut self) {
        while let Some(Reverse((_, id))) = self.keys.peek() {
            if self.entries.contains_key(id) {
                break;
            }
            self.keys.pop();
        }
    }
}

impl<T> Default for DeadlineHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DeadlineHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineHeap")
            .field("len", &self.entries.len())
            .field("keys", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for collections::deadline_heap.
    use std::time::Duration;

    use super::*;

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn pops_in_deadline_order() {
        let base = Instant::now();
        let mut heap = DeadlineHeap::new();
        for (millis, label) in [(30, "c"), (10, "a"), (20, "b")] {
            heap.push(at(base, millis), label);
        }

        let far = at(base, 1_000);
        let order: Vec<_> =
            std::iter::from_fn(|| heap.pop_due(far).map(|(_, _, label)| label)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(heap.is_empty());
    }

    #[test]
    fn pop_due_leaves_future_entries() {
        let base = Instant::now();
        let mut heap = DeadlineHeap::new();
        heap.push(at(base, 50), 1);

        assert!(heap.pop_due(base).is_none());
        assert_eq!(heap.peek_deadline(), Some(at(base, 50)));
        assert_eq!(heap.len(), 1);

        let (_, deadline, item) = heap.pop_due(at(base, 50)).unwrap();
        assert_eq!(deadline, at(base, 50));
        assert_eq!(item, 1);
    }

    /// Validates `DeadlineHeap::push` behavior for the equal deadline tie
    /// break scenario.
    ///
    /// Assertions:
    /// - Confirms entries sharing a deadline pop in insertion order.
    #[test]
    fn equal_deadlines_pop_in_insertion_order() {
        let deadline = Instant::now();
        let mut heap = DeadlineHeap::new();
        let ids: Vec<_> = (0..5).map(|i| heap.push(deadline, i)).collect();

        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        let popped: Vec<_> = heap.drain();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cancel_removes_entry_and_skips_tombstone() {
        let base = Instant::now();
        let mut heap = DeadlineHeap::new();
        let first = heap.push(at(base, 10), "first");
        heap.push(at(base, 20), "second");

        assert!(heap.contains(first));
        assert_eq!(heap.cancel(first), Some("first"));
        assert!(!heap.contains(first));
        assert_eq!(heap.cancel(first), None);
        assert_eq!(heap.len(), 1);

        assert_eq!(heap.peek_deadline(), Some(at(base, 20)));
        let (_, _, item) = heap.pop_earliest().unwrap();
        assert_eq!(item, "second");
    }

    #[test]
    fn cancelling_last_entry_clears_tombstones() {
        let mut heap = DeadlineHeap::new();
        let id = heap.push(Instant::now(), ());
        heap.cancel(id);
        assert!(heap.is_empty());
        assert_eq!(heap.peek_deadline(), None);
        assert!(format!("{heap:?}").contains("keys: 0"));
    }

    /// Validates `DeadlineHeap::cancel` behavior for the register then
    /// cancel churn scenario.
    ///
    /// Assertions:
    /// - Confirms cancelled keys behind a live earlier entry are compacted.
    /// - Confirms the live entry is still the earliest after compaction.
    #[test]
    fn cancel_churn_keeps_keys_bounded() {
        let base = Instant::now();
        let mut heap = DeadlineHeap::new();
        heap.push(at(base, 1_000), "live");

        for _ in 0..100_000 {
            let id = heap.push(at(base, 3_600_000), "timeout");
            assert_eq!(heap.cancel(id), Some("timeout"));
            assert!(heap.keys.len() <= 2 * heap.len() + COMPACT_SLACK + 1);
        }

        assert_eq!(heap.len(), 1);
        assert_eq!(heap.peek_deadline(), Some(at(base, 1_000)));
        assert_eq!(heap.drain(), vec!["live"]);
    }

    #[test]
    fn compaction_keeps_surviving_order() {
        let base = Instant::now();
        let mut heap = DeadlineHeap::new();
        let ids: Vec<_> = (0..64u64).map(|i| heap.push(at(base, 64 - i), i)).collect();
        for id in ids.iter().step_by(2) {
            heap.cancel(*id);
        }

        assert_eq!(heap.len(), 32);
        let expected: Vec<u64> = (1u32..64).step_by(2).rev().map(u64::from).collect();
        assert_eq!(heap.drain(), expected);
    }

    #[test]
    fn cancel_after_pop_returns_none() {
        let mut heap = DeadlineHeap::new();
        let id = heap.push(Instant::now(), 42);
        let (popped, _, _) = heap.pop_earliest().unwrap();
        assert_eq!(popped, id);
        assert_eq!(heap.cancel(id), None);
    }

    #[test]
    fn past_deadline_is_due_immediately() {
        let now = Instant::now();
        let past = now.checked_sub(Duration::from_secs(1)).unwrap_or(now);
        let mut heap = DeadlineHeap::new();
        heap.push(past, "overdue");
        assert!(heap.pop_due(now).is_some());
    }

    #[test]
    fn entry_id_display() {
        let mut heap = DeadlineHeap::new();
        let id = heap.push(Instant::now(), ());
        assert_eq!(id.to_string(), "#0");
        assert_eq!(id.as_u64(), 0);
    }
}
