//! Specialized data structures
//!
//! - **[`work_queue`]**: blocking FIFO hand-off queue with drain/discard close
//! - **[`deadline_heap`]**: deadline-ordered min-heap with cancellation
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Instant;
//!
//! use alarmpool_common::collections::{CloseMode, DeadlineHeap, WorkQueue};
//!
//! let queue = WorkQueue::bounded(16).unwrap();
//! queue.push(42).unwrap();
//! queue.close(CloseMode::Drain);
//! assert_eq!(queue.pop(), Some(42));
//!
//! let mut heap = DeadlineHeap::new();
//! heap.push(Instant::now(), "tick");
//! assert_eq!(heap.len(), 1);
//! ```

pub mod deadline_heap;
pub mod work_queue;

// Re-export commonly used types
pub use deadline_heap::{DeadlineHeap, EntryId};
pub use work_queue::{CloseMode, PushError, TryPushError, WorkQueue};
