//! # relayq
//!
//! Lock-free, linked-list-based concurrent queues for inter-thread message passing,
//! backed by a lock-free node-recycling pool.
//!
//! ## 🚀 Features
//!
//! - **MPMC Queue**: Multi-producer, multi-consumer unbounded queue with a recycled
//!   node pool; steady-state operation performs no allocation
//! - **MPSC Queue**: Single-consumer specialization with a wait-free dequeue path and
//!   a `rewind` operation (push-front for the owning consumer)
//! - **FreeList**: The reclamation stack underneath both queues, a lock-free,
//!   intrusive stack of recyclable nodes with reference-count-based protection
//!   against use-after-recycle
//! - **Pool statistics**: Recycle/allocation counters on every queue via the
//!   [`StatsSource`](metrics::StatsSource) trait
//!
//! ## 🎯 Philosophy
//!
//! relayq targets the message-passing hot path of event-loop systems:
//! - No locks anywhere; every operation is non-blocking
//! - Node storage is pooled and recycled, so a warmed-up queue never touches the
//!   allocator
//! - The "capacity" handed to a constructor seeds the pool. It is a hint, not a
//!   fill limit; `enqueue` always succeeds and `try_enqueue` is the only
//!   flow-control knob
//! - Ergonomic APIs that guide users toward correct concurrent usage, including a
//!   borrow-checked single-consumer contract for the MPSC queue
//!
//! ## ⚡ Quick Start
//!
//! ```rust
//! use relayq::MpmcQueue;
//!
//! let queue = MpmcQueue::new(128);
//! queue.enqueue(42);
//! assert_eq!(queue.try_dequeue(), Some(42));
//! assert_eq!(queue.try_dequeue(), None);
//! ```
//!
//! ## 🔒 Thread Safety
//!
//! [`MpmcQueue`] may be shared freely across threads. [`MpscQueue`] shares its
//! producer side freely; the consumer side is exclusive, expressed either through
//! `&mut self` or through the documented `_unchecked` contract.
//!
//! ## 📊 Ordering Guarantees
//!
//! - A dequeued value was enqueued before the dequeue took effect
//! - Values from a single producer are dequeued in that producer's order
//! - Interleaving across producers is arbitrary (linearizable, not wall-clock FIFO)

pub mod freelist;
pub mod metrics;
pub mod queue;

pub use crate::metrics::{PoolStats, StatsSource};
pub use crate::queue::mpmc::MpmcQueue;
pub use crate::queue::mpsc::MpscQueue;

/// Number of blocks seeded into the free pool by the `Default` constructors.
pub const DEFAULT_POOL_SIZE: usize = 65536;

/// Error returned by `try_enqueue` when the free pool is exhausted.
///
/// Carries the rejected value back to the caller, so nothing is lost when the
/// queue pushes back:
///
/// ```rust
/// use relayq::MpmcQueue;
///
/// let queue = MpmcQueue::new(1);
/// queue.try_enqueue("a").unwrap();
/// let err = queue.try_enqueue("b").unwrap_err();
/// assert_eq!(err.into_inner(), "b");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> core::fmt::Display for Full<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "free pool exhausted")
    }
}

impl<T: core::fmt::Debug> std::error::Error for Full<T> {}
