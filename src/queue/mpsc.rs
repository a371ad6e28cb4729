//! Multi-Producer, Single-Consumer (MPSC) Queue
//!
//! The single-consumer specialization of [`MpmcQueue`]. Producers are
//! unchanged; the consumer path drops the CAS and every piece of refcount
//! traffic, because exclusive head advancement makes plain loads and stores
//! sufficient. That also unlocks [`rewind`](MpscQueue::rewind), a push-front
//! only the owning consumer may perform.
//!
//! Exclusivity is expressed the usual way: the safe consumer methods take
//! `&mut self`, and `_unchecked` variants take `&self` under a documented
//! contract for callers that hold the queue behind an `Arc` and pin
//! consumption to one thread themselves.

use core::fmt;
use core::ptr::{self, NonNull};
use core::sync::atomic::Ordering;

use crate::metrics::{PoolStats, StatsSource};
use crate::queue::mpmc::{Block, MpmcQueue};
use crate::{Full, DEFAULT_POOL_SIZE};

/// A multi-producer, single-consumer queue with pooled block recycling.
///
/// Producer methods ([`enqueue`](Self::enqueue),
/// [`try_enqueue`](Self::try_enqueue)) may be called from any number of
/// threads. Consumer methods ([`try_dequeue`](Self::try_dequeue),
/// [`rewind`](Self::rewind)) belong to exactly one thread at a time.
///
/// # Examples
///
/// ```rust
/// use relayq::MpscQueue;
///
/// let mut queue = MpscQueue::new(16);
/// queue.enqueue(1);
/// queue.enqueue(2);
///
/// assert_eq!(queue.try_dequeue(), Some(1));
/// // Push a value back to the front, e.g. after failing to process it.
/// queue.rewind(99);
/// assert_eq!(queue.try_dequeue(), Some(99));
/// assert_eq!(queue.try_dequeue(), Some(2));
/// ```
pub struct MpscQueue<T> {
    inner: MpmcQueue<T>,
}

impl<T> MpscQueue<T> {
    /// Creates a queue whose pool is seeded with `capacity` spare blocks.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: MpmcQueue::new(capacity),
        }
    }

    /// Appends a value. Never fails; allocates when the pool is exhausted.
    #[inline]
    pub fn enqueue(&self, value: T) {
        self.inner.enqueue(value);
    }

    /// Appends a value only if a pooled block is available.
    #[inline]
    pub fn try_enqueue(&self, value: T) -> Result<(), Full<T>> {
        self.inner.try_enqueue(value)
    }

    /// Whether the queue was empty at the moment of observation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Removes the oldest value, or returns `None` when the queue is empty.
    ///
    /// Wait-free: a plain pointer advance and a pool push, no CAS.
    #[inline]
    pub fn try_dequeue(&mut self) -> Option<T> {
        // &mut self proves we are the only consumer.
        unsafe { self.try_dequeue_unchecked() }
    }

    /// [`try_dequeue`](Self::try_dequeue) without the exclusivity proof.
    ///
    /// # Safety
    ///
    /// The caller must be the queue's sole consumer: no other call to
    /// `try_dequeue*` or `rewind*` may run concurrently with this one.
    /// Producers may run freely.
    pub unsafe fn try_dequeue_unchecked(&self) -> Option<T> {
        let h = self.inner.head.load(Ordering::Relaxed);
        let nh = unsafe { (*h).next.load(Ordering::Acquire) };
        if nh.is_null() {
            return None;
        }
        // Sole-consumer contract: nobody else advances head, so `nh` stays in
        // the chain and its payload is ours to take.
        let value = unsafe { ptr::read((*nh).elem.get()).assume_init() };
        self.inner.head.store(nh, Ordering::Relaxed);
        // The retired sentinel goes straight back to the pool; its structural
        // reference is the one the push consumes.
        unsafe {
            self.inner
                .pool
                .push(Block::as_node(NonNull::new_unchecked(h)))
        };
        Some(value)
    }

    /// Pushes a value back to the *front* of the queue.
    ///
    /// The current sentinel becomes the front payload block and a spare block
    /// is prepended as the new sentinel, so the value is the next one a
    /// dequeue returns. Never fails; allocates when the pool is exhausted.
    #[inline]
    pub fn rewind(&mut self, value: T) {
        unsafe { self.rewind_unchecked(value) }
    }

    /// [`rewind`](Self::rewind) without the exclusivity proof.
    ///
    /// # Safety
    ///
    /// Same contract as [`try_dequeue_unchecked`](Self::try_dequeue_unchecked):
    /// sole consumer, never concurrent with another consumer-side call.
    pub unsafe fn rewind_unchecked(&self, value: T) {
        let nblk = self.inner.claim_or_alloc();
        let h = self.inner.head.load(Ordering::Relaxed);
        // The sentinel's slot is uninitialized by invariant; it now carries
        // the rewound value.
        unsafe { (*(*h).elem.get()).write(value) };
        unsafe { nblk.as_ref() }.next.store(h, Ordering::Relaxed);
        self.inner.head.store(nblk.as_ptr(), Ordering::Relaxed);
    }
}

impl<T> Default for MpscQueue<T> {
    /// Equivalent to `MpscQueue::new(DEFAULT_POOL_SIZE)`.
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl<T> StatsSource for MpscQueue<T> {
    fn stats(&self) -> PoolStats {
        self.inner.stats()
    }

    fn reset_stats(&self) {
        self.inner.reset_stats();
    }
}

impl<T> fmt::Debug for MpscQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpscQueue")
            .field("inner", &self.inner)
            .finish()
    }
}
