//! Multi-Producer, Multi-Consumer (MPMC) Queue
//!
//! A lock-free queue over a singly-linked chain of recyclable blocks, in the
//! classical sentinel-head layout: producers touch only `tail`, consumers touch
//! only `head`, and the two meet through the chain's `next` links.
//!
//! ## Design
//!
//! The queue never frees a block while it is alive. Blocks shuttle between two
//! homes (the [`FreeList`] pool and the live chain) and are deallocated only
//! when the queue is dropped. What makes the recycling safe is the pool's
//! reference count: a consumer must read `head.next` *after* loading `head`,
//! and in that window a competing consumer may retire the head block. The
//! refcount turns "this block is still head-adjacent" into a ticket that blocks
//! recycling until the last reader lets go.
//!
//! ## Memory Ordering Model
//!
//! ```text
//! Producer (enqueue)                 Consumer (try_dequeue)
//! ------------------                 ----------------------
//! write elem
//! tail.swap          (AcqRel)
//! prev.next.store    (Release) --->  head.next.load (Acquire)
//!                                    read elem
//!                                    head CAS       (Relaxed)
//! ```
//!
//! The release/acquire pair on the chain link is what publishes the payload;
//! the pool's `top` carries the equivalent edge for recycled blocks. Everything
//! else (head loads, refcount traffic away from the zero path) stays relaxed.
//!
//! ## Linearization
//!
//! Enqueue takes effect at the tail swap; dequeue takes effect at the head CAS.
//! Per-producer order is preserved; cross-producer interleaving is arbitrary.

use core::cell::UnsafeCell;
use core::fmt;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use crossbeam_utils::CachePadded;

use crate::freelist::{FreeList, Node};
use crate::metrics::{AtomicStats, PoolStats, StatsSource};
use crate::{Full, DEFAULT_POOL_SIZE};

/// A recyclable queue entry.
///
/// The embedded [`Node`] must stay the first field: blocks are lent to the
/// pool by pointer cast, and `#[repr(C)]` guarantees the cast is identity.
/// `link.next` (the free-stack link) and `next` (the chain link) are distinct:
/// a block uses one or the other depending on which home it is in.
///
/// `elem` is uninitialized while the block is pooled or serving as the
/// sentinel; an enqueue writes it, a dequeue moves it out.
#[repr(C)]
pub(super) struct Block<T> {
    pub(super) link: Node,
    pub(super) next: AtomicPtr<Block<T>>,
    pub(super) elem: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Block<T> {
    fn boxed() -> NonNull<Block<T>> {
        let block = Box::new(Block {
            link: Node::new(),
            next: AtomicPtr::new(ptr::null_mut()),
            elem: UnsafeCell::new(MaybeUninit::uninit()),
        });
        // Box::into_raw never returns null.
        unsafe { NonNull::new_unchecked(Box::into_raw(block)) }
    }

    #[inline]
    pub(super) fn as_node(block: NonNull<Block<T>>) -> NonNull<Node> {
        block.cast()
    }
}

/// A multi-producer, multi-consumer queue with pooled block recycling.
///
/// Unbounded: `enqueue` always succeeds and allocates a fresh block when the
/// pool runs dry. The constructor's `capacity` seeds the pool and is the bound
/// that [`try_enqueue`](Self::try_enqueue) respects, the queue's only
/// flow-control knob.
///
/// # Progress
///
/// `enqueue` is wait-free apart from allocation; `try_dequeue` is lock-free
/// (a consumer retries only because another consumer made progress).
///
/// # Examples
///
/// ```rust
/// use relayq::MpmcQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(MpmcQueue::new(1024));
///
/// let producer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         for i in 0..100u64 {
///             queue.enqueue(i);
///         }
///     }
/// });
///
/// let consumer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         let mut sum = 0u64;
///         let mut seen = 0;
///         while seen < 100 {
///             if let Some(value) = queue.try_dequeue() {
///                 sum += value;
///                 seen += 1;
///             }
///         }
///         sum
///     }
/// });
///
/// producer.join().unwrap();
/// assert_eq!(consumer.join().unwrap(), 4950);
/// ```
pub struct MpmcQueue<T> {
    pub(super) pool: FreeList,
    pub(super) head: CachePadded<AtomicPtr<Block<T>>>,
    pub(super) tail: CachePadded<AtomicPtr<Block<T>>>,
    pub(super) stats: AtomicStats,
}

// Blocks only ever hold a `T` while threaded through the chain, and a payload
// is handed to exactly one consumer.
unsafe impl<T: Send> Send for MpmcQueue<T> {}
unsafe impl<T: Send> Sync for MpmcQueue<T> {}

impl<T> MpmcQueue<T> {
    /// Creates a queue whose pool is seeded with `capacity` spare blocks.
    ///
    /// `capacity` is a hint, not a fill limit: it bounds `try_enqueue`, while
    /// `enqueue` grows the block population on demand.
    pub fn new(capacity: usize) -> Self {
        let sentinel = Block::<T>::boxed();
        let queue = Self {
            pool: FreeList::new(),
            head: CachePadded::new(AtomicPtr::new(sentinel.as_ptr())),
            tail: CachePadded::new(AtomicPtr::new(sentinel.as_ptr())),
            stats: AtomicStats::default(),
        };
        for _ in 0..capacity {
            // A fresh block carries its own slot reference; push consumes it.
            unsafe { queue.pool.push(Block::as_node(Block::<T>::boxed())) };
        }
        queue
    }

    /// Claims a spare block from the pool, if one is available.
    pub(super) fn claim_block(&self) -> Option<NonNull<Block<T>>> {
        let node = self.pool.pop()?;
        self.stats.record_recycled();
        Some(node.cast())
    }

    /// Claims a spare block, allocating a fresh one when the pool is dry.
    pub(super) fn claim_or_alloc(&self) -> NonNull<Block<T>> {
        match self.claim_block() {
            Some(block) => block,
            None => {
                self.stats.record_fresh();
                Block::boxed()
            }
        }
    }

    /// Writes `value` into `block` and splices it behind the current tail.
    ///
    /// # Safety
    ///
    /// `block` must be exclusively claimed (freshly allocated or popped from
    /// this queue's pool) with an uninitialized `elem` slot.
    pub(super) unsafe fn splice(&self, block: NonNull<Block<T>>, value: T) {
        let b = unsafe { block.as_ref() };
        unsafe { (*b.elem.get()).write(value) };
        b.next.store(ptr::null_mut(), Ordering::Relaxed);
        // Linearization point. AcqRel: acquire the predecessor we splice onto,
        // release our block's contents to whoever swaps the tail next.
        let prev = self.tail.swap(block.as_ptr(), Ordering::AcqRel);
        // Publishes the payload to consumers that acquire this link. Until the
        // store lands, the chain is transiently short of the tail.
        unsafe { (*prev).next.store(block.as_ptr(), Ordering::Release) };
    }

    /// Appends a value. Never fails; allocates a fresh block when the pool is
    /// exhausted.
    pub fn enqueue(&self, value: T) {
        let block = self.claim_or_alloc();
        unsafe { self.splice(block, value) };
    }

    /// Appends a value only if a pooled block is available.
    ///
    /// Returns the value back inside [`Full`] when the pool is dry. This is
    /// the queue's only backpressure mechanism; the chain itself is unbounded.
    pub fn try_enqueue(&self, value: T) -> Result<(), Full<T>> {
        match self.claim_block() {
            Some(block) => {
                unsafe { self.splice(block, value) };
                Ok(())
            }
            None => {
                self.stats.record_rejected();
                Err(Full(value))
            }
        }
    }

    /// Removes the oldest reachable value, or returns `None` when the queue is
    /// observed empty.
    pub fn try_dequeue(&self) -> Option<T> {
        loop {
            let h = self.head.load(Ordering::Relaxed);
            let h_node = unsafe { &(*h).link };
            // Ghost head (mid-recycle) or a lost count race: start over.
            if !h_node.try_acquire() {
                continue;
            }
            let h = unsafe { NonNull::new_unchecked(h) };
            let nh = unsafe { h.as_ref().next.load(Ordering::Acquire) };
            if nh.is_null() {
                unsafe { self.pool.release_ref(Block::as_node(h)) };
                return None;
            }
            // Copy the slot out *before* the head CAS: the moment the CAS
            // lands, a competing consumer can retire `nh` and a producer can
            // overwrite it. The copy stays `MaybeUninit` until the CAS
            // settles who owns it: if `h` was stale, these are junk bytes
            // and must never be treated as a `T`.
            let slot = unsafe { ptr::read((*nh).elem.get()) };
            if self
                .head
                .compare_exchange_weak(h.as_ptr(), nh, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                // Two references die here: the transient one taken above, and
                // the chain's structural one. The second release is the push
                // that recycles the retired sentinel.
                unsafe {
                    self.pool.release_ref(Block::as_node(h));
                    self.pool.push(Block::as_node(h));
                }
                // Winning the CAS proves `h` was the sentinel for the whole
                // window (the held reference kept it out of the pool, so no
                // ABA), hence `nh` was its live successor and the slot holds
                // the initialized payload.
                return Some(unsafe { slot.assume_init() });
            }
            // Another consumer advanced the head first; the copy is dropped
            // as raw bytes, never as a `T`.
            self.stats.record_contention();
            unsafe { self.pool.release_ref(Block::as_node(h)) };
        }
    }

    /// Whether the queue was empty at the moment of observation.
    ///
    /// Under contention the answer can be stale by the time the caller acts on
    /// it; it is exact only while no other thread touches the queue.
    pub fn is_empty(&self) -> bool {
        let h = self.head.load(Ordering::Relaxed);
        unsafe { (*h).next.load(Ordering::Acquire).is_null() }
    }
}

impl<T> Default for MpmcQueue<T> {
    /// Equivalent to `MpmcQueue::new(DEFAULT_POOL_SIZE)`.
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl<T> StatsSource for MpmcQueue<T> {
    fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl<T> fmt::Debug for MpmcQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpmcQueue")
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T> Drop for MpmcQueue<T> {
    fn drop(&mut self) {
        // Pooled blocks never hold a payload.
        while let Some(node) = self.pool.pop() {
            drop(unsafe { Box::from_raw(node.cast::<Block<T>>().as_ptr()) });
        }
        // The chain: the first block is the sentinel, every later block
        // carries a live value. Together with the pool this covers every
        // block the queue ever allocated, exactly once.
        let mut cur = self.head.load(Ordering::Relaxed);
        let mut sentinel = true;
        while !cur.is_null() {
            let next = unsafe { (*cur).next.load(Ordering::Relaxed) };
            unsafe {
                if !sentinel {
                    ptr::drop_in_place((*cur).elem.get().cast::<T>());
                }
                drop(Box::from_raw(cur));
            }
            sentinel = false;
            cur = next;
        }
    }
}
