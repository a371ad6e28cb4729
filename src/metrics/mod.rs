//! Pool Statistics Module
//!
//! Lightweight operational counters for the queues. The interesting health
//! signal for a recycling queue is not throughput (benchmarks measure that)
//! but pool behavior: how often a producer found a spare block versus paying
//! for a fresh allocation, how often `try_enqueue` pushed back, and how
//! contended the consumer side is. All counters are relaxed atomics bumped off
//! the hottest paths.

use core::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot of a queue's pool counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Blocks obtained from the free pool.
    pub recycled_blocks: u64,
    /// Blocks allocated because the pool was dry.
    pub fresh_allocations: u64,
    /// `try_enqueue` calls rejected for lack of a pooled block.
    pub rejected_enqueues: u64,
    /// Dequeue attempts that lost a race to another consumer and retried.
    pub contended_dequeues: u64,
}

impl PoolStats {
    /// Total block claims (recycled + fresh).
    pub fn claims(&self) -> u64 {
        self.recycled_blocks + self.fresh_allocations
    }

    /// Fraction of claims served by the pool, in `[0.0, 1.0]`.
    ///
    /// A warmed-up queue sits at 1.0; a sustained lower value means the seed
    /// capacity is undersized for the workload.
    pub fn recycle_rate(&self) -> f64 {
        let claims = self.claims();
        if claims == 0 {
            0.0
        } else {
            self.recycled_blocks as f64 / claims as f64
        }
    }
}

/// Internal atomic counter set backing [`PoolStats`].
#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    recycled_blocks: AtomicU64,
    fresh_allocations: AtomicU64,
    rejected_enqueues: AtomicU64,
    contended_dequeues: AtomicU64,
}

impl AtomicStats {
    #[inline]
    pub(crate) fn record_recycled(&self) {
        self.recycled_blocks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fresh(&self) {
        self.fresh_allocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected(&self) {
        self.rejected_enqueues.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_contention(&self) {
        self.contended_dequeues.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            recycled_blocks: self.recycled_blocks.load(Ordering::Relaxed),
            fresh_allocations: self.fresh_allocations.load(Ordering::Relaxed),
            rejected_enqueues: self.rejected_enqueues.load(Ordering::Relaxed),
            contended_dequeues: self.contended_dequeues.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.recycled_blocks.store(0, Ordering::Relaxed);
        self.fresh_allocations.store(0, Ordering::Relaxed);
        self.rejected_enqueues.store(0, Ordering::Relaxed);
        self.contended_dequeues.store(0, Ordering::Relaxed);
    }
}

/// Implemented by queues that expose pool statistics.
pub trait StatsSource {
    /// Current counter snapshot.
    fn stats(&self) -> PoolStats;

    /// Zeroes all counters.
    fn reset_stats(&self);
}
