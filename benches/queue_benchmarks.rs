//! Performance benchmarks for the relayq queues
//!
//! Compares against the usual suspects for inter-thread message passing:
//! - `crossbeam::queue::SegQueue` (unbounded MPMC)
//! - `crossbeam::queue::ArrayQueue` (bounded MPMC)
//! - `std::sync::mpsc` channels

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crossbeam::queue::{ArrayQueue, SegQueue};
use relayq::{MpmcQueue, MpscQueue};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;

const BATCH_SIZES: &[usize] = &[64, 256, 1024];
const THREAD_COUNTS: &[usize] = &[2, 4, 8];

fn bench_single_thread_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_push_pop");

    for &size in BATCH_SIZES {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("relayq_mpmc", size), &size, |b, &size| {
            let queue: MpmcQueue<u64> = MpmcQueue::new(size);
            b.iter(|| {
                for i in 0..size as u64 {
                    queue.enqueue(black_box(i));
                }
                for _ in 0..size {
                    black_box(queue.try_dequeue());
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("relayq_mpsc", size), &size, |b, &size| {
            let mut queue: MpscQueue<u64> = MpscQueue::new(size);
            b.iter(|| {
                for i in 0..size as u64 {
                    queue.enqueue(black_box(i));
                }
                for _ in 0..size {
                    black_box(queue.try_dequeue());
                }
            })
        });

        group.bench_with_input(
            BenchmarkId::new("crossbeam_seg", size),
            &size,
            |b, &size| {
                let queue: SegQueue<u64> = SegQueue::new();
                b.iter(|| {
                    for i in 0..size as u64 {
                        queue.push(black_box(i));
                    }
                    for _ in 0..size {
                        black_box(queue.pop());
                    }
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_array", size),
            &size,
            |b, &size| {
                let queue: ArrayQueue<u64> = ArrayQueue::new(size);
                b.iter(|| {
                    for i in 0..size as u64 {
                        queue.push(black_box(i)).unwrap();
                    }
                    for _ in 0..size {
                        black_box(queue.pop());
                    }
                })
            },
        );

        group.bench_with_input(BenchmarkId::new("std_mpsc", size), &size, |b, &size| {
            let (tx, rx) = mpsc::channel::<u64>();
            b.iter(|| {
                for i in 0..size as u64 {
                    tx.send(black_box(i)).unwrap();
                }
                for _ in 0..size {
                    black_box(rx.recv().unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_mpmc_throughput(c: &mut Criterion) {
    const PER_THREAD: usize = 10_000;

    let mut group = c.benchmark_group("mpmc_throughput");
    group.sample_size(10);

    for &threads in THREAD_COUNTS {
        let pairs = threads / 2;
        group.throughput(Throughput::Elements((pairs * PER_THREAD) as u64));

        group.bench_with_input(
            BenchmarkId::new("relayq_mpmc", threads),
            &pairs,
            |b, &pairs| {
                b.iter(|| {
                    let queue = Arc::new(MpmcQueue::new(4096));
                    let barrier = Arc::new(Barrier::new(pairs * 2));
                    let mut handles = vec![];

                    for _ in 0..pairs {
                        let producer_queue = Arc::clone(&queue);
                        let producer_barrier = Arc::clone(&barrier);
                        handles.push(thread::spawn(move || {
                            producer_barrier.wait();
                            for i in 0..PER_THREAD as u64 {
                                producer_queue.enqueue(i);
                            }
                        }));
                        let consumer_queue = Arc::clone(&queue);
                        let consumer_barrier = Arc::clone(&barrier);
                        handles.push(thread::spawn(move || {
                            consumer_barrier.wait();
                            let mut received = 0;
                            while received < PER_THREAD {
                                if consumer_queue.try_dequeue().is_some() {
                                    received += 1;
                                }
                            }
                        }));
                    }
                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_seg", threads),
            &pairs,
            |b, &pairs| {
                b.iter(|| {
                    let queue = Arc::new(SegQueue::new());
                    let barrier = Arc::new(Barrier::new(pairs * 2));
                    let mut handles = vec![];

                    for _ in 0..pairs {
                        let producer_queue = Arc::clone(&queue);
                        let producer_barrier = Arc::clone(&barrier);
                        handles.push(thread::spawn(move || {
                            producer_barrier.wait();
                            for i in 0..PER_THREAD as u64 {
                                producer_queue.push(i);
                            }
                        }));
                        let consumer_queue = Arc::clone(&queue);
                        let consumer_barrier = Arc::clone(&barrier);
                        handles.push(thread::spawn(move || {
                            consumer_barrier.wait();
                            let mut received = 0;
                            while received < PER_THREAD {
                                if consumer_queue.pop().is_some() {
                                    received += 1;
                                }
                            }
                        }));
                    }
                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_pool_effect(c: &mut Criterion) {
    const OPS: usize = 1_024;

    let mut group = c.benchmark_group("pool_effect");
    group.throughput(Throughput::Elements(OPS as u64));

    // Warmed pool: every claim is a recycle.
    group.bench_function("warm_pool", |b| {
        let queue: MpmcQueue<u64> = MpmcQueue::new(OPS);
        b.iter(|| {
            for i in 0..OPS as u64 {
                queue.enqueue(black_box(i));
            }
            for _ in 0..OPS {
                black_box(queue.try_dequeue());
            }
        })
    });

    // Empty seed: the first pass pays the allocator, later passes recycle.
    group.bench_function("cold_pool", |b| {
        b.iter(|| {
            let queue: MpmcQueue<u64> = MpmcQueue::new(0);
            for i in 0..OPS as u64 {
                queue.enqueue(black_box(i));
            }
            for _ in 0..OPS {
                black_box(queue.try_dequeue());
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_push_pop,
    bench_mpmc_throughput,
    bench_pool_effect
);
criterion_main!(benches);
