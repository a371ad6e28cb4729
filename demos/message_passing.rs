//! High-throughput message passing demo
//!
//! Runs a producer/consumer fleet over a shared MPMC queue and prints the
//! pool statistics at the end. The interesting number is the recycle rate:
//! a well-sized pool serves nearly every message without touching the
//! allocator.

use relayq::{MpmcQueue, StatsSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[derive(Debug)]
struct Message {
    id: u64,
    source: usize,
    payload: String,
}

fn main() {
    println!("🚀 relayq message passing demo");
    println!("==============================");

    let num_producers = 4;
    let num_consumers = 4;
    let messages_per_producer = 100_000usize;
    let pool_size = 10_000;
    let total = num_producers * messages_per_producer;

    println!("Configuration:");
    println!("  Producers: {num_producers}");
    println!("  Consumers: {num_consumers}");
    println!("  Messages per producer: {messages_per_producer}");
    println!("  Pool size: {pool_size}\n");

    let queue = Arc::new(MpmcQueue::new(pool_size));
    let received = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let producers: Vec<_> = (0..num_producers)
        .map(|producer_id| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..messages_per_producer {
                    queue.enqueue(Message {
                        id: (producer_id * messages_per_producer + i) as u64,
                        source: producer_id,
                        payload: format!("payload from producer {producer_id}"),
                    });
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..num_consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let received = Arc::clone(&received);
            thread::spawn(move || {
                let mut handled = 0u64;
                while received.load(Ordering::Relaxed) < total {
                    if let Some(message) = queue.try_dequeue() {
                        debug_assert!(message.source < num_producers && !message.payload.is_empty());
                        let _ = message.id;
                        handled += 1;
                        received.fetch_add(1, Ordering::Relaxed);
                    } else {
                        thread::yield_now();
                    }
                }
                handled
            })
        })
        .collect();

    for handle in producers {
        handle.join().unwrap();
    }
    let mut per_consumer = vec![];
    for handle in consumers {
        per_consumer.push(handle.join().unwrap());
    }

    let elapsed = start.elapsed();
    let stats = queue.stats();

    println!("Results:");
    println!("  Total messages: {total}");
    println!("  Elapsed: {elapsed:?}");
    println!(
        "  Throughput: {:.0} msg/s",
        total as f64 / elapsed.as_secs_f64()
    );
    println!("  Per-consumer: {per_consumer:?}");
    println!("\nPool behavior:");
    println!("  Recycled blocks: {}", stats.recycled_blocks);
    println!("  Fresh allocations: {}", stats.fresh_allocations);
    println!("  Recycle rate: {:.1}%", stats.recycle_rate() * 100.0);
}
