//! Property-based tests for the queues.
//!
//! The single-threaded properties pin the sequential semantics against simple
//! models (a `VecDeque` for the MPSC queue, a plain vector for FIFO order);
//! the concurrent property re-checks conservation under real threads.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use crate::{Full, MpmcQueue, MpscQueue};

#[derive(Debug, Clone)]
enum Op {
    Enqueue(i32),
    Dequeue,
    Rewind(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<i32>().prop_map(Op::Enqueue),
        2 => Just(Op::Dequeue),
        1 => any::<i32>().prop_map(Op::Rewind),
    ]
}

proptest! {
    #[test]
    fn prop_fifo_single_thread(values in prop::collection::vec(any::<i32>(), 0..200)) {
        let queue = MpmcQueue::new(16);
        for &value in &values {
            queue.enqueue(value);
        }
        for &expected in &values {
            prop_assert_eq!(queue.try_dequeue(), Some(expected));
        }
        prop_assert_eq!(queue.try_dequeue(), None);
        prop_assert!(queue.is_empty());
    }

    #[test]
    fn prop_try_enqueue_bound(capacity in 0usize..32, attempts in 1usize..64) {
        let queue = MpmcQueue::new(capacity);
        let mut accepted = 0;
        for i in 0..attempts {
            if queue.try_enqueue(i).is_ok() {
                accepted += 1;
            }
        }
        // Without intervening dequeues the pool is the exact bound.
        prop_assert_eq!(accepted, attempts.min(capacity));
    }

    #[test]
    fn prop_rejected_value_round_trips(value in any::<u64>()) {
        let queue = MpmcQueue::new(0);
        prop_assert_eq!(queue.try_enqueue(value), Err(Full(value)));
    }

    #[test]
    fn prop_mpsc_matches_deque_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let mut queue = MpscQueue::new(8);
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::Enqueue(value) => {
                    queue.enqueue(value);
                    model.push_back(value);
                }
                Op::Dequeue => {
                    prop_assert_eq!(queue.try_dequeue(), model.pop_front());
                }
                Op::Rewind(value) => {
                    queue.rewind(value);
                    model.push_front(value);
                }
            }
        }

        while let Some(value) = queue.try_dequeue() {
            prop_assert_eq!(Some(value), model.pop_front());
        }
        prop_assert!(model.is_empty());
    }

    #[test]
    fn prop_concurrent_conservation(
        producers in 2usize..5,
        per_producer in 10usize..100,
    ) {
        let queue = Arc::new(MpmcQueue::<usize>::new(64));

        let handles: Vec<_> = (0..producers)
            .map(|producer_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for seq in 0..per_producer {
                        queue.enqueue(producer_id * per_producer + seq);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut drained = vec![];
        while let Some(value) = queue.try_dequeue() {
            drained.push(value);
        }

        prop_assert_eq!(drained.len(), producers * per_producer);
        drained.sort_unstable();
        drained.dedup();
        prop_assert_eq!(drained.len(), producers * per_producer);
    }
}
