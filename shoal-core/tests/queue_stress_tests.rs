use std::sync::{Arc, Barrier};
use std::thread;

use serial_test::serial;

use shoal_core::TwoLockQueue;

#[test]
fn test_single_producer_single_consumer_ordered() {
    let queue: Arc<TwoLockQueue<usize>> = Arc::new(TwoLockQueue::new());
    let count = 10_000;

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            // One producer means FIFO order is observable end to end.
            for expected in 0..count {
                assert_eq!(queue.wait_and_pop(), expected);
            }
        })
    };

    for i in 0..count {
        queue.push(i);
    }

    consumer.join().unwrap();
    assert!(queue.is_empty());
}

#[test]
#[serial(queue_stress)]
fn test_many_producers_many_consumers_no_loss() {
    let queue: Arc<TwoLockQueue<usize>> = Arc::new(TwoLockQueue::new());
    let producers = 4;
    let consumers = 4;
    let per_producer = 5_000;
    let start = Arc::new(Barrier::new(producers + consumers));

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for i in 0..per_producer {
                    queue.push(p * per_producer + i);
                }
            })
        })
        .collect();

    // Each consumer takes an exact share, so wait_and_pop must block
    // through every momentary empty spell without losing its turn.
    let per_consumer = producers * per_producer / consumers;
    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                (0..per_consumer)
                    .map(|_| queue.wait_and_pop())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in producer_handles {
        handle.join().unwrap();
    }

    let mut seen = vec![false; producers * per_producer];
    for handle in consumer_handles {
        for value in handle.join().unwrap() {
            assert!(!seen[value], "value {} delivered twice", value);
            seen[value] = true;
        }
    }
    assert!(seen.iter().all(|&s| s), "a pushed value was lost");
    assert!(queue.is_empty());
}

#[test]
#[serial(queue_stress)]
fn test_try_pop_mixed_with_blocking_pop() {
    let queue: Arc<TwoLockQueue<usize>> = Arc::new(TwoLockQueue::new());
    let total = 20_000;

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..total {
                queue.push(i);
            }
        })
    };

    let polling = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut got = Vec::new();
            // Poll for half the values, accepting clean misses.
            while got.len() < total / 2 {
                if let Some(value) = queue.try_pop() {
                    got.push(value);
                }
            }
            got
        })
    };

    let blocking = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || (0..total / 2).map(|_| queue.wait_and_pop()).collect::<Vec<_>>())
    };

    producer.join().unwrap();
    let mut all = polling.join().unwrap();
    all.extend(blocking.join().unwrap());

    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), total, "values were lost or duplicated");
    assert!(queue.is_empty());
}

#[test]
fn test_per_producer_order_is_preserved() {
    // FIFO holds per producer even when producers interleave.
    let queue: Arc<TwoLockQueue<(usize, usize)>> = Arc::new(TwoLockQueue::new());
    let producers = 4;
    let per_producer = 5_000;

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_producer {
                    queue.push((p, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut next_expected = vec![0usize; producers];
    while let Some((producer, seq)) = queue.try_pop() {
        assert_eq!(seq, next_expected[producer], "producer {} reordered", producer);
        next_expected[producer] += 1;
    }
    assert!(next_expected.iter().all(|&n| n == per_producer));
}
