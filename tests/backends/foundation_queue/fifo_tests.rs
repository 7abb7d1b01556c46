use foundation_queue::BoundedBlockingQueue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn puts_then_takes_come_back_in_insertion_order() {
    let queue = BoundedBlockingQueue::new(100).unwrap();
    let inserted: Vec<u32> = (0..100).map(|i| i * 7 % 101).collect();

    for value in &inserted {
        queue.put(*value);
    }
    let taken: Vec<u32> = (0..100).map(|_| queue.take()).collect();

    assert_eq!(taken, inserted);
}

#[test]
fn take_order_matches_insertion_order_across_threads() {
    // Producers serialize among themselves so the order their puts land in
    // is known; consumers do the same for takes.
    let queue = BoundedBlockingQueue::new(3).unwrap();
    let put_log = Arc::new(Mutex::new(Vec::new()));
    let take_log = Arc::new(Mutex::new(Vec::new()));
    let producers = 4;
    let consumers = 3;
    let per_producer = 150;
    let total = producers * per_producer;

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = queue.clone();
            let put_log = Arc::clone(&put_log);
            thread::spawn(move || {
                for i in 0..per_producer {
                    let mut log = put_log.lock().unwrap();
                    let value = p * 10_000 + i;
                    queue.put(value);
                    log.push(value);
                }
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = queue.clone();
            let take_log = Arc::clone(&take_log);
            thread::spawn(move || loop {
                let mut log = take_log.lock().unwrap();
                if log.len() == total {
                    return;
                }
                log.push(queue.take());
            })
        })
        .collect();

    for handle in producer_handles.into_iter().chain(consumer_handles) {
        handle.join().unwrap();
    }

    assert_eq!(*take_log.lock().unwrap(), *put_log.lock().unwrap());
    assert!(queue.is_empty());
}

#[test]
fn size_stays_within_capacity_under_contention() {
    let capacity = 4;
    let queue = BoundedBlockingQueue::new(capacity).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let sampler = {
        let queue = queue.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut max_seen = 0;
            while !done.load(Ordering::Acquire) {
                let size = queue.size();
                assert!(size <= capacity, "size {size} above capacity");
                max_seen = max_seen.max(size);
            }
            max_seen
        })
    };

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..2_000_u32 {
                    queue.put(i);
                }
            })
        })
        .collect();
    for _ in 0..8_000 {
        queue.take();
    }
    for producer in producers {
        producer.join().unwrap();
    }

    done.store(true, Ordering::Release);
    let max_seen = sampler.join().unwrap();
    assert!(max_seen <= capacity);
    assert_eq!(queue.size(), 0);
}

#[test]
fn round_trip_preserves_the_multiset() {
    for (n, m, k) in [(1, 1, 1), (17, 3, 5), (1000, 7, 2), (250, 1, 9)] {
        let queue = BoundedBlockingQueue::new(3).unwrap();

        // Values 0..n dealt round-robin to the m producers.
        let producers: Vec<_> = (0..m)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for value in (p..n).step_by(m) {
                        queue.put(value);
                    }
                })
            })
            .collect();

        // Consumer c takes its share of n, the first n % k take one extra.
        let consumers: Vec<_> = (0..k)
            .map(|c| {
                let queue = queue.clone();
                let share = n / k + usize::from(c < n % k);
                thread::spawn(move || (0..share).map(|_| queue.take()).collect::<Vec<_>>())
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for consumer in consumers {
            for value in consumer.join().unwrap() {
                *counts.entry(value).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), n, "n={n} m={m} k={k}");
        assert!(counts.iter().all(|(value, count)| *value < n && *count == 1));
        assert!(queue.is_empty());
    }
}
