use foundation_queue::{BoundedBlockingQueue, QueueError};
use foundation_testing::scenarios::spawn_probe;
use ntest::timeout;
use serial_test::serial;
use std::time::{Duration, Instant};

const GRACE: Duration = Duration::from_millis(50);
const LIMIT: Duration = Duration::from_secs(5);

#[test]
fn zero_capacity_construction_fails() {
    let result = BoundedBlockingQueue::<String>::new(0);
    assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
}

#[test]
fn offer_with_zero_timeout_on_full_queue_returns_immediately() {
    let queue = BoundedBlockingQueue::new(2).unwrap();
    queue.put("a");
    queue.put("b");

    let started = Instant::now();
    assert_eq!(queue.offer("c", Duration::ZERO), Err("c"));
    assert!(started.elapsed() < GRACE);

    assert_eq!(queue.size(), 2);
    assert_eq!(queue.peek_with(|head| *head), Some("a"));
}

#[test]
fn poll_with_zero_timeout_on_empty_queue_returns_none_immediately() {
    let queue: BoundedBlockingQueue<&str> = BoundedBlockingQueue::new(2).unwrap();

    let started = Instant::now();
    assert_eq!(queue.poll(Duration::ZERO), None);
    assert!(started.elapsed() < GRACE);
    assert_eq!(queue.size(), 0);
}

#[test]
#[serial]
fn offer_times_out_on_a_full_queue() {
    let queue = BoundedBlockingQueue::new(1).unwrap();
    queue.put(1);

    let started = Instant::now();
    assert_eq!(queue.offer(2, Duration::from_millis(40)), Err(2));
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(queue.take(), 1);
}

#[test]
#[serial]
#[timeout(10000)]
fn put_on_full_queue_blocks_until_a_take() {
    let queue = BoundedBlockingQueue::new(1).unwrap();
    queue.put(10);

    let probe = {
        let queue = queue.clone();
        spawn_probe(move || queue.put(11))
    };
    assert!(probe.is_blocked_after(GRACE));
    assert_eq!(queue.size(), 1);

    assert_eq!(queue.take(), 10);
    probe.join_within(LIMIT).unwrap();
    assert_eq!(queue.take(), 11);
}

#[test]
#[serial]
#[timeout(10000)]
fn take_on_empty_queue_blocks_until_a_put() {
    let queue = BoundedBlockingQueue::new(1).unwrap();

    let probe = {
        let queue = queue.clone();
        spawn_probe(move || queue.take())
    };
    assert!(probe.is_blocked_after(GRACE));

    queue.put(vec![1, 2, 3]);
    assert_eq!(probe.join_within(LIMIT).unwrap(), vec![1, 2, 3]);
    assert!(queue.is_empty());
}

#[test]
#[serial]
#[timeout(10000)]
fn capacity_two_scenario() {
    let queue = BoundedBlockingQueue::new(2).unwrap();

    let started = Instant::now();
    queue.put(1);
    queue.put(2);
    assert!(started.elapsed() < GRACE);

    let third = {
        let queue = queue.clone();
        spawn_probe(move || queue.put(3))
    };
    assert!(third.is_blocked_after(GRACE));

    assert_eq!(queue.take(), 1);
    third.join_within(LIMIT).unwrap();

    assert_eq!(queue.take(), 2);
    assert_eq!(queue.take(), 3);
}

#[test]
#[serial]
#[timeout(10000)]
fn poll_returns_an_element_that_arrives_before_the_deadline() {
    let queue = BoundedBlockingQueue::new(1).unwrap();

    let probe = {
        let queue = queue.clone();
        spawn_probe(move || queue.poll(Duration::from_secs(5)))
    };
    assert!(probe.is_blocked_after(GRACE));

    queue.put('x');
    assert_eq!(probe.join_within(LIMIT).unwrap(), Some('x'));
}

#[test]
#[serial]
#[timeout(10000)]
fn drain_frees_room_for_several_blocked_producers() {
    let queue = BoundedBlockingQueue::new(2).unwrap();
    queue.put(0);
    queue.put(1);

    let producers: Vec<_> = (2..4)
        .map(|i| {
            let queue = queue.clone();
            spawn_probe(move || queue.put(i))
        })
        .collect();
    assert!(producers[0].is_blocked_after(GRACE));

    let mut drained = Vec::new();
    assert_eq!(queue.drain_into(&mut drained, 2), 2);
    assert_eq!(drained, vec![0, 1]);

    for producer in producers {
        producer.join_within(LIMIT).unwrap();
    }
    assert_eq!(queue.size(), 2);
}
