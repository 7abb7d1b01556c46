use foundation_queue::{BoundedBlockingQueue, CancellationToken, OfferError, QueueError};
use foundation_testing::scenarios::spawn_probe;
use ntest::timeout;
use serial_test::serial;
use std::time::Duration;
use tracing_test::traced_test;

const GRACE: Duration = Duration::from_millis(50);
const LIMIT: Duration = Duration::from_secs(5);

#[test]
#[serial]
#[timeout(10000)]
fn cancelled_offer_hands_back_item_before_its_timeout() {
    let queue = BoundedBlockingQueue::new(1).unwrap();
    queue.put(1_i32);
    let token = CancellationToken::new();

    let probe = {
        let queue = queue.clone();
        let token = token.clone();
        spawn_probe(move || queue.offer_cancellable(2, Duration::from_secs(60), &token))
    };
    assert!(probe.is_blocked_after(GRACE));
    token.cancel();

    assert_eq!(
        probe.join_within(LIMIT).unwrap(),
        Err(OfferError::Cancelled(2))
    );
    assert_eq!(queue.size(), 1);
    assert_eq!(queue.take(), 1);
}

#[test]
#[serial]
#[timeout(10000)]
fn one_token_wakes_waiters_on_different_queues() {
    let left: BoundedBlockingQueue<u8> = BoundedBlockingQueue::new(1).unwrap();
    let right: BoundedBlockingQueue<u8> = BoundedBlockingQueue::new(1).unwrap();
    let token = CancellationToken::new();

    let probes: Vec<_> = [left.clone(), right.clone()]
        .into_iter()
        .map(|queue| {
            let token = token.clone();
            spawn_probe(move || queue.take_cancellable(&token))
        })
        .collect();
    for probe in &probes {
        assert!(probe.is_blocked_after(GRACE));
    }
    assert_eq!(token.waiting(), 2);

    token.cancel();
    for probe in probes {
        assert!(matches!(
            probe.join_within(LIMIT).unwrap(),
            Err(QueueError::Cancelled)
        ));
    }
}

#[test]
#[serial]
#[timeout(10000)]
fn cancelling_one_waiter_leaves_the_others_blocked() {
    let queue: BoundedBlockingQueue<u8> = BoundedBlockingQueue::new(1).unwrap();
    let cancelled = CancellationToken::new();
    let untouched = CancellationToken::new();

    let doomed = {
        let queue = queue.clone();
        let token = cancelled.clone();
        spawn_probe(move || queue.take_cancellable(&token))
    };
    let survivor = {
        let queue = queue.clone();
        let token = untouched.clone();
        spawn_probe(move || queue.take_cancellable(&token))
    };
    assert!(doomed.is_blocked_after(GRACE));
    assert!(survivor.is_blocked_after(Duration::ZERO));

    cancelled.cancel();
    assert!(doomed.join_within(LIMIT).unwrap().is_err());
    assert!(survivor.is_blocked_after(GRACE));

    queue.put(3);
    assert_eq!(survivor.join_within(LIMIT).unwrap().unwrap(), 3);
}

#[test]
#[serial]
#[timeout(10000)]
fn queue_keeps_working_after_many_cancelled_waits() {
    let queue = BoundedBlockingQueue::new(2).unwrap();

    for round in 0..20_u32 {
        let token = CancellationToken::new();
        let probe = {
            let queue = queue.clone();
            let token = token.clone();
            spawn_probe(move || queue.poll_cancellable(Duration::from_secs(60), &token))
        };
        token.cancel();
        assert!(probe.join_within(LIMIT).unwrap().is_err());

        queue.put(round);
        assert_eq!(queue.take(), round);
        assert_eq!(token.waiting(), 0);
    }
}

#[test]
#[traced_test]
fn cancellation_is_logged_with_waiter_count() {
    let token = CancellationToken::new();
    assert!(token.cancel());
    assert!(!token.cancel());
    assert!(logs_contain("CancellationToken cancelled"));
    assert!(logs_contain("waiters=0"));
}
