use std::time::Duration;

use tidemark_core::{ConfigError, QueueError, QueueState, WaitableQueue, Wake};
use tokio::time::timeout;

#[test]
fn fifo_enqueue_dequeue() {
    let queue = WaitableQueue::new(4, 0, 10).unwrap();

    for i in 0..7 {
        queue.enqueue(i);
    }

    let drained: Vec<i32> = std::iter::from_fn(|| queue.dequeue().0).collect();
    assert_eq!(drained, (0..7).collect::<Vec<_>>());
}

#[test]
fn dequeue_on_empty_queue() {
    let queue = WaitableQueue::<String>::new(0, 0, 0).unwrap();

    assert_eq!(queue.dequeue(), (None, QueueState::BelowLowWatermark));
    assert!(queue.is_empty());
}

#[test]
fn enqueue_reports_watermark_states() {
    let queue = WaitableQueue::new(0, 2, 8).unwrap();

    assert_eq!(queue.enqueue(1), QueueState::BelowLowWatermark);
    for i in 2..=4 {
        queue.enqueue(i);
    }
    assert_eq!(queue.enqueue(5), QueueState::Nominal);
    for i in 6..=8 {
        assert_eq!(queue.enqueue(i), QueueState::Nominal);
    }
    assert_eq!(queue.enqueue(9), QueueState::AboveHighWatermark);
    assert_eq!(queue.len(), 9);
}

#[test]
fn dequeue_reports_post_removal_state() {
    let queue = WaitableQueue::new(0, 2, 3).unwrap();
    for i in 0..5 {
        queue.enqueue(i);
    }

    assert_eq!(queue.dequeue(), (Some(0), QueueState::AboveHighWatermark));
    assert_eq!(queue.dequeue(), (Some(1), QueueState::Nominal));
    assert_eq!(queue.dequeue(), (Some(2), QueueState::Nominal));
    assert_eq!(queue.dequeue(), (Some(3), QueueState::BelowLowWatermark));
    assert_eq!(queue.dequeue(), (Some(4), QueueState::BelowLowWatermark));
    assert_eq!(queue.dequeue(), (None, QueueState::BelowLowWatermark));
}

#[test]
fn capacity_hint_is_not_a_limit() {
    let queue = WaitableQueue::new(1, 0, 1).unwrap();

    for i in 0..100 {
        queue.enqueue(i);
    }

    assert_eq!(queue.len(), 100);
}

#[test]
fn oversized_capacity_hint_is_ignored() {
    let queue = WaitableQueue::<u64>::new(isize::MAX, 0, 2).unwrap();

    assert_eq!(queue.enqueue(1), QueueState::Nominal);
    assert_eq!(queue.enqueue(2), QueueState::Nominal);
    assert_eq!(queue.enqueue(3), QueueState::AboveHighWatermark);
    assert_eq!(queue.dequeue(), (Some(1), QueueState::Nominal));
    assert_eq!(queue.len(), 2);

    let queue = WaitableQueue::<u64>::new(isize::MAX / 4, 0, 0).unwrap();
    queue.enqueue(9);
    assert_eq!(queue.dequeue().0, Some(9));
}

#[test]
fn close_twice_is_safe() {
    let queue = WaitableQueue::<u8>::new(0, 0, 1).unwrap();
    let handle = queue.wait_handle();

    queue.close();
    assert!(handle.is_closed());
    queue.close();
    assert!(handle.is_closed());
    assert!(queue.is_closed());
    assert_eq!(handle.try_wait(), Some(Wake::Closed));
}

#[test]
fn closed_queue_drains_in_order() {
    let queue = WaitableQueue::new(0, 0, 10).unwrap();
    for i in ["a", "b", "c"] {
        queue.enqueue(i);
    }

    queue.close();

    assert_eq!(queue.dequeue().0, Some("a"));
    assert_eq!(queue.dequeue().0, Some("b"));
    assert_eq!(queue.dequeue().0, Some("c"));
    for _ in 0..3 {
        assert_eq!(queue.dequeue(), (None, QueueState::BelowLowWatermark));
    }
}

#[test]
#[should_panic(expected = "enqueue on closed queue")]
fn enqueue_after_close_panics() {
    let queue = WaitableQueue::new(0, 0, 1).unwrap();
    queue.close();

    queue.enqueue(1);
}

#[test]
fn enqueue_after_close_panics_every_time() {
    let queue = std::sync::Arc::new(WaitableQueue::new(0, 0, 1).unwrap());
    queue.close();

    for _ in 0..3 {
        let queue = queue.clone();
        let result = std::thread::spawn(move || queue.enqueue(7)).join();
        assert!(result.is_err());
    }

    // The panics happened outside the lock, so the queue is still usable.
    assert_eq!(queue.dequeue(), (None, QueueState::BelowLowWatermark));
    assert!(queue.is_closed());
}

#[test]
fn try_enqueue_after_close_returns_item() {
    let queue = WaitableQueue::new(0, 0, 1).unwrap();
    assert_eq!(queue.try_enqueue("first").unwrap(), QueueState::Nominal);

    queue.close();

    let err = queue.try_enqueue("second").unwrap_err();
    assert!(matches!(err, QueueError::Closed("second")));
    assert_eq!(err.into_inner(), "second");
    assert_eq!(queue.len(), 1);
}

#[test]
fn burst_of_enqueues_coalesces_into_one_wake() {
    let queue = WaitableQueue::new(0, 0, 100).unwrap();
    let handle = queue.wait_handle();

    for i in 0..10 {
        queue.enqueue(i);
    }

    assert_eq!(handle.try_wait(), Some(Wake::Available));
    assert_eq!(handle.try_wait(), None);

    // One wake, yet all ten items are there for a draining consumer.
    assert_eq!(std::iter::from_fn(|| queue.dequeue().0).count(), 10);
}

#[test]
fn construction_validation() {
    assert_eq!(
        WaitableQueue::<u8>::new(-1, 0, 0).unwrap_err(),
        ConfigError::CapacityNegative(-1)
    );
    assert_eq!(
        WaitableQueue::<u8>::new(0, -1, 0).unwrap_err(),
        ConfigError::LowWatermarkNegative(-1)
    );
    assert_eq!(
        WaitableQueue::<u8>::new(0, 0, -1).unwrap_err(),
        ConfigError::HighWatermarkNegative(-1)
    );
    assert_eq!(
        WaitableQueue::<u8>::new(0, 5, 4).unwrap_err(),
        ConfigError::HighWatermarkBelowLow { low: 5, high: 4 }
    );
}

#[test]
fn construction_validation_order() {
    // Every parameter is invalid: the capacity is reported first.
    assert_eq!(
        WaitableQueue::<u8>::new(-1, -2, -3).unwrap_err(),
        ConfigError::CapacityNegative(-1)
    );
    assert_eq!(
        WaitableQueue::<u8>::new(0, -2, -3).unwrap_err(),
        ConfigError::LowWatermarkNegative(-2)
    );
}

#[tokio::test]
async fn waiter_is_woken_by_enqueue() {
    let queue = std::sync::Arc::new(WaitableQueue::new(0, 0, 1).unwrap());
    let handle = queue.wait_handle();

    let waiter = tokio::spawn(async move { handle.wait().await });
    tokio::task::yield_now().await;
    queue.enqueue(42);

    let wake = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    assert_eq!(wake, Wake::Available);
    assert_eq!(queue.dequeue().0, Some(42));
}

#[tokio::test]
async fn close_unblocks_current_and_future_waiters() {
    let queue = WaitableQueue::<u8>::new(0, 0, 1).unwrap();
    let handle = queue.wait_handle();

    let waiting = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait().await })
    };
    tokio::task::yield_now().await;
    queue.close();

    let wake = timeout(Duration::from_secs(1), waiting).await.unwrap().unwrap();
    assert_eq!(wake, Wake::Closed);
    for _ in 0..3 {
        let wake = timeout(Duration::from_millis(100), handle.wait()).await.unwrap();
        assert_eq!(wake, Wake::Closed);
    }
}

#[tokio::test]
async fn wakes_stream_ends_on_close() {
    use futures_util::StreamExt;

    let queue = WaitableQueue::new(0, 0, 1).unwrap();
    let mut wakes = Box::pin(queue.wait_handle().wakes());

    queue.enqueue(1);
    queue.enqueue(2);
    assert_eq!(wakes.next().await, Some(()));

    queue.close();
    assert_eq!(wakes.next().await, None);
}

#[tokio::test]
async fn wakes_stream_shares_the_slot_with_other_waiters() {
    use futures_util::StreamExt;

    let queue = WaitableQueue::new(0, 0, 1).unwrap();
    let handle = queue.wait_handle();
    let mut wakes = Box::pin(handle.wakes());

    queue.enqueue(1);
    // Taken through a clone: the stream never sees this wake.
    assert_eq!(handle.clone().try_wait(), Some(Wake::Available));

    let missed = timeout(Duration::from_millis(50), wakes.next()).await;
    assert!(missed.is_err());

    queue.close();
    assert_eq!(wakes.next().await, None);
}
