/*!
 * Cancellation and Timeout Tests
 * Abandoned waits leave the slot unchanged and the lock free
 */

use monitor_handoff::{BoundedMonitorBuffer, CancellationToken, HandoffError, WaitPolicy};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_cancel_waiting_produce_keeps_slot() {
    let buffer = Arc::new(BoundedMonitorBuffer::new());
    buffer.produce(1u64);
    let token = CancellationToken::new();

    let (buffer_clone, token_clone) = (buffer.clone(), token.clone());
    let producer = thread::spawn(move || {
        buffer_clone
            .produce_with(2, WaitPolicy::cancellable(&token_clone))
            .map_err(|e| (e.reason.clone(), e.into_inner()))
    });

    thread::sleep(Duration::from_millis(50));
    token.cancel();

    assert_eq!(producer.join().unwrap(), Err((HandoffError::Cancelled, 2)));

    // Slot still holds the first value and the lock is free for the consumer
    assert!(buffer.is_occupied());
    assert_eq!(buffer.consume(), 1);
    assert!(!buffer.is_occupied());
    assert_eq!(buffer.counters().cancellations, 1);
}

#[test]
fn test_cancel_waiting_consume_lets_other_side_proceed() {
    let buffer = Arc::new(BoundedMonitorBuffer::<u64>::new());
    let token = CancellationToken::new();

    let (buffer_clone, token_clone) = (buffer.clone(), token.clone());
    let consumer = thread::spawn(move || {
        buffer_clone.consume_with(WaitPolicy::cancellable(&token_clone))
    });

    thread::sleep(Duration::from_millis(50));
    token.cancel();
    assert_eq!(consumer.join().unwrap(), Err(HandoffError::Cancelled));

    // Producer is not blocked by a held lock or a phantom value
    assert_eq!(buffer.try_produce(9).map_err(|e| e.reason), Ok(()));
    assert_eq!(buffer.try_consume(), Ok(9));
}

#[test]
fn test_cancel_is_prompt() {
    let buffer = Arc::new(BoundedMonitorBuffer::<u64>::new());
    let token = CancellationToken::new();

    let (buffer_clone, token_clone) = (buffer.clone(), token.clone());
    let consumer = thread::spawn(move || {
        let start = Instant::now();
        let result = buffer_clone.consume_with(WaitPolicy::cancellable(&token_clone));
        (result, start.elapsed())
    });

    thread::sleep(Duration::from_millis(30));
    token.cancel();

    let (result, elapsed) = consumer.join().unwrap();
    assert_eq!(result, Err(HandoffError::Cancelled));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn test_already_cancelled_token_does_not_block_ready_call() {
    let buffer = BoundedMonitorBuffer::new();
    let token = CancellationToken::new();
    token.cancel();

    // The slot is empty, so produce never suspends and cancellation is not observed
    assert!(buffer.produce_with(5u64, WaitPolicy::cancellable(&token)).is_ok());
    assert_eq!(buffer.consume_with(WaitPolicy::cancellable(&token)), Ok(5));

    // Now the consumer would have to suspend
    assert_eq!(
        buffer.consume_with(WaitPolicy::cancellable(&token)),
        Err(HandoffError::Cancelled)
    );
}

#[test]
fn test_timeout_leaves_occupied_unchanged() {
    let buffer = BoundedMonitorBuffer::new();

    let start = Instant::now();
    let result = buffer.consume_timeout(Duration::from_millis(40));
    assert!(matches!(result, Err(HandoffError::Timeout { .. })));
    assert!(start.elapsed() >= Duration::from_millis(40));
    assert!(!buffer.is_occupied());

    buffer.produce(3u64);
    let err = buffer.produce_timeout(4, Duration::from_millis(20)).unwrap_err();
    assert!(matches!(err.reason, HandoffError::Timeout { .. }));
    assert_eq!(err.value, 4);
    assert!(buffer.is_occupied());
    assert_eq!(buffer.consume(), 3);

    assert_eq!(buffer.counters().timeouts, 2);
}

#[test]
fn test_timeout_satisfied_before_deadline() {
    let buffer = Arc::new(BoundedMonitorBuffer::new());

    let buffer_clone = buffer.clone();
    let consumer = thread::spawn(move || buffer_clone.consume_timeout(Duration::from_secs(5)));

    thread::sleep(Duration::from_millis(30));
    buffer.produce(11u64);

    assert_eq!(consumer.join().unwrap(), Ok(11));
}

#[test]
fn test_deadline_and_token_combined() {
    let buffer = BoundedMonitorBuffer::<u64>::new();
    let token = CancellationToken::new();

    let policy = WaitPolicy::cancellable(&token).with_timeout(Duration::from_millis(25));
    assert!(matches!(
        buffer.consume_with(policy),
        Err(HandoffError::Timeout { .. })
    ));
    assert_eq!(token.registered_waiters(), 0);
}
