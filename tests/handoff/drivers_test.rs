/*!
 * Driver and Harness Tests
 */

use monitor_handoff::{
    run_handoff, run_handoff_with, BoundedMonitorBuffer, CancellationToken, Consumer, DemoConfig,
    HandoffError, Producer, SignalPolicy,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_paced_drivers_deliver_in_order() {
    let buffer = Arc::new(BoundedMonitorBuffer::new());

    let producer = Producer::new(buffer.clone(), 1..=5u64)
        .with_pacing(Duration::from_millis(5))
        .spawn("producer")
        .unwrap();
    let consumer = Consumer::new(buffer.clone(), 5)
        .with_pacing(Duration::from_millis(8))
        .spawn("consumer")
        .unwrap();

    assert_eq!(producer.join_flatten(), Ok(5));
    assert_eq!(consumer.join_flatten(), Ok(vec![1, 2, 3, 4, 5]));
    assert!(!buffer.is_occupied());
}

#[test]
fn test_run_handoff_with_pacing_waits_for_completion() {
    let config = DemoConfig {
        iterations: 4,
        producer_delay: Duration::from_millis(10),
        consumer_delay: Duration::from_millis(15),
        signal: SignalPolicy::One,
    };

    let start = Instant::now();
    let report = run_handoff(&config).unwrap();

    assert_eq!(report.consumed, vec![1, 2, 3, 4]);
    assert!(report.is_exact());
    // Both activities ran all iterations, including their trailing pauses
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[test]
fn test_run_handoff_broadcast() {
    let config = DemoConfig::unpaced(50).with_signal(SignalPolicy::Broadcast);
    let report = run_handoff(&config).unwrap();
    assert!(report.is_exact());
    assert_eq!(report.counters.consumed, 50);
}

#[test]
fn test_cancel_mid_run() {
    let config = DemoConfig {
        iterations: 1_000,
        producer_delay: Duration::from_millis(5),
        consumer_delay: Duration::from_millis(5),
        signal: SignalPolicy::One,
    };
    let token = CancellationToken::new();

    let token_clone = token.clone();
    let run = thread::spawn(move || run_handoff_with(&config, token_clone));

    thread::sleep(Duration::from_millis(50));
    let cancelled_at = Instant::now();
    token.cancel();

    assert_eq!(run.join().unwrap(), Err(HandoffError::Cancelled));
    assert!(cancelled_at.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_failing_producer_releases_consumer() {
    let buffer = Arc::new(BoundedMonitorBuffer::new());
    let token = CancellationToken::new();

    let values = (1..=3u64).map(|v| {
        if v == 3 {
            panic!("producer bug");
        }
        v
    });

    let producer = Producer::new(buffer.clone(), values)
        .with_cancellation(token.clone())
        .spawn("faulty-producer")
        .unwrap();
    let consumer = Consumer::new(buffer.clone(), 3)
        .with_cancellation(token.clone())
        .spawn("consumer")
        .unwrap();

    assert_eq!(
        producer.join_flatten(),
        Err(HandoffError::ActivityPanicked {
            name: "faulty-producer".to_string()
        })
    );
    assert_eq!(consumer.join_flatten(), Err(HandoffError::Cancelled));
    assert!(token.is_cancelled());
}

#[test]
fn test_failure_on_child_token_spares_parent() {
    let buffer = Arc::new(BoundedMonitorBuffer::new());
    let parent = CancellationToken::new();
    let run = parent.child();

    let values = (1..=2u64).map(|v| {
        if v == 2 {
            panic!("producer bug");
        }
        v
    });

    let producer = Producer::new(buffer.clone(), values)
        .with_cancellation(run.token().clone())
        .spawn("faulty-producer")
        .unwrap();
    let consumer = Consumer::new(buffer, 2)
        .with_cancellation(run.token().clone())
        .spawn("consumer")
        .unwrap();

    assert!(producer.join_flatten().is_err());
    assert_eq!(consumer.join_flatten(), Err(HandoffError::Cancelled));
    assert!(run.is_cancelled());
    assert!(!parent.is_cancelled());
}

#[test]
fn test_successful_drivers_do_not_cancel() {
    let buffer = Arc::new(BoundedMonitorBuffer::new());
    let token = CancellationToken::new();

    let producer = Producer::new(buffer.clone(), vec![10u64, 20])
        .with_cancellation(token.clone())
        .spawn("producer")
        .unwrap();
    let consumer = Consumer::new(buffer, 2)
        .with_cancellation(token.clone())
        .spawn("consumer")
        .unwrap();

    assert_eq!(producer.join_flatten(), Ok(2));
    assert_eq!(consumer.join_flatten(), Ok(vec![10, 20]));
    assert!(!token.is_cancelled());
}
