/*!
 * Stress Tests
 * Many trials, several producers and consumers, random pacing
 */

use monitor_handoff::{
    run_handoff, Activity, BoundedMonitorBuffer, DemoConfig, SignalPolicy, SyncConfig,
};
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_repeated_runs_are_exact() {
    for trial in 0..100 {
        let signal = if trial % 2 == 0 {
            SignalPolicy::One
        } else {
            SignalPolicy::Broadcast
        };
        let report = run_handoff(&DemoConfig::unpaced(1_000).with_signal(signal)).unwrap();
        assert!(report.is_exact(), "trial {} lost or reordered values", trial);
    }
}

fn many_to_many(signal: SignalPolicy, producers: u64, consumers: u64, per_producer: u64) {
    let buffer = Arc::new(BoundedMonitorBuffer::with_config(SyncConfig { signal }));
    let total = producers * per_producer;
    assert_eq!(total % consumers, 0);
    let per_consumer = total / consumers;

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let buffer = buffer.clone();
            Activity::spawn(format!("producer-{}", p), move || {
                for i in 0..per_producer {
                    buffer.produce(p * per_producer + i);
                }
            })
            .unwrap()
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|c| {
            let buffer = buffer.clone();
            Activity::spawn(format!("consumer-{}", c), move || {
                (0..per_consumer).map(|_| buffer.consume()).collect::<Vec<_>>()
            })
            .unwrap()
        })
        .collect();

    for handle in producer_handles {
        handle.join().unwrap();
    }
    let mut received: Vec<u64> = consumer_handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    received.sort_unstable();

    assert_eq!(received, (0..total).collect::<Vec<_>>());
    assert!(!buffer.is_occupied());
    assert_eq!(buffer.counters().produced, total);
    assert_eq!(buffer.counters().consumed, total);
}

#[test]
fn test_many_to_many_single_signal() {
    many_to_many(SignalPolicy::One, 4, 4, 500);
}

#[test]
fn test_many_to_many_broadcast() {
    many_to_many(SignalPolicy::Broadcast, 4, 2, 500);
}

#[test]
fn test_uneven_sides() {
    many_to_many(SignalPolicy::One, 1, 8, 800);
    many_to_many(SignalPolicy::Broadcast, 8, 1, 100);
}

#[test]
fn test_random_pacing_preserves_order() {
    let buffer = Arc::new(BoundedMonitorBuffer::new());
    const COUNT: u64 = 200;

    let buffer_clone = buffer.clone();
    let producer = thread::spawn(move || {
        let mut rng = rand::thread_rng();
        for i in 0..COUNT {
            buffer_clone.produce(i);
            if rng.gen_bool(0.3) {
                thread::sleep(Duration::from_micros(rng.gen_range(0..200)));
            }
        }
    });

    let mut rng = rand::thread_rng();
    let mut received = Vec::with_capacity(COUNT as usize);
    for _ in 0..COUNT {
        received.push(buffer.consume());
        if rng.gen_bool(0.3) {
            thread::sleep(Duration::from_micros(rng.gen_range(0..200)));
        }
    }

    producer.join().unwrap();
    assert_eq!(received, (0..COUNT).collect::<Vec<_>>());
}
