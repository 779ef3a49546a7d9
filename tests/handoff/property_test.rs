/*!
 * Property Tests
 * Arbitrary sequences pass through the slot unchanged and in order
 */

use monitor_handoff::{BoundedMonitorBuffer, Consumer, Producer, SignalPolicy, SyncConfig};
use proptest::prelude::*;
use std::sync::Arc;

fn signal_policy() -> impl Strategy<Value = SignalPolicy> {
    prop_oneof![Just(SignalPolicy::One), Just(SignalPolicy::Broadcast)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_sequence_preserved(
        values in prop::collection::vec(any::<i64>(), 0..200),
        signal in signal_policy(),
    ) {
        let buffer = Arc::new(BoundedMonitorBuffer::with_config(SyncConfig { signal }));

        let producer = Producer::new(buffer.clone(), values.clone()).spawn("producer").unwrap();
        let consumer = Consumer::new(buffer.clone(), values.len()).spawn("consumer").unwrap();

        prop_assert_eq!(producer.join_flatten(), Ok(values.len()));
        prop_assert_eq!(consumer.join_flatten(), Ok(values));
        prop_assert!(!buffer.is_occupied());
    }

    #[test]
    fn prop_try_operations_alternate(ops in prop::collection::vec(any::<bool>(), 1..100)) {
        // true = try_produce, false = try_consume; a shadow Option models the slot
        let buffer = BoundedMonitorBuffer::new();
        let mut shadow: Option<usize> = None;

        for (i, produce) in ops.into_iter().enumerate() {
            if produce {
                let accepted = buffer.try_produce(i).is_ok();
                prop_assert_eq!(accepted, shadow.is_none());
                if accepted {
                    shadow = Some(i);
                }
            } else {
                prop_assert_eq!(buffer.try_consume().ok(), shadow.take());
            }
            prop_assert_eq!(buffer.is_occupied(), shadow.is_some());
        }

        let counters = buffer.counters();
        prop_assert_eq!(counters.in_flight(), u64::from(shadow.is_some()));
    }
}
