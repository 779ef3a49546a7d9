/*!
 * Bounded Monitor Buffer
 *
 * Single-slot producer/consumer hand-off. A `produce` must be drained by a
 * `consume` before the next `produce` is accepted, so hand-offs strictly alternate.
 *
 * # State Machine
 *
 * `EMPTY --produce--> FULL --consume--> EMPTY`, starting `EMPTY`.
 *
 * # Coordination
 *
 * One monitor guards the slot. Producers suspend on `not_full`, consumers on
 * `not_empty`; each completed transition signals the opposite side. Both sides
 * recheck the slot after every wake, so the buffer stays correct under the
 * broadcast signal policy and with several producers or consumers.
 */

use super::slot::{BufferSnapshot, Slot};
use crate::core::errors::{HandoffError, HandoffResult, ProduceError};
use crate::core::sync::{Condition, Monitor, MonitorGuard, SyncConfig, WaitPolicy};
use crate::core::types::MonitorId;
use crate::monitoring::{HandoffCounters, HandoffStats};
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};

/// Single-slot hand-off buffer coordinated by a mutex and two conditions
///
/// # Examples
///
/// ```
/// use monitor_handoff::BoundedMonitorBuffer;
///
/// let buffer = BoundedMonitorBuffer::new();
/// buffer.produce(42u64);
/// assert!(buffer.is_occupied());
/// assert_eq!(buffer.consume(), 42);
/// ```
pub struct BoundedMonitorBuffer<T> {
    monitor: Monitor<Slot<T>>,
    /// Producers wait here while the slot is full
    not_full: Condition<Slot<T>>,
    /// Consumers wait here while the slot is empty
    not_empty: Condition<Slot<T>>,
    stats: HandoffStats,
}

impl<T> BoundedMonitorBuffer<T> {
    /// Create an empty buffer that signals one waiter per transition
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        let monitor = Monitor::with_config(Slot::Empty, config);
        let not_full = monitor.new_condition();
        let not_empty = monitor.new_condition();

        debug!(
            monitor = %monitor.id(),
            signal = config.signal.name(),
            "hand-off buffer created"
        );

        Self {
            monitor,
            not_full,
            not_empty,
            stats: HandoffStats::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> MonitorId {
        self.monitor.id()
    }

    pub fn config(&self) -> SyncConfig {
        self.monitor.config()
    }

    /// Hand `value` to the consumer side, suspending while the slot is full
    pub fn produce(&self, value: T) {
        let mut guard = self.monitor.enter();
        if guard.is_occupied() {
            trace!(monitor = %self.id(), "producer waiting, slot is full");
        }
        self.not_full.wait_while(&mut guard, |slot| slot.is_occupied());
        self.complete_produce(&mut guard, value);
    }

    /// Take the pending value, suspending while the slot is empty
    pub fn consume(&self) -> T {
        let mut guard = self.monitor.enter();
        if !guard.is_occupied() {
            trace!(monitor = %self.id(), "consumer waiting, slot is empty");
        }
        let value = self.not_empty.wait_until_some(&mut guard, Slot::take);
        self.complete_consume(&guard);
        value
    }

    /// Store `value` only if the slot is empty right now
    pub fn try_produce(&self, value: T) -> Result<(), ProduceError<T>> {
        let mut guard = self.monitor.enter();
        if guard.is_occupied() {
            self.stats.record(|c| c.rejected += 1);
            return Err(ProduceError::new(value, HandoffError::WouldBlock));
        }
        self.complete_produce(&mut guard, value);
        Ok(())
    }

    /// Take the pending value only if one is present right now
    pub fn try_consume(&self) -> HandoffResult<T> {
        let mut guard = self.monitor.enter();
        match guard.take() {
            Some(value) => {
                self.complete_consume(&guard);
                Ok(value)
            }
            None => {
                self.stats.record(|c| c.rejected += 1);
                Err(HandoffError::WouldBlock)
            }
        }
    }

    /// True iff a produced value is waiting to be consumed
    pub fn is_occupied(&self) -> bool {
        self.monitor.enter().is_occupied()
    }

    /// Counters merged with the wait totals of both conditions
    pub fn counters(&self) -> HandoffCounters {
        let mut counters = self.stats.read();
        counters.producer_waits = self.not_full.total_waits();
        counters.consumer_waits = self.not_empty.total_waits();
        counters
    }

    /// Consistent view of occupancy, waiters and counters
    pub fn snapshot(&self) -> BufferSnapshot {
        let guard = self.monitor.enter();
        BufferSnapshot {
            monitor: self.id(),
            occupied: guard.is_occupied(),
            waiting_producers: self.not_full.waiter_count(),
            waiting_consumers: self.not_empty.waiter_count(),
            counters: self.counters(),
        }
    }

    /// Slot is known to be empty and the guard is held
    fn complete_produce(&self, guard: &mut MonitorGuard<'_, Slot<T>>, value: T) {
        debug_assert!(!guard.is_occupied(), "produce into an occupied slot");
        **guard = Slot::Full(value);
        self.stats.record(|c| c.produced += 1);
        let woken = self.not_empty.signal(guard);
        debug!(monitor = %self.id(), woken = woken.count(), "value produced");
    }

    /// Value has just been taken and the guard is held
    fn complete_consume(&self, guard: &MonitorGuard<'_, Slot<T>>) {
        self.stats.record(|c| c.consumed += 1);
        let woken = self.not_full.signal(guard);
        debug!(monitor = %self.id(), woken = woken.count(), "value consumed");
    }

    fn record_abandoned(&self, reason: &HandoffError) {
        match reason {
            HandoffError::Cancelled => self.stats.record(|c| c.cancellations += 1),
            HandoffError::Timeout { .. } => self.stats.record(|c| c.timeouts += 1),
            _ => {}
        }
    }
}

impl<T: Send + 'static> BoundedMonitorBuffer<T> {
    /// Like `produce`, bounded by a deadline and/or a cancellation token
    ///
    /// On `Err` the slot is unchanged and the value comes back inside the error.
    pub fn produce_with(&self, value: T, policy: WaitPolicy<'_>) -> Result<(), ProduceError<T>> {
        let mut guard = self.monitor.enter();
        match self
            .not_full
            .wait_while_with(&mut guard, |slot| slot.is_occupied(), policy)
        {
            Ok(()) => {
                self.complete_produce(&mut guard, value);
                Ok(())
            }
            Err(reason) => {
                self.record_abandoned(&reason);
                debug!(monitor = %self.id(), error = %reason, "produce abandoned");
                Err(ProduceError::new(value, reason))
            }
        }
    }

    /// Like `consume`, bounded by a deadline and/or a cancellation token
    ///
    /// On `Err` no value was taken and the slot is unchanged.
    pub fn consume_with(&self, policy: WaitPolicy<'_>) -> HandoffResult<T> {
        let mut guard = self.monitor.enter();
        match self
            .not_empty
            .wait_until_some_with(&mut guard, Slot::take, policy)
        {
            Ok(value) => {
                self.complete_consume(&guard);
                Ok(value)
            }
            Err(reason) => {
                self.record_abandoned(&reason);
                debug!(monitor = %self.id(), error = %reason, "consume abandoned");
                Err(reason)
            }
        }
    }

    pub fn produce_timeout(&self, value: T, timeout: Duration) -> Result<(), ProduceError<T>> {
        self.produce_with(value, WaitPolicy::timeout(timeout))
    }

    pub fn consume_timeout(&self, timeout: Duration) -> HandoffResult<T> {
        self.consume_with(WaitPolicy::timeout(timeout))
    }
}

impl<T> Default for BoundedMonitorBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BoundedMonitorBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedMonitorBuffer")
            .field("monitor", &self.id())
            .field("counters", &self.counters())
            .finish()
    }
}
