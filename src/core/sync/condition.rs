/*!
 * Condition Signaling
 *
 * Explicit condition variable bound to one `Monitor`, with the same
 * release-on-wait / re-acquire-on-wake semantics as a built-in object monitor.
 *
 * # Design: Recheck Loop Over Single Wait
 *
 * A single `wait` may return without the awaited state having changed (spurious
 * wakeup, broadcast, or a signal aimed at the other side). The `wait_while*` and
 * `wait_until_some*` families therefore evaluate the caller's check under the lock
 * before every suspension and after every wake, and only return once it passes or
 * the wait is abandoned.
 *
 * # Contract
 *
 * Every method taking a `MonitorGuard` panics if the guard was issued by a
 * different monitor ("illegal monitor state"). Runtime outcomes (cancellation,
 * deadline) are reported through `HandoffResult`.
 */

use super::cancel::{CancellationToken, Registration, Waker};
use super::config::SignalPolicy;
use super::monitor::{MonitorGuard, Shared};
use super::traits::WakeResult;
use crate::core::errors::{HandoffError, HandoffResult};
use crate::core::types::MonitorId;
use parking_lot::Condvar;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Bounds on a single wait: optional deadline and optional cancellation token
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitPolicy<'t> {
    deadline: Option<Instant>,
    cancel: Option<&'t CancellationToken>,
}

impl<'t> WaitPolicy<'t> {
    /// Wait until the condition holds, however long that takes
    pub const fn forever() -> Self {
        Self {
            deadline: None,
            cancel: None,
        }
    }

    /// Give up after `timeout` (an unrepresentable deadline means no deadline)
    pub fn timeout(timeout: Duration) -> Self {
        Self::forever().with_timeout(timeout)
    }

    pub fn deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    pub fn cancellable(token: &'t CancellationToken) -> Self {
        Self::forever().cancel_on(token)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn cancel_on(mut self, token: &'t CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> Option<&'t CancellationToken> {
        self.cancel
    }
}

/// Condition variable bound to a single monitor
pub struct Condition<S> {
    shared: Arc<Shared<S>>,
    condvar: Arc<Condvar>,
    policy: SignalPolicy,
    /// Current suspended waiters (mutated only under the monitor lock)
    waiters: AtomicUsize,
    /// Total suspensions since creation
    waits: AtomicU64,
}

impl<S> Condition<S> {
    pub(crate) fn bound_to(shared: Arc<Shared<S>>, policy: SignalPolicy) -> Self {
        Self {
            shared,
            condvar: Arc::new(Condvar::new()),
            policy,
            waiters: AtomicUsize::new(0),
            waits: AtomicU64::new(0),
        }
    }

    /// Monitor this condition belongs to
    #[inline]
    pub fn monitor_id(&self) -> MonitorId {
        self.shared.id
    }

    #[inline]
    pub fn policy(&self) -> SignalPolicy {
        self.policy
    }

    /// Whether `guard` grants the exclusive access this condition requires
    #[inline]
    pub fn is_bound_to(&self, guard: &MonitorGuard<'_, S>) -> bool {
        guard.owner == self.shared.id
    }

    #[track_caller]
    fn assert_bound(&self, guard: &MonitorGuard<'_, S>) {
        if !self.is_bound_to(guard) {
            panic!(
                "illegal monitor state: condition of {} used with a guard of {}",
                self.shared.id, guard.owner
            );
        }
    }

    /// Suspend once, releasing the monitor until signalled
    ///
    /// May return spuriously; callers that need a state change should use
    /// `wait_while`.
    #[track_caller]
    pub fn wait(&self, guard: &mut MonitorGuard<'_, S>) {
        self.assert_bound(guard);
        self.suspend(guard, None);
    }

    /// Suspend while `blocked` holds, rechecking after every wake
    #[track_caller]
    pub fn wait_while<F>(&self, guard: &mut MonitorGuard<'_, S>, mut blocked: F)
    where
        F: FnMut(&mut S) -> bool,
    {
        self.wait_until_some(guard, |state| (!blocked(state)).then_some(()))
    }

    /// Suspend until `ready` yields a value, rechecking after every wake
    ///
    /// `ready` runs under the lock, so it can test and mutate the state in one step.
    #[track_caller]
    pub fn wait_until_some<R, F>(&self, guard: &mut MonitorGuard<'_, S>, mut ready: F) -> R
    where
        F: FnMut(&mut S) -> Option<R>,
    {
        self.assert_bound(guard);
        loop {
            if let Some(out) = ready(&mut *guard.inner) {
                return out;
            }
            self.suspend(guard, None);
        }
    }

    /// Suspend while `blocked` holds, honoring a deadline and a cancellation token
    #[track_caller]
    pub fn wait_while_with<F>(
        &self,
        guard: &mut MonitorGuard<'_, S>,
        mut blocked: F,
        policy: WaitPolicy<'_>,
    ) -> HandoffResult<()>
    where
        F: FnMut(&mut S) -> bool,
        S: Send + 'static,
    {
        self.wait_until_some_with(guard, |state| (!blocked(state)).then_some(()), policy)
    }

    /// Suspend until `ready` yields a value, honoring a deadline and a cancellation token
    ///
    /// Cancellation and deadlines only matter when the caller would actually
    /// suspend: if `ready` succeeds on a check, its value is returned even when the
    /// token has fired. On `Err` the guard is still held and `ready` has not
    /// succeeded, so the state is whatever the last failed check left.
    #[track_caller]
    pub fn wait_until_some_with<R, F>(
        &self,
        guard: &mut MonitorGuard<'_, S>,
        mut ready: F,
        policy: WaitPolicy<'_>,
    ) -> HandoffResult<R>
    where
        F: FnMut(&mut S) -> Option<R>,
        S: Send + 'static,
    {
        self.assert_bound(guard);
        let started = Instant::now();
        let mut registration: Option<Registration> = None;

        loop {
            if let Some(out) = ready(&mut *guard.inner) {
                return Ok(out);
            }

            if let Some(token) = policy.cancel {
                if token.is_cancelled() {
                    trace!(monitor = %self.shared.id, "wait abandoned: cancelled");
                    return Err(HandoffError::Cancelled);
                }
                if registration.is_none() {
                    registration = Some(token.register(self.cancel_waker())?);
                }
            }

            if let Some(deadline) = policy.deadline {
                if Instant::now() >= deadline {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    trace!(monitor = %self.shared.id, elapsed_ms, "wait abandoned: deadline");
                    return Err(HandoffError::Timeout { elapsed_ms });
                }
            }

            self.suspend(guard, policy.deadline);
        }
    }

    /// Wake waiters according to the condition's signal policy
    #[track_caller]
    pub fn signal(&self, guard: &MonitorGuard<'_, S>) -> WakeResult {
        self.assert_bound(guard);
        match self.policy {
            SignalPolicy::One => WakeResult::from_count(self.condvar.notify_one() as usize),
            SignalPolicy::Broadcast => WakeResult::from_count(self.condvar.notify_all()),
        }
    }

    /// Wake every waiter regardless of policy
    #[track_caller]
    pub fn signal_all(&self, guard: &MonitorGuard<'_, S>) -> WakeResult {
        self.assert_bound(guard);
        WakeResult::from_count(self.condvar.notify_all())
    }

    /// Current number of suspended waiters (for diagnostics)
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }

    /// Total number of suspensions performed on this condition
    #[inline]
    pub fn total_waits(&self) -> u64 {
        self.waits.load(Ordering::Relaxed)
    }

    fn suspend(&self, guard: &mut MonitorGuard<'_, S>, deadline: Option<Instant>) {
        self.waiters.fetch_add(1, Ordering::Relaxed);
        self.waits.fetch_add(1, Ordering::Relaxed);

        self.shared.mark_released();
        match deadline {
            Some(deadline) => {
                self.condvar.wait_until(&mut guard.inner, deadline);
            }
            None => self.condvar.wait(&mut guard.inner),
        }
        self.shared.mark_held();

        self.waiters.fetch_sub(1, Ordering::Relaxed);
    }
}

impl<S: Send + 'static> Condition<S> {
    /// Waker that broadcasts on this condition under the monitor lock
    ///
    /// When the cancelling thread already holds the monitor, no waiter can be
    /// between its flag check and its suspension, so it broadcasts directly.
    fn cancel_waker(&self) -> Waker {
        let shared = Arc::clone(&self.shared);
        let condvar = Arc::clone(&self.condvar);
        Arc::new(move || {
            if shared.held_by_current_thread() {
                condvar.notify_all();
                return;
            }
            let _guard = shared.state.lock();
            condvar.notify_all();
        })
    }
}

impl<S> fmt::Debug for Condition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("monitor", &self.shared.id)
            .field("policy", &self.policy)
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
