/*!
 * Monitor
 *
 * Explicit mutual exclusion over a piece of state, the owning half of a
 * mutex/condition pair. Conditions created from a monitor are bound to it by
 * `MonitorId` and refuse guards from any other monitor.
 *
 * # Design: RAII Guard Over Manual Unlock
 *
 * Exclusive access is a `MonitorGuard` borrowed from the monitor. Every exit path,
 * including cancelled or timed-out waits and unwinding panics, drops the guard and
 * releases the mutex.
 */

use super::condition::Condition;
use super::config::{SignalPolicy, SyncConfig};
use crate::core::types::MonitorId;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Process-unique token for the calling thread (never 0)
fn current_thread_token() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static TOKEN: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TOKEN.with(|token| *token)
}

pub(crate) struct Shared<S> {
    pub(crate) id: MonitorId,
    pub(crate) state: Mutex<S>,
    /// Thread token of the current guard holder, 0 when unowned or suspended
    holder: AtomicU64,
}

impl<S> Shared<S> {
    /// Whether the calling thread holds this monitor right now
    pub(crate) fn held_by_current_thread(&self) -> bool {
        self.holder.load(Ordering::Acquire) == current_thread_token()
    }

    /// Only called with the mutex held
    pub(crate) fn mark_held(&self) {
        self.holder.store(current_thread_token(), Ordering::Release);
    }

    /// Only called with the mutex held
    pub(crate) fn mark_released(&self) {
        self.holder.store(0, Ordering::Release);
    }
}

/// Mutex-guarded state with an identity that conditions can be bound to
pub struct Monitor<S> {
    shared: Arc<Shared<S>>,
    config: SyncConfig,
}

impl<S> Monitor<S> {
    /// Create a monitor using the default signal policy for its conditions
    pub fn new(state: S) -> Self {
        Self::with_config(state, SyncConfig::default())
    }

    pub fn with_config(state: S, config: SyncConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: MonitorId::next(),
                state: Mutex::new(state),
                holder: AtomicU64::new(0),
            }),
            config,
        }
    }

    #[inline]
    pub fn id(&self) -> MonitorId {
        self.shared.id
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// Acquire exclusive access, blocking until the mutex is free
    #[inline]
    pub fn enter(&self) -> MonitorGuard<'_, S> {
        MonitorGuard::new(&self.shared, self.shared.state.lock())
    }

    /// Acquire exclusive access only if nobody holds it right now
    pub fn try_enter(&self) -> Option<MonitorGuard<'_, S>> {
        self.shared
            .state
            .try_lock()
            .map(|inner| MonitorGuard::new(&self.shared, inner))
    }

    /// Acquire exclusive access, giving up after `timeout`
    pub fn try_enter_for(&self, timeout: Duration) -> Option<MonitorGuard<'_, S>> {
        self.shared
            .state
            .try_lock_for(timeout)
            .map(|inner| MonitorGuard::new(&self.shared, inner))
    }

    /// Run `f` with exclusive access to the state
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.enter();
        f(&mut *guard)
    }

    /// Create a condition bound to this monitor using the monitor's signal policy
    pub fn new_condition(&self) -> Condition<S> {
        self.new_condition_with(self.config.signal)
    }

    pub fn new_condition_with(&self, policy: SignalPolicy) -> Condition<S> {
        Condition::bound_to(Arc::clone(&self.shared), policy)
    }
}

impl<S: Default> Default for Monitor<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> fmt::Debug for Monitor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("id", &self.shared.id)
            .field("locked", &self.shared.state.is_locked())
            .field("config", &self.config)
            .finish()
    }
}

/// Proof of exclusive access to a monitor's state
pub struct MonitorGuard<'a, S> {
    pub(crate) owner: MonitorId,
    pub(crate) shared: &'a Shared<S>,
    pub(crate) inner: MutexGuard<'a, S>,
}

impl<'a, S> MonitorGuard<'a, S> {
    fn new(shared: &'a Shared<S>, inner: MutexGuard<'a, S>) -> Self {
        shared.mark_held();
        Self {
            owner: shared.id,
            shared,
            inner,
        }
    }

    /// Monitor this guard was issued by
    #[inline]
    pub fn monitor_id(&self) -> MonitorId {
        self.owner
    }
}

impl<S> Drop for MonitorGuard<'_, S> {
    fn drop(&mut self) {
        self.shared.mark_released();
    }
}

impl<S> Deref for MonitorGuard<'_, S> {
    type Target = S;

    #[inline]
    fn deref(&self) -> &S {
        &self.inner
    }
}

impl<S> DerefMut for MonitorGuard<'_, S> {
    #[inline]
    fn deref_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}
