/*!
 * Cooperative Cancellation
 *
 * A shared flag checked at suspension points. Cancelling never forcibly stops an
 * activity: suspended waiters are woken, observe the flag, and return
 * `HandoffError::Cancelled` to their caller.
 *
 * # Wake Protocol
 *
 * A waiter registers a waker before it suspends. `cancel()` sets the flag first and
 * then runs every registered waker outside the token's own lock. A waker re-acquires
 * the waiter's monitor before broadcasting, so a cancel racing with entry into a wait
 * cannot slip between the waiter's flag check and its suspension. A canceller that
 * already holds that monitor broadcasts without re-acquiring it.
 */

use crate::core::errors::{HandoffError, HandoffResult};
use ahash::AHashMap;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// Callback run once when the token is cancelled
pub(crate) type Waker = Arc<dyn Fn() + Send + Sync>;

struct Registry {
    next_id: u64,
    wakers: AHashMap<u64, Waker>,
}

struct TokenInner {
    cancelled: AtomicBool,
    registry: Mutex<Registry>,
    /// Parks cancellable sleepers
    sleepers: Condvar,
}

/// Shared cancellation flag for producers, consumers and their waits
///
/// Cloning is cheap and every clone observes the same flag.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                registry: Mutex::new(Registry {
                    next_id: 0,
                    wakers: AHashMap::new(),
                }),
                sleepers: Condvar::new(),
            }),
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation and wake everything suspended on this token
    ///
    /// Idempotent. May be called while holding a `MonitorGuard`.
    pub fn cancel(&self) {
        let wakers: Vec<Waker> = {
            let mut registry = self.inner.registry.lock();
            if self.inner.cancelled.swap(true, Ordering::AcqRel) {
                return;
            }
            self.inner.sleepers.notify_all();
            registry.wakers.drain().map(|(_, waker)| waker).collect()
        };

        debug!(waiters = wakers.len(), "cancellation requested");
        for waker in wakers {
            waker();
        }
    }

    /// Register a waker for the duration of a suspension
    ///
    /// Returns `Err(Cancelled)` when the token has already fired, in which case the
    /// caller must not suspend.
    pub(crate) fn register(&self, waker: Waker) -> HandoffResult<Registration> {
        let mut registry = self.inner.registry.lock();
        if self.is_cancelled() {
            return Err(HandoffError::Cancelled);
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.wakers.insert(id, waker);
        Ok(Registration {
            token: Arc::clone(&self.inner),
            id,
        })
    }

    /// Sleep for `duration` unless cancelled first
    pub fn sleep(&self, duration: Duration) -> HandoffResult<()> {
        let deadline = match Instant::now().checked_add(duration) {
            Some(deadline) => deadline,
            None => return self.sleep_until_cancelled(),
        };

        let mut registry = self.inner.registry.lock();
        loop {
            if self.is_cancelled() {
                return Err(HandoffError::Cancelled);
            }
            if self
                .inner
                .sleepers
                .wait_until(&mut registry, deadline)
                .timed_out()
            {
                return if self.is_cancelled() {
                    Err(HandoffError::Cancelled)
                } else {
                    Ok(())
                };
            }
        }
    }

    fn sleep_until_cancelled(&self) -> HandoffResult<()> {
        let mut registry = self.inner.registry.lock();
        while !self.is_cancelled() {
            self.inner.sleepers.wait(&mut registry);
        }
        Err(HandoffError::Cancelled)
    }

    /// Derive a token that is cancelled with this one but can also be cancelled alone
    ///
    /// Cancelling the child never cancels the parent. The link is removed when the
    /// returned `ChildToken` is dropped.
    pub fn child(&self) -> ChildToken {
        let token = CancellationToken::new();
        let weak: Weak<TokenInner> = Arc::downgrade(&token.inner);

        let link = self.register(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                CancellationToken { inner }.cancel();
            }
        }));

        let link = match link {
            Ok(registration) => Some(registration),
            Err(_) => {
                token.cancel();
                None
            }
        };

        ChildToken {
            token,
            link,
        }
    }

    /// Guard that cancels this token when dropped, unless disarmed first
    ///
    /// Lets an activity that fails or panics release every peer blocked on it.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            token: Some(self.clone()),
        }
    }

    /// Number of suspensions currently registered (for diagnostics)
    pub fn registered_waiters(&self) -> usize {
        self.inner.registry.lock().wakers.len()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Token linked to a parent for as long as it is alive
pub struct ChildToken {
    token: CancellationToken,
    link: Option<Registration>,
}

impl ChildToken {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Deref for ChildToken {
    type Target = CancellationToken;

    fn deref(&self) -> &CancellationToken {
        &self.token
    }
}

impl fmt::Debug for ChildToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildToken")
            .field("cancelled", &self.token.is_cancelled())
            .field("linked", &self.link.is_some())
            .finish()
    }
}

/// Cancels its token on drop unless `disarm` was called
#[must_use = "dropping the guard immediately cancels the token"]
pub struct CancelOnDrop {
    token: Option<CancellationToken>,
}

impl CancelOnDrop {
    /// Keep the token alive; returns it for further use
    pub fn disarm(mut self) -> CancellationToken {
        match self.token.take() {
            Some(token) => token,
            None => CancellationToken::new(),
        }
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

/// Removes a waker from its token on drop
pub(crate) struct Registration {
    token: Arc<TokenInner>,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.token.registry.lock().wakers.remove(&self.id);
    }
}
