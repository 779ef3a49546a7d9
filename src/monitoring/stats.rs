/*!
 * Hand-off Statistics
 * Seqlock-protected counters, cheap to read from any thread while the buffer runs
 */

use seqlock::SeqLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Point-in-time copy of the hand-off counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffCounters {
    /// Values placed into the slot
    pub produced: u64,
    /// Values taken out of the slot
    pub consumed: u64,
    /// Suspensions of producers on a full slot
    pub producer_waits: u64,
    /// Suspensions of consumers on an empty slot
    pub consumer_waits: u64,
    /// Waits abandoned through a cancellation token
    pub cancellations: u64,
    /// Waits abandoned at their deadline
    pub timeouts: u64,
    /// Non-blocking calls refused with `WouldBlock`
    pub rejected: u64,
}

impl HandoffCounters {
    /// Values produced but not yet consumed (0 or 1 for a single slot)
    #[inline]
    pub fn in_flight(&self) -> u64 {
        self.produced.saturating_sub(self.consumed)
    }
}

/// Shared hand-off statistics
///
/// # Performance
///
/// - **Reads**: Lock-free (sequence number check and retry)
/// - **Writes**: Serialized by the seqlock; callers already hold the buffer lock
#[derive(Clone)]
pub struct HandoffStats {
    inner: Arc<SeqLock<HandoffCounters>>,
}

impl HandoffStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SeqLock::new(HandoffCounters::default())),
        }
    }

    /// Read current counters (lock-free)
    #[inline(always)]
    pub fn read(&self) -> HandoffCounters {
        self.inner.read()
    }

    /// Update counters with a closure
    #[inline]
    pub fn record<F>(&self, f: F)
    where
        F: FnOnce(&mut HandoffCounters),
    {
        let mut guard = self.inner.lock_write();
        f(&mut *guard);
    }

    /// Reset every counter to zero
    pub fn reset(&self) {
        *self.inner.lock_write() = HandoffCounters::default();
    }
}

impl Default for HandoffStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandoffStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HandoffStats").field(&self.read()).finish()
    }
}
