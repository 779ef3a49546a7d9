/*!
 * Slot State
 * The single hand-off cell and its observable snapshot
 */

use crate::core::types::MonitorId;
use crate::monitoring::HandoffCounters;
use serde::{Deserialize, Serialize};

/// Occupancy of the single slot
///
/// The variant is the occupancy flag: no payload value, including a "null-like"
/// one, can be mistaken for emptiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot<T> {
    Empty,
    Full(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<T> Slot<T> {
    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Slot::Full(_))
    }

    /// Take the value out, leaving the slot empty
    #[inline]
    pub(crate) fn take(&mut self) -> Option<T> {
        match std::mem::take(self) {
            Slot::Full(value) => Some(value),
            Slot::Empty => None,
        }
    }
}

/// Observable state of a buffer at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSnapshot {
    pub monitor: MonitorId,
    /// True iff exactly one produced, unconsumed value is held
    pub occupied: bool,
    /// Producers currently suspended on a full slot
    pub waiting_producers: usize,
    /// Consumers currently suspended on an empty slot
    pub waiting_consumers: usize,
    pub counters: HandoffCounters,
}
