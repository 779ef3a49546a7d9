/*!
 * Synchronization Configuration
 *
 * Runtime configuration for signal policy selection
 */

use crate::core::errors::HandoffError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a condition wakes waiters when its state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPolicy {
    /// Wake a single waiter (enough for one producer and one consumer)
    #[default]
    One,
    /// Wake every waiter; the recheck loop sends the losers back to sleep
    Broadcast,
}

impl SignalPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Broadcast => "broadcast",
        }
    }
}

impl FromStr for SignalPolicy {
    type Err = HandoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one" | "single" => Ok(Self::One),
            "broadcast" | "all" => Ok(Self::Broadcast),
            other => Err(HandoffError::InvalidConfig(format!(
                "unknown signal policy '{}', expected 'one' or 'broadcast'",
                other
            ))),
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Policy used by `Condition::signal`
    pub signal: SignalPolicy,
}

impl SyncConfig {
    /// Configuration that wakes exactly one waiter per state change
    pub const fn single() -> Self {
        Self {
            signal: SignalPolicy::One,
        }
    }

    /// Configuration that broadcasts every state change
    ///
    /// Useful with several producers or consumers sharing a buffer.
    pub const fn broadcast() -> Self {
        Self {
            signal: SignalPolicy::Broadcast,
        }
    }
}
