/*!
 * Demo Configuration
 *
 * Defaults reproduce the reference run; every field can be overridden from the
 * environment.
 */

use crate::core::errors::{HandoffError, HandoffResult};
use crate::core::sync::{SignalPolicy, SyncConfig};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::str::FromStr;
use std::time::Duration;

/// Hand-offs per run
pub const DEFAULT_ITERATIONS: usize = 5;
/// Producer pause after each push
pub const DEFAULT_PRODUCER_DELAY: Duration = Duration::from_millis(1000);
/// Consumer pause after each pull
pub const DEFAULT_CONSUMER_DELAY: Duration = Duration::from_millis(1500);

pub const ENV_ITERATIONS: &str = "HANDOFF_ITERATIONS";
pub const ENV_PRODUCER_DELAY_MS: &str = "HANDOFF_PRODUCER_DELAY_MS";
pub const ENV_CONSUMER_DELAY_MS: &str = "HANDOFF_CONSUMER_DELAY_MS";
pub const ENV_SIGNAL: &str = "HANDOFF_SIGNAL";

/// Configuration of one producer/consumer run
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub iterations: usize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub producer_delay: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub consumer_delay: Duration,
    pub signal: SignalPolicy,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            producer_delay: DEFAULT_PRODUCER_DELAY,
            consumer_delay: DEFAULT_CONSUMER_DELAY,
            signal: SignalPolicy::One,
        }
    }
}

impl DemoConfig {
    /// Run without pacing (tests, benchmarks)
    pub fn unpaced(iterations: usize) -> Self {
        Self {
            iterations,
            producer_delay: Duration::ZERO,
            consumer_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn with_signal(mut self, signal: SignalPolicy) -> Self {
        self.signal = signal;
        self
    }

    /// Defaults overridden by any `HANDOFF_*` variables that are set
    pub fn from_env() -> HandoffResult<Self> {
        let mut config = Self::default();

        if let Some(iterations) = env_parse::<usize>(ENV_ITERATIONS)? {
            config.iterations = iterations;
        }
        if let Some(ms) = env_parse::<u64>(ENV_PRODUCER_DELAY_MS)? {
            config.producer_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>(ENV_CONSUMER_DELAY_MS)? {
            config.consumer_delay = Duration::from_millis(ms);
        }
        if let Some(signal) = env_parse::<SignalPolicy>(ENV_SIGNAL)? {
            config.signal = signal;
        }

        Ok(config)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            signal: self.signal,
        }
    }
}

fn env_parse<T>(key: &str) -> HandoffResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| HandoffError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(HandoffError::InvalidConfig(format!("{}: {}", key, e))),
    }
}
