/*!
 * Consumer Driver
 * Pulls a fixed number of values out of a shared buffer, pacing between pulls
 */

use super::activity::ActivityHandle;
use super::{pace, spawn_guarded};
use crate::buffer::BoundedMonitorBuffer;
use crate::core::errors::HandoffResult;
use crate::core::sync::{CancellationToken, WaitPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Finite consumer loop over a shared buffer
pub struct Consumer<T> {
    buffer: Arc<BoundedMonitorBuffer<T>>,
    count: usize,
    pacing: Duration,
    cancel: Option<CancellationToken>,
}

impl<T: Send + 'static> Consumer<T> {
    pub fn new(buffer: Arc<BoundedMonitorBuffer<T>>, count: usize) -> Self {
        Self {
            buffer,
            count,
            pacing: Duration::ZERO,
            cancel: None,
        }
    }

    /// Delay after each pull (affects interleaving only)
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Make waits and pacing abandon on `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Pull `count` values, returning them in hand-off order
    #[instrument(level = "debug", name = "consumer", skip_all)]
    pub fn run(self) -> HandoffResult<Vec<T>> {
        let mut consumed = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let value = match &self.cancel {
                Some(token) => self.buffer.consume_with(WaitPolicy::cancellable(token))?,
                None => self.buffer.consume(),
            };
            consumed.push(value);
            debug!(monitor = %self.buffer.id(), consumed = consumed.len(), "pulled value");
            pace(self.pacing, self.cancel.as_ref())?;
        }

        Ok(consumed)
    }

    /// Run on a named activity
    ///
    /// With a cancellation token attached, a failing or panicking consumer cancels
    /// the token so that peers blocked on the buffer are released.
    pub fn spawn(
        self,
        name: impl Into<String>,
    ) -> HandoffResult<ActivityHandle<HandoffResult<Vec<T>>>> {
        let cancel = self.cancel.clone();
        spawn_guarded(name, cancel, move || self.run())
    }
}
