/*!
 * Producer Driver
 * Pushes a finite sequence of values into a shared buffer, pacing between pushes
 */

use super::activity::ActivityHandle;
use super::{pace, spawn_guarded};
use crate::buffer::BoundedMonitorBuffer;
use crate::core::errors::HandoffResult;
use crate::core::sync::{CancellationToken, WaitPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Finite producer loop over a shared buffer
pub struct Producer<T, I> {
    buffer: Arc<BoundedMonitorBuffer<T>>,
    values: I,
    pacing: Duration,
    cancel: Option<CancellationToken>,
}

impl<T, I> Producer<T, I>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
{
    pub fn new(buffer: Arc<BoundedMonitorBuffer<T>>, values: I) -> Self {
        Self {
            buffer,
            values,
            pacing: Duration::ZERO,
            cancel: None,
        }
    }

    /// Delay after each push (affects interleaving only)
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Make waits and pacing abandon on `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Push every value, returning how many were handed off
    #[instrument(level = "debug", name = "producer", skip_all)]
    pub fn run(self) -> HandoffResult<usize> {
        let Self {
            buffer,
            values,
            pacing,
            cancel,
        } = self;

        let mut produced = 0usize;
        for value in values {
            match &cancel {
                Some(token) => buffer.produce_with(value, WaitPolicy::cancellable(token))?,
                None => buffer.produce(value),
            }
            produced += 1;
            debug!(monitor = %buffer.id(), produced, "pushed value");
            pace(pacing, cancel.as_ref())?;
        }

        Ok(produced)
    }
}

impl<T, I> Producer<T, I>
where
    T: Send + 'static,
    I: IntoIterator<Item = T> + Send + 'static,
{
    /// Run on a named activity
    ///
    /// With a cancellation token attached, a failing or panicking producer cancels
    /// the token so that peers blocked on the buffer are released.
    pub fn spawn(
        self,
        name: impl Into<String>,
    ) -> HandoffResult<ActivityHandle<HandoffResult<usize>>> {
        let cancel = self.cancel.clone();
        spawn_guarded(name, cancel, move || self.run())
    }
}
