/*!
 * Producer/Consumer Drivers
 *
 * Finite driver loops that exercise a shared `BoundedMonitorBuffer`, the
 * activities they run on, and the harness that wires one of each together.
 * Producer and consumer know nothing of each other's progress; the buffer is
 * their only coordination.
 */

mod activity;
mod config;
mod consumer;
mod harness;
mod producer;

pub use activity::{Activity, ActivityHandle};
pub use config::DemoConfig;
pub use consumer::Consumer;
pub use harness::{run_handoff, run_handoff_with, RunReport};
pub use producer::Producer;

use crate::core::errors::HandoffResult;
use crate::core::sync::CancellationToken;
use std::time::Duration;

/// Sleep between iterations, abandoning early if `cancel` fires
pub(crate) fn pace(pacing: Duration, cancel: Option<&CancellationToken>) -> HandoffResult<()> {
    if pacing.is_zero() {
        return Ok(());
    }
    match cancel {
        Some(token) => token.sleep(pacing),
        None => {
            std::thread::sleep(pacing);
            Ok(())
        }
    }
}

/// Spawn a driver run that cancels `cancel` unless it completes successfully
///
/// Errors and panics both release peers blocked on the shared buffer.
pub(crate) fn spawn_guarded<R, F>(
    name: impl Into<String>,
    cancel: Option<CancellationToken>,
    run: F,
) -> HandoffResult<ActivityHandle<HandoffResult<R>>>
where
    F: FnOnce() -> HandoffResult<R> + Send + 'static,
    R: Send + 'static,
{
    let span = tracing::Span::current();
    Activity::spawn(name, move || {
        let _entered = span.enter();
        let guard = cancel.as_ref().map(CancellationToken::drop_guard);
        let result = run();
        if result.is_ok() {
            if let Some(guard) = guard {
                guard.disarm();
            }
        }
        result
    })
}
