/*!
 * Activities
 *
 * Independently scheduled units of work. An activity is a plain closure handed to
 * `Activity::spawn`, which runs it on its own named OS thread.
 */

use crate::core::errors::{HandoffError, HandoffResult};
use std::any::Any;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Constructor for named activities
pub struct Activity;

impl Activity {
    /// Run `f` on a new thread called `name`
    pub fn spawn<F, R>(name: impl Into<String>, f: F) -> HandoffResult<ActivityHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let name = name.into();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .map_err(|e| HandoffError::Spawn(e.to_string()))?;

        debug!(activity = %name, "activity started");
        Ok(ActivityHandle { name, handle })
    }
}

/// Handle to a running activity
pub struct ActivityHandle<R> {
    name: String,
    handle: JoinHandle<R>,
}

impl<R> ActivityHandle<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the activity to complete
    ///
    /// A panic inside the activity becomes `HandoffError::ActivityPanicked`.
    pub fn join(self) -> HandoffResult<R> {
        match self.handle.join() {
            Ok(value) => {
                debug!(activity = %self.name, "activity finished");
                Ok(value)
            }
            Err(payload) => {
                error!(
                    activity = %self.name,
                    panic = panic_message(payload.as_ref()),
                    "activity panicked"
                );
                Err(HandoffError::ActivityPanicked { name: self.name })
            }
        }
    }
}

impl<R> ActivityHandle<HandoffResult<R>> {
    /// Join an activity that itself returns a `HandoffResult`
    pub fn join_flatten(self) -> HandoffResult<R> {
        self.join().and_then(|result| result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
