/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Common result type for hand-off operations
pub type HandoffResult<T> = Result<T, HandoffError>;

/// Hand-off errors with serialization support
///
/// Contract violations (using a condition with a foreign monitor guard) are not
/// represented here: they panic at the call site.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum HandoffError {
    #[error("Wait was cancelled")]
    #[diagnostic(
        code(handoff::cancelled),
        help("The cancellation token was triggered while the activity was suspended.")
    )]
    Cancelled,

    #[error("Wait timed out after {elapsed_ms}ms")]
    #[diagnostic(
        code(handoff::timeout),
        help("The buffer state did not change before the deadline. The slot is untouched.")
    )]
    Timeout { elapsed_ms: u64 },

    #[error("Operation would block")]
    #[diagnostic(
        code(handoff::would_block),
        help("The slot is in the wrong state for a non-blocking call; retry or block")
    )]
    WouldBlock,

    #[error("Activity '{name}' panicked")]
    #[diagnostic(
        code(handoff::activity_panicked),
        help("A producer or consumer closure panicked. Check logs for the panic message.")
    )]
    ActivityPanicked { name: String },

    #[error("Failed to spawn activity: {0}")]
    #[diagnostic(
        code(handoff::spawn_failed),
        help("The OS refused to create a thread. Check system thread limits.")
    )]
    Spawn(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(handoff::invalid_config),
        help("Check HANDOFF_* environment variables.")
    )]
    InvalidConfig(String),
}

impl HandoffError {
    /// Whether the error came from an abandoned suspension (cancel or deadline)
    #[inline]
    pub fn is_abandoned_wait(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout { .. })
    }
}

/// A produce that did not complete, handing the unsent value back
///
/// The slot is left exactly as it was before the call.
#[derive(Error, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ProduceError<T> {
    pub value: T,
    pub reason: HandoffError,
}

impl<T> ProduceError<T> {
    pub fn new(value: T, reason: HandoffError) -> Self {
        Self { value, reason }
    }

    /// Recover the value that was not handed off
    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn reason(&self) -> &HandoffError {
        &self.reason
    }
}

// Payloads need not be Debug
impl<T> fmt::Debug for ProduceError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProduceError")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<T> From<ProduceError<T>> for HandoffError {
    fn from(err: ProduceError<T>) -> Self {
        err.reason
    }
}
