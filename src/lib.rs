/*!
 * Monitor Hand-off Library
 * Single-slot producer/consumer hand-off over an explicit mutex and condition pair
 */

pub mod buffer;
pub mod core;
pub mod drivers;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{HandoffError, HandoffResult, ProduceError};
pub use crate::core::sync::{
    CancellationToken, Condition, Monitor, MonitorGuard, SignalPolicy, SyncConfig, WaitPolicy,
    WakeResult,
};
pub use crate::core::types::{MonitorId, Value};
pub use buffer::{BoundedMonitorBuffer, BufferSnapshot};
pub use drivers::{
    run_handoff, run_handoff_with, Activity, ActivityHandle, Consumer, DemoConfig, Producer,
    RunReport,
};
pub use monitoring::{init_tracing, HandoffCounters, HandoffStats};
