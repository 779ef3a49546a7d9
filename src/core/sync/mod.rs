/*!
 * Synchronization Primitives
 *
 * Explicit mutual exclusion plus condition signaling, the building blocks of the
 * hand-off buffer:
 * - `Monitor`: mutex-guarded state with an identity
 * - `Condition`: condition variable bound to one monitor, with recheck loops
 * - `CancellationToken`: cooperative cancellation observed at suspension points
 *
 * # Architecture
 *
 * A monitor owns the state; conditions borrow its mutex through a shared handle
 * and are created from it, so a condition can never be paired with the wrong
 * mutex without tripping the ownership check.
 */

mod cancel;
mod condition;
mod config;
mod monitor;
mod traits;

pub use cancel::{CancelOnDrop, CancellationToken, ChildToken};
pub use condition::{Condition, WaitPolicy};
pub use config::{SignalPolicy, SyncConfig};
pub use monitor::{Monitor, MonitorGuard};
pub use traits::WakeResult;
