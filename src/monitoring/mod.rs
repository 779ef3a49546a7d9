/*!
 * Monitoring
 * Structured tracing and hand-off statistics
 */

mod stats;
mod tracer;

pub use stats::{HandoffCounters, HandoffStats};
pub use tracer::{generate_run_id, init_tracing, RunSpan};
