/*!
 * Hand-off Buffer
 *
 * Single-slot producer/consumer buffer built on the monitor primitives.
 */

mod handoff;
mod slot;

pub use handoff::BoundedMonitorBuffer;
pub use slot::BufferSnapshot;
