/*!
 * Run Harness
 *
 * Builds one buffer, starts one producer and one consumer activity, and waits
 * for both to complete explicitly rather than sleeping for a fixed time.
 */

use super::config::DemoConfig;
use super::consumer::Consumer;
use super::producer::Producer;
use crate::buffer::BoundedMonitorBuffer;
use crate::core::errors::{HandoffError, HandoffResult};
use crate::core::sync::CancellationToken;
use crate::core::types::Value;
use crate::monitoring::{HandoffCounters, RunSpan};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of a completed run
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    /// Values in the order the producer pushed them
    pub produced: Vec<Value>,
    /// Values in the order the consumer received them
    pub consumed: Vec<Value>,
    pub counters: HandoffCounters,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub elapsed: Duration,
}

impl RunReport {
    /// Every produced value arrived once, in order
    pub fn is_exact(&self) -> bool {
        self.produced == self.consumed
    }
}

/// Run one producer and one consumer to completion
pub fn run_handoff(config: &DemoConfig) -> HandoffResult<RunReport> {
    run_handoff_with(config, CancellationToken::new())
}

/// Like `run_handoff`, abandoning both activities when `cancel` fires
///
/// A cancelled run returns `Err(HandoffError::Cancelled)`; the buffer lock is never
/// left held. A failing activity only cancels a run-local child of `cancel`, so the
/// caller's token stays usable for later runs.
pub fn run_handoff_with(
    config: &DemoConfig,
    cancel: CancellationToken,
) -> HandoffResult<RunReport> {
    let run_cancel = cancel.child();
    let run = RunSpan::new(config.iterations);
    let _entered = run.enter();
    let started = Instant::now();

    let buffer = Arc::new(BoundedMonitorBuffer::with_config(config.sync_config()));
    let produced: Vec<Value> = (1..=config.iterations as Value).collect();

    info!(
        run_id = run.run_id(),
        iterations = config.iterations,
        producer_delay_ms = config.producer_delay.as_millis() as u64,
        consumer_delay_ms = config.consumer_delay.as_millis() as u64,
        signal = config.signal.name(),
        "starting hand-off run"
    );

    let producer = Producer::new(Arc::clone(&buffer), produced.clone())
        .with_pacing(config.producer_delay)
        .with_cancellation(run_cancel.token().clone())
        .spawn("producer")?;

    let consumer = match Consumer::new(Arc::clone(&buffer), config.iterations)
        .with_pacing(config.consumer_delay)
        .with_cancellation(run_cancel.token().clone())
        .spawn("consumer")
    {
        Ok(handle) => handle,
        Err(e) => {
            // Release the producer, which may be parked on a full slot
            run_cancel.cancel();
            let _ = producer.join();
            return Err(e);
        }
    };

    let producer_result = producer.join_flatten();
    let consumer_result = consumer.join_flatten();

    let consumed = match (producer_result, consumer_result) {
        (Ok(_), Ok(consumed)) => consumed,
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(failed(&run, e)),
        // Prefer the root cause over the cancellation it triggered in the peer
        (Err(HandoffError::Cancelled), Err(e)) | (Err(e), Err(_)) => {
            return Err(failed(&run, e))
        }
    };

    let report = RunReport {
        run_id: run.run_id().to_string(),
        produced,
        consumed,
        counters: buffer.counters(),
        elapsed: started.elapsed(),
    };

    run.record_handoffs(report.counters.consumed);
    run.record_result(report.is_exact());
    info!(
        run_id = run.run_id(),
        handoffs = report.counters.consumed,
        producer_waits = report.counters.producer_waits,
        consumer_waits = report.counters.consumer_waits,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "hand-off run complete"
    );

    Ok(report)
}

fn failed(run: &RunSpan, error: HandoffError) -> HandoffError {
    run.record_result(false);
    warn!(run_id = run.run_id(), error = %error, "hand-off run failed");
    error
}
