/*!
 * Hand-off Demo - Main Entry Point
 *
 * Runs one producer and one consumer over a single-slot buffer and prints the
 * run report as JSON.
 */

use anyhow::{bail, Context};
use monitor_handoff::{init_tracing, run_handoff, DemoConfig};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize structured tracing
    init_tracing();

    let config = DemoConfig::from_env().context("Failed to load HANDOFF_* configuration")?;
    info!(
        iterations = config.iterations,
        signal = config.signal.name(),
        "Hand-off demo starting"
    );

    let report = run_handoff(&config).context("Hand-off run failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize run report")?
    );

    if !report.is_exact() {
        bail!(
            "consumer observed {:?}, expected {:?}",
            report.consumed,
            report.produced
        );
    }

    info!(run_id = %report.run_id, "Hand-off demo finished");
    Ok(())
}
