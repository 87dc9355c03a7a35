//! Capysense entry point: read each host sensor once and print the report.

use std::sync::Arc;

use capysense_sensors::{SensorSuite, TracingSink};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so the report on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting capysense");

    let suite = SensorSuite::standard(Arc::new(TracingSink));

    // Sensors that fail print as `n/a`; the readout itself always succeeds.
    for reading in suite.read_all() {
        println!("{reading}");
    }

    Ok(())
}
