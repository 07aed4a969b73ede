//! Metrics-aggregation sidecar.
//!
//! Runs the ostinato pipeline as a standalone process: measurements arrive
//! over HTTP, accumulate across rolling generations, and are served back to
//! a scrape-based collector from `/metrics` alongside the sidecar's own
//! process metrics.

mod http;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ostinato::{Aggregator, AggregatorConfig};

/// ostinato-sidecar — windowed metrics aggregation behind a scrape endpoint.
#[derive(Parser)]
#[command(name = "ostinato-sidecar", version, about)]
struct Cli {
    /// Prefix prepended to every ingested series name.
    #[arg(long, default_value = "")]
    prefix: String,

    /// Port for the HTTP endpoint.
    #[arg(long, default_value = "9100")]
    port: u16,

    /// Seconds between rollup ticks.
    #[arg(long, default_value = "10")]
    rollup_period_secs: u64,

    /// Rollup ticks between store rotations.
    #[arg(long, default_value = "6")]
    rotate_every: u32,

    /// Number of retained store generations.
    #[arg(long, default_value = "2")]
    generations: usize,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AggregatorConfig {
        prefix: cli.prefix,
        rollup_period: Duration::from_secs(cli.rollup_period_secs),
        rotate_every: cli.rotate_every,
        generations: cli.generations,
    };

    let aggregator = match Aggregator::spawn(config) {
        Ok(aggregator) => Arc::new(aggregator),
        Err(e) => {
            tracing::error!("failed to start aggregator: {e}");
            std::process::exit(1);
        }
    };

    http::run_server(aggregator, cli.port);
}
