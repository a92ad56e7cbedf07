//! Farm rental engine CLI
//!
//! Replays booking events against a machinery fleet and prints the final
//! bookings as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- fleet.csv events.csv > bookings.csv
//! cargo run -- --strategy sync fleet.csv events.csv > bookings.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 fleet.csv events.csv
//! RUST_LOG=info cargo run -- --day-count elapsed --default-distance 25 fleet.csv events.csv
//! ```
//!
//! Refused commands and malformed rows are logged to stderr (filtered by
//! `RUST_LOG`, default `warn`) and never stop the replay.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use farm_rental_engine::cli;
use farm_rental_engine::strategy;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let strategy = {
        let batch = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), batch, args.to_pricing_config())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.fleet_file, &args.events_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
