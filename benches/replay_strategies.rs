//! Benchmark suite for comparing replay strategies
//!
//! Compares the synchronous and asynchronous strategies using the divan
//! benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Workload
//!
//! The fleet and event files are generated once per size. Every machine gets
//! back-to-back weekly bookings that run through approve, pay, start and
//! complete, plus one overlapping request that is refused.

use farm_rental_engine::cli::StrategyType;
use farm_rental_engine::core::PricingConfig;
use farm_rental_engine::strategy::{create_strategy, BatchConfig};
use std::fmt::Write as _;
use std::io::Write;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

const SIZES: &[usize] = &[10, 100, 1000];

struct Workload {
    fleet: NamedTempFile,
    events: NamedTempFile,
}

fn temp_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Build a workload with `machines` machines and ten bookings each
fn workload(machines: usize) -> Workload {
    let mut fleet = String::from("machinery,owner,name,price_per_day,delivery_charge_per_km,security_deposit\n");
    let mut events = String::from("type,machinery,booking,renter,start,end,delivery,distance\n");

    let mut booking = 0;
    for machinery in 1..=machines {
        writeln!(fleet, "{},{},Machine {},2500,40,5000", machinery, machinery % 50, machinery).unwrap();

        for week in 0..10 {
            booking += 1;
            let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                + chrono::Days::new(week * 7);
            let end = start + chrono::Days::new(5);
            writeln!(events, "create,{},{},{},{},{},yes,7.5", machinery, booking, booking % 97, start, end).unwrap();
            for step in ["approve", "pay", "start", "complete"] {
                writeln!(events, "{},{},{}", step, machinery, booking).unwrap();
            }
        }

        writeln!(events, "create,{},{},1,2025-01-02,2025-01-03", machinery, booking + 1_000_000).unwrap();
    }

    Workload {
        fleet: temp_csv(&fleet),
        events: temp_csv(&events),
    }
}

fn replay(strategy_type: StrategyType, batch: Option<BatchConfig>, workload: &Workload) {
    let strategy = create_strategy(strategy_type, batch, PricingConfig::default());
    let mut output = Vec::new();

    strategy
        .process(workload.fleet.path(), workload.events.path(), &mut output)
        .expect("Replay failed");
}

#[divan::bench(args = SIZES)]
fn sync_strategy(bencher: divan::Bencher, machines: usize) {
    let workload = workload(machines);
    bencher.bench(|| replay(StrategyType::Sync, None, &workload));
}

#[divan::bench(args = SIZES)]
fn async_strategy(bencher: divan::Bencher, machines: usize) {
    let workload = workload(machines);
    bencher.bench(|| replay(StrategyType::Async, Some(BatchConfig::default()), &workload));
}
