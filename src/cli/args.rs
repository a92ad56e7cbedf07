use crate::core::{DayCountPolicy, PricingConfig};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Replay rental booking events against a machinery fleet
#[derive(Parser, Debug)]
#[command(name = "farm-rental-engine")]
#[command(about = "Replay rental booking events against a machinery fleet", long_about = None)]
pub struct CliArgs {
    /// Fleet CSV file path containing machinery listings
    #[arg(value_name = "FLEET", help = "Path to the fleet CSV file")]
    pub fleet_file: PathBuf,

    /// Event CSV file path containing booking commands
    #[arg(value_name = "EVENTS", help = "Path to the event CSV file")]
    pub events_file: PathBuf,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for single-threaded or 'async' for parallel per machine"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Delivery distance assumed when a request gives none
    #[arg(
        long = "default-distance",
        value_name = "KM",
        help = "Delivery distance in km used when a request gives none (default: 10)"
    )]
    pub default_distance: Option<Decimal>,

    /// How billable days are counted
    #[arg(
        long = "day-count",
        value_name = "POLICY",
        default_value = "inclusive",
        help = "Billable days: 'inclusive' counts every day, 'elapsed' counts nights"
    )]
    pub day_count: DayCount,
}

/// Available replay strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Billable day rule as spelled on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DayCount {
    Inclusive,
    Elapsed,
}

impl From<DayCount> for DayCountPolicy {
    fn from(day_count: DayCount) -> Self {
        match day_count {
            DayCount::Inclusive => DayCountPolicy::Inclusive,
            DayCount::Elapsed => DayCountPolicy::Elapsed,
        }
    }
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced by
    /// the defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create a PricingConfig from CLI arguments
    pub fn to_pricing_config(&self) -> PricingConfig {
        let default = PricingConfig::default();
        PricingConfig::new(
            self.default_distance
                .unwrap_or(default.default_delivery_distance),
            self.day_count.into(),
        )
    }
}
