//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing fleet loading, event CSV parsing and the booking engine.
//! This allows different implementations (synchronous, asynchronous batch)
//! to be selected at runtime.

use crate::cli::StrategyType;
use crate::core::PricingConfig;
use crate::types::BookingError;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy loads the fleet, replays the event CSV through its engine
/// and writes the final bookings to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay `events_path` against the fleet in `fleet_path`
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened or the output cannot
    /// be written. Rows that fail to parse and commands the engine refuses
    /// are logged and skipped; they never abort the replay.
    fn process(
        &self,
        fleet_path: &Path,
        events_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), BookingError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `batch` - Optional configuration for async batch processing (ignored for sync)
/// * `pricing` - Pricing configuration handed to the engine
pub fn create_strategy(
    strategy_type: StrategyType,
    batch: Option<BatchConfig>,
    pricing: PricingConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(pricing)),
        StrategyType::Async => {
            Box::new(AsyncProcessingStrategy::new(batch.unwrap_or_default(), pricing))
        }
    }
}

pub(crate) fn output_error(message: String) -> BookingError {
    BookingError::IoError { message }
}
