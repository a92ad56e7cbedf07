//! Synchronous processing strategy
//!
//! Single-threaded replay. Orchestrates the flow between:
//! - `read_fleet` and `SyncReader` (CSV input)
//! - `BookingEngine` (business logic)
//! - `csv_format::write_bookings_csv` (output)
//!
//! Events are streamed one row at a time; memory grows with the number of
//! bookings, not with the length of the event file.

use crate::core::{BookingEngine, PricingConfig};
use crate::io::csv_format::write_bookings_csv;
use crate::io::sync_reader::{read_fleet, SyncReader};
use crate::strategy::{output_error, ProcessingStrategy};
use crate::types::Booking;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use farm_rental_engine::core::PricingConfig;
/// use farm_rental_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(PricingConfig::default());
/// let mut output = io::stdout();
///
/// strategy
///     .process(Path::new("fleet.csv"), Path::new("events.csv"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    pricing: PricingConfig,
}

impl SyncProcessingStrategy {
    pub fn new(pricing: PricingConfig) -> Self {
        Self { pricing }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        fleet_path: &Path,
        events_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), crate::types::BookingError> {
        let mut engine = BookingEngine::with_config(self.pricing.clone());

        for machinery in read_fleet(fleet_path)? {
            if let Err(e) = engine.register_machinery(machinery) {
                warn!("Skipping listing: {}", e);
            }
        }

        let reader = SyncReader::new(events_path)?;

        let mut refused = 0usize;
        for result in reader {
            match result {
                Ok(command) => {
                    let (kind, booking) = (command.kind(), command.booking);
                    if let Err(e) = engine.apply(command) {
                        refused += 1;
                        warn!(booking, command = kind, "Command refused: {}", e);
                    }
                }
                Err(e) => warn!("Skipping event row: {}", e),
            }
        }

        let bookings: Vec<Booking> = engine.bookings().into_iter().cloned().collect();
        info!(bookings = bookings.len(), refused, "Replay finished");

        write_bookings_csv(&bookings, output).map_err(output_error)
    }
}
