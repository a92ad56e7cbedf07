//! Asynchronous batch processing strategy
//!
//! Replays events in batches using thread-based parallelism with
//! machinery-based partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (machinery partitioning + tasks)
//!     └── AsyncBookingEngine (per-machine locks)
//!         ├── AsyncMachineryRegistry
//!         ├── AsyncCalendarStore
//!         └── AsyncBookingStore
//! ```
//!
//! # Ordering
//!
//! - Batches are replayed one after another, so a machine's commands keep
//!   file order even when they span batches
//! - Within a batch, different machines are replayed in parallel
//! - A create reusing a booking ID from another machine waits for the
//!   earlier create, so the first row in the file keeps the ID
//! - The final bookings equal those of a sequential replay

use crate::core::r#async::{AsyncBookingEngine, BatchProcessor};
use crate::core::PricingConfig;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_bookings_csv;
use crate::io::sync_reader::read_fleet;
use crate::strategy::{output_error, ProcessingStrategy};
use crate::types::BookingError;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration for batch processing
///
/// Controls how commands are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, falling back to the defaults for zero values
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    pricing: PricingConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, pricing: PricingConfig) -> Self {
        Self { config, pricing }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay events in batches on a multi-threaded tokio runtime
    ///
    /// 1. Loads the fleet into a fresh AsyncBookingEngine
    /// 2. Reads events in batches from the CSV using AsyncReader
    /// 3. Replays each batch to completion before reading the next
    /// 4. Writes the final bookings using the csv_format module
    fn process(
        &self,
        fleet_path: &Path,
        events_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), BookingError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| BookingError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let engine = AsyncBookingEngine::with_config(self.pricing.clone());
            for machinery in read_fleet(fleet_path)? {
                if let Err(e) = engine.register_machinery(machinery) {
                    warn!("Skipping listing: {}", e);
                }
            }

            let processor = BatchProcessor::new(engine.clone());

            let file = tokio::fs::File::open(events_path)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => BookingError::FileNotFound {
                        path: events_path.display().to_string(),
                    },
                    _ => BookingError::IoError {
                        message: format!(
                            "Failed to open file '{}': {}",
                            events_path.display(),
                            e
                        ),
                    },
                })?;

            // csv-async reads futures::io, tokio files speak tokio::io
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut refused = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }
                debug!(commands = batch.len(), "Replaying batch");

                for processed in processor.process_batch(batch).await {
                    if let Err(e) = processed.result {
                        refused += 1;
                        warn!(
                            booking = processed.command.booking,
                            command = processed.command.kind(),
                            "Command refused: {}",
                            e
                        );
                    }
                }
            }

            let bookings = engine.bookings();
            info!(bookings = bookings.len(), refused, "Replay finished");

            write_bookings_csv(&bookings, output).map_err(output_error)
        })
    }
}
