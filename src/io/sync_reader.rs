//! Synchronous CSV readers
//!
//! Provides a streaming iterator over replay commands from an event CSV and
//! a loader for the fleet CSV. Delegates CSV format concerns to the
//! csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<BookingCommand, BookingError>` for each CSV row:
//!
//! ```no_run
//! use farm_rental_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("events.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Replaying {} for booking {}", command.kind(), command.booking),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()` and `read_fleet()`
//! - Individual row errors are yielded as `ParseError` with the line number
//! - Bad fleet rows are logged and skipped

use crate::io::csv_format::{
    convert_event_record, convert_fleet_record, EventCsvRecord, FleetCsvRecord,
};
use crate::types::{BookingCommand, BookingError, Machinery};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

fn open_csv(path: &Path) -> Result<csv::Reader<File>, BookingError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BookingError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => BookingError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Load every valid listing from a fleet CSV
///
/// Rows that fail to parse are logged and skipped; the file itself must
/// exist and be readable.
pub fn read_fleet(path: &Path) -> Result<Vec<Machinery>, BookingError> {
    let mut reader = open_csv(path)?;
    let mut fleet = Vec::new();

    for (index, row) in reader.deserialize::<FleetCsvRecord>().enumerate() {
        let line = index as u64 + 2;
        match row.map_err(|e| e.to_string()).and_then(convert_fleet_record) {
            Ok(machinery) => fleet.push(machinery),
            Err(message) => warn!(line, "Skipping fleet row: {}", message),
        }
    }

    debug!(path = %path.display(), machines = fleet.len(), "Loaded fleet");
    Ok(fleet)
}

/// Synchronous event CSV reader
///
/// Streams one command per row without loading the file into memory.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open an event CSV for streaming iteration
    ///
    /// The reader trims whitespace from all fields and allows short rows,
    /// since most event types leave trailing columns empty.
    ///
    /// # Errors
    ///
    /// `FileNotFound` when the path does not exist, `IoError` when it
    /// cannot be opened.
    pub fn new(path: &Path) -> Result<Self, BookingError> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<BookingCommand, BookingError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<EventCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        let line = self.line_num;
        Some(
            row.map_err(|e| e.to_string())
                .and_then(convert_event_record)
                .map_err(|message| BookingError::ParseError {
                    line: Some(line),
                    message,
                }),
        )
    }
}
