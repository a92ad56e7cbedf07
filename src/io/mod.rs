//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `sync_reader` - Fleet loader and synchronous event reader with iterator interface
//! - `async_reader` - Asynchronous event reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_event_record, convert_fleet_record, write_bookings_csv, EventCsvRecord,
    FleetCsvRecord,
};
pub use sync_reader::{read_fleet, SyncReader};
