//! Farm Rental Engine Library
//! # Overview
//!
//! This library allocates rental bookings for farm machinery: it keeps a
//! per-machine reservation calendar, refuses overlapping requests, prices
//! bookings, and drives each booking through its lifecycle. A CSV replay
//! front end runs with either a sync or an async strategy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Machinery, Booking, DateInterval, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::availability`] - Overlap and availability checks
//!   - [`core::pricing`] - Price breakdown calculation
//!   - [`core::calendar_store`] - Per-machine reservations
//!   - [`core::engine`] - Booking lifecycle orchestration
//!   - [`core::payment`] - Payment adapter
//! - [`io`] - Fleet and event CSV input, booking CSV output
//! - [`strategy`] - Sync and async replay pipelines
//!
//! # Booking Lifecycle
//!
//! - **pending**: Created; the dates are reserved until the owner decides
//! - **confirmed**: Approved by the owner, or paid
//! - **in-progress**: Machine handed over
//! - **completed**, **rejected**, **cancelled**: Terminal; the dates are free again
//!
//! # Guarantees
//!
//! - Reservations of one machine never overlap, whatever the concurrency
//! - A refused operation leaves every store untouched
//! - Operations on different machines never wait on each other

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{AsyncBookingEngine, BookingEngine, DemoGateway, PaymentGateway, PricingConfig};
pub use io::write_bookings_csv;
pub use types::{
    Booking, BookingCommand, BookingError, BookingEvent, BookingId, BookingRequest,
    BookingStatus, DateInterval, ErrorKind, Machinery, MachineryId, PaymentStatus, UserId,
};
