//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `machinery`: Rentable machines and their identifiers
//! - `calendar`: Date intervals and reservations
//! - `booking`: Bookings, their statuses and the lifecycle state machine
//! - `command`: Replayable commands read from CSV
//! - `error`: Error types for the booking engine

pub mod booking;
pub mod calendar;
pub mod command;
pub mod error;
pub mod machinery;

pub use booking::{
    generate_booking_number, Booking, BookingEvent, BookingId, BookingRequest, BookingStatus,
    BookingTimeline, PaymentHandle, PaymentMode, PaymentOutcome, PaymentStatus, PriceBreakdown,
    Transition,
};
pub use calendar::{DateInterval, Reservation};
pub use command::{BookingCommand, CommandAction};
pub use error::{BookingError, ErrorKind};
pub use machinery::{Amount, Machinery, MachineryId, MachineryUpdate, UserId};
