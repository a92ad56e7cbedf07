//! Error types for the rental booking engine
//!
//! This module defines every failure the engine can report. Errors are
//! designed to be descriptive enough to show to a renter or an owner as-is.
//!
//! # Error Categories
//!
//! - **Input Errors**: File not found, I/O failures, malformed CSV rows
//! - **Validation Errors**: Missing fields, unknown machinery or bookings, duplicates
//! - **Availability Errors**: The requested dates collide with a reservation
//! - **Transition Errors**: The booking state machine forbids the operation
//! - **Conflict Errors**: A concurrent request won the calendar write
//! - **Payment Failures**: The payment adapter declined; the booking stays actionable

use super::booking::{BookingId, BookingStatus};
use super::machinery::MachineryId;
use chrono::NaiveDate;
use thiserror::Error;

/// Coarse classification of a [`BookingError`]
///
/// Callers that only need to decide between "reject", "retry" and "keep
/// going" can match on the kind instead of every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or parsing replay input failed
    Input,
    /// The request was missing or malformed; nothing was mutated
    Validation,
    /// The requested dates are taken or the machine is switched off
    Unavailable,
    /// The booking's current status does not permit the operation
    InvalidTransition,
    /// The calendar write lost a race; retry the whole create
    Conflict,
    /// The payment adapter reported a failure
    PaymentFailure,
}

/// Main error type for the booking engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// This is a recoverable error - the malformed row is skipped
    /// and replay continues with the next one.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// A required request field was not supplied
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// A request field was present but could not be used
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidField {
        /// Name of the offending field
        field: String,
        /// The rejected value as supplied
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Start date falls after end date
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Requested first day
        start: NaiveDate,
        /// Requested last day
        end: NaiveDate,
    },

    /// Machinery is unknown or has been deactivated
    #[error("Machinery {machinery} not found")]
    MachineryNotFound {
        /// Machinery ID that was not found
        machinery: MachineryId,
    },

    /// Machinery ID registered twice
    #[error("Machinery {machinery} is already registered")]
    DuplicateMachinery {
        /// Machinery ID that is duplicated
        machinery: MachineryId,
    },

    /// Booking is unknown
    #[error("Booking {booking} not found")]
    BookingNotFound {
        /// Booking ID that was not found
        booking: BookingId,
    },

    /// Booking ID used twice
    #[error("Duplicate booking ID {booking}")]
    DuplicateBooking {
        /// Booking ID that is duplicated
        booking: BookingId,
    },

    /// An event names a different machine than the booking it targets
    #[error("Machinery mismatch for {operation} on booking {booking}: expected machinery {expected}, got machinery {actual}")]
    MachineryMismatch {
        /// Booking ID
        booking: BookingId,
        /// Machinery recorded on the booking
        expected: MachineryId,
        /// Machinery named by the event
        actual: MachineryId,
        /// Operation that failed
        operation: String,
    },

    /// Price arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for machinery {machinery}")]
    ArithmeticOverflow {
        /// Pricing step that would overflow
        operation: String,
        /// Machinery being priced
        machinery: MachineryId,
    },

    /// The machine cannot be rented for the requested dates
    ///
    /// Raised either because a reservation overlaps the request or because
    /// the owner has switched the machine's `available` flag off.
    #[error("Machinery {machinery} is not available for {start}..{end}{}", conflicting_booking.map(|b| format!(" (reserved by booking {})", b)).unwrap_or_default())]
    Unavailable {
        /// Machinery ID
        machinery: MachineryId,
        /// Requested first day
        start: NaiveDate,
        /// Requested last day
        end: NaiveDate,
        /// Booking holding an overlapping reservation, if any
        conflicting_booking: Option<BookingId>,
    },

    /// The state machine does not allow the operation from the current status
    #[error("Cannot {operation} booking {booking} while it is {status}")]
    InvalidTransition {
        /// Booking ID
        booking: BookingId,
        /// Operation that was attempted
        operation: String,
        /// Status the booking was in
        status: BookingStatus,
    },

    /// The calendar rejected a reservation at write time
    ///
    /// This is the expected outcome of a lost race between two creates for
    /// the same machine. The caller should retry from validation.
    #[error("Reservation conflict on machinery {machinery} for {start}..{end}: overlaps booking {existing}")]
    Conflict {
        /// Machinery ID
        machinery: MachineryId,
        /// Requested first day
        start: NaiveDate,
        /// Requested last day
        end: NaiveDate,
        /// Booking already holding the overlapping reservation
        existing: BookingId,
    },

    /// A payment was initiated for a booking that is already settled
    #[error("Booking {booking} is already paid")]
    AlreadyPaid {
        /// Booking ID
        booking: BookingId,
    },

    /// The payment adapter declined the payment
    ///
    /// Non-fatal: the booking keeps its status and may be paid again or cancelled.
    #[error("Payment failed for booking {booking}{}", reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    PaymentFailed {
        /// Booking ID
        booking: BookingId,
        /// Reason reported by the adapter
        reason: Option<String>,
    },
}

impl BookingError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::FileNotFound { .. }
            | BookingError::IoError { .. }
            | BookingError::ParseError { .. } => ErrorKind::Input,
            BookingError::Unavailable { .. } => ErrorKind::Unavailable,
            BookingError::InvalidTransition { .. } | BookingError::AlreadyPaid { .. } => {
                ErrorKind::InvalidTransition
            }
            BookingError::Conflict { .. } => ErrorKind::Conflict,
            BookingError::PaymentFailed { .. } => ErrorKind::PaymentFailure,
            _ => ErrorKind::Validation,
        }
    }

    /// Whether retrying the same request can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Conflict | ErrorKind::PaymentFailure
        )
    }
}

// Conversion from io::Error to BookingError
impl From<std::io::Error> for BookingError {
    fn from(error: std::io::Error) -> Self {
        BookingError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to BookingError
impl From<csv::Error> for BookingError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        BookingError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl BookingError {
    /// Create a MissingField error
    pub fn missing_field(field: &str) -> Self {
        BookingError::MissingField {
            field: field.to_string(),
        }
    }

    /// Create an InvalidField error
    pub fn invalid_field(field: &str, value: &str, reason: &str) -> Self {
        BookingError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidDateRange error
    pub fn invalid_date_range(start: NaiveDate, end: NaiveDate) -> Self {
        BookingError::InvalidDateRange { start, end }
    }

    /// Create a MachineryNotFound error
    pub fn machinery_not_found(machinery: MachineryId) -> Self {
        BookingError::MachineryNotFound { machinery }
    }

    /// Create a DuplicateMachinery error
    pub fn duplicate_machinery(machinery: MachineryId) -> Self {
        BookingError::DuplicateMachinery { machinery }
    }

    /// Create a BookingNotFound error
    pub fn booking_not_found(booking: BookingId) -> Self {
        BookingError::BookingNotFound { booking }
    }

    /// Create a DuplicateBooking error
    pub fn duplicate_booking(booking: BookingId) -> Self {
        BookingError::DuplicateBooking { booking }
    }

    /// Create a MachineryMismatch error
    pub fn machinery_mismatch(
        booking: BookingId,
        expected: MachineryId,
        actual: MachineryId,
        operation: &str,
    ) -> Self {
        BookingError::MachineryMismatch {
            booking,
            expected,
            actual,
            operation: operation.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, machinery: MachineryId) -> Self {
        BookingError::ArithmeticOverflow {
            operation: operation.to_string(),
            machinery,
        }
    }

    /// Create an Unavailable error
    pub fn unavailable(
        machinery: MachineryId,
        start: NaiveDate,
        end: NaiveDate,
        conflicting_booking: Option<BookingId>,
    ) -> Self {
        BookingError::Unavailable {
            machinery,
            start,
            end,
            conflicting_booking,
        }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(booking: BookingId, operation: &str, status: BookingStatus) -> Self {
        BookingError::InvalidTransition {
            booking,
            operation: operation.to_string(),
            status,
        }
    }

    /// Create a Conflict error
    pub fn conflict(
        machinery: MachineryId,
        start: NaiveDate,
        end: NaiveDate,
        existing: BookingId,
    ) -> Self {
        BookingError::Conflict {
            machinery,
            start,
            end,
            existing,
        }
    }

    /// Create an AlreadyPaid error
    pub fn already_paid(booking: BookingId) -> Self {
        BookingError::AlreadyPaid { booking }
    }

    /// Create a PaymentFailed error
    pub fn payment_failed(booking: BookingId, reason: Option<String>) -> Self {
        BookingError::PaymentFailed { booking, reason }
    }
}
