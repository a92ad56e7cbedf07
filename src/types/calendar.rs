//! Calendar types for the rental booking engine
//!
//! Dates are plain calendar days (`NaiveDate`) with no time zone and no
//! time of day. Both ends of an interval are inclusive: a machine booked
//! through day N is busy on day N.

use super::booking::BookingId;
use super::error::BookingError;
use chrono::NaiveDate;
use std::fmt;

/// Inclusive range of calendar days
///
/// Construction guarantees `start <= end`. A single-day rental has
/// `start == end` and is a perfectly valid interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateInterval {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateInterval {
    /// Create an interval, rejecting an end date before the start date
    ///
    /// # Errors
    ///
    /// Returns `BookingError::InvalidDateRange` if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BookingError> {
        if start > end {
            return Err(BookingError::invalid_date_range(start, end));
        }
        Ok(Self { start, end })
    }

    /// Interval covering exactly one day
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// First day of the interval
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the interval (inclusive)
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether two inclusive intervals share at least one day
    ///
    /// `[s1,e1]` and `[s2,e2]` overlap iff `s1 <= e2 && s2 <= e1`.
    pub fn overlaps(&self, other: &DateInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whole days elapsed between start and end (0 for a same-day interval)
    pub fn elapsed_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Number of calendar days touched by the interval (at least 1)
    pub fn calendar_days(&self) -> i64 {
        self.elapsed_days() + 1
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A committed interval blocking a machine's calendar
///
/// Owned by the calendar of the machine it belongs to and referenced by
/// exactly one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Booking that holds this reservation
    pub booking: BookingId,

    /// Reserved days
    pub interval: DateInterval,
}
