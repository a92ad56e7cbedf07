//! Calendar storage
//!
//! This module provides the CalendarStore component that holds every
//! machine's reservations. It is the source of truth for availability.
//!
//! # Invariant
//!
//! Reservations belonging to one machine never overlap. `reserve` re-checks
//! overlap at write time even though callers are expected to have asked the
//! availability checker first.
//!
//! # Ordering
//!
//! Reservations are kept in insertion order; the overlap check does not
//! rely on sortedness.

use crate::core::availability::first_conflict;
use crate::types::{BookingError, BookingId, DateInterval, MachineryId, Reservation};
use std::collections::HashMap;

/// Per-machine reservation calendar
pub struct CalendarStore {
    /// Map of machinery ID to its reservations (insertion order)
    calendars: HashMap<MachineryId, Vec<Reservation>>,
}

impl CalendarStore {
    /// Create a new empty calendar store
    pub fn new() -> Self {
        CalendarStore {
            calendars: HashMap::new(),
        }
    }

    /// Reserve `interval` on `machinery` for `booking`
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Conflict` if the interval overlaps an existing
    /// reservation of the same machine. The store is left untouched.
    pub fn reserve(
        &mut self,
        machinery: MachineryId,
        interval: DateInterval,
        booking: BookingId,
    ) -> Result<(), BookingError> {
        let calendar = self.calendars.entry(machinery).or_default();

        if let Some(existing) = first_conflict(calendar, &interval) {
            return Err(BookingError::conflict(
                machinery,
                interval.start(),
                interval.end(),
                existing.booking,
            ));
        }

        calendar.push(Reservation { booking, interval });
        Ok(())
    }

    /// Remove the reservation held by `booking` on `machinery`
    ///
    /// Idempotent: releasing a reservation that does not exist is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if a reservation was removed
    pub fn release(&mut self, machinery: MachineryId, booking: BookingId) -> bool {
        let Some(calendar) = self.calendars.get_mut(&machinery) else {
            return false;
        };

        let before = calendar.len();
        calendar.retain(|reservation| reservation.booking != booking);
        calendar.len() != before
    }

    /// Reservations of `machinery` in insertion order
    pub fn reservations(&self, machinery: MachineryId) -> &[Reservation] {
        self.calendars
            .get(&machinery)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for CalendarStore {
    fn default() -> Self {
        Self::new()
    }
}
