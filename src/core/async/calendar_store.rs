//! Thread-safe calendar storage for the concurrent engine
//!
//! This module provides the `AsyncCalendarStore` struct, which holds every
//! machine's reservations in a `DashMap` so calendars of different machines
//! can be read and written from many tasks at once.
//!
//! # Write-time validation
//!
//! `reserve` re-checks overlap while it holds the machine's map entry. Two
//! writers for the same machine are serialized by that entry guard, so the
//! loser of a race gets `Conflict` instead of writing an overlapping
//! reservation, even if both passed an earlier availability check.

use crate::core::availability::first_conflict;
use crate::types::{BookingError, BookingId, DateInterval, MachineryId, Reservation};
use dashmap::DashMap;

/// Thread-safe per-machine reservation calendar
#[derive(Debug)]
pub struct AsyncCalendarStore {
    /// Concurrent map of machinery ID to its reservations (insertion order)
    calendars: DashMap<MachineryId, Vec<Reservation>>,
}

impl AsyncCalendarStore {
    pub fn new() -> Self {
        Self {
            calendars: DashMap::new(),
        }
    }

    /// Reserve `interval` on `machinery` for `booking` (thread-safe)
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Conflict` if the interval overlaps a
    /// reservation of the same machine at the time of the write.
    pub fn reserve(
        &self,
        machinery: MachineryId,
        interval: DateInterval,
        booking: BookingId,
    ) -> Result<(), BookingError> {
        let mut calendar = self.calendars.entry(machinery).or_default();

        if let Some(existing) = first_conflict(calendar.as_slice(), &interval) {
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

    /// Remove the reservation held by `booking` (idempotent)
    pub fn release(&self, machinery: MachineryId, booking: BookingId) -> bool {
        let Some(mut calendar) = self.calendars.get_mut(&machinery) else {
            return false;
        };

        let before = calendar.len();
        calendar.retain(|reservation| reservation.booking != booking);
        calendar.len() != before
    }

    /// Snapshot of the reservations of `machinery`
    pub fn reservations(&self, machinery: MachineryId) -> Vec<Reservation> {
        self.calendars
            .get(&machinery)
            .map(|calendar| calendar.value().clone())
            .unwrap_or_default()
    }
}

impl Default for AsyncCalendarStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn interval(start: u32, end: u32) -> DateInterval {
        DateInterval::new(
            NaiveDate::from_ymd_opt(2025, 3, start).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, end).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_reserve_rejects_overlap() {
        let store = AsyncCalendarStore::new();
        store.reserve(1, interval(2, 4), 10).unwrap();

        let result = store.reserve(1, interval(4, 5), 11);

        assert!(matches!(result, Err(BookingError::Conflict { existing: 10, .. })));
        assert_eq!(store.reservations(1).len(), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let store = AsyncCalendarStore::new();
        store.reserve(1, interval(2, 4), 10).unwrap();

        assert!(store.release(1, 10));
        assert!(!store.release(1, 10));
        assert!(store.reservations(1).is_empty());
    }

    #[test]
    fn test_concurrent_writers_cannot_double_book() {
        let store = Arc::new(AsyncCalendarStore::new());

        let handles: Vec<_> = (0..8)
            .map(|booking| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.reserve(1, interval(1, 3), booking))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(Result::is_ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(store.reservations(1).len(), 1);
    }
}
