//! Booking storage
//!
//! This module provides the BookingStore component that keeps the current
//! version of every booking by its ID. Bookings are never removed: rejected,
//! cancelled and completed bookings stay for history and listings.
//!
//! # Duplicate Handling
//!
//! Booking IDs are assigned by the caller. Inserting an ID that already
//! exists fails and leaves the stored booking untouched.

use crate::core::query::{paginate, BookingQuery, Page};
use crate::types::{Booking, BookingError, BookingId, UserId};
use std::collections::HashMap;

/// Booking store
///
/// Maintains a HashMap of booking ID to the booking's latest version.
pub struct BookingStore {
    /// Map of booking ID to booking
    bookings: HashMap<BookingId, Booking>,
}

impl BookingStore {
    /// Create a new empty booking store
    pub fn new() -> Self {
        BookingStore {
            bookings: HashMap::new(),
        }
    }

    /// Store a new booking
    ///
    /// # Errors
    ///
    /// Returns `DuplicateBooking` if the ID is already taken.
    pub fn insert(&mut self, booking: Booking) -> Result<(), BookingError> {
        if self.bookings.contains_key(&booking.id) {
            return Err(BookingError::duplicate_booking(booking.id));
        }

        self.bookings.insert(booking.id, booking);
        Ok(())
    }

    /// Whether a booking with this ID exists
    pub fn contains(&self, id: BookingId) -> bool {
        self.bookings.contains_key(&id)
    }

    /// Get a stored booking
    pub fn get(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.get(&id)
    }

    /// Replace the stored version of an existing booking
    ///
    /// # Errors
    ///
    /// Returns `BookingNotFound` if the booking was never inserted.
    pub fn replace(&mut self, booking: Booking) -> Result<(), BookingError> {
        let stored = self
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| BookingError::booking_not_found(booking.id))?;
        *stored = booking;
        Ok(())
    }

    /// Bookings placed by `renter`, newest first
    pub fn for_renter(&self, renter: UserId, query: &BookingQuery) -> Page<Booking> {
        self.select(|booking| booking.renter == renter, query)
    }

    /// Bookings on machines owned by `owner`, newest first
    pub fn for_owner(&self, owner: UserId, query: &BookingQuery) -> Page<Booking> {
        self.select(|booking| booking.owner == owner, query)
    }

    /// All bookings sorted by ID
    pub fn all(&self) -> Vec<&Booking> {
        let mut bookings: Vec<&Booking> = self.bookings.values().collect();
        bookings.sort_by_key(|booking| booking.id);
        bookings
    }

    fn select<F>(&self, matches: F, query: &BookingQuery) -> Page<Booking>
    where
        F: Fn(&Booking) -> bool,
    {
        let selected = self
            .bookings
            .values()
            .filter(|booking| matches(booking))
            .cloned()
            .collect();
        paginate(selected, query)
    }
}

impl Default for BookingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingRequest, BookingStatus, Machinery, PriceBreakdown};
    use chrono::{NaiveDate, Utc};

    fn booking(id: BookingId, owner: UserId, renter: UserId) -> Booking {
        let machinery = Machinery::new(1, owner, "Tractor", 100);
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let request = BookingRequest::new(id, 1, renter, day, day);
        let price = PriceBreakdown {
            day_count: 1,
            price_per_day: 100,
            base: 100,
            delivery_charge: 0,
            deposit: 0,
            discount: 0,
            total: 100,
        };
        Booking::new(
            &request,
            &machinery,
            request.validate().unwrap(),
            price,
            format!("BK-{}", id),
            Utc::now(),
        )
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = BookingStore::new();
        store.insert(booking(1, 10, 20)).unwrap();

        assert!(store.contains(1));
        assert_eq!(store.get(1).unwrap().renter, 20);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_duplicate_insert_keeps_first() {
        let mut store = BookingStore::new();
        store.insert(booking(1, 10, 20)).unwrap();

        let result = store.insert(booking(1, 11, 21));

        assert_eq!(result.unwrap_err(), BookingError::duplicate_booking(1));
        assert_eq!(store.get(1).unwrap().renter, 20);
    }

    #[test]
    fn test_replace() {
        let mut store = BookingStore::new();
        store.insert(booking(1, 10, 20)).unwrap();

        let mut updated = store.get(1).unwrap().clone();
        updated.status = BookingStatus::Confirmed;
        store.replace(updated).unwrap();

        assert_eq!(store.get(1).unwrap().status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_replace_unknown_booking_fails() {
        let mut store = BookingStore::new();
        let result = store.replace(booking(9, 10, 20));
        assert_eq!(result.unwrap_err(), BookingError::booking_not_found(9));
    }

    #[test]
    fn test_listings_by_party() {
        let mut store = BookingStore::new();
        store.insert(booking(1, 10, 20)).unwrap();
        store.insert(booking(2, 10, 21)).unwrap();
        store.insert(booking(3, 11, 20)).unwrap();

        let query = BookingQuery::default();
        assert_eq!(store.for_renter(20, &query).total, 2);
        assert_eq!(store.for_owner(10, &query).total, 2);
        assert_eq!(store.for_owner(12, &query).total, 0);
    }

    #[test]
    fn test_all_sorted_by_id() {
        let mut store = BookingStore::new();
        for id in [3, 1, 2] {
            store.insert(booking(id, 10, 20)).unwrap();
        }

        let ids: Vec<BookingId> = store.all().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
