//! Thread-safe booking storage for the concurrent engine
//!
//! This module provides the `AsyncBookingStore` struct, which keeps the
//! latest version of every booking in a `DashMap`.
//!
//! # Thread Safety
//!
//! Inserting goes through the map entry, so two tasks racing to create the
//! same booking ID cannot both succeed. Lookups return clones so no shard
//! lock outlives the call.

use crate::core::query::{paginate, BookingQuery, Page};
use crate::types::{Booking, BookingError, BookingId, UserId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe booking store
#[derive(Debug)]
pub struct AsyncBookingStore {
    /// Concurrent map of booking ID to booking
    bookings: DashMap<BookingId, Booking>,
}

impl AsyncBookingStore {
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
        }
    }

    /// Store a new booking (thread-safe)
    ///
    /// # Errors
    ///
    /// Returns `DuplicateBooking` if the ID is already taken.
    pub fn insert(&self, booking: Booking) -> Result<(), BookingError> {
        match self.bookings.entry(booking.id) {
            Entry::Occupied(_) => Err(BookingError::duplicate_booking(booking.id)),
            Entry::Vacant(slot) => {
                slot.insert(booking);
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: BookingId) -> bool {
        self.bookings.contains_key(&id)
    }

    /// Snapshot of a stored booking
    pub fn get(&self, id: BookingId) -> Option<Booking> {
        self.bookings.get(&id).map(|booking| booking.value().clone())
    }

    /// Replace the stored version of an existing booking
    ///
    /// # Errors
    ///
    /// Returns `BookingNotFound` if the booking was never inserted.
    pub fn replace(&self, booking: Booking) -> Result<(), BookingError> {
        let mut stored = self
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

    /// Snapshot of all bookings sorted by ID
    pub fn all(&self) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by_key(|booking| booking.id);
        bookings
    }

    fn select<F>(&self, matches: F, query: &BookingQuery) -> Page<Booking>
    where
        F: Fn(&Booking) -> bool,
    {
        let selected = self
            .bookings
            .iter()
            .filter(|entry| matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        paginate(selected, query)
    }
}

impl Default for AsyncBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingRequest, Machinery, PriceBreakdown};
    use chrono::{NaiveDate, Utc};
    use std::sync::Arc;

    fn booking(id: BookingId) -> Booking {
        let machinery = Machinery::new(1, 10, "Seeder", 300);
        let day = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        let request = BookingRequest::new(id, 1, 20, day, day);
        let price = PriceBreakdown {
            day_count: 1,
            price_per_day: 300,
            base: 300,
            delivery_charge: 0,
            deposit: 0,
            discount: 0,
            total: 300,
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
    fn test_insert_get_replace() {
        let store = AsyncBookingStore::new();
        store.insert(booking(1)).unwrap();

        let mut updated = store.get(1).unwrap();
        updated.purpose = Some("sowing".to_string());
        store.replace(updated).unwrap();

        assert_eq!(store.get(1).unwrap().purpose.as_deref(), Some("sowing"));
        assert!(store.replace(booking(2)).is_err());
    }

    #[test]
    fn test_racing_inserts_keep_one() {
        let store = Arc::new(AsyncBookingStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.insert(booking(7)))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(Result::is_ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn test_listings() {
        let store = AsyncBookingStore::new();
        for id in 1..=3 {
            store.insert(booking(id)).unwrap();
        }

        assert_eq!(store.for_renter(20, &BookingQuery::default()).total, 3);
        assert_eq!(store.for_owner(10, &BookingQuery::default().with_page(1, 2)).items.len(), 2);
        assert_eq!(store.for_owner(11, &BookingQuery::default()).total, 0);
    }
}
