//! Thread-safe machinery registry for the concurrent engine
//!
//! Same rules as `MachineryRegistry`, backed by a `DashMap`. Counter
//! increments happen under the listing's map entry, so concurrent bookings
//! and views never lose an update.

use crate::types::{BookingError, Machinery, MachineryId, MachineryUpdate};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe store of machinery listings
#[derive(Debug)]
pub struct AsyncMachineryRegistry {
    machinery: DashMap<MachineryId, Machinery>,
}

impl AsyncMachineryRegistry {
    pub fn new() -> Self {
        Self {
            machinery: DashMap::new(),
        }
    }

    /// Register a new listing
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMachinery` if the ID is already registered.
    pub fn register(&self, mut machinery: Machinery) -> Result<(), BookingError> {
        match self.machinery.entry(machinery.id) {
            Entry::Occupied(_) => Err(BookingError::duplicate_machinery(machinery.id)),
            Entry::Vacant(slot) => {
                machinery.is_active = true;
                machinery.total_bookings = 0;
                machinery.views = 0;
                slot.insert(machinery);
                Ok(())
            }
        }
    }

    /// Snapshot of an active listing
    pub fn get(&self, id: MachineryId) -> Result<Machinery, BookingError> {
        self.machinery
            .get(&id)
            .filter(|machinery| machinery.is_active)
            .map(|machinery| machinery.value().clone())
            .ok_or_else(|| BookingError::machinery_not_found(id))
    }

    /// Snapshot of an active listing, counting the view
    pub fn view(&self, id: MachineryId) -> Result<Machinery, BookingError> {
        self.modify_active(id, |machinery| machinery.views += 1)
    }

    /// Apply owner edits to an active listing
    pub fn update_listing(
        &self,
        id: MachineryId,
        update: MachineryUpdate,
    ) -> Result<Machinery, BookingError> {
        self.modify_active(id, |machinery| update.apply_to(machinery))
    }

    /// Soft-delete a listing
    pub fn deactivate(&self, id: MachineryId) -> Result<(), BookingError> {
        self.modify_active(id, |machinery| machinery.is_active = false)
            .map(|_| ())
    }

    /// Atomically count one more booking for the listing
    pub fn increment_bookings(&self, id: MachineryId) -> Result<u64, BookingError> {
        let mut machinery = self
            .machinery
            .get_mut(&id)
            .ok_or_else(|| BookingError::machinery_not_found(id))?;
        machinery.total_bookings += 1;
        Ok(machinery.total_bookings)
    }

    /// All active listings sorted by ID
    pub fn all(&self) -> Vec<Machinery> {
        let mut listings: Vec<Machinery> = self
            .machinery
            .iter()
            .filter(|entry| entry.is_active)
            .map(|entry| entry.value().clone())
            .collect();
        listings.sort_by_key(|machinery| machinery.id);
        listings
    }

    fn modify_active<F>(&self, id: MachineryId, f: F) -> Result<Machinery, BookingError>
    where
        F: FnOnce(&mut Machinery),
    {
        let mut machinery = self
            .machinery
            .get_mut(&id)
            .filter(|machinery| machinery.is_active)
            .ok_or_else(|| BookingError::machinery_not_found(id))?;
        f(&mut machinery);
        Ok(machinery.clone())
    }
}

impl Default for AsyncMachineryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
