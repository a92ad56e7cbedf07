//! Machinery registry
//!
//! This module provides the `MachineryRegistry` struct which holds every
//! listed machine and the counters attached to it.
//!
//! The MachineryRegistry is responsible for:
//! - Registering listings and rejecting duplicate IDs
//! - Hiding deactivated (soft-deleted) listings from lookups
//! - Applying owner edits without touching counters
//! - Incrementing the booking and view counters of a single listing

use crate::types::{BookingError, Machinery, MachineryId, MachineryUpdate};
use std::collections::HashMap;

/// Stores machinery listings by ID
pub struct MachineryRegistry {
    machinery: HashMap<MachineryId, Machinery>,
}

impl MachineryRegistry {
    pub fn new() -> Self {
        MachineryRegistry {
            machinery: HashMap::new(),
        }
    }

    /// Register a new listing
    ///
    /// Counters are reset and the listing is marked active.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMachinery` if the ID is already registered.
    pub fn register(&mut self, mut machinery: Machinery) -> Result<(), BookingError> {
        if self.machinery.contains_key(&machinery.id) {
            return Err(BookingError::duplicate_machinery(machinery.id));
        }

        machinery.is_active = true;
        machinery.total_bookings = 0;
        machinery.views = 0;
        self.machinery.insert(machinery.id, machinery);
        Ok(())
    }

    /// Look up an active listing
    pub fn get(&self, id: MachineryId) -> Result<&Machinery, BookingError> {
        self.machinery
            .get(&id)
            .filter(|machinery| machinery.is_active)
            .ok_or_else(|| BookingError::machinery_not_found(id))
    }

    /// Look up an active listing, counting the view
    pub fn view(&mut self, id: MachineryId) -> Result<&Machinery, BookingError> {
        let machinery = self.get_active_mut(id)?;
        machinery.views += 1;
        Ok(&*machinery)
    }

    /// Apply owner edits to an active listing
    pub fn update_listing(
        &mut self,
        id: MachineryId,
        update: MachineryUpdate,
    ) -> Result<&Machinery, BookingError> {
        let machinery = self.get_active_mut(id)?;
        update.apply_to(machinery);
        Ok(&*machinery)
    }

    /// Soft-delete a listing; existing bookings are unaffected
    pub fn deactivate(&mut self, id: MachineryId) -> Result<(), BookingError> {
        self.get_active_mut(id)?.is_active = false;
        Ok(())
    }

    /// Count one more booking for the listing
    pub fn increment_bookings(&mut self, id: MachineryId) -> Result<u64, BookingError> {
        let machinery = self
            .machinery
            .get_mut(&id)
            .ok_or_else(|| BookingError::machinery_not_found(id))?;
        machinery.total_bookings += 1;
        Ok(machinery.total_bookings)
    }

    /// All active listings sorted by ID
    pub fn all(&self) -> Vec<&Machinery> {
        let mut listings: Vec<&Machinery> = self
            .machinery
            .values()
            .filter(|machinery| machinery.is_active)
            .collect();
        listings.sort_by_key(|machinery| machinery.id);
        listings
    }

    fn get_active_mut(&mut self, id: MachineryId) -> Result<&mut Machinery, BookingError> {
        self.machinery
            .get_mut(&id)
            .filter(|machinery| machinery.is_active)
            .ok_or_else(|| BookingError::machinery_not_found(id))
    }
}

impl Default for MachineryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_tractor() -> MachineryRegistry {
        let mut registry = MachineryRegistry::new();
        registry
            .register(Machinery::new(1, 10, "Tractor", 2500))
            .unwrap();
        registry
    }

    #[test]
    fn test_register_resets_counters() {
        let mut registry = MachineryRegistry::new();
        let mut listing = Machinery::new(1, 10, "Tractor", 2500);
        listing.total_bookings = 99;
        listing.views = 7;

        registry.register(listing).unwrap();

        let stored = registry.get(1).unwrap();
        assert_eq!(stored.total_bookings, 0);
        assert_eq!(stored.views, 0);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = registry_with_tractor();
        let result = registry.register(Machinery::new(1, 11, "Other", 100));
        assert_eq!(result.unwrap_err(), BookingError::duplicate_machinery(1));
    }

    #[test]
    fn test_view_counts() {
        let mut registry = registry_with_tractor();
        registry.view(1).unwrap();
        registry.view(1).unwrap();
        assert_eq!(registry.get(1).unwrap().views, 2);
    }

    #[test]
    fn test_deactivated_listing_is_hidden() {
        let mut registry = registry_with_tractor();
        registry.deactivate(1).unwrap();

        assert_eq!(registry.get(1).unwrap_err(), BookingError::machinery_not_found(1));
        assert!(registry.all().is_empty());
        assert!(registry.deactivate(1).is_err());
    }

    #[test]
    fn test_update_listing() {
        let mut registry = registry_with_tractor();
        let updated = registry
            .update_listing(
                1,
                MachineryUpdate {
                    available: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.available);
    }

    #[test]
    fn test_increment_bookings() {
        let mut registry = registry_with_tractor();
        assert_eq!(registry.increment_bookings(1).unwrap(), 1);
        assert_eq!(registry.increment_bookings(1).unwrap(), 2);
        assert!(registry.increment_bookings(2).is_err());
    }
}
