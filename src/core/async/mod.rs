//! Concurrent implementations of core components
//!
//! This module provides thread-safe versions of the core booking components
//! using DashMap for storage and a tokio mutex per machine for ordering.
//!
//! # Architecture
//!
//! - **AsyncMachineryRegistry**: Listings and their atomic counters
//! - **AsyncCalendarStore**: Reservations, re-validated under the entry guard
//! - **AsyncBookingStore**: Booking records with atomic ID uniqueness
//! - **AsyncBookingEngine**: Orchestrates bookings under per-machine locks
//! - **BatchProcessor**: Replays commands in parallel across machines
//!
//! # Thread Safety
//!
//! - Operations on different machines proceed in parallel
//! - Operations on the same machine are serialized
//! - No global lock

pub mod batch_processor;
pub mod booking_store;
pub mod calendar_store;
pub mod engine;
pub mod machinery_registry;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use booking_store::AsyncBookingStore;
pub use calendar_store::AsyncCalendarStore;
pub use engine::AsyncBookingEngine;
pub use machinery_registry::AsyncMachineryRegistry;
