//! Core business logic module
//!
//! This module contains the booking components:
//! - `availability` - Pure overlap and availability checks
//! - `pricing` - Price breakdown calculation
//! - `calendar_store` - Per-machine reservations
//! - `machinery_registry` - Listings and their counters
//! - `booking_store` - Booking records
//! - `query` - Renter/owner listings with pagination
//! - `traits` - Seams to external collaborators
//! - `payment` - In-process payment gateway
//! - `engine` - Booking lifecycle orchestration
//! - `async` - Concurrent implementations

pub mod r#async;
pub mod availability;
pub mod booking_store;
pub mod calendar_store;
pub mod engine;
pub mod machinery_registry;
pub mod payment;
pub mod pricing;
pub mod query;
pub mod traits;

pub use availability::AvailabilityReport;
pub use booking_store::BookingStore;
pub use calendar_store::CalendarStore;
pub use engine::BookingEngine;
pub use machinery_registry::MachineryRegistry;
pub use payment::DemoGateway;
pub use pricing::{DayCountPolicy, PricingConfig};
pub use query::{BookingQuery, Page};
pub use r#async::{AsyncBookingEngine, AsyncBookingStore, AsyncCalendarStore, AsyncMachineryRegistry};
pub use traits::PaymentGateway;
