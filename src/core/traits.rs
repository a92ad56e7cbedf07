//! Core traits for collaborators outside the booking engine
//!
//! This module defines the seam between the engines and the payment
//! provider, so both the synchronous and the concurrent engine can drive
//! any gateway implementation interchangeably.

use crate::types::{Amount, BookingError, BookingId, PaymentHandle};

/// Trait for starting payments with an external provider
///
/// `initiate` only opens the payment. Its result is reported later through
/// the engine's `on_payment_result`, possibly more than once, so engines
/// apply it idempotently.
pub trait PaymentGateway: Send + Sync {
    /// Open a payment of `amount` for `booking`
    ///
    /// # Errors
    ///
    /// Implementations return `PaymentFailed` when the provider refuses to
    /// open the payment.
    fn initiate(&self, booking: BookingId, amount: Amount) -> Result<PaymentHandle, BookingError>;
}
