//! Payment adapter
//!
//! `DemoGateway` is the in-process [`PaymentGateway`] used by replay and
//! tests. It never touches a network: every payment is opened immediately
//! with a fresh reference, and the outcome is delivered separately.

use crate::core::traits::PaymentGateway;
use crate::types::{Amount, Booking, BookingError, BookingId, PaymentHandle};
use uuid::Uuid;

/// Gateway that opens every payment locally
#[derive(Debug, Clone, Default)]
pub struct DemoGateway;

impl DemoGateway {
    pub fn new() -> Self {
        DemoGateway
    }
}

impl PaymentGateway for DemoGateway {
    fn initiate(&self, booking: BookingId, amount: Amount) -> Result<PaymentHandle, BookingError> {
        let reference = format!("demo_{}", Uuid::new_v4().simple());
        tracing::debug!(booking, amount, reference = %reference, "Opened demo payment");

        Ok(PaymentHandle { booking, reference })
    }
}

/// Amount still owed on a booking that may be paid now
///
/// # Errors
///
/// - `InvalidTransition` when the booking is in a terminal status
/// - `AlreadyPaid` when nothing is owed
///
/// A partly paid booking stays payable for its remainder.
pub fn payable_amount(booking: &Booking) -> Result<Amount, BookingError> {
    if booking.status.is_terminal() {
        return Err(BookingError::invalid_transition(
            booking.id,
            "initiate payment for",
            booking.status,
        ));
    }

    if booking.pending_amount == 0 {
        return Err(BookingError::already_paid(booking.id));
    }

    Ok(booking.pending_amount)
}
