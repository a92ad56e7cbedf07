//! Booking-related types for the rental booking engine
//!
//! This module defines the booking record, its lifecycle and payment
//! statuses, the requests and events that drive it, and the state machine
//! itself. The state machine is pure: [`Booking::plan`] computes the next
//! version of a booking without touching any store, so the engines can
//! apply the calendar effect and the record update under one lock.

use super::calendar::DateInterval;
use super::error::BookingError;
use super::machinery::{Amount, Machinery, MachineryId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Booking identifier
///
/// Assigned by the request layer, which must keep it unique.
pub type BookingId = u32;

/// Lifecycle status of a booking
///
/// ```text
/// pending ──► confirmed ──► in-progress ──► completed
///    │            │
///    ├─► rejected └─► cancelled
///    └──────────────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    /// Created and holding its reservation, awaiting owner approval
    Pending,

    /// Approved by the owner (or paid)
    Confirmed,

    /// Machine handed over to the renter
    InProgress,

    /// Machine returned; the reservation has been released
    Completed,

    /// Declined by the owner while pending
    Rejected,

    /// Withdrawn before the rental started
    Cancelled,
}

impl BookingStatus {
    /// Lowercase name as used in CSV output and messages
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// No transition ever leaves a terminal status
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Rejected | BookingStatus::Cancelled
        )
    }

    /// Whether a booking in this status owns a calendar reservation
    pub fn holds_reservation(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the renter intends to pay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Demo payments settle immediately at creation
    Demo,

    /// Payment goes through the payment adapter
    #[default]
    Gateway,
}

/// Monetary breakdown of a booking
///
/// All amounts are in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Billable days
    pub day_count: u32,

    /// Daily tariff at the time of booking
    pub price_per_day: Amount,

    /// `day_count × price_per_day`
    pub base: Amount,

    /// Delivery surcharge (0 when not requested or not offered)
    pub delivery_charge: Amount,

    /// Security deposit
    pub deposit: Amount,

    /// Promotional discount
    pub discount: Amount,

    /// `base + delivery_charge + deposit - discount`
    pub total: Amount,
}

/// Reference returned by the payment adapter when a payment is initiated
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentHandle {
    /// Booking being paid for
    pub booking: BookingId,

    /// Adapter-specific payment reference
    pub reference: String,
}

/// Result of a payment as reported by the payment adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Adapter reference, if the payment went through the adapter
    pub reference: Option<String>,

    /// Whether the payment succeeded
    pub success: bool,

    /// Amount captured; `None` means the full booking total
    pub amount: Option<Amount>,

    /// Adapter's failure reason
    pub reason: Option<String>,
}

impl PaymentOutcome {
    /// A successful payment of `amount` (or the full total when `None`)
    pub fn succeeded(amount: Option<Amount>) -> Self {
        PaymentOutcome {
            reference: None,
            success: true,
            amount,
            reason: None,
        }
    }

    /// A declined payment
    pub fn failed(reason: Option<String>) -> Self {
        PaymentOutcome {
            reference: None,
            success: false,
            amount: None,
            reason,
        }
    }

    /// Attach the adapter reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// A renter's request to book a machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    /// Identity for the new booking
    pub booking: BookingId,

    /// Machine to rent
    pub machinery: MachineryId,

    /// Renter placing the request
    pub renter: UserId,

    /// First rental day
    pub start: Option<NaiveDate>,

    /// Last rental day (inclusive)
    pub end: Option<NaiveDate>,

    /// Whether the renter wants the machine delivered
    pub delivery_requested: bool,

    /// Delivery distance in kilometres, when known
    pub distance: Option<Decimal>,

    pub delivery_address: Option<String>,
    pub purpose: Option<String>,
    pub payment_mode: PaymentMode,
}

impl BookingRequest {
    /// Request without delivery, paid through the payment adapter
    pub fn new(
        booking: BookingId,
        machinery: MachineryId,
        renter: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        BookingRequest {
            booking,
            machinery,
            renter,
            start: Some(start),
            end: Some(end),
            delivery_requested: false,
            distance: None,
            delivery_address: None,
            purpose: None,
            payment_mode: PaymentMode::default(),
        }
    }

    /// Ask for delivery over `distance` km (or the configured default when `None`)
    pub fn with_delivery(mut self, distance: Option<Decimal>) -> Self {
        self.delivery_requested = true;
        self.distance = distance;
        self
    }

    pub fn with_payment_mode(mut self, payment_mode: PaymentMode) -> Self {
        self.payment_mode = payment_mode;
        self
    }

    /// Check required fields and build the requested interval
    ///
    /// # Errors
    ///
    /// - `MissingField` when a date is absent
    /// - `InvalidDateRange` when start is after end
    /// - `InvalidField` when the distance is negative
    pub fn validate(&self) -> Result<DateInterval, BookingError> {
        let start = self
            .start
            .ok_or_else(|| BookingError::missing_field("start"))?;
        let end = self.end.ok_or_else(|| BookingError::missing_field("end"))?;

        if let Some(distance) = self.distance {
            if distance.is_sign_negative() && !distance.is_zero() {
                return Err(BookingError::invalid_field(
                    "distance",
                    &distance.to_string(),
                    "must not be negative",
                ));
            }
        }

        DateInterval::new(start, end)
    }
}

/// Events that move a booking through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    /// Owner approves a pending booking
    Approve,

    /// Owner declines a pending booking
    Reject { reason: Option<String> },

    /// Payment adapter reports a result
    RecordPayment(PaymentOutcome),

    /// Machine handed over to the renter
    Start,

    /// Machine returned
    Complete,

    /// Renter or owner withdraws the booking
    Cancel {
        reason: Option<String>,
        cancelled_by: Option<UserId>,
    },
}

impl BookingEvent {
    /// Operation name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::Approve => "approve",
            BookingEvent::Reject { .. } => "reject",
            BookingEvent::RecordPayment(_) => "record payment for",
            BookingEvent::Start => "start",
            BookingEvent::Complete => "complete",
            BookingEvent::Cancel { .. } => "cancel",
        }
    }
}

/// Timestamps of every transition the booking has reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingTimeline {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl BookingTimeline {
    fn new(at: DateTime<Utc>) -> Self {
        BookingTimeline {
            created_at: at,
            updated_at: at,
            confirmed_at: None,
            started_at: None,
            completed_at: None,
            rejected_at: None,
            cancelled_at: None,
        }
    }
}

/// A renter's contract for one machine over one interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: BookingId,

    /// Human-readable reference shown to renters and owners
    pub booking_number: String,

    pub machinery: MachineryId,
    pub owner: UserId,
    pub renter: UserId,
    pub interval: DateInterval,
    pub price: PriceBreakdown,
    pub delivery_requested: bool,
    pub delivery_address: Option<String>,
    pub purpose: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_mode: PaymentMode,
    pub paid_amount: Amount,
    pub pending_amount: Amount,

    /// Reference of the latest payment initiated or applied
    pub payment_reference: Option<String>,

    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<UserId>,
    pub timeline: BookingTimeline,
}

/// Result of planning a transition
///
/// Carries the next version of the booking and what the engine must do to
/// the calendar before persisting it.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Booking as it must be stored
    pub next: Booking,

    /// Whether the booking's reservation must be released
    pub releases_reservation: bool,

    /// Whether `next` differs from the current booking
    pub changed: bool,

    /// Failure to report after `next` is stored (declined payments)
    pub failure: Option<BookingError>,
}

/// Generate a booking number such as `BK-000042-9F3A1C2B`
pub fn generate_booking_number(id: BookingId) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("BK-{:06}-{}", id, &suffix[..8]).to_uppercase()
}

impl Booking {
    /// Build a new `pending` booking from a validated request
    ///
    /// Demo payments are settled on the spot; gateway payments leave the
    /// whole total pending.
    pub fn new(
        request: &BookingRequest,
        machinery: &Machinery,
        interval: DateInterval,
        price: PriceBreakdown,
        booking_number: String,
        at: DateTime<Utc>,
    ) -> Self {
        let (payment_status, paid_amount, pending_amount) = match request.payment_mode {
            PaymentMode::Demo => (PaymentStatus::Paid, price.total, 0),
            PaymentMode::Gateway => (PaymentStatus::Pending, 0, price.total),
        };

        Booking {
            id: request.booking,
            booking_number,
            machinery: machinery.id,
            owner: machinery.owner,
            renter: request.renter,
            interval,
            price,
            delivery_requested: request.delivery_requested,
            delivery_address: request.delivery_address.clone(),
            purpose: request.purpose.clone(),
            status: BookingStatus::Pending,
            payment_status,
            payment_mode: request.payment_mode,
            paid_amount,
            pending_amount,
            payment_reference: None,
            rejection_reason: None,
            cancellation_reason: None,
            cancelled_by: None,
            timeline: BookingTimeline::new(at),
        }
    }

    /// Compute the effect of `event` on this booking
    ///
    /// Never mutates `self`; on error nothing needs to be undone.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the current status does not permit
    /// the event.
    pub fn plan(&self, event: &BookingEvent, at: DateTime<Utc>) -> Result<Transition, BookingError> {
        let mut next = self.clone();
        let mut releases_reservation = false;
        let mut failure = None;

        match event {
            BookingEvent::Approve => {
                self.require(event, &[BookingStatus::Pending])?;
                next.status = BookingStatus::Confirmed;
                next.timeline.confirmed_at = Some(at);
            }
            BookingEvent::Reject { reason } => {
                self.require(event, &[BookingStatus::Pending])?;
                next.status = BookingStatus::Rejected;
                next.rejection_reason = reason.clone();
                next.timeline.rejected_at = Some(at);
                releases_reservation = true;
            }
            BookingEvent::Start => {
                self.require(event, &[BookingStatus::Confirmed])?;
                next.status = BookingStatus::InProgress;
                next.timeline.started_at = Some(at);
            }
            BookingEvent::Complete => {
                self.require(event, &[BookingStatus::InProgress])?;
                next.status = BookingStatus::Completed;
                next.timeline.completed_at = Some(at);
                releases_reservation = true;
            }
            BookingEvent::Cancel {
                reason,
                cancelled_by,
            } => {
                self.require(event, &[BookingStatus::Pending, BookingStatus::Confirmed])?;
                next.status = BookingStatus::Cancelled;
                next.cancellation_reason = reason.clone();
                next.cancelled_by = *cancelled_by;
                next.timeline.cancelled_at = Some(at);
                releases_reservation = true;
            }
            BookingEvent::RecordPayment(outcome) => {
                if self.status.is_terminal() {
                    return Err(BookingError::invalid_transition(
                        self.id,
                        event.name(),
                        self.status,
                    ));
                }
                failure = next.apply_payment(outcome, at);
            }
        }

        let changed = next != *self;
        if changed {
            next.timeline.updated_at = at;
        }

        Ok(Transition {
            next,
            releases_reservation,
            changed,
            failure,
        })
    }

    /// Record a payment opened with the payment adapter
    ///
    /// A booking that was only partly paid goes back to `pending` payment so
    /// the next result can settle the remainder. Results carrying any other
    /// reference are ignored from now on.
    pub fn open_payment(&mut self, reference: String, at: DateTime<Utc>) {
        if self.pending_amount > 0 {
            self.payment_status = PaymentStatus::Pending;
        }
        self.payment_reference = Some(reference);
        self.timeline.updated_at = at;
    }

    // One result settles one opened payment; redelivery and stale results are no-ops.
    fn apply_payment(&mut self, outcome: &PaymentOutcome, at: DateTime<Utc>) -> Option<BookingError> {
        let stale = match (&outcome.reference, &self.payment_reference) {
            (Some(received), Some(current)) => received != current,
            _ => false,
        };
        if stale || self.payment_status == PaymentStatus::Paid {
            return None;
        }

        if !outcome.success {
            self.payment_status = PaymentStatus::Failed;
            if outcome.reference.is_some() {
                self.payment_reference = outcome.reference.clone();
            }
            return Some(BookingError::payment_failed(self.id, outcome.reason.clone()));
        }

        let captured = outcome.amount.unwrap_or(self.pending_amount);
        let paid = self
            .paid_amount
            .saturating_add(captured)
            .min(self.price.total);
        self.payment_status = PaymentStatus::Paid;
        self.paid_amount = paid;
        self.pending_amount = self.price.total - paid;
        if outcome.reference.is_some() {
            self.payment_reference = outcome.reference.clone();
        }
        if self.status == BookingStatus::Pending {
            self.status = BookingStatus::Confirmed;
            self.timeline.confirmed_at = Some(at);
        }
        None
    }

    fn require(&self, event: &BookingEvent, allowed: &[BookingStatus]) -> Result<(), BookingError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(BookingError::invalid_transition(
                self.id,
                event.name(),
                self.status,
            ))
        }
    }
}
