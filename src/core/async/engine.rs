//! Booking orchestration for concurrent callers
//!
//! This module provides the `AsyncBookingEngine` struct, which implements the
//! same operations as `BookingEngine` on top of thread-safe stores, for use
//! from many tokio tasks at once.
//!
//! # Architecture
//!
//! ```text
//! AsyncBookingEngine
//!     ├── Arc<AsyncMachineryRegistry>            (listings and counters)
//!     ├── Arc<AsyncCalendarStore>                (reservations per machine)
//!     ├── Arc<AsyncBookingStore>                 (booking records)
//!     └── Arc<DashMap<MachineryId, Arc<Mutex>>>  (one lock per machine)
//! ```
//!
//! # Locking
//!
//! Every operation that can change a calendar or a booking first takes the
//! lock of the machine involved and holds it until both the calendar and
//! the booking record are written. Check-then-reserve on one machine is
//! therefore atomic, and cancel/complete of one booking cannot both win.
//! Operations on different machines never wait for each other.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AsyncBookingStore, AsyncCalendarStore, AsyncMachineryRegistry};
use crate::core::availability::{first_conflict, is_available, AvailabilityReport};
use crate::core::payment::payable_amount;
use crate::core::pricing::{self, PricingConfig};
use crate::core::query::{BookingQuery, Page};
use crate::core::traits::PaymentGateway;
use crate::types::{
    generate_booking_number, Amount, Booking, BookingCommand, BookingError, BookingEvent,
    BookingId, BookingRequest, CommandAction, DateInterval, Machinery, MachineryId,
    MachineryUpdate, PaymentHandle, PaymentOutcome, Transition, UserId,
};

/// Booking engine shared across async tasks
///
/// Cloning is cheap and every clone operates on the same stores.
#[derive(Debug, Clone)]
pub struct AsyncBookingEngine {
    registry: Arc<AsyncMachineryRegistry>,
    calendar: Arc<AsyncCalendarStore>,
    bookings: Arc<AsyncBookingStore>,

    /// Per-machine locks, created on first use
    locks: Arc<DashMap<MachineryId, Arc<Mutex<()>>>>,

    config: Arc<PricingConfig>,
}

impl AsyncBookingEngine {
    /// Create a new AsyncBookingEngine with the default pricing configuration
    pub fn new() -> Self {
        Self::with_config(PricingConfig::default())
    }

    /// Create a new AsyncBookingEngine
    ///
    /// # Arguments
    ///
    /// * `config` - Pricing configuration shared by every clone
    pub fn with_config(config: PricingConfig) -> Self {
        Self {
            registry: Arc::new(AsyncMachineryRegistry::new()),
            calendar: Arc::new(AsyncCalendarStore::new()),
            bookings: Arc::new(AsyncBookingStore::new()),
            locks: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    // The map guard is dropped at the end of the statement, before any await.
    fn machine_lock(&self, machinery: MachineryId) -> Arc<Mutex<()>> {
        Arc::clone(&self.locks.entry(machinery).or_default())
    }

    /// List a machine for rent
    pub fn register_machinery(&self, machinery: Machinery) -> Result<(), BookingError> {
        let id = machinery.id;
        self.registry.register(machinery)?;
        debug!(machinery = id, "Registered machinery");
        Ok(())
    }

    /// Snapshot of an active machine
    pub fn machinery(&self, id: MachineryId) -> Result<Machinery, BookingError> {
        self.registry.get(id)
    }

    /// Snapshot of an active machine, counting the view
    pub fn view_machinery(&self, id: MachineryId) -> Result<Machinery, BookingError> {
        self.registry.view(id)
    }

    /// Apply owner edits to a listing
    pub async fn update_machinery(
        &self,
        id: MachineryId,
        update: MachineryUpdate,
    ) -> Result<Machinery, BookingError> {
        let lock = self.machine_lock(id);
        let _guard = lock.lock().await;
        self.registry.update_listing(id, update)
    }

    /// Soft-delete a listing
    pub async fn deactivate_machinery(&self, id: MachineryId) -> Result<(), BookingError> {
        let lock = self.machine_lock(id);
        let _guard = lock.lock().await;
        self.registry.deactivate(id)?;
        info!(machinery = id, "Deactivated machinery");
        Ok(())
    }

    /// Check whether a machine can be booked for `start..=end`
    ///
    /// Lock-free snapshot: the answer may be stale by the time the caller
    /// acts on it, and `create_booking` checks again under the lock.
    pub fn check_availability(
        &self,
        machinery: MachineryId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AvailabilityReport, BookingError> {
        let requested = DateInterval::new(start, end)?;
        let listing = self.registry.get(machinery)?;
        let reservations = self.calendar.reservations(machinery);

        Ok(AvailabilityReport {
            available: is_available(listing.available, &reservations, &requested),
            booked: reservations,
        })
    }

    /// Create a booking
    ///
    /// Validation happens before the machine lock is taken; availability,
    /// pricing, the reservation and the booking record all happen under it.
    ///
    /// # Returns
    ///
    /// * `Ok(Booking)` - The new booking in `pending` status
    /// * `Err(BookingError)` - Nothing was reserved or stored
    ///
    /// # Errors
    ///
    /// Same as `BookingEngine::create_booking`, plus `Conflict` if the
    /// calendar write loses a race.
    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let interval = request.validate()?;

        let lock = self.machine_lock(request.machinery);
        let _guard = lock.lock().await;

        let machinery = self.registry.get(request.machinery)?;
        if self.bookings.contains(request.booking) {
            return Err(BookingError::duplicate_booking(request.booking));
        }

        let unavailable = |conflicting| {
            BookingError::unavailable(machinery.id, interval.start(), interval.end(), conflicting)
        };
        if !machinery.available {
            return Err(unavailable(None));
        }
        let reservations = self.calendar.reservations(machinery.id);
        if let Some(existing) = first_conflict(&reservations, &interval) {
            return Err(unavailable(Some(existing.booking)));
        }

        let price = pricing::price(
            &machinery,
            &interval,
            request.delivery_requested,
            request.distance,
            &self.config,
        )?;
        let booking = Booking::new(
            &request,
            &machinery,
            interval,
            price,
            generate_booking_number(request.booking),
            Utc::now(),
        );

        self.calendar.reserve(booking.machinery, interval, booking.id)?;
        if let Err(error) = self.bookings.insert(booking.clone()) {
            self.calendar.release(booking.machinery, booking.id);
            return Err(error);
        }
        self.registry.increment_bookings(booking.machinery)?;

        info!(
            booking = booking.id,
            machinery = booking.machinery,
            interval = %booking.interval,
            total = booking.price.total,
            "Created booking"
        );
        Ok(booking)
    }

    /// Apply a lifecycle event to a booking
    ///
    /// The booking is re-read under its machine's lock, so the event is
    /// checked against the latest status.
    ///
    /// # Errors
    ///
    /// Returns `BookingNotFound`, `InvalidTransition`, or `PaymentFailed`
    /// (after the failed payment status has been stored).
    pub async fn transition(
        &self,
        id: BookingId,
        event: BookingEvent,
    ) -> Result<Booking, BookingError> {
        let machinery = self
            .bookings
            .get(id)
            .ok_or_else(|| BookingError::booking_not_found(id))?
            .machinery;

        let lock = self.machine_lock(machinery);
        let _guard = lock.lock().await;

        self.transition_locked(id, event)
    }

    fn transition_locked(&self, id: BookingId, event: BookingEvent) -> Result<Booking, BookingError> {
        let current = self
            .bookings
            .get(id)
            .ok_or_else(|| BookingError::booking_not_found(id))?;

        let Transition {
            next,
            releases_reservation,
            changed,
            failure,
        } = current.plan(&event, Utc::now())?;

        if releases_reservation {
            self.calendar.release(next.machinery, next.id);
        }
        if changed {
            self.bookings.replace(next.clone())?;
        }

        match failure {
            Some(error) => {
                warn!(booking = id, "{}", error);
                Err(error)
            }
            None => {
                info!(
                    booking = id,
                    operation = event.name(),
                    status = %next.status,
                    "Applied booking event"
                );
                Ok(next)
            }
        }
    }

    pub async fn approve(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Approve).await
    }

    pub async fn reject(&self, id: BookingId, reason: Option<String>) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Reject { reason }).await
    }

    pub async fn record_payment(
        &self,
        id: BookingId,
        outcome: PaymentOutcome,
    ) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::RecordPayment(outcome))
            .await
    }

    pub async fn start(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Start).await
    }

    pub async fn complete(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Complete).await
    }

    pub async fn cancel(
        &self,
        id: BookingId,
        reason: Option<String>,
        cancelled_by: Option<UserId>,
    ) -> Result<Booking, BookingError> {
        self.transition(
            id,
            BookingEvent::Cancel {
                reason,
                cancelled_by,
            },
        )
        .await
    }

    /// Open a payment for the outstanding amount of a booking
    ///
    /// # Errors
    ///
    /// Returns an error if the booking is unknown, terminal, already paid,
    /// or the gateway refuses the payment.
    pub async fn initiate_payment(
        &self,
        id: BookingId,
        gateway: &dyn PaymentGateway,
    ) -> Result<PaymentHandle, BookingError> {
        let machinery = self
            .bookings
            .get(id)
            .ok_or_else(|| BookingError::booking_not_found(id))?
            .machinery;

        let lock = self.machine_lock(machinery);
        let _guard = lock.lock().await;

        let mut booking = self
            .bookings
            .get(id)
            .ok_or_else(|| BookingError::booking_not_found(id))?;
        let amount = payable_amount(&booking)?;

        let handle = gateway.initiate(id, amount)?;

        booking.open_payment(handle.reference.clone(), Utc::now());
        self.bookings.replace(booking)?;

        debug!(booking = id, amount, reference = %handle.reference, "Initiated payment");
        Ok(handle)
    }

    /// Apply a payment result reported for `handle`
    ///
    /// Results may arrive late or more than once; both are harmless.
    pub async fn on_payment_result(
        &self,
        handle: &PaymentHandle,
        success: bool,
        amount: Option<Amount>,
    ) -> Result<Booking, BookingError> {
        let outcome = if success {
            PaymentOutcome::succeeded(amount)
        } else {
            PaymentOutcome::failed(None)
        };

        self.record_payment(handle.booking, outcome.with_reference(handle.reference.clone()))
            .await
    }

    /// Apply one replay command
    ///
    /// # Errors
    ///
    /// A transition fails with `MachineryMismatch` when the command names a
    /// machine other than the booking's.
    pub async fn apply(&self, command: BookingCommand) -> Result<Booking, BookingError> {
        match command.action {
            CommandAction::Create(request) => self.create_booking(request).await,
            CommandAction::Transition(event) => {
                let stored = self
                    .bookings
                    .get(command.booking)
                    .ok_or_else(|| BookingError::booking_not_found(command.booking))?;

                if stored.machinery != command.machinery {
                    return Err(BookingError::machinery_mismatch(
                        command.booking,
                        stored.machinery,
                        command.machinery,
                        event.name(),
                    ));
                }

                let lock = self.machine_lock(stored.machinery);
                let _guard = lock.lock().await;
                self.transition_locked(command.booking, event)
            }
        }
    }

    /// Snapshot of a booking
    pub fn booking(&self, id: BookingId) -> Option<Booking> {
        self.bookings.get(id)
    }

    pub fn bookings_for_renter(&self, renter: UserId, query: &BookingQuery) -> Page<Booking> {
        self.bookings.for_renter(renter, query)
    }

    pub fn bookings_for_owner(&self, owner: UserId, query: &BookingQuery) -> Page<Booking> {
        self.bookings.for_owner(owner, query)
    }

    /// Snapshot of all bookings sorted by booking ID
    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings.all()
    }
}

impl Default for AsyncBookingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payment::DemoGateway;
    use crate::types::{BookingStatus, ErrorKind, PaymentStatus};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn engine_with_tractor() -> AsyncBookingEngine {
        let engine = AsyncBookingEngine::new();
        engine
            .register_machinery(Machinery::new(1, 10, "Tractor", 2500).with_deposit(5000))
            .unwrap();
        engine
    }

    fn request(booking: BookingId, start: u32, end: u32) -> BookingRequest {
        BookingRequest::new(booking, 1, 20, day(start), day(end))
    }

    #[tokio::test]
    async fn test_create_and_lifecycle() {
        let engine = engine_with_tractor();

        let created = engine.create_booking(request(1, 1, 3)).await.unwrap();
        assert_eq!(created.status, BookingStatus::Pending);
        assert_eq!(created.price.total, 12500);

        engine.approve(1).await.unwrap();
        let paid = engine
            .record_payment(1, PaymentOutcome::succeeded(None))
            .await
            .unwrap();
        assert_eq!(paid.status, BookingStatus::Confirmed);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.paid_amount, 12500);

        let cancelled = engine.cancel(1, None, Some(20)).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(engine.check_availability(1, day(1), day(3)).unwrap().available);
    }

    #[tokio::test]
    async fn test_overlap_is_unavailable() {
        let engine = engine_with_tractor();
        engine.create_booking(request(1, 2, 4)).await.unwrap();

        let result = engine.create_booking(request(2, 1, 3)).await;

        assert_eq!(
            result.unwrap_err(),
            BookingError::unavailable(1, day(1), day(3), Some(1))
        );
        assert_eq!(engine.calendar.reservations(1).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_identical_creates_admit_one() {
        let engine = engine_with_tractor();

        let tasks: Vec<_> = (1..=2)
            .map(|id| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.create_booking(request(id, 1, 3)).await })
            })
            .collect();

        let mut successes = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(booking) => {
                    assert_eq!(booking.status, BookingStatus::Pending);
                    successes += 1;
                }
                Err(error) => assert!(matches!(
                    error.kind(),
                    ErrorKind::Unavailable | ErrorKind::Conflict
                )),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(engine.calendar.reservations(1).len(), 1);
        assert_eq!(engine.machinery(1).unwrap().total_bookings, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mixed_operations_keep_calendar_disjoint() {
        let engine = engine_with_tractor();

        let tasks: Vec<_> = (0..40u32)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let start = 1 + i % 20;
                    let id = i + 1;
                    if engine.create_booking(request(id, start, start + 2)).await.is_ok()
                        && i % 3 == 0
                    {
                        let _ = engine.cancel(id, None, None).await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let booked = engine.calendar.reservations(1);
        for (i, a) in booked.iter().enumerate() {
            for b in &booked[i + 1..] {
                assert!(!a.interval.overlaps(&b.interval));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancel_and_start_race_has_one_winner() {
        let engine = engine_with_tractor();
        engine.create_booking(request(1, 1, 3)).await.unwrap();
        engine.approve(1).await.unwrap();

        let cancel = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.cancel(1, None, None).await })
        };
        let start = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.start(1).await })
        };

        let results = [cancel.await.unwrap(), start.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_payment_result_is_idempotent() {
        let engine = engine_with_tractor();
        engine.create_booking(request(1, 1, 3)).await.unwrap();
        let handle = engine.initiate_payment(1, &DemoGateway::new()).await.unwrap();

        let first = engine.on_payment_result(&handle, true, None).await.unwrap();
        let second = engine.on_payment_result(&handle, true, None).await.unwrap();
        let late_failure = engine.on_payment_result(&handle, false, None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(late_failure.payment_status, PaymentStatus::Paid);
        assert_eq!(late_failure.paid_amount, 12500);
    }

    #[tokio::test]
    async fn test_apply_checks_machinery() {
        let engine = engine_with_tractor();
        engine.create_booking(request(1, 1, 3)).await.unwrap();

        let result = engine
            .apply(BookingCommand {
                machinery: 9,
                booking: 1,
                action: CommandAction::Transition(BookingEvent::Approve),
            })
            .await;

        assert!(matches!(result, Err(BookingError::MachineryMismatch { .. })));
    }
}
