//! Booking engine
//!
//! This module provides the BookingEngine that orchestrates bookings by
//! coordinating between the MachineryRegistry, CalendarStore and
//! BookingStore components.
//!
//! The engine enforces business rules such as:
//! - Validation of requests before any store is touched
//! - Availability checks before a reservation is written
//! - Reservation and booking record created together or not at all
//! - The booking lifecycle (pending → confirmed → in-progress → completed)
//! - Releasing the reservation whenever a booking leaves a reserving state

use crate::core::availability::{first_conflict, is_available, AvailabilityReport};
use crate::core::booking_store::BookingStore;
use crate::core::calendar_store::CalendarStore;
use crate::core::machinery_registry::MachineryRegistry;
use crate::core::payment::payable_amount;
use crate::core::pricing::{self, PricingConfig};
use crate::core::query::{BookingQuery, Page};
use crate::core::traits::PaymentGateway;
use crate::types::{
    generate_booking_number, Amount, Booking, BookingCommand, BookingError, BookingEvent,
    BookingId, BookingRequest, CommandAction, DateInterval, Machinery, MachineryId,
    MachineryUpdate, PaymentHandle, PaymentOutcome, Transition, UserId,
};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

/// Booking engine
///
/// Single-owner engine: every operation takes `&mut self`, so check-then-reserve
/// is serialized by construction. See `AsyncBookingEngine` for the shared one.
pub struct BookingEngine {
    registry: MachineryRegistry,
    calendar: CalendarStore,
    bookings: BookingStore,
    config: PricingConfig,
}

impl BookingEngine {
    /// Create a new BookingEngine with the default pricing configuration
    pub fn new() -> Self {
        Self::with_config(PricingConfig::default())
    }

    /// Create a new BookingEngine
    ///
    /// # Arguments
    ///
    /// * `config` - Pricing configuration (default delivery distance, day count rule)
    pub fn with_config(config: PricingConfig) -> Self {
        BookingEngine {
            registry: MachineryRegistry::new(),
            calendar: CalendarStore::new(),
            bookings: BookingStore::new(),
            config,
        }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// List a machine for rent
    pub fn register_machinery(&mut self, machinery: Machinery) -> Result<(), BookingError> {
        let id = machinery.id;
        self.registry.register(machinery)?;
        debug!(machinery = id, "Registered machinery");
        Ok(())
    }

    /// Look up an active machine
    pub fn machinery(&self, id: MachineryId) -> Result<&Machinery, BookingError> {
        self.registry.get(id)
    }

    /// Look up an active machine and count the view
    pub fn view_machinery(&mut self, id: MachineryId) -> Result<&Machinery, BookingError> {
        self.registry.view(id)
    }

    /// Apply owner edits to a listing
    pub fn update_machinery(
        &mut self,
        id: MachineryId,
        update: MachineryUpdate,
    ) -> Result<&Machinery, BookingError> {
        self.registry.update_listing(id, update)
    }

    /// Soft-delete a listing; its existing bookings keep their reservations
    pub fn deactivate_machinery(&mut self, id: MachineryId) -> Result<(), BookingError> {
        self.registry.deactivate(id)?;
        info!(machinery = id, "Deactivated machinery");
        Ok(())
    }

    /// Check whether a machine can be booked for `start..=end`
    ///
    /// # Returns
    ///
    /// The availability verdict together with the reservations currently
    /// held on the machine.
    ///
    /// # Errors
    ///
    /// Returns an error if the dates are reversed or the machine is unknown.
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
            available: is_available(listing.available, reservations, &requested),
            booked: reservations.to_vec(),
        })
    }

    /// Create a booking
    ///
    /// Validates the request, checks availability, prices the rental, then
    /// reserves the interval and stores the `pending` booking.
    ///
    /// # Arguments
    ///
    /// * `request` - The renter's booking request
    ///
    /// # Returns
    ///
    /// * `Ok(Booking)` - The new booking in `pending` status
    /// * `Err(BookingError)` - Nothing was reserved or stored
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A date is missing, reversed, or the distance is negative
    /// - The machine is unknown or deactivated
    /// - The booking ID is already taken
    /// - The machine is switched off or the dates overlap a reservation
    /// - Pricing overflows
    pub fn create_booking(&mut self, request: BookingRequest) -> Result<Booking, BookingError> {
        let interval = request.validate()?;
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
        if let Some(existing) = first_conflict(self.calendar.reservations(machinery.id), &interval)
        {
            return Err(unavailable(Some(existing.booking)));
        }

        let price = pricing::price(
            machinery,
            &interval,
            request.delivery_requested,
            request.distance,
            &self.config,
        )?;
        let booking = Booking::new(
            &request,
            machinery,
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
    /// The reservation is released and the new version stored in one step.
    ///
    /// # Returns
    ///
    /// The booking as stored after the event.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The booking does not exist
    /// - The current status does not permit the event (nothing changes)
    /// - A payment failure was recorded (the booking keeps its status but
    ///   its payment status is updated before the error is returned)
    pub fn transition(
        &mut self,
        id: BookingId,
        event: BookingEvent,
    ) -> Result<Booking, BookingError> {
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

    /// Owner approves a pending booking
    pub fn approve(&mut self, id: BookingId) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Approve)
    }

    /// Owner declines a pending booking, freeing its dates
    pub fn reject(&mut self, id: BookingId, reason: Option<String>) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Reject { reason })
    }

    /// Record a payment outcome
    pub fn record_payment(
        &mut self,
        id: BookingId,
        outcome: PaymentOutcome,
    ) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::RecordPayment(outcome))
    }

    /// Hand the machine over to the renter
    pub fn start(&mut self, id: BookingId) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Start)
    }

    /// Machine returned; frees its dates
    pub fn complete(&mut self, id: BookingId) -> Result<Booking, BookingError> {
        self.transition(id, BookingEvent::Complete)
    }

    /// Withdraw a pending or confirmed booking, freeing its dates
    pub fn cancel(
        &mut self,
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
    }

    /// Open a payment for the outstanding amount of a booking
    ///
    /// The gateway's reference is stored on the booking; the outcome is
    /// delivered later through [`BookingEngine::on_payment_result`].
    ///
    /// # Errors
    ///
    /// Returns an error if the booking is unknown, terminal, already paid,
    /// or the gateway refuses the payment.
    pub fn initiate_payment(
        &mut self,
        id: BookingId,
        gateway: &dyn PaymentGateway,
    ) -> Result<PaymentHandle, BookingError> {
        let booking = self
            .bookings
            .get(id)
            .ok_or_else(|| BookingError::booking_not_found(id))?;
        let amount = payable_amount(booking)?;

        let handle = gateway.initiate(id, amount)?;

        let mut next = booking.clone();
        next.open_payment(handle.reference.clone(), Utc::now());
        self.bookings.replace(next)?;

        debug!(booking = id, amount, reference = %handle.reference, "Initiated payment");
        Ok(handle)
    }

    /// Apply a payment result reported for `handle`
    ///
    /// Safe to call again with the same result.
    pub fn on_payment_result(
        &mut self,
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
    }

    /// Apply one replay command
    ///
    /// # Errors
    ///
    /// Besides the errors of the underlying operation, a transition fails
    /// with `MachineryMismatch` when the command names a machine other than
    /// the booking's.
    pub fn apply(&mut self, command: BookingCommand) -> Result<Booking, BookingError> {
        match command.action {
            CommandAction::Create(request) => self.create_booking(request),
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

                self.transition(command.booking, event)
            }
        }
    }

    /// Get a booking by ID
    pub fn booking(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    /// Bookings placed by `renter`, newest first
    pub fn bookings_for_renter(&self, renter: UserId, query: &BookingQuery) -> Page<Booking> {
        self.bookings.for_renter(renter, query)
    }

    /// Bookings on machines owned by `owner`, newest first
    pub fn bookings_for_owner(&self, owner: UserId, query: &BookingQuery) -> Page<Booking> {
        self.bookings.for_owner(owner, query)
    }

    /// Get all bookings for final output, sorted by booking ID
    pub fn bookings(&self) -> Vec<&Booking> {
        self.bookings.all()
    }
}

impl Default for BookingEngine {
    fn default() -> Self {
        Self::new()
    }
}
