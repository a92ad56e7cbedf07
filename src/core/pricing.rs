//! Pricing calculator
//!
//! Turns a machine's tariff, a requested interval and the delivery choice
//! into a [`PriceBreakdown`]. Everything here is a pure function of its
//! inputs: no clock, no randomness, no store access.
//!
//! Amounts are integers in the smallest currency unit. The only fractional
//! quantity is the delivery distance, a `Decimal`; the delivery surcharge is
//! rounded to an integer exactly once, before it is added to anything else.

use crate::types::{Amount, BookingError, DateInterval, Machinery, PriceBreakdown};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// How billable days are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayCountPolicy {
    /// Every calendar day touched by the interval (03-01..03-03 is 3 days)
    #[default]
    Inclusive,

    /// Whole days elapsed between start and end, never less than one
    Elapsed,
}

/// Pricing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    /// Distance assumed when a renter asks for delivery without giving one
    pub default_delivery_distance: Decimal,

    /// Billable day rule
    pub day_count: DayCountPolicy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_delivery_distance: Decimal::TEN,
            day_count: DayCountPolicy::default(),
        }
    }
}

impl PricingConfig {
    /// Create a PricingConfig, falling back to the default distance when
    /// `default_delivery_distance` is negative
    pub fn new(default_delivery_distance: Decimal, day_count: DayCountPolicy) -> Self {
        let default = Self::default();

        let default_delivery_distance = if default_delivery_distance.is_sign_negative()
            && !default_delivery_distance.is_zero()
        {
            tracing::warn!(
                "Invalid default delivery distance ({}), using default ({})",
                default_delivery_distance,
                default.default_delivery_distance
            );
            default.default_delivery_distance
        } else {
            default_delivery_distance
        };

        Self {
            default_delivery_distance,
            day_count,
        }
    }
}

/// Billable days for an interval
///
/// A same-day interval is always exactly one day under either policy.
pub fn day_count(interval: &DateInterval, policy: DayCountPolicy) -> i64 {
    match policy {
        DayCountPolicy::Inclusive => interval.calendar_days(),
        DayCountPolicy::Elapsed => interval.elapsed_days().max(1),
    }
}

/// Delivery surcharge for a request
///
/// Zero unless delivery is both requested and offered. A missing per-km
/// rate counts as free delivery.
///
/// # Errors
///
/// - `InvalidField` if `distance` is negative
/// - `ArithmeticOverflow` if the surcharge does not fit an amount
pub fn delivery_charge(
    machinery: &Machinery,
    delivery_requested: bool,
    distance: Option<Decimal>,
    config: &PricingConfig,
) -> Result<Amount, BookingError> {
    if !delivery_requested || !machinery.delivery_available {
        return Ok(0);
    }

    let distance = distance.unwrap_or(config.default_delivery_distance);
    if distance.is_sign_negative() && !distance.is_zero() {
        return Err(BookingError::invalid_field(
            "distance",
            &distance.to_string(),
            "must not be negative",
        ));
    }

    let rate = Decimal::from(machinery.delivery_charge_per_km.unwrap_or(0));
    rate.checked_mul(distance)
        .map(|charge| charge.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|charge| charge.to_u64())
        .ok_or_else(|| BookingError::arithmetic_overflow("delivery charge", machinery.id))
}

/// Price a booking
///
/// # Arguments
///
/// * `machinery` - The machine being rented (tariff, deposit, delivery settings)
/// * `interval` - Requested rental days
/// * `delivery_requested` - Whether the renter wants delivery
/// * `distance` - Delivery distance in km; `None` uses the configured default
/// * `config` - Pricing configuration
///
/// # Returns
///
/// The full breakdown: `total = base + delivery_charge + deposit - discount`.
///
/// # Errors
///
/// Returns an error if the distance is negative or any step would overflow.
pub fn price(
    machinery: &Machinery,
    interval: &DateInterval,
    delivery_requested: bool,
    distance: Option<Decimal>,
    config: &PricingConfig,
) -> Result<PriceBreakdown, BookingError> {
    let overflow = |operation: &str| BookingError::arithmetic_overflow(operation, machinery.id);

    let days = u32::try_from(day_count(interval, config.day_count))
        .map_err(|_| overflow("day count"))?;

    let base = Amount::from(days)
        .checked_mul(machinery.price_per_day)
        .ok_or_else(|| overflow("base rental"))?;

    let delivery = delivery_charge(machinery, delivery_requested, distance, config)?;
    let deposit = machinery.security_deposit;

    // No promotional rules exist yet.
    let discount: Amount = 0;

    let total = base
        .checked_add(delivery)
        .and_then(|sum| sum.checked_add(deposit))
        .and_then(|sum| sum.checked_sub(discount))
        .ok_or_else(|| overflow("total"))?;

    Ok(PriceBreakdown {
        day_count: days,
        price_per_day: machinery.price_per_day,
        base,
        delivery_charge: delivery,
        deposit,
        discount,
        total,
    })
}
