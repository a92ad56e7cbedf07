//! CSV format handling for fleet listings, replay events and booking output
//!
//! This module centralizes all CSV format concerns, providing:
//! - FleetCsvRecord and EventCsvRecord structures for deserialization
//! - Conversion from CSV records to domain types
//! - Booking output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{
    Amount, Booking, BookingCommand, BookingEvent, BookingId, BookingRequest, CommandAction,
    Machinery, MachineryId, PaymentMode, PaymentOutcome, UserId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fleet CSV row
///
/// Columns: machinery, owner, name, price_per_day, delivery_charge_per_km,
/// security_deposit, delivery_available, available. Everything after
/// `price_per_day` may be left empty.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FleetCsvRecord {
    pub machinery: MachineryId,
    pub owner: UserId,
    pub name: String,
    pub price_per_day: Amount,
    pub delivery_charge_per_km: Option<Amount>,
    pub security_deposit: Option<Amount>,
    pub delivery_available: Option<String>,
    pub available: Option<String>,
}

/// Event CSV row
///
/// Columns: type, machinery, booking, renter, start, end, delivery,
/// distance, payment, amount, outcome, reason, actor, purpose. Which
/// optional columns matter depends on `type`: `purpose` is read on
/// `create` rows, `reason` on `reject`, `cancel` and failed `pay` rows.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct EventCsvRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub machinery: MachineryId,
    pub booking: BookingId,
    pub renter: Option<UserId>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub delivery: Option<String>,
    pub distance: Option<String>,
    pub payment: Option<String>,
    pub amount: Option<String>,
    pub outcome: Option<String>,
    pub reason: Option<String>,
    pub actor: Option<UserId>,
    pub purpose: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(field: &str, value: Option<String>, default: bool) -> Result<bool, String> {
    match non_empty(value).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(format!("Invalid {} flag '{}'", field, v)),
        },
    }
}

// chrono's `%m` and `%d` also take one digit, so the shape is checked first
fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, String> {
    non_empty(value)
        .map(|v| {
            let invalid = || format!("Invalid {} date '{}', expected YYYY-MM-DD", field, v);
            if !is_iso_date(&v) {
                return Err(invalid());
            }
            NaiveDate::parse_from_str(&v, DATE_FORMAT).map_err(|_| invalid())
        })
        .transpose()
}

/// Convert a FleetCsvRecord to a Machinery listing
///
/// Delivery is offered when the flag says so, or, with the flag left
/// empty, when a per-km rate is given. Machines are available by default.
pub fn convert_fleet_record(record: FleetCsvRecord) -> Result<Machinery, String> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(format!("Machinery {} has no name", record.machinery));
    }

    let delivery_available = parse_flag(
        "delivery_available",
        record.delivery_available,
        record.delivery_charge_per_km.is_some(),
    )?;
    let available = parse_flag("available", record.available, true)?;

    let mut machinery = Machinery::new(record.machinery, record.owner, name, record.price_per_day)
        .with_deposit(record.security_deposit.unwrap_or(0))
        .with_available(available);
    machinery.delivery_charge_per_km = record.delivery_charge_per_km;
    machinery.delivery_available = delivery_available;

    Ok(machinery)
}

/// Convert an EventCsvRecord to a BookingCommand
///
/// Dates are parsed here but their presence and order are checked by the
/// engine, so a `create` row without dates reaches it and is refused there.
///
/// # Returns
///
/// Result containing either:
/// - Ok(BookingCommand) - Successfully converted command
/// - Err(String) - Error message describing the conversion failure
pub fn convert_event_record(record: EventCsvRecord) -> Result<BookingCommand, String> {
    let booking = record.booking;
    let reason = non_empty(record.reason);

    let action = match record.event_type.trim().to_lowercase().as_str() {
        "create" => {
            let renter = record
                .renter
                .ok_or_else(|| format!("Create for booking {} requires a renter", booking))?;

            let distance = non_empty(record.distance)
                .map(|v| {
                    Decimal::from_str(&v)
                        .map_err(|_| format!("Invalid distance '{}' for booking {}", v, booking))
                })
                .transpose()?;

            let payment_mode = match non_empty(record.payment).map(|v| v.to_lowercase()) {
                None => PaymentMode::default(),
                Some(v) if v == "demo" => PaymentMode::Demo,
                Some(v) if v == "gateway" => PaymentMode::Gateway,
                Some(v) => {
                    return Err(format!(
                        "Invalid payment mode '{}' for booking {}",
                        v, booking
                    ))
                }
            };

            CommandAction::Create(BookingRequest {
                booking,
                machinery: record.machinery,
                renter,
                start: parse_date("start", record.start)?,
                end: parse_date("end", record.end)?,
                delivery_requested: parse_flag("delivery", record.delivery, false)?,
                distance,
                delivery_address: None,
                purpose: non_empty(record.purpose),
                payment_mode,
            })
        }
        "approve" => CommandAction::Transition(BookingEvent::Approve),
        "reject" => CommandAction::Transition(BookingEvent::Reject { reason }),
        "pay" => {
            let amount = non_empty(record.amount)
                .map(|v| {
                    v.parse::<Amount>()
                        .map_err(|_| format!("Invalid amount '{}' for booking {}", v, booking))
                })
                .transpose()?;

            let outcome = match non_empty(record.outcome).map(|v| v.to_lowercase()) {
                None => PaymentOutcome::succeeded(amount),
                Some(v) if v == "success" || v == "paid" => PaymentOutcome::succeeded(amount),
                Some(v) if v == "failed" || v == "declined" => PaymentOutcome::failed(reason),
                Some(v) => {
                    return Err(format!(
                        "Invalid payment outcome '{}' for booking {}",
                        v, booking
                    ))
                }
            };

            CommandAction::Transition(BookingEvent::RecordPayment(outcome))
        }
        "start" => CommandAction::Transition(BookingEvent::Start),
        "complete" => CommandAction::Transition(BookingEvent::Complete),
        "cancel" => CommandAction::Transition(BookingEvent::Cancel {
            reason,
            cancelled_by: record.actor,
        }),
        _ => {
            return Err(format!(
                "Invalid event type: '{}' for booking {}",
                record.event_type, booking
            ))
        }
    };

    Ok(BookingCommand {
        machinery: record.machinery,
        booking,
        action,
    })
}

/// Write bookings to CSV format
///
/// Bookings are sorted by booking ID for deterministic output.
///
/// # Arguments
///
/// * `bookings` - Bookings to write
/// * `output` - Mutable reference to a writer for outputting CSV
pub fn write_bookings_csv(bookings: &[Booking], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "booking", "machinery", "renter", "start", "end", "days", "base", "delivery",
            "deposit", "discount", "total", "status", "payment", "paid", "pending",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&Booking> = bookings.iter().collect();
    sorted.sort_by_key(|booking| booking.id);

    for booking in sorted {
        let price = &booking.price;
        writer
            .write_record(&[
                booking.id.to_string(),
                booking.machinery.to_string(),
                booking.renter.to_string(),
                booking.interval.start().format(DATE_FORMAT).to_string(),
                booking.interval.end().format(DATE_FORMAT).to_string(),
                price.day_count.to_string(),
                price.base.to_string(),
                price.delivery_charge.to_string(),
                price.deposit.to_string(),
                price.discount.to_string(),
                price.total.to_string(),
                booking.status.to_string(),
                booking.payment_status.to_string(),
                booking.paid_amount.to_string(),
                booking.pending_amount.to_string(),
            ])
            .map_err(|e| format!("Failed to write booking record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
