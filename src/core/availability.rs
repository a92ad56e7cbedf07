//! Availability checking
//!
//! Pure functions deciding whether a requested interval is free on one
//! machine. They look only at the reservations they are handed (the ones
//! belonging to the target machine) and make no assumption about their
//! order, so callers may pass the calendar exactly as stored.

use crate::types::{DateInterval, Reservation};

/// Snapshot answer to an availability query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityReport {
    /// Whether a booking for the requested interval would be accepted
    pub available: bool,

    /// Reservations currently held on the machine
    pub booked: Vec<Reservation>,
}

/// First reservation overlapping `requested`, if any
pub fn first_conflict<'a>(
    reservations: &'a [Reservation],
    requested: &DateInterval,
) -> Option<&'a Reservation> {
    reservations
        .iter()
        .find(|reservation| reservation.interval.overlaps(requested))
}

/// Whether any reservation overlaps `requested`
pub fn has_conflict(reservations: &[Reservation], requested: &DateInterval) -> bool {
    first_conflict(reservations, requested).is_some()
}

/// Whether a machine can take a booking for `requested`
///
/// Available means the owner's `available` switch is on and no existing
/// reservation shares a day with the request.
pub fn is_available(
    machinery_available: bool,
    reservations: &[Reservation],
    requested: &DateInterval,
) -> bool {
    machinery_available && !has_conflict(reservations, requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn interval(start: u32, end: u32) -> DateInterval {
        DateInterval::new(day(start), day(end)).unwrap()
    }

    fn reservation(booking: u32, start: u32, end: u32) -> Reservation {
        Reservation {
            booking,
            interval: interval(start, end),
        }
    }

    #[test]
    fn test_empty_calendar_is_available() {
        assert!(is_available(true, &[], &interval(1, 3)));
    }

    #[test]
    fn test_unavailable_flag_wins_over_empty_calendar() {
        assert!(!is_available(false, &[], &interval(1, 3)));
    }

    #[rstest]
    #[case::overlap_on_two_days(interval(1, 3), false)]
    #[case::touching_start_day(interval(4, 6), false)]
    #[case::day_after(interval(5, 6), true)]
    #[case::day_before(interval(1, 1), true)]
    #[case::same_day_inside(interval(3, 3), false)]
    fn test_against_single_reservation(#[case] requested: DateInterval, #[case] expected: bool) {
        let calendar = [reservation(1, 2, 4)];
        assert_eq!(is_available(true, &calendar, &requested), expected);
    }

    #[test]
    fn test_unsorted_calendar() {
        let calendar = [
            reservation(3, 20, 25),
            reservation(1, 1, 2),
            reservation(2, 10, 12),
        ];

        assert!(is_available(true, &calendar, &interval(5, 9)));
        assert_eq!(
            first_conflict(&calendar, &interval(11, 21)).map(|r| r.booking),
            Some(3)
        );
    }

    #[test]
    fn test_check_is_repeatable() {
        let calendar = [reservation(1, 2, 4)];
        let requested = interval(3, 5);

        let first = has_conflict(&calendar, &requested);
        let second = has_conflict(&calendar, &requested);
        assert_eq!(first, second);
    }
}
