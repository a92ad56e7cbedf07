//! Booking listings for renters and owners
//!
//! Shared by the synchronous and concurrent booking stores: both collect the
//! matching bookings and hand them to [`paginate`].

use crate::types::{Booking, BookingStatus};
use std::cmp::Reverse;

const DEFAULT_LIMIT: usize = 10;

/// Filter and page selection for a booking listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingQuery {
    /// Only bookings in this status, when set
    pub status: Option<BookingStatus>,

    /// 1-based page number
    pub page: usize,

    /// Bookings per page
    pub limit: usize,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl BookingQuery {
    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_page(mut self, page: usize, limit: usize) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,

    /// Matching items across all pages
    pub total: usize,

    /// Number of pages
    pub pages: usize,
}

/// Filter, order (newest first) and slice bookings
///
/// A page or limit of zero is treated as the first page / default limit.
pub fn paginate(bookings: Vec<Booking>, query: &BookingQuery) -> Page<Booking> {
    let page = query.page.max(1);
    let limit = if query.limit == 0 {
        DEFAULT_LIMIT
    } else {
        query.limit
    };

    let mut matching: Vec<Booking> = bookings
        .into_iter()
        .filter(|booking| query.status.is_none_or(|status| booking.status == status))
        .collect();
    matching.sort_by_key(|booking| Reverse((booking.timeline.created_at, booking.id)));

    let total = matching.len();
    let items = matching
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        items,
        page,
        limit,
        total,
        pages: total.div_ceil(limit),
    }
}
