//! Machinery-related types for the rental booking engine
//!
//! A piece of machinery is the rentable resource. Its tariff and delivery
//! settings feed the pricing calculator; its reservations live in the
//! calendar store, keyed by the machinery ID.

/// Machinery identifier
pub type MachineryId = u32;

/// Identifier of a marketplace user (owner or renter)
pub type UserId = u32;

/// Monetary amount in the smallest currency unit
pub type Amount = u64;

/// A rentable machine listed by its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machinery {
    /// The machinery ID
    pub id: MachineryId,

    /// User who listed the machine and approves its bookings
    pub owner: UserId,

    /// Display name
    pub name: String,

    /// Daily tariff
    pub price_per_day: Amount,

    /// Delivery tariff per kilometre, when the owner charges for delivery
    pub delivery_charge_per_km: Option<Amount>,

    /// Refundable security deposit charged once per booking
    pub security_deposit: Amount,

    /// Whether the owner offers delivery at all
    pub delivery_available: bool,

    /// Owner-controlled switch; `false` blocks every new booking
    pub available: bool,

    /// Cleared when the listing is deleted (soft delete)
    pub is_active: bool,

    /// Number of bookings ever created for this machine
    pub total_bookings: u64,

    /// Number of times the listing was viewed
    pub views: u64,
}

impl Machinery {
    /// Create an active, available listing with no deposit and no delivery
    pub fn new(
        id: MachineryId,
        owner: UserId,
        name: impl Into<String>,
        price_per_day: Amount,
    ) -> Self {
        Machinery {
            id,
            owner,
            name: name.into(),
            price_per_day,
            delivery_charge_per_km: None,
            security_deposit: 0,
            delivery_available: false,
            available: true,
            is_active: true,
            total_bookings: 0,
            views: 0,
        }
    }

    /// Set the security deposit
    pub fn with_deposit(mut self, security_deposit: Amount) -> Self {
        self.security_deposit = security_deposit;
        self
    }

    /// Offer delivery at the given per-kilometre rate
    pub fn with_delivery(mut self, charge_per_km: Amount) -> Self {
        self.delivery_available = true;
        self.delivery_charge_per_km = Some(charge_per_km);
        self
    }

    /// Set the owner's availability switch
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// Owner edits to a listing
///
/// Counters (`total_bookings`, `views`) and the soft-delete flag are not
/// editable through an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineryUpdate {
    pub name: Option<String>,
    pub price_per_day: Option<Amount>,
    pub delivery_charge_per_km: Option<Option<Amount>>,
    pub security_deposit: Option<Amount>,
    pub delivery_available: Option<bool>,
    pub available: Option<bool>,
}

impl MachineryUpdate {
    /// Apply the present fields to a listing
    pub fn apply_to(self, machinery: &mut Machinery) {
        if let Some(name) = self.name {
            machinery.name = name;
        }
        if let Some(price) = self.price_per_day {
            machinery.price_per_day = price;
        }
        if let Some(charge) = self.delivery_charge_per_km {
            machinery.delivery_charge_per_km = charge;
        }
        if let Some(deposit) = self.security_deposit {
            machinery.security_deposit = deposit;
        }
        if let Some(delivery) = self.delivery_available {
            machinery.delivery_available = delivery;
        }
        if let Some(available) = self.available {
            machinery.available = available;
        }
    }
}
