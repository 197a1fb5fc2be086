//! Parking lot domain entity

use rust_decimal::Decimal;

use crate::domain::pricing::max_amount;
use crate::domain::{DomainError, DomainResult};

/// Whether a lot accepts new bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotStatus {
    Open,
    Closed,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl Default for LotStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parking facility with a fixed number of fungible spots.
///
/// `available_spots` is the authoritative capacity counter. The number of
/// held spots (`total_spots - available_spots`) always equals the number of
/// active reservations for the lot.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingLot {
    pub id: i32,
    pub name: String,
    pub location: String,
    pub total_spots: i32,
    pub available_spots: i32,
    /// Price per started hour, 2 decimal places
    pub hourly_rate: Decimal,
    pub status: LotStatus,
}

impl ParkingLot {
    /// Spots currently held by active reservations
    pub fn held_spots(&self) -> i32 {
        self.total_spots - self.available_spots
    }

    pub fn is_full(&self) -> bool {
        self.available_spots <= 0
    }

    /// Check that a booking may be attempted against this lot
    pub fn ensure_bookable(&self) -> DomainResult<()> {
        if self.status == LotStatus::Closed {
            return Err(DomainError::InvalidRequest(format!(
                "Parking lot {} is closed",
                self.id
            )));
        }
        if self.is_full() {
            return Err(DomainError::CapacityExceeded { lot_id: self.id });
        }
        Ok(())
    }

    /// Change the lot size, keeping every held spot held.
    pub fn resize(&mut self, new_total: i32) -> DomainResult<()> {
        if new_total <= 0 {
            return Err(DomainError::InvalidRequest(
                "total_spots must be positive".to_string(),
            ));
        }
        let held = self.held_spots();
        if new_total < held {
            return Err(DomainError::InvalidRequest(format!(
                "Cannot shrink lot {} to {} spots: {} are held by active reservations",
                self.id, new_total, held
            )));
        }
        self.total_spots = new_total;
        self.available_spots = new_total - held;
        Ok(())
    }

    /// Occupancy in percent, rounded to 2 decimal places
    pub fn occupancy_rate(&self) -> Decimal {
        occupancy_percent(self.held_spots() as i64, self.total_spots as i64)
    }
}

/// `occupied / total * 100`, 2 dp; zero for an empty denominator
pub fn occupancy_percent(occupied: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(occupied) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

/// Data for a lot that does not exist yet
#[derive(Debug, Clone)]
pub struct NewLot {
    pub name: String,
    pub location: String,
    pub total_spots: i32,
    pub hourly_rate: Decimal,
    pub status: LotStatus,
}

impl NewLot {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidRequest("Lot name is required".into()));
        }
        if self.location.trim().is_empty() {
            return Err(DomainError::InvalidRequest("Lot location is required".into()));
        }
        if self.total_spots <= 0 {
            return Err(DomainError::InvalidRequest(
                "total_spots must be positive".into(),
            ));
        }
        validate_rate(self.hourly_rate)
    }
}

/// Partial admin edit of a lot; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct LotChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub total_spots: Option<i32>,
    pub hourly_rate: Option<Decimal>,
    pub status: Option<LotStatus>,
}

impl LotChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.total_spots.is_none()
            && self.hourly_rate.is_none()
            && self.status.is_none()
    }

    /// Apply the edit to `lot`. Validation happens before any field is
    /// touched, so a rejected edit leaves `lot` as it was.
    pub fn apply_to(&self, lot: &mut ParkingLot) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::InvalidRequest("No changes given".into()));
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(DomainError::InvalidRequest("Lot name is required".into()));
        }
        if matches!(&self.location, Some(location) if location.trim().is_empty()) {
            return Err(DomainError::InvalidRequest("Lot location is required".into()));
        }
        if let Some(rate) = self.hourly_rate {
            validate_rate(rate)?;
        }

        let mut updated = lot.clone();
        if let Some(total) = self.total_spots {
            updated.resize(total)?;
        }
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(location) = &self.location {
            updated.location = location.clone();
        }
        if let Some(rate) = self.hourly_rate {
            updated.hourly_rate = rate;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        *lot = updated;
        Ok(())
    }
}

/// A rate must survive the `DECIMAL(10,2)` column unchanged
fn validate_rate(rate: Decimal) -> DomainResult<()> {
    if rate <= Decimal::ZERO {
        return Err(DomainError::InvalidRequest(
            "hourly_rate must be positive".into(),
        ));
    }
    if rate.normalize().scale() > 2 {
        return Err(DomainError::InvalidRequest(
            "hourly_rate must have at most 2 decimal places".into(),
        ));
    }
    if rate > max_amount() {
        return Err(DomainError::InvalidRequest(format!(
            "hourly_rate must not exceed {}",
            max_amount()
        )));
    }
    Ok(())
}
