//! Reservation domain entity

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// Booking confirmed, holds one capacity unit of its lot
    Active,
    /// Parking period finished
    Completed,
    /// Cancelled by the driver or an administrator
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Unknown values map to `Cancelled`, a terminal state that never
    /// releases capacity.
    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Cancelled,
        }
    }

    /// Whether a reservation in this state holds a spot of its lot
    pub fn holds_spot(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A time-bounded booking of one spot in a lot
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub lot_id: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Derived from the lot rate and the booked window, never entered
    pub total_cost: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// A reservation about to be inserted
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: i32,
    pub lot_id: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_cost: Decimal,
}

/// Counts and revenue over all reservations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingSummary {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Sum of `total_cost` over non-cancelled reservations
    pub revenue: Decimal,
}

impl BookingSummary {
    pub fn record(&mut self, reservation: &Reservation) {
        self.total += 1;
        match reservation.status {
            ReservationStatus::Active => self.active += 1,
            ReservationStatus::Completed => self.completed += 1,
            ReservationStatus::Cancelled => self.cancelled += 1,
        }
        if reservation.status != ReservationStatus::Cancelled {
            self.revenue += reservation.total_cost;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(status: ReservationStatus, cost: &str) -> Reservation {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        Reservation {
            id: 1,
            user_id: 2,
            lot_id: 3,
            start_time: day.and_hms_opt(9, 0, 0).unwrap(),
            end_time: day.and_hms_opt(11, 0, 0).unwrap(),
            total_cost: cost.parse().unwrap(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_active_holds_a_spot() {
        assert!(ReservationStatus::Active.holds_spot());
        assert!(!ReservationStatus::Completed.holds_spot());
        assert!(!ReservationStatus::Cancelled.holds_spot());
    }

    #[test]
    fn status_roundtrip() {
        for status in &[
            ReservationStatus::Active,
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
        ] {
            assert_eq!(&ReservationStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn only_the_stored_active_value_holds_a_spot() {
        // Anything the ledger filters would not match as active must not read as active
        for raw in ["confirmed", "Active", "pending"] {
            assert!(!ReservationStatus::from_str(raw).holds_spot());
        }
    }

    #[test]
    fn unknown_status_defaults_to_cancelled() {
        assert_eq!(ReservationStatus::from_str("pending"), ReservationStatus::Cancelled);
    }

    #[test]
    fn summary_excludes_cancelled_revenue() {
        let mut summary = BookingSummary::default();
        summary.record(&sample(ReservationStatus::Active, "20.00"));
        summary.record(&sample(ReservationStatus::Completed, "7.50"));
        summary.record(&sample(ReservationStatus::Cancelled, "99.00"));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.revenue, "27.50".parse::<Decimal>().unwrap());
    }
}
