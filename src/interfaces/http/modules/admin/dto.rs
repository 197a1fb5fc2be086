//! Admin DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{AdminStats, Analytics, DailyRevenue, LotRevenue};
use crate::domain::{DomainError, DomainResult, LotChanges, LotStatus, NewLot, User, UserRole};
use crate::interfaces::http::common::money;

fn parse_status(value: &str) -> DomainResult<LotStatus> {
    LotStatus::parse(value)
        .ok_or_else(|| DomainError::InvalidRequest(format!("Unknown lot status '{}'", value)))
}

fn default_status() -> String {
    LotStatus::Open.as_str().to_string()
}

/// Create lot request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[validate(range(min = 1, max = 100000))]
    pub total_spots: i32,
    /// Price per hour; a JSON number or string
    #[schema(value_type = String, example = "2.50")]
    pub hourly_rate: Decimal,
    /// `open` (default) or `closed`
    #[serde(default = "default_status")]
    pub status: String,
}

impl CreateLotRequest {
    pub fn into_new_lot(self) -> DomainResult<NewLot> {
        Ok(NewLot {
            status: parse_status(&self.status)?,
            name: self.name,
            location: self.location,
            total_spots: self.total_spots,
            hourly_rate: self.hourly_rate,
        })
    }
}

/// Partial lot update; absent fields stay as they are
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 100000))]
    pub total_spots: Option<i32>,
    #[schema(value_type = Option<String>, example = "3.00")]
    pub hourly_rate: Option<Decimal>,
    pub status: Option<String>,
}

impl UpdateLotRequest {
    pub fn into_changes(self) -> DomainResult<LotChanges> {
        Ok(LotChanges {
            status: self.status.as_deref().map(parse_status).transpose()?,
            name: self.name,
            location: self.location,
            total_spots: self.total_spots,
            hourly_rate: self.hourly_rate,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentBookingsParams {
    /// Number of bookings to return (default 100, max 1000)
    pub limit: Option<u64>,
}

impl RecentBookingsParams {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(100).clamp(1, 1000)
    }
}

/// Reservation counts by status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingCountsDto {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
}

/// Dashboard statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminStatsDto {
    pub total_lots: u64,
    pub total_spots: i64,
    pub available_spots: i64,
    pub occupied_spots: i64,
    #[schema(example = "42.50")]
    pub occupancy_rate: String,
    pub total_drivers: u64,
    pub bookings: BookingCountsDto,
    /// Sum of non-cancelled reservation costs
    #[schema(example = "1280.75")]
    pub revenue: String,
}

impl From<AdminStats> for AdminStatsDto {
    fn from(s: AdminStats) -> Self {
        Self {
            total_lots: s.total_lots,
            total_spots: s.total_spots,
            available_spots: s.available_spots,
            occupied_spots: s.occupied_spots,
            occupancy_rate: money(s.occupancy_rate),
            total_drivers: s.total_drivers,
            revenue: money(s.bookings.revenue),
            bookings: BookingCountsDto {
                total: s.bookings.total,
                active: s.bookings.active,
                completed: s.bookings.completed,
                cancelled: s.bookings.cancelled,
            },
        }
    }
}

/// Billable bookings of one day
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyRevenueDto {
    #[schema(example = "2025-06-01")]
    pub date: String,
    pub bookings: u64,
    #[schema(example = "96.00")]
    pub revenue: String,
}

impl From<DailyRevenue> for DailyRevenueDto {
    fn from(d: DailyRevenue) -> Self {
        Self {
            date: d.date.format("%Y-%m-%d").to_string(),
            bookings: d.bookings,
            revenue: money(d.revenue),
        }
    }
}

/// Revenue of one lot
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotRevenueDto {
    pub lot_id: i32,
    pub name: String,
    pub location: String,
    pub bookings: u64,
    #[schema(example = "420.00")]
    pub revenue: String,
    pub average_cost: Option<String>,
    pub max_cost: Option<String>,
    pub min_cost: Option<String>,
}

impl From<LotRevenue> for LotRevenueDto {
    fn from(l: LotRevenue) -> Self {
        Self {
            lot_id: l.lot_id,
            name: l.name,
            location: l.location,
            bookings: l.bookings,
            revenue: money(l.revenue),
            average_cost: l.average_cost.map(money),
            max_cost: l.max_cost.map(money),
            min_cost: l.min_cost.map(money),
        }
    }
}

/// Revenue analytics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsDto {
    /// Last 7 days, newest first
    pub revenue_by_day: Vec<DailyRevenueDto>,
    /// Top 10 lots by revenue
    pub top_lots: Vec<LotRevenueDto>,
}

impl From<Analytics> for AnalyticsDto {
    fn from(a: Analytics) -> Self {
        Self {
            revenue_by_day: a.revenue_by_day.into_iter().map(Into::into).collect(),
            top_lots: a.top_lots.into_iter().map(Into::into).collect(),
        }
    }
}

/// User API representation; the password hash never leaves the service
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            name: u.name,
            email: u.email,
            role: u.role.as_str().to_string(),
            created_at: u.created_at,
        }
    }
}

fn default_role() -> String {
    UserRole::Driver.as_str().to_string()
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
    /// `driver` (default) or `admin`
    #[serde(default = "default_role")]
    pub role: String,
}

impl CreateUserRequest {
    pub fn role(&self) -> DomainResult<UserRole> {
        UserRole::parse(&self.role)
            .ok_or_else(|| DomainError::InvalidRequest(format!("Unknown role '{}'", self.role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_maps_to_changes() {
        let req = UpdateLotRequest {
            status: Some("CLOSED".into()),
            total_spots: Some(9),
            ..Default::default()
        };
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.status, Some(LotStatus::Closed));
        assert_eq!(changes.total_spots, Some(9));
        assert!(changes.name.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let req = UpdateLotRequest {
            status: Some("maintenance".into()),
            ..Default::default()
        };
        assert!(matches!(
            req.into_changes(),
            Err(DomainError::InvalidRequest(_))
        ));
    }

    #[test]
    fn recent_bookings_limit_is_clamped() {
        assert_eq!(RecentBookingsParams { limit: None }.limit(), 100);
        assert_eq!(RecentBookingsParams { limit: Some(0) }.limit(), 1);
        assert_eq!(RecentBookingsParams { limit: Some(50_000) }.limit(), 1000);
    }

    #[test]
    fn hourly_rate_accepts_number_or_string() {
        let from_number: CreateLotRequest = serde_json::from_str(
            r#"{"name":"A","location":"B","total_spots":3,"hourly_rate":2.5}"#,
        )
        .unwrap();
        let from_string: CreateLotRequest = serde_json::from_str(
            r#"{"name":"A","location":"B","total_spots":3,"hourly_rate":"2.50"}"#,
        )
        .unwrap();
        assert_eq!(from_number.hourly_rate, from_string.hourly_rate);
        assert_eq!(from_string.status, "open");
    }
}
