//! Reservation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::pricing::format_timestamp;
use crate::domain::Reservation;
use crate::interfaces::http::common::money;

/// Request to book one spot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,
    #[validate(range(min = 1))]
    pub lot_id: i32,
    /// `YYYY-MM-DDTHH:MM`, seconds optional
    #[schema(example = "2025-06-01T09:00")]
    #[validate(length(min = 1))]
    pub start_time: String,
    /// `YYYY-MM-DDTHH:MM`, after `start_time`
    #[schema(example = "2025-06-01T12:00")]
    #[validate(length(min = 1))]
    pub end_time: String,
}

/// Reservation in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    pub reservation_id: i32,
    pub user_id: i32,
    pub lot_id: i32,
    pub start_time: String,
    pub end_time: String,
    #[schema(example = "15.00")]
    pub total_cost: String,
    /// `active`, `completed` or `cancelled`
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            reservation_id: r.id,
            user_id: r.user_id,
            lot_id: r.lot_id,
            start_time: format_timestamp(r.start_time),
            end_time: format_timestamp(r.end_time),
            total_cost: money(r.total_cost),
            status: r.status.to_string(),
            created_at: r.created_at,
        }
    }
}
