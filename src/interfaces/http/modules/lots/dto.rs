//! Parking lot DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::LotAvailability;
use crate::domain::ParkingLot;
use crate::interfaces::http::common::money;

/// Parking lot in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotDto {
    pub lot_id: i32,
    pub name: String,
    pub location: String,
    pub total_spots: i32,
    pub available_spots: i32,
    /// Price per hour, two decimal places
    #[schema(example = "2.50")]
    pub hourly_rate: String,
    /// `open` or `closed`
    pub status: String,
    /// Percent of spots held
    #[schema(example = "37.50")]
    pub occupancy_rate: String,
}

impl From<ParkingLot> for LotDto {
    fn from(lot: ParkingLot) -> Self {
        Self {
            occupancy_rate: money(lot.occupancy_rate()),
            hourly_rate: money(lot.hourly_rate),
            status: lot.status.to_string(),
            lot_id: lot.id,
            name: lot.name,
            location: lot.location,
            total_spots: lot.total_spots,
            available_spots: lot.available_spots,
        }
    }
}

/// Live capacity of a lot
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotStatusDto {
    pub lot_id: i32,
    pub status: String,
    pub available_spots: i32,
    pub total_spots: i32,
}

impl From<LotAvailability> for LotStatusDto {
    fn from(a: LotAvailability) -> Self {
        Self {
            lot_id: a.lot_id,
            status: a.status.to_string(),
            available_spots: a.available_spots,
            total_spots: a.total_spots,
        }
    }
}

/// Booking window to price
#[derive(Debug, Deserialize, IntoParams)]
pub struct QuoteParams {
    /// `YYYY-MM-DDTHH:MM`
    pub start_time: String,
    /// `YYYY-MM-DDTHH:MM`, after `start_time`
    pub end_time: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteDto {
    pub lot_id: i32,
    pub start_time: String,
    pub end_time: String,
    #[schema(example = "15.00")]
    pub total_cost: String,
}
