//! Parking lot aggregate
//!
//! Contains the ParkingLot entity, admin edit types and the read repository.

pub mod model;
pub mod repository;

pub use model::{occupancy_percent, LotChanges, LotStatus, NewLot, ParkingLot};
pub use repository::LotRepository;
