//! Domain layer - entities, pricing rules and repository ports

pub mod ledger;
pub mod lot;
pub mod pricing;
pub mod repositories;
pub mod reservation;
pub mod user;

pub use ledger::{Ledger, LedgerTransaction};
pub use lot::{LotChanges, LotRepository, LotStatus, NewLot, ParkingLot};
pub use pricing::{total_cost, BookingWindow};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{
    BookingSummary, NewReservation, Reservation, ReservationRepository, ReservationStatus,
};
pub use user::{CreateUserDto, User, UserRepository, UserRole};

pub use crate::shared::errors::DomainError;
