//! Parking lot repository interface (read side)
//!
//! Writes that touch capacity go through [`crate::domain::Ledger`].

use async_trait::async_trait;

use super::model::ParkingLot;
use crate::domain::DomainResult;

#[async_trait]
pub trait LotRepository: Send + Sync {
    /// Find lot by ID
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingLot>>;

    /// All lots ordered by ID
    async fn find_all(&self) -> DomainResult<Vec<ParkingLot>>;
}
