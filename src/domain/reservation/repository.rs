//! Reservation repository interface (read side)
//!
//! Status changes go through [`crate::domain::Ledger`] so that capacity and
//! reservation state move together.

use async_trait::async_trait;

use super::model::{BookingSummary, Reservation};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Find reservation by ID
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    /// All reservations of a user, newest first
    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>>;

    /// Most recent reservations across all lots, newest first
    async fn find_recent(&self, limit: u64) -> DomainResult<Vec<Reservation>>;

    /// Counts by status plus revenue
    async fn summary(&self) -> DomainResult<BookingSummary>;

    /// Reservations that count towards revenue (everything not cancelled),
    /// oldest first
    async fn find_billable(&self) -> DomainResult<Vec<Reservation>>;
}
