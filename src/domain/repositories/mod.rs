//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider` - unified access to all per-aggregate repositories
//! - `DomainResult` - standard result type for domain operations

use super::ledger::Ledger;
use super::lot::LotRepository;
use super::reservation::ReservationRepository;
use super::user::UserRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories and the availability ledger.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let lot = repos.lots().find_by_id(1).await?;
///     let mut tx = repos.ledger().begin().await?;
///     tx.reserve_one(1).await?;
///     tx.commit().await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn lots(&self) -> &dyn LotRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn users(&self) -> &dyn UserRepository;
    fn ledger(&self) -> &dyn Ledger;
}
