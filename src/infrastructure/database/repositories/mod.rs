//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories, the transactional ledger and the
//! unified RepositoryProvider.

pub mod ledger;
pub mod lot_repository;
pub mod repository_provider;
pub mod reservation_repository;
pub mod user_repository;

pub use ledger::SeaOrmLedger;
pub use repository_provider::SeaOrmRepositoryProvider;

use crate::domain::DomainError;

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}
