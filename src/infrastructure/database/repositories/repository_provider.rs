//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::ledger::Ledger;
use crate::domain::lot::LotRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::user::UserRepository;

use super::ledger::SeaOrmLedger;
use super::lot_repository::SeaOrmLotRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate accessors plus the
/// ledger used for every capacity-changing write.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let lot = repos.lots().find_by_id(1).await?;
/// let mut tx = repos.ledger().begin().await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    lots: SeaOrmLotRepository,
    reservations: SeaOrmReservationRepository,
    users: SeaOrmUserRepository,
    ledger: SeaOrmLedger,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            lots: SeaOrmLotRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db.clone()),
            ledger: SeaOrmLedger::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn lots(&self) -> &dyn LotRepository {
        &self.lots
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn ledger(&self) -> &dyn Ledger {
        &self.ledger
    }
}
