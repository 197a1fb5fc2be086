//! SeaORM implementation of the availability ledger
//!
//! Capacity changes are conditional single-statement updates whose
//! affected-row count decides success, so two transactions racing for the
//! last spot can never both win. On backends with row locks the lot and
//! reservation reads also take `SELECT ... FOR UPDATE`.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, TransactionTrait,
};

use super::{db_err, lot_repository, reservation_repository, user_repository};
use crate::domain::{
    DomainError, DomainResult, Ledger, LedgerTransaction, NewLot, NewReservation, ParkingLot,
    Reservation, ReservationStatus, User,
};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation, user};

pub struct SeaOrmLedger {
    db: DatabaseConnection,
}

impl SeaOrmLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Ledger for SeaOrmLedger {
    async fn begin(&self) -> DomainResult<Box<dyn LedgerTransaction>> {
        let txn = self.db.begin().await.map_err(db_err)?;
        Ok(Box::new(SeaOrmLedgerTransaction { txn }))
    }
}

pub struct SeaOrmLedgerTransaction {
    txn: DatabaseTransaction,
}

impl SeaOrmLedgerTransaction {
    /// SQLite has no row locks; it serialises writers for the whole database
    fn for_update<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        if self.txn.get_database_backend() == DbBackend::Sqlite {
            select
        } else {
            select.lock_exclusive()
        }
    }

    fn for_share<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        if self.txn.get_database_backend() == DbBackend::Sqlite {
            select
        } else {
            select.lock_shared()
        }
    }

    async fn lot_exists(&self, lot_id: i32) -> DomainResult<bool> {
        let count = parking_lot::Entity::find_by_id(lot_id)
            .count(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    fn lot_not_found(lot_id: i32) -> DomainError {
        DomainError::not_found("Parking lot", "lot_id", lot_id)
    }
}

#[async_trait]
impl LedgerTransaction for SeaOrmLedgerTransaction {
    async fn lock_lot(&mut self, lot_id: i32) -> DomainResult<Option<ParkingLot>> {
        let model = self
            .for_update(parking_lot::Entity::find_by_id(lot_id))
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(lot_repository::model_to_domain))
    }

    async fn user_exists(&mut self, user_id: i32) -> DomainResult<bool> {
        let model = self
            .for_share(user::Entity::find_by_id(user_id))
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.is_some())
    }

    async fn lock_user(&mut self, user_id: i32) -> DomainResult<Option<User>> {
        let model = self
            .for_update(user::Entity::find_by_id(user_id))
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(user_repository::user_model_to_domain))
    }

    async fn count_active_for_user(&mut self, user_id: i32) -> DomainResult<u64> {
        reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .filter(reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
            .count(&self.txn)
            .await
            .map_err(db_err)
    }

    async fn delete_user(&mut self, user_id: i32) -> DomainResult<()> {
        debug!("Deleting user: {}", user_id);

        reservation::Entity::delete_many()
            .filter(reservation::Column::UserId.eq(user_id))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;

        let result = user::Entity::delete_by_id(user_id)
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", "user_id", user_id));
        }
        Ok(())
    }

    async fn insert_lot(&mut self, lot: NewLot) -> DomainResult<ParkingLot> {
        debug!("Inserting parking lot: {}", lot.name);

        let model = parking_lot::ActiveModel {
            lot_id: NotSet,
            lot_name: Set(lot.name),
            location: Set(lot.location),
            total_spots: Set(lot.total_spots),
            available_spots: Set(lot.total_spots),
            hourly_rate: Set(lot.hourly_rate),
            status: Set(lot.status.as_str().to_string()),
        };
        let model = model.insert(&self.txn).await.map_err(db_err)?;
        Ok(lot_repository::model_to_domain(model))
    }

    async fn update_lot(&mut self, lot: &ParkingLot) -> DomainResult<()> {
        debug!("Updating parking lot: {}", lot.id);

        let model = parking_lot::ActiveModel {
            lot_id: Set(lot.id),
            lot_name: Set(lot.name.clone()),
            location: Set(lot.location.clone()),
            total_spots: Set(lot.total_spots),
            available_spots: Set(lot.available_spots),
            hourly_rate: Set(lot.hourly_rate),
            status: Set(lot.status.as_str().to_string()),
        };
        model.update(&self.txn).await.map_err(db_err)?;
        Ok(())
    }

    async fn delete_lot(&mut self, lot_id: i32) -> DomainResult<()> {
        parking_spot::Entity::delete_many()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;

        let result = parking_lot::Entity::delete_by_id(lot_id)
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(Self::lot_not_found(lot_id));
        }
        Ok(())
    }

    async fn count_holding(&mut self, lot_id: i32) -> DomainResult<u64> {
        reservation::Entity::find()
            .filter(reservation::Column::LotId.eq(lot_id))
            .filter(reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
            .count(&self.txn)
            .await
            .map_err(db_err)
    }

    async fn reserve_one(&mut self, lot_id: i32) -> DomainResult<()> {
        let result = parking_lot::Entity::update_many()
            .col_expr(
                parking_lot::Column::AvailableSpots,
                Expr::col(parking_lot::Column::AvailableSpots).sub(1),
            )
            .filter(parking_lot::Column::LotId.eq(lot_id))
            .filter(parking_lot::Column::AvailableSpots.gt(0))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 1 {
            return Ok(());
        }
        if self.lot_exists(lot_id).await? {
            Err(DomainError::CapacityExceeded { lot_id })
        } else {
            Err(Self::lot_not_found(lot_id))
        }
    }

    async fn release_one(&mut self, lot_id: i32) -> DomainResult<()> {
        let result = parking_lot::Entity::update_many()
            .col_expr(
                parking_lot::Column::AvailableSpots,
                Expr::col(parking_lot::Column::AvailableSpots).add(1),
            )
            .filter(parking_lot::Column::LotId.eq(lot_id))
            .filter(
                Expr::col(parking_lot::Column::AvailableSpots)
                    .lt(Expr::col(parking_lot::Column::TotalSpots)),
            )
            .exec(&self.txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 1 {
            return Ok(());
        }
        if self.lot_exists(lot_id).await? {
            error!(
                "Release on parking lot {} would exceed total_spots; ledger out of sync",
                lot_id
            );
            Err(DomainError::InvariantViolation(format!(
                "release on parking lot {} would exceed total_spots",
                lot_id
            )))
        } else {
            Err(Self::lot_not_found(lot_id))
        }
    }

    async fn insert_reservation(&mut self, r: NewReservation) -> DomainResult<Reservation> {
        debug!("Inserting reservation: user={} lot={}", r.user_id, r.lot_id);

        let model = reservation::ActiveModel {
            reservation_id: NotSet,
            user_id: Set(r.user_id),
            lot_id: Set(r.lot_id),
            start_time: Set(r.start_time),
            end_time: Set(r.end_time),
            total_cost: Set(r.total_cost),
            status: Set(ReservationStatus::Active.as_str().to_string()),
            created_at: Set(Utc::now()),
        };
        let model = model.insert(&self.txn).await.map_err(db_err)?;
        Ok(reservation_repository::model_to_domain(model))
    }

    async fn lock_reservation(&mut self, id: i32) -> DomainResult<Option<Reservation>> {
        let model = self
            .for_update(reservation::Entity::find_by_id(id))
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(reservation_repository::model_to_domain))
    }

    async fn delete_reservation(&mut self, id: i32) -> DomainResult<()> {
        debug!("Deleting reservation: {}", id);

        let result = reservation::Entity::delete_by_id(id)
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Reservation", "reservation_id", id));
        }
        Ok(())
    }

    async fn transition_reservation(
        &mut self,
        id: i32,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool> {
        let result = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(to.as_str()))
            .filter(reservation::Column::ReservationId.eq(id))
            .filter(reservation::Column::Status.eq(from.as_str()))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn sync_spots(&mut self, lot_id: i32, total: i32, occupied: i32) -> DomainResult<()> {
        parking_spot::Entity::delete_many()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;

        if total <= 0 {
            return Ok(());
        }

        let spots = (1..=total).map(|number| parking_spot::ActiveModel {
            spot_id: NotSet,
            lot_id: Set(lot_id),
            spot_number: Set(number),
            is_occupied: Set(number <= occupied),
        });
        parking_spot::Entity::insert_many(spots)
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn mark_spot(&mut self, lot_id: i32, occupied: bool) -> DomainResult<()> {
        let spot = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .filter(parking_spot::Column::IsOccupied.eq(!occupied))
            .order_by_asc(parking_spot::Column::SpotNumber)
            .one(&self.txn)
            .await
            .map_err(db_err)?;

        let Some(spot) = spot else {
            debug!("No spot to flag in lot {} (occupied={})", lot_id, occupied);
            return Ok(());
        };

        let mut active: parking_spot::ActiveModel = spot.into();
        active.is_occupied = Set(occupied);
        active.update(&self.txn).await.map_err(db_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        self.txn.commit().await.map_err(db_err)
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        self.txn.rollback().await.map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::LotStatus;
    use crate::infrastructure::database::testing::{memory_database, seed_driver};

    async fn lot_with(ledger: &SeaOrmLedger, total: i32) -> ParkingLot {
        let mut tx = ledger.begin().await.unwrap();
        let lot = tx
            .insert_lot(NewLot {
                name: "Depot".into(),
                location: "Harbour".into(),
                total_spots: total,
                hourly_rate: "2.00".parse().unwrap(),
                status: LotStatus::Open,
            })
            .await
            .unwrap();
        tx.sync_spots(lot.id, total, 0).await.unwrap();
        tx.commit().await.unwrap();
        lot
    }

    async fn available(ledger: &SeaOrmLedger, lot_id: i32) -> i32 {
        let mut tx = ledger.begin().await.unwrap();
        let lot = tx.lock_lot(lot_id).await.unwrap().unwrap();
        tx.rollback().await.unwrap();
        lot.available_spots
    }

    #[tokio::test]
    async fn reserve_one_stops_at_zero() {
        let ledger = SeaOrmLedger::new(memory_database().await);
        let lot = lot_with(&ledger, 1).await;

        let mut tx = ledger.begin().await.unwrap();
        tx.reserve_one(lot.id).await.unwrap();
        let err = tx.reserve_one(lot.id).await.unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded { .. }));
        tx.commit().await.unwrap();

        assert_eq!(available(&ledger, lot.id).await, 0);
    }

    #[tokio::test]
    async fn release_beyond_total_is_an_invariant_violation() {
        let ledger = SeaOrmLedger::new(memory_database().await);
        let lot = lot_with(&ledger, 2).await;

        let mut tx = ledger.begin().await.unwrap();
        let err = tx.release_one(lot.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        tx.rollback().await.unwrap();

        assert_eq!(available(&ledger, lot.id).await, 2);
    }

    #[tokio::test]
    async fn unknown_lot_is_not_found() {
        let ledger = SeaOrmLedger::new(memory_database().await);

        let mut tx = ledger.begin().await.unwrap();
        assert!(matches!(
            tx.reserve_one(404).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            tx.release_one(404).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn rollback_discards_decrement() {
        let ledger = SeaOrmLedger::new(memory_database().await);
        let lot = lot_with(&ledger, 3).await;

        let mut tx = ledger.begin().await.unwrap();
        tx.reserve_one(lot.id).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(available(&ledger, lot.id).await, 3);
    }

    #[tokio::test]
    async fn mark_spot_flips_lowest_number_first() {
        let db = memory_database().await;
        let ledger = SeaOrmLedger::new(db.clone());
        let lot = lot_with(&ledger, 3).await;

        let mut tx = ledger.begin().await.unwrap();
        tx.mark_spot(lot.id, true).await.unwrap();
        tx.mark_spot(lot.id, true).await.unwrap();
        tx.mark_spot(lot.id, false).await.unwrap();
        tx.commit().await.unwrap();

        let occupied: Vec<i32> = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot.id))
            .filter(parking_spot::Column::IsOccupied.eq(true))
            .all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.spot_number)
            .collect();
        assert_eq!(occupied, vec![2]);
    }

    #[tokio::test]
    async fn deleting_a_user_takes_their_reservations_along() {
        let db = memory_database().await;
        let ledger = SeaOrmLedger::new(db.clone());
        let lot = lot_with(&ledger, 2).await;
        let user = seed_driver(&db, "d@example.com").await;
        let start = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let mut tx = ledger.begin().await.unwrap();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let r = tx
                .insert_reservation(NewReservation {
                    user_id: user.id,
                    lot_id: lot.id,
                    start_time: start,
                    end_time: start + chrono::Duration::hours(1),
                    total_cost: "2.00".parse().unwrap(),
                })
                .await
                .unwrap();
            ids.push(r.id);
        }
        assert_eq!(tx.count_active_for_user(user.id).await.unwrap(), 2);

        tx.delete_reservation(ids[0]).await.unwrap();
        assert!(matches!(
            tx.delete_reservation(ids[0]).await,
            Err(DomainError::NotFound { .. })
        ));
        assert_eq!(tx.count_active_for_user(user.id).await.unwrap(), 1);

        assert_eq!(tx.lock_user(user.id).await.unwrap().unwrap().email, "d@example.com");
        tx.delete_user(user.id).await.unwrap();
        assert!(tx.lock_user(user.id).await.unwrap().is_none());
        assert!(tx.lock_reservation(ids[1]).await.unwrap().is_none());
        assert!(matches!(
            tx.delete_user(user.id).await,
            Err(DomainError::NotFound { .. })
        ));
        tx.commit().await.unwrap();
    }
}
