//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::db_err;
use crate::domain::{
    BookingSummary, DomainResult, Reservation, ReservationRepository, ReservationStatus,
};
use crate::infrastructure::database::entities::reservation;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.reservation_id,
        user_id: m.user_id,
        lot_id: m.lot_id,
        start_time: m.start_time,
        end_time: m.end_time,
        total_cost: m.total_cost.round_dp(2),
        status: ReservationStatus::from_str(&m.status),
        created_at: m.created_at,
    }
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .order_by_desc(reservation::Column::ReservationId)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_recent(&self, limit: u64) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .order_by_desc(reservation::Column::CreatedAt)
            .order_by_desc(reservation::Column::ReservationId)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn summary(&self) -> DomainResult<BookingSummary> {
        let models = reservation::Entity::find()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut summary = BookingSummary::default();
        for reservation in models.into_iter().map(model_to_domain) {
            summary.record(&reservation);
        }
        Ok(summary)
    }

    async fn find_billable(&self) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::Status.ne(ReservationStatus::Cancelled.as_str()))
            .order_by_asc(reservation::Column::CreatedAt)
            .order_by_asc(reservation::Column::ReservationId)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
