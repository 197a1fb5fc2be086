//! SeaORM implementation of LotRepository

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use super::db_err;
use crate::domain::{DomainResult, LotRepository, LotStatus, ParkingLot};
use crate::infrastructure::database::entities::parking_lot;

pub struct SeaOrmLotRepository {
    db: DatabaseConnection,
}

impl SeaOrmLotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: parking_lot::Model) -> ParkingLot {
    ParkingLot {
        id: m.lot_id,
        name: m.lot_name,
        location: m.location,
        total_spots: m.total_spots,
        available_spots: m.available_spots,
        // SQLite hands decimals back through f64
        hourly_rate: m.hourly_rate.round_dp(2),
        status: LotStatus::parse(&m.status).unwrap_or(LotStatus::Closed),
    }
}

// ── LotRepository impl ──────────────────────────────────────────

#[async_trait]
impl LotRepository for SeaOrmLotRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingLot>> {
        let model = parking_lot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLot>> {
        let models = parking_lot::Entity::find()
            .order_by_asc(parking_lot::Column::LotId)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
