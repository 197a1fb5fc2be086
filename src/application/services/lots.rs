//! Lot administration and statistics

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::info;
use rust_decimal::Decimal;

use super::finish;
use crate::domain::lot::occupancy_percent;
use crate::domain::{
    BookingSummary, DomainError, DomainResult, LedgerTransaction, LotChanges, NewLot, ParkingLot,
    RepositoryProvider, Reservation, UserRole,
};

/// Aggregate figures for the admin dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct AdminStats {
    pub total_lots: u64,
    pub total_spots: i64,
    pub available_spots: i64,
    pub occupied_spots: i64,
    /// Percent of all spots held, 2 dp
    pub occupancy_rate: Decimal,
    pub total_drivers: u64,
    pub bookings: BookingSummary,
}

/// Billable bookings created on one UTC calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub bookings: u64,
    pub revenue: Decimal,
}

/// Billable bookings of one lot
#[derive(Debug, Clone, PartialEq)]
pub struct LotRevenue {
    pub lot_id: i32,
    pub name: String,
    pub location: String,
    pub bookings: u64,
    pub revenue: Decimal,
    /// `None` while the lot has no bookings
    pub average_cost: Option<Decimal>,
    pub max_cost: Option<Decimal>,
    pub min_cost: Option<Decimal>,
}

/// Revenue breakdown for the admin dashboard. Cancelled bookings are left
/// out, as in [`AdminStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct Analytics {
    /// Last 7 days, newest first; days without bookings are omitted
    pub revenue_by_day: Vec<DailyRevenue>,
    /// Highest revenue first, at most 10
    pub top_lots: Vec<LotRevenue>,
}

const ANALYTICS_DAYS: i64 = 7;
const TOP_LOTS: usize = 10;

/// Service for managing parking lots
pub struct LotAdminService {
    repos: Arc<dyn RepositoryProvider>,
}

impl LotAdminService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Create a lot with every spot available
    pub async fn create_lot(&self, lot: NewLot) -> DomainResult<ParkingLot> {
        lot.validate()?;

        let mut tx = self.repos.ledger().begin().await?;
        let result = create_in(tx.as_mut(), lot).await;
        let lot = finish(tx, result).await?;

        info!("Parking lot {} '{}' created with {} spots", lot.id, lot.name, lot.total_spots);
        Ok(lot)
    }

    /// Edit a lot under its row lock. A size change keeps every held spot
    /// held and regenerates the spot rows.
    pub async fn update_lot(&self, lot_id: i32, changes: LotChanges) -> DomainResult<ParkingLot> {
        if changes.is_empty() {
            return Err(DomainError::InvalidRequest("No changes given".into()));
        }

        let mut tx = self.repos.ledger().begin().await?;
        let result = update_in(tx.as_mut(), lot_id, &changes).await;
        let lot = finish(tx, result).await?;

        info!(
            "Parking lot {} updated: {}/{} available, rate {}, {}",
            lot.id, lot.available_spots, lot.total_spots, lot.hourly_rate, lot.status
        );
        Ok(lot)
    }

    /// Delete a lot that no active reservation refers to
    pub async fn delete_lot(&self, lot_id: i32) -> DomainResult<()> {
        let mut tx = self.repos.ledger().begin().await?;
        let result = delete_in(tx.as_mut(), lot_id).await;
        finish(tx, result).await?;

        info!("Parking lot {} deleted", lot_id);
        Ok(())
    }

    pub async fn list_lots(&self) -> DomainResult<Vec<ParkingLot>> {
        self.repos.lots().find_all().await
    }

    pub async fn get_lot(&self, lot_id: i32) -> DomainResult<ParkingLot> {
        self.repos
            .lots()
            .find_by_id(lot_id)
            .await?
            .ok_or_else(|| lot_not_found(lot_id))
    }

    pub async fn stats(&self) -> DomainResult<AdminStats> {
        let lots = self.repos.lots().find_all().await?;
        let total_drivers = self.repos.users().count_by_role(UserRole::Driver).await?;
        let bookings = self.repos.reservations().summary().await?;

        let total_spots: i64 = lots.iter().map(|l| l.total_spots as i64).sum();
        let available_spots: i64 = lots.iter().map(|l| l.available_spots as i64).sum();
        let occupied_spots = total_spots - available_spots;

        Ok(AdminStats {
            total_lots: lots.len() as u64,
            total_spots,
            available_spots,
            occupied_spots,
            occupancy_rate: occupancy_percent(occupied_spots, total_spots),
            total_drivers,
            bookings,
        })
    }

    /// Latest bookings across all lots, newest first
    pub async fn recent_bookings(&self, limit: u64) -> DomainResult<Vec<Reservation>> {
        self.repos.reservations().find_recent(limit).await
    }

    /// Remove a booking. An active booking gives its spot back first.
    pub async fn delete_booking(&self, reservation_id: i32) -> DomainResult<Reservation> {
        let mut tx = self.repos.ledger().begin().await?;
        let result = delete_booking_in(tx.as_mut(), reservation_id).await;
        let removed = finish(tx, result).await?;

        info!(
            "Reservation {} deleted (was {}, lot {})",
            removed.id, removed.status, removed.lot_id
        );
        Ok(removed)
    }

    pub async fn analytics(&self) -> DomainResult<Analytics> {
        self.analytics_at(Utc::now()).await
    }

    /// Analytics as seen at `now`
    pub async fn analytics_at(&self, now: DateTime<Utc>) -> DomainResult<Analytics> {
        let lots = self.repos.lots().find_all().await?;
        let billable = self.repos.reservations().find_billable().await?;

        Ok(Analytics {
            revenue_by_day: revenue_by_day(&billable, now - Duration::days(ANALYTICS_DAYS)),
            top_lots: top_lots(&lots, &billable),
        })
    }
}

fn revenue_by_day(reservations: &[Reservation], since: DateTime<Utc>) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (u64, Decimal)> = BTreeMap::new();
    for r in reservations.iter().filter(|r| r.created_at >= since) {
        let day = days.entry(r.created_at.date_naive()).or_insert((0, Decimal::ZERO));
        day.0 += 1;
        day.1 += r.total_cost;
    }

    days.into_iter()
        .rev()
        .map(|(date, (bookings, revenue))| DailyRevenue {
            date,
            bookings,
            revenue,
        })
        .collect()
}

fn top_lots(lots: &[ParkingLot], reservations: &[Reservation]) -> Vec<LotRevenue> {
    let mut costs_by_lot: HashMap<i32, Vec<Decimal>> = HashMap::new();
    for r in reservations {
        costs_by_lot.entry(r.lot_id).or_default().push(r.total_cost);
    }

    let mut ranked: Vec<LotRevenue> = lots
        .iter()
        .map(|lot| {
            let costs = costs_by_lot.get(&lot.id).map(Vec::as_slice).unwrap_or(&[]);
            let revenue: Decimal = costs.iter().sum();
            let average_cost = if costs.is_empty() {
                None
            } else {
                Some((revenue / Decimal::from(costs.len())).round_dp(2))
            };
            LotRevenue {
                lot_id: lot.id,
                name: lot.name.clone(),
                location: lot.location.clone(),
                bookings: costs.len() as u64,
                revenue,
                average_cost,
                max_cost: costs.iter().max().copied(),
                min_cost: costs.iter().min().copied(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.lot_id.cmp(&b.lot_id)));
    ranked.truncate(TOP_LOTS);
    ranked
}

fn lot_not_found(lot_id: i32) -> DomainError {
    DomainError::not_found("Parking lot", "lot_id", lot_id)
}

async fn create_in(tx: &mut dyn LedgerTransaction, lot: NewLot) -> DomainResult<ParkingLot> {
    let lot = tx.insert_lot(lot).await?;
    tx.sync_spots(lot.id, lot.total_spots, 0).await?;
    Ok(lot)
}

async fn update_in(
    tx: &mut dyn LedgerTransaction,
    lot_id: i32,
    changes: &LotChanges,
) -> DomainResult<ParkingLot> {
    let mut lot = tx.lock_lot(lot_id).await?.ok_or_else(|| lot_not_found(lot_id))?;
    let previous_total = lot.total_spots;

    changes.apply_to(&mut lot)?;
    tx.update_lot(&lot).await?;

    if lot.total_spots != previous_total {
        tx.sync_spots(lot.id, lot.total_spots, lot.held_spots()).await?;
    }
    Ok(lot)
}

async fn delete_booking_in(
    tx: &mut dyn LedgerTransaction,
    reservation_id: i32,
) -> DomainResult<Reservation> {
    let reservation = tx
        .lock_reservation(reservation_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Reservation", "reservation_id", reservation_id))?;

    if reservation.status.holds_spot() {
        tx.release_one(reservation.lot_id).await?;
        tx.mark_spot(reservation.lot_id, false).await?;
    }
    tx.delete_reservation(reservation_id).await?;
    Ok(reservation)
}

async fn delete_in(tx: &mut dyn LedgerTransaction, lot_id: i32) -> DomainResult<()> {
    tx.lock_lot(lot_id).await?.ok_or_else(|| lot_not_found(lot_id))?;

    let holding = tx.count_holding(lot_id).await?;
    if holding > 0 {
        return Err(DomainError::Conflict(format!(
            "Parking lot {} has {} active reservations",
            lot_id, holding
        )));
    }
    tx.delete_lot(lot_id).await
}
