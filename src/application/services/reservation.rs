//! Reservation engine
//!
//! Booking, cancellation and completion each run as one ledger
//! transaction: the lot (or reservation) row is locked, validated and
//! mutated, then committed. Any error on the way rolls everything back.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::finish;
use crate::domain::{
    total_cost, BookingWindow, DomainError, DomainResult, LedgerTransaction, LotStatus,
    NewReservation, ParkingLot, RepositoryProvider, Reservation, ReservationStatus,
};

/// Point-in-time availability of a lot
#[derive(Debug, Clone, PartialEq)]
pub struct LotAvailability {
    pub lot_id: i32,
    pub status: LotStatus,
    pub available_spots: i32,
    pub total_spots: i32,
}

impl From<&ParkingLot> for LotAvailability {
    fn from(lot: &ParkingLot) -> Self {
        Self {
            lot_id: lot.id,
            status: lot.status,
            available_spots: lot.available_spots,
            total_spots: lot.total_spots,
        }
    }
}

/// Service for booking and releasing parking capacity
pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ReservationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Book one spot of `lot_id` for `user_id` over `[start_time, end_time)`
    pub async fn book(
        &self,
        user_id: i32,
        lot_id: i32,
        start_time: &str,
        end_time: &str,
    ) -> DomainResult<Reservation> {
        let result = self.try_book(user_id, lot_id, start_time, end_time).await;

        let outcome = match &result {
            Ok(_) => "booked",
            Err(DomainError::CapacityExceeded { .. }) => "capacity_exceeded",
            Err(DomainError::InvalidRequest(_)) | Err(DomainError::NotFound { .. }) => "rejected",
            Err(_) => "error",
        };
        metrics::counter!("parking_bookings_total", "outcome" => outcome).increment(1);

        match &result {
            Ok(r) => info!(
                reservation_id = r.id,
                user_id,
                lot_id,
                total_cost = %r.total_cost,
                "Reservation booked"
            ),
            Err(e) => info!(user_id, lot_id, "Booking refused: {}", e),
        }
        result
    }

    async fn try_book(
        &self,
        user_id: i32,
        lot_id: i32,
        start_time: &str,
        end_time: &str,
    ) -> DomainResult<Reservation> {
        // Malformed windows never open a transaction
        let window = BookingWindow::parse(start_time, end_time)?;

        let mut tx = self.repos.ledger().begin().await?;
        let result = book_in(tx.as_mut(), user_id, lot_id, &window).await;
        finish(tx, result).await
    }

    /// Cancel an active reservation and give its spot back
    pub async fn cancel(&self, reservation_id: i32) -> DomainResult<Reservation> {
        let mut tx = self.repos.ledger().begin().await?;
        let result = leave_active(tx.as_mut(), reservation_id, ReservationStatus::Cancelled).await;
        let result = finish(tx, result).await;

        if let Ok(r) = &result {
            metrics::counter!("parking_cancellations_total").increment(1);
            info!(reservation_id, lot_id = r.lot_id, "Reservation cancelled");
        }
        result
    }

    /// Mark an active reservation as completed and give its spot back
    pub async fn complete(&self, reservation_id: i32) -> DomainResult<Reservation> {
        let mut tx = self.repos.ledger().begin().await?;
        let result = leave_active(tx.as_mut(), reservation_id, ReservationStatus::Completed).await;
        let result = finish(tx, result).await;

        if let Ok(r) = &result {
            metrics::counter!("parking_completions_total").increment(1);
            info!(reservation_id, lot_id = r.lot_id, "Reservation completed");
        }
        result
    }

    /// Price a window without booking it
    pub async fn quote(&self, lot_id: i32, start_time: &str, end_time: &str) -> DomainResult<Decimal> {
        let window = BookingWindow::parse(start_time, end_time)?;
        let lot = self.find_lot(lot_id).await?;
        total_cost(lot.hourly_rate, &window)
    }

    pub async fn lot_status(&self, lot_id: i32) -> DomainResult<LotAvailability> {
        let lot = self.find_lot(lot_id).await?;
        Ok(LotAvailability::from(&lot))
    }

    pub async fn get(&self, reservation_id: i32) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| reservation_not_found(reservation_id))
    }

    /// Reservations of a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        if self.repos.users().get_user_by_id(user_id).await?.is_none() {
            return Err(DomainError::not_found("User", "user_id", user_id));
        }
        self.repos.reservations().find_by_user(user_id).await
    }

    async fn find_lot(&self, lot_id: i32) -> DomainResult<ParkingLot> {
        self.repos
            .lots()
            .find_by_id(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Parking lot", "lot_id", lot_id))
    }
}

fn reservation_not_found(id: i32) -> DomainError {
    DomainError::not_found("Reservation", "reservation_id", id)
}

async fn book_in(
    tx: &mut dyn LedgerTransaction,
    user_id: i32,
    lot_id: i32,
    window: &BookingWindow,
) -> DomainResult<Reservation> {
    let lot = tx
        .lock_lot(lot_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Parking lot", "lot_id", lot_id))?;

    if !tx.user_exists(user_id).await? {
        return Err(DomainError::not_found("User", "user_id", user_id));
    }

    lot.ensure_bookable()?;
    let cost = total_cost(lot.hourly_rate, window)?;

    let reservation = tx
        .insert_reservation(NewReservation {
            user_id,
            lot_id,
            start_time: window.start(),
            end_time: window.end(),
            total_cost: cost,
        })
        .await?;

    tx.reserve_one(lot_id).await?;
    tx.mark_spot(lot_id, true).await?;

    Ok(reservation)
}

/// Move an active reservation to a terminal state and release its spot.
/// The status update is conditional on `active`, so concurrent callers see
/// exactly one transition and one release.
async fn leave_active(
    tx: &mut dyn LedgerTransaction,
    id: i32,
    target: ReservationStatus,
) -> DomainResult<Reservation> {
    let mut reservation = tx
        .lock_reservation(id)
        .await?
        .ok_or_else(|| reservation_not_found(id))?;

    if !reservation.is_active() {
        return Err(refuse_transition(id, reservation.status, target));
    }

    if !tx
        .transition_reservation(id, ReservationStatus::Active, target)
        .await?
    {
        // Another transaction got here first
        let current = tx
            .lock_reservation(id)
            .await?
            .ok_or_else(|| reservation_not_found(id))?;
        if current.is_active() {
            error!(reservation_id = id, "Active reservation could not be transitioned");
            return Err(DomainError::InvariantViolation(format!(
                "reservation {} is active but could not be transitioned",
                id
            )));
        }
        warn!(reservation_id = id, status = %current.status, "Lost race leaving active state");
        return Err(refuse_transition(id, current.status, target));
    }

    tx.release_one(reservation.lot_id).await?;
    tx.mark_spot(reservation.lot_id, false).await?;

    reservation.status = target;
    Ok(reservation)
}

fn refuse_transition(id: i32, from: ReservationStatus, to: ReservationStatus) -> DomainError {
    if from == ReservationStatus::Cancelled && to == ReservationStatus::Cancelled {
        DomainError::AlreadyCancelled(id)
    } else {
        DomainError::InvalidTransition {
            id,
            from: from.as_str(),
            to: to.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::time::Duration;

    use crate::infrastructure::database::testing::{
        file_database, memory_database, seed_driver, seed_lot,
    };
    use crate::infrastructure::SeaOrmRepositoryProvider;
    use sea_orm::DatabaseConnection;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn service(db: &DatabaseConnection) -> ReservationService {
        ReservationService::new(Arc::new(SeaOrmRepositoryProvider::new(db.clone())))
    }

    /// SQLite answers lock-upgrade contention between pooled connections
    /// with SQLITE_BUSY; a client would retry those.
    async fn retry_busy<T, F, Fut>(mut op: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        for _ in 0..100 {
            match op().await {
                Err(DomainError::Storage(_)) => tokio::time::sleep(Duration::from_millis(5)).await,
                other => return other,
            }
        }
        op().await
    }

    async fn available(svc: &ReservationService, lot_id: i32) -> i32 {
        svc.lot_status(lot_id).await.unwrap().available_spots
    }

    async fn active_count(svc: &ReservationService, user_id: i32) -> usize {
        svc.list_for_user(user_id)
            .await
            .unwrap()
            .iter()
            .filter(|r| r.is_active())
            .count()
    }

    #[tokio::test]
    async fn book_takes_exactly_one_spot() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 3, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let r = svc
            .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T12:00")
            .await
            .unwrap();

        assert_eq!(r.status, ReservationStatus::Active);
        assert_eq!(r.total_cost, dec("20.00"));
        assert_eq!(available(&svc, lot.id).await, 2);
        assert_eq!(active_count(&svc, user.id).await, 1);
        assert_eq!(svc.get(r.id).await.unwrap(), r);
    }

    #[tokio::test]
    async fn full_lot_rejects_without_change() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 1, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        svc.book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap();

        for _ in 0..3 {
            let err = svc
                .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::CapacityExceeded { .. }));
        }
        assert_eq!(available(&svc, lot.id).await, 0);
        assert_eq!(active_count(&svc, user.id).await, 1);
    }

    #[tokio::test]
    async fn minimum_charge_and_proportional_billing() {
        let db = memory_database().await;
        let ten = seed_lot(&db, 5, "10.00").await;
        let five = seed_lot(&db, 5, "5.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let short = svc
            .book(user.id, ten.id, "2025-06-01T10:00", "2025-06-01T10:30")
            .await
            .unwrap();
        assert_eq!(short.total_cost, dec("10.00"));

        let long = svc
            .book(user.id, five.id, "2025-06-01T08:00", "2025-06-01T11:00")
            .await
            .unwrap();
        assert_eq!(long.total_cost, dec("15.00"));
    }

    #[tokio::test]
    async fn quote_is_idempotent_and_matches_booking() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 5, "3.33").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let first = svc.quote(lot.id, "2025-06-01T08:17", "2025-06-01T13:43").await.unwrap();
        let second = svc.quote(lot.id, "2025-06-01T08:17", "2025-06-01T13:43").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(available(&svc, lot.id).await, 5);

        let booked = svc
            .book(user.id, lot.id, "2025-06-01T08:17", "2025-06-01T13:43")
            .await
            .unwrap();
        assert_eq!(booked.total_cost, first);
    }

    #[tokio::test]
    async fn cost_too_large_to_store_is_refused_without_mutation() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 2, "50000000.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let err = svc
            .quote(lot.id, "2025-01-01T00:00", "2025-01-01T03:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));

        let err = svc
            .book(user.id, lot.id, "2025-01-01T00:00", "2030-01-01T00:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
        assert_eq!(available(&svc, lot.id).await, 2);
        assert_eq!(active_count(&svc, user.id).await, 0);

        let ok = svc
            .book(user.id, lot.id, "2025-01-01T00:00", "2025-01-01T01:00")
            .await
            .unwrap();
        assert_eq!(ok.total_cost, dec("50000000.00"));
    }

    #[tokio::test]
    async fn quote_unknown_lot_is_not_found() {
        let db = memory_database().await;
        let svc = service(&db);

        let err = svc
            .quote(99, "2025-06-01T08:00", "2025-06-01T09:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn inverted_window_is_rejected_without_mutation() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 2, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        for (start, end) in [
            ("2025-06-01T10:00", "2025-06-01T10:00"),
            ("2025-06-01T12:00", "2025-06-01T10:00"),
            ("not-a-time", "2025-06-01T10:00"),
        ] {
            let err = svc.book(user.id, lot.id, start, end).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidRequest(_)));
        }
        assert_eq!(available(&svc, lot.id).await, 2);
        assert_eq!(active_count(&svc, user.id).await, 0);
    }

    #[tokio::test]
    async fn unknown_user_or_lot_is_not_found() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 2, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let err = svc
            .book(user.id + 100, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "User", .. }));

        let err = svc
            .book(user.id, lot.id + 100, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Parking lot", .. }));

        assert_eq!(available(&svc, lot.id).await, 2);
    }

    #[tokio::test]
    async fn cancel_round_trip_restores_availability() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 4, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let before = available(&svc, lot.id).await;
        let r = svc
            .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap();
        assert_eq!(available(&svc, lot.id).await, before - 1);

        let cancelled = svc.cancel(r.id).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(available(&svc, lot.id).await, before);
        assert_eq!(svc.get(r.id).await.unwrap().status, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn second_cancel_fails_and_releases_nothing() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 2, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let r = svc
            .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap();
        svc.cancel(r.id).await.unwrap();

        let err = svc.cancel(r.id).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyCancelled(id) if id == r.id));
        assert_eq!(available(&svc, lot.id).await, 2);
    }

    #[tokio::test]
    async fn complete_releases_once_and_is_terminal() {
        let db = memory_database().await;
        let lot = seed_lot(&db, 2, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = service(&db);

        let r = svc
            .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap();
        let done = svc.complete(r.id).await.unwrap();
        assert_eq!(done.status, ReservationStatus::Completed);
        assert_eq!(available(&svc, lot.id).await, 2);

        assert!(matches!(
            svc.complete(r.id).await,
            Err(DomainError::InvalidTransition { from: "completed", to: "completed", .. })
        ));
        assert!(matches!(
            svc.cancel(r.id).await,
            Err(DomainError::InvalidTransition { from: "completed", to: "cancelled", .. })
        ));
        assert_eq!(available(&svc, lot.id).await, 2);
    }

    #[tokio::test]
    async fn cancel_unknown_reservation_is_not_found() {
        let db = memory_database().await;
        let svc = service(&db);

        assert!(matches!(
            svc.cancel(12345).await,
            Err(DomainError::NotFound { entity: "Reservation", .. })
        ));
    }

    #[tokio::test]
    async fn closed_lot_refuses_bookings() {
        let db = memory_database().await;
        let mut lot = seed_lot(&db, 2, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let repos = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let svc = ReservationService::new(repos.clone());

        lot.status = LotStatus::Closed;
        let mut tx = repos.ledger().begin().await.unwrap();
        tx.update_lot(&lot).await.unwrap();
        tx.commit().await.unwrap();

        let err = svc
            .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
        assert_eq!(available(&svc, lot.id).await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_never_oversell() {
        const ATTEMPTS: usize = 12;
        const CAPACITY: i32 = 5;

        let (_dir, db) = file_database().await;
        let lot = seed_lot(&db, CAPACITY, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = Arc::new(service(&db));
        let (user_id, lot_id) = (user.id, lot.id);

        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    retry_busy(|| {
                        svc.book(user_id, lot_id, "2025-06-01T10:00", "2025-06-01T11:00")
                    })
                    .await
                })
            })
            .collect();

        let mut booked = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => booked += 1,
                Err(DomainError::CapacityExceeded { .. }) => refused += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(booked, CAPACITY as usize);
        assert_eq!(refused, ATTEMPTS - CAPACITY as usize);
        assert_eq!(available(&svc, lot.id).await, 0);
        assert_eq!(active_count(&svc, user.id).await, CAPACITY as usize);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cancels_release_once() {
        let (_dir, db) = file_database().await;
        let lot = seed_lot(&db, 3, "10.00").await;
        let user = seed_driver(&db, "a@example.com").await;
        let svc = Arc::new(service(&db));

        let r = svc
            .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap();

        let id = r.id;

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { retry_busy(|| svc.cancel(id)).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DomainError::AlreadyCancelled(_)) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(available(&svc, lot.id).await, 3);
    }

    #[tokio::test]
    async fn list_for_unknown_user_is_not_found() {
        let db = memory_database().await;
        let svc = service(&db);

        assert!(matches!(
            svc.list_for_user(7).await,
            Err(DomainError::NotFound { entity: "User", .. })
        ));
    }
}
