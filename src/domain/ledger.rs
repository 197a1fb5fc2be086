//! Availability ledger port
//!
//! Every write that touches lot capacity runs inside one
//! [`LedgerTransaction`]. A transaction that is neither committed nor rolled
//! back is rolled back when dropped, so a failed operation leaves no partial
//! effect behind.

use async_trait::async_trait;

use super::lot::{NewLot, ParkingLot};
use super::reservation::{NewReservation, Reservation, ReservationStatus};
use super::user::User;
use super::DomainResult;

/// Opens scoped transactions against the store
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn begin(&self) -> DomainResult<Box<dyn LedgerTransaction>>;
}

/// One atomic unit of work over lots, spots and reservations
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Load a lot and hold its row lock until the transaction ends
    async fn lock_lot(&mut self, lot_id: i32) -> DomainResult<Option<ParkingLot>>;

    /// Whether the user exists. Where the store has row locks, the user row
    /// stays share-locked so it cannot be deleted before commit.
    async fn user_exists(&mut self, user_id: i32) -> DomainResult<bool>;

    /// Load a user and hold its row lock until the transaction ends
    async fn lock_user(&mut self, user_id: i32) -> DomainResult<Option<User>>;

    /// Active reservations of a user
    async fn count_active_for_user(&mut self, user_id: i32) -> DomainResult<u64>;

    /// Delete a user together with their reservation history
    async fn delete_user(&mut self, user_id: i32) -> DomainResult<()>;

    /// Insert a lot with every spot available
    async fn insert_lot(&mut self, lot: NewLot) -> DomainResult<ParkingLot>;

    /// Persist name, location, size, availability, rate and status
    async fn update_lot(&mut self, lot: &ParkingLot) -> DomainResult<()>;

    async fn delete_lot(&mut self, lot_id: i32) -> DomainResult<()>;

    /// Active reservations of a lot
    async fn count_holding(&mut self, lot_id: i32) -> DomainResult<u64>;

    /// Take one spot: decrement `available_spots` only if it is positive.
    /// Fails with `CapacityExceeded` when the lot is full.
    async fn reserve_one(&mut self, lot_id: i32) -> DomainResult<()>;

    /// Give one spot back: increment `available_spots` only if it stays
    /// within `total_spots`. Fails with `InvariantViolation` otherwise.
    async fn release_one(&mut self, lot_id: i32) -> DomainResult<()>;

    /// Insert an active reservation
    async fn insert_reservation(&mut self, reservation: NewReservation) -> DomainResult<Reservation>;

    /// Load a reservation and hold its row lock until the transaction ends
    async fn lock_reservation(&mut self, id: i32) -> DomainResult<Option<Reservation>>;

    /// Remove a reservation row. Capacity is not touched here.
    async fn delete_reservation(&mut self, id: i32) -> DomainResult<()>;

    /// Move a reservation from `from` to `to`. Returns false when the
    /// reservation was not in `from` any more.
    async fn transition_reservation(
        &mut self,
        id: i32,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool>;

    /// Regenerate spot rows `1..=total`, the first `occupied` flagged
    async fn sync_spots(&mut self, lot_id: i32, total: i32, occupied: i32) -> DomainResult<()>;

    /// Flip the lowest-numbered spot whose flag differs from `occupied`.
    /// Display data only; a missing spot is not an error.
    async fn mark_spot(&mut self, lot_id: i32, occupied: bool) -> DomainResult<()>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;

    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}
