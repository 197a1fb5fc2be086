//! Application services

mod lots;
mod reservation;
mod users;

pub use lots::{AdminStats, Analytics, DailyRevenue, LotAdminService, LotRevenue};
pub use reservation::{LotAvailability, ReservationService};
pub use users::UserService;

use tracing::warn;

use crate::domain::{DomainResult, LedgerTransaction};

/// Commit on success, roll back on failure. The error of the operation
/// wins over a failed rollback, which is only logged.
async fn finish<T>(tx: Box<dyn LedgerTransaction>, result: DomainResult<T>) -> DomainResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed after '{}': {}", err, rollback_err);
            }
            Err(err)
        }
    }
}
