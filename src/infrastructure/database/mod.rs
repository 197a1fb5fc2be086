pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::{SeaOrmLedger, SeaOrmRepositoryProvider};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use migrator::Migrator;

const DEFAULT_DATABASE_URL: &str = "sqlite://./parking.db?mode=rwc";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./parking.db?mode=rwc")
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    info!("Connecting to database: {}", config.url);
    let mut options = ConnectOptions::new(config.url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Bring the schema up to date
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("Running database migrations");
    Migrator::up(db, None).await?;
    info!("Migrations complete");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! SQLite fixtures shared by the test modules

    use rust_decimal::Decimal;
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use tempfile::TempDir;

    use super::migrator::Migrator;
    use super::repositories::user_repository::SeaOrmUserRepository;
    use super::repositories::SeaOrmLedger;
    use crate::domain::{Ledger, LotStatus, NewLot, ParkingLot, User, UserRepository, UserRole};

    /// A migrated in-memory database. One pooled connection keeps every
    /// handle on the same SQLite memory instance.
    pub async fn memory_database() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    /// A migrated file-backed database behind a multi-connection pool, so
    /// concurrent transactions really overlap. Keep the `TempDir` alive for
    /// as long as the connection is used.
    pub async fn file_database() -> (TempDir, DatabaseConnection) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("parking.db").display());
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(8)
            .min_connections(2)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        (dir, db)
    }

    pub async fn seed_lot(db: &DatabaseConnection, total: i32, rate: &str) -> ParkingLot {
        let ledger = SeaOrmLedger::new(db.clone());
        let mut tx = ledger.begin().await.unwrap();
        let lot = tx
            .insert_lot(NewLot {
                name: format!("Lot {}", total),
                location: "Dock Road".into(),
                total_spots: total,
                hourly_rate: rate.parse::<Decimal>().unwrap(),
                status: LotStatus::Open,
            })
            .await
            .unwrap();
        tx.sync_spots(lot.id, total, 0).await.unwrap();
        tx.commit().await.unwrap();
        lot
    }

    pub async fn seed_driver(db: &DatabaseConnection, email: &str) -> User {
        SeaOrmUserRepository::new(db.clone())
            .create_user("Driver", email, "not-a-real-hash", UserRole::Driver)
            .await
            .unwrap()
    }
}
