//! # Parking Reservation Service
//!
//! Backend for booking time-bounded parking spots with hourly pricing.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Lots, reservations, users, pricing and the availability ledger port
//! - **application**: Reservation engine, lot administration and user services
//! - **infrastructure**: SeaORM entities, migrations, repositories and password hashing
//! - **interfaces**: REST API with Swagger documentation and Prometheus metrics
//! - **shared**: Error taxonomy and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{config_path_from_env, default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiState};
