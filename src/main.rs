//! Parking reservation service
//!
//! REST API for booking parking spots.
//! Reads configuration from TOML file (~/.config/parking-service/config.toml).

use tracing::{error, info, warn};

use parking_service::config::LoggingSection;
use parking_service::domain::{CreateUserDto, UserRole};
use parking_service::interfaces::http::modules::metrics::install_recorder;
use parking_service::shared::shutdown::ShutdownCoordinator;
use parking_service::{
    config_path_from_env, create_api_router, init_database, run_migrations, ApiState, AppConfig,
    DatabaseConfig,
};

fn init_logging(cfg: &LoggingSection) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if cfg.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = config_path_from_env();
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_logging(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_logging(&LoggingSection::default());
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting parking reservation service...");

    // ── Prometheus recorder (before any metrics call) ──────────
    let prometheus_handle = match install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!("Metrics disabled, recorder install failed: {}", e);
            None
        }
    };

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig::from(&app_cfg.database);
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = run_migrations(&db).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }

    let state = ApiState::new(db.clone());

    let admin = &app_cfg.admin;
    match state
        .users
        .ensure_admin(CreateUserDto {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
            role: UserRole::Admin,
        })
        .await
    {
        Ok(Some(user)) => info!("Default admin created: {}", user.email),
        Ok(None) => {}
        Err(e) => error!("Failed to create admin user: {}", e),
    }

    // ── Shutdown handling ──────────────────────────────────────
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── REST API ───────────────────────────────────────────────
    let router = create_api_router(state, prometheus_handle);
    let addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs/", addr);

    let api_shutdown = shutdown_signal.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API received shutdown signal");
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            match result {
                Ok(Ok(())) => info!("REST API server stopped"),
                Ok(Err(e)) => error!("REST API server error: {}", e),
                Err(e) => error!("REST API server task panicked: {}", e),
            }
        }
        _ = shutdown_signal.wait() => {
            info!("Draining in-flight requests...");
            let drained = shutdown
                .cleanup_with_timeout(async {
                    if let Ok(Err(e)) = (&mut server).await {
                        error!("REST API server error: {}", e);
                    }
                })
                .await;
            if !drained {
                server.abort();
            }
        }
    }

    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("Parking reservation service shutdown complete");
    Ok(())
}
