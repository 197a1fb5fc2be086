//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{LotAdminService, ReservationService, UserService};
use crate::domain::RepositoryProvider;
use crate::infrastructure::SeaOrmRepositoryProvider;

use super::common::ApiResponse;
use super::modules::{admin, health, lots, metrics, reservations};

/// Unified state for every route. Handlers keep their own narrow
/// `State<T>` extractors, derived through `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub db: DatabaseConnection,
    pub reservations: Arc<ReservationService>,
    pub lots: Arc<LotAdminService>,
    pub users: Arc<UserService>,
    pub started_at: Arc<Instant>,
}

impl ApiState {
    pub fn new(db: DatabaseConnection) -> Self {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        Self {
            db,
            reservations: Arc::new(ReservationService::new(repos.clone())),
            lots: Arc::new(LotAdminService::new(repos.clone())),
            users: Arc::new(UserService::new(repos)),
            started_at: Arc::new(Instant::now()),
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for lots::LotsState {
    fn from_ref(s: &ApiState) -> Self {
        lots::LotsState {
            lots: Arc::clone(&s.lots),
            reservations: Arc::clone(&s.reservations),
        }
    }
}

impl FromRef<ApiState> for reservations::ReservationState {
    fn from_ref(s: &ApiState) -> Self {
        reservations::ReservationState {
            reservations: Arc::clone(&s.reservations),
        }
    }
}

impl FromRef<ApiState> for admin::AdminState {
    fn from_ref(s: &ApiState) -> Self {
        admin::AdminState {
            lots: Arc::clone(&s.lots),
            users: Arc::clone(&s.users),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        lots::list_lots,
        lots::get_lot,
        lots::lot_status,
        lots::quote,
        reservations::create_reservation,
        reservations::get_reservation,
        reservations::cancel_reservation,
        reservations::complete_reservation,
        reservations::list_user_reservations,
        admin::get_stats,
        admin::recent_bookings,
        admin::delete_booking,
        admin::get_analytics,
        admin::create_lot,
        admin::update_lot,
        admin::delete_lot,
        admin::list_users,
        admin::create_user,
        admin::delete_user,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            lots::LotDto,
            lots::LotStatusDto,
            lots::QuoteDto,
            reservations::CreateReservationRequest,
            reservations::ReservationDto,
            admin::CreateLotRequest,
            admin::UpdateLotRequest,
            admin::AdminStatsDto,
            admin::BookingCountsDto,
            admin::AnalyticsDto,
            admin::DailyRevenueDto,
            admin::LotRevenueDto,
            admin::UserDto,
            admin::CreateUserRequest,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and database reachability."),
        (name = "Lots", description = "Browse parking lots, check live availability and price a booking window. Timestamps use `YYYY-MM-DDTHH:MM`."),
        (name = "Reservations", description = "Book, cancel and complete reservations. A booking holds one spot of its lot until it is cancelled or completed. Stays shorter than an hour are billed as one hour."),
        (name = "Admin", description = "Lot management, users and statistics. Not authenticated by this service."),
    ),
    info(
        title = "Parking Reservation API",
        version = "1.0.0",
        description = "REST API for booking parking spots.

All responses use the envelope `{\"success\": bool, \"data\": ..., \"error\": string|null}`.
Money amounts are decimal strings with two places."
    )
)]
pub struct ApiDoc;

pub fn create_api_router(state: ApiState, prometheus: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let lot_routes: Router<ApiState> = Router::new()
        .route("/", get(lots::list_lots))
        .route("/{lot_id}", get(lots::get_lot))
        .route("/{lot_id}/status", get(lots::lot_status))
        .route("/{lot_id}/quote", get(lots::quote));

    let reservation_routes: Router<ApiState> = Router::new()
        .route("/", post(reservations::create_reservation))
        .route(
            "/{reservation_id}",
            get(reservations::get_reservation).delete(reservations::cancel_reservation),
        )
        .route("/{reservation_id}/complete", post(reservations::complete_reservation));

    let admin_routes: Router<ApiState> = Router::new()
        .route("/stats", get(admin::get_stats))
        .route("/analytics", get(admin::get_analytics))
        .route("/bookings", get(admin::recent_bookings))
        .route("/bookings/{reservation_id}", delete(admin::delete_booking))
        .route("/lots", post(admin::create_lot))
        .route("/lots/{lot_id}", put(admin::update_lot).delete(admin::delete_lot))
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/users/{user_id}", delete(admin::delete_user));

    let api = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/lots", lot_routes)
        .nest("/api/v1/reservations", reservation_routes)
        .route(
            "/api/v1/users/{user_id}/reservations",
            get(reservations::list_user_reservations),
        )
        .nest("/api/v1/admin", admin_routes)
        .route_layer(middleware::from_fn(metrics::http_metrics_middleware))
        .with_state(state);

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    router.layer(cors).layer(TraceLayer::new_for_http())
}
