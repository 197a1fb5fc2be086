//! Admin HTTP handlers
//!
//! Not authenticated here; access control belongs to the deployment in
//! front of the service.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::*;
use crate::application::{LotAdminService, UserService};
use crate::domain::CreateUserDto;
use crate::interfaces::http::common::{domain_error, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::lots::LotDto;
use crate::interfaces::http::modules::reservations::ReservationDto;

#[derive(Clone)]
pub struct AdminState {
    pub lots: Arc<LotAdminService>,
    pub users: Arc<UserService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<AdminStatsDto>)
    )
)]
pub async fn get_stats(State(state): State<AdminState>) -> ApiResult<AdminStatsDto> {
    let stats = state.lots.stats().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(AdminStatsDto::from(stats))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/bookings",
    tag = "Admin",
    params(RecentBookingsParams),
    responses(
        (status = 200, description = "Most recent bookings", body = ApiResponse<Vec<ReservationDto>>)
    )
)]
pub async fn recent_bookings(
    State(state): State<AdminState>,
    Query(params): Query<RecentBookingsParams>,
) -> ApiResult<Vec<ReservationDto>> {
    let bookings = state
        .lots
        .recent_bookings(params.limit())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(ReservationDto::from).collect(),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/bookings/{reservation_id}",
    tag = "Admin",
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Booking deleted; an active one gives its spot back", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn delete_booking(
    State(state): State<AdminState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDto> {
    let reservation = state
        .lots
        .delete_booking(reservation_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(reservation))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics",
    tag = "Admin",
    responses(
        (status = 200, description = "Revenue by day and top lots", body = ApiResponse<AnalyticsDto>)
    )
)]
pub async fn get_analytics(State(state): State<AdminState>) -> ApiResult<AnalyticsDto> {
    let analytics = state.lots.analytics().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(AnalyticsDto::from(analytics))))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/lots",
    tag = "Admin",
    request_body = CreateLotRequest,
    responses(
        (status = 201, description = "Lot created", body = ApiResponse<LotDto>),
        (status = 400, description = "Invalid lot"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_lot(
    State(state): State<AdminState>,
    ValidatedJson(request): ValidatedJson<CreateLotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LotDto>>), ApiError> {
    let new_lot = request.into_new_lot().map_err(domain_error)?;
    let lot = state.lots.create_lot(new_lot).await.map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(LotDto::from(lot)))))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/lots/{lot_id}",
    tag = "Admin",
    params(("lot_id" = i32, Path, description = "Parking lot ID")),
    request_body = UpdateLotRequest,
    responses(
        (status = 200, description = "Lot updated", body = ApiResponse<LotDto>),
        (status = 400, description = "Invalid change, e.g. shrinking below held spots"),
        (status = 404, description = "Lot not found")
    )
)]
pub async fn update_lot(
    State(state): State<AdminState>,
    Path(lot_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateLotRequest>,
) -> ApiResult<LotDto> {
    let changes = request.into_changes().map_err(domain_error)?;
    let lot = state
        .lots
        .update_lot(lot_id, changes)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(LotDto::from(lot))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/lots/{lot_id}",
    tag = "Admin",
    params(("lot_id" = i32, Path, description = "Parking lot ID")),
    responses(
        (status = 200, description = "Lot deleted"),
        (status = 404, description = "Lot not found"),
        (status = 409, description = "Lot has active reservations")
    )
)]
pub async fn delete_lot(
    State(state): State<AdminState>,
    Path(lot_id): Path<i32>,
) -> ApiResult<String> {
    state.lots.delete_lot(lot_id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(format!("Parking lot {} deleted", lot_id))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users, newest first", body = ApiResponse<Vec<UserDto>>)
    )
)]
pub async fn list_users(State(state): State<AdminState>) -> ApiResult<Vec<UserDto>> {
    let users = state.users.list_users().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    tag = "Admin",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<AdminState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let role = request.role().map_err(domain_error)?;
    let user = state
        .users
        .create_user(CreateUserDto {
            name: request.name,
            email: request.email,
            password: request.password,
            role,
        })
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(UserDto::from(user)))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{user_id}",
    tag = "Admin",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User and booking history deleted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User has active reservations")
    )
)]
pub async fn delete_user(
    State(state): State<AdminState>,
    Path(user_id): Path<i32>,
) -> ApiResult<String> {
    state.users.delete_user(user_id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(format!("User {} deleted", user_id))))
}
