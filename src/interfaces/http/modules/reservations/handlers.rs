//! Reservation HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::*;
use crate::application::ReservationService;
use crate::interfaces::http::common::{domain_error, ApiError, ApiResponse, ApiResult, ValidatedJson};

#[derive(Clone)]
pub struct ReservationState {
    pub reservations: Arc<ReservationService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Spot booked", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Malformed window or closed lot"),
        (status = 404, description = "User or lot not found"),
        (status = 409, description = "Lot is full"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_reservation(
    State(state): State<ReservationState>,
    ValidatedJson(request): ValidatedJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationDto>>), ApiError> {
    let reservation = state
        .reservations
        .book(
            request.user_id,
            request.lot_id,
            &request.start_time,
            &request.end_time,
        )
        .await
        .map_err(domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReservationDto::from(reservation))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{reservation_id}",
    tag = "Reservations",
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation details", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<ReservationState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDto> {
    let reservation = state
        .reservations
        .get(reservation_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(reservation))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{reservation_id}",
    tag = "Reservations",
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Already cancelled or completed"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ReservationState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDto> {
    let reservation = state
        .reservations
        .cancel(reservation_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(reservation))))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{reservation_id}/complete",
    tag = "Reservations",
    params(("reservation_id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation completed", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Reservation is not active"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn complete_reservation(
    State(state): State<ReservationState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationDto> {
    let reservation = state
        .reservations
        .complete(reservation_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(reservation))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/reservations",
    tag = "Reservations",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Reservations of the user, newest first", body = ApiResponse<Vec<ReservationDto>>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_reservations(
    State(state): State<ReservationState>,
    Path(user_id): Path<i32>,
) -> ApiResult<Vec<ReservationDto>> {
    let reservations = state
        .reservations
        .list_for_user(user_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        reservations.into_iter().map(ReservationDto::from).collect(),
    )))
}
