//! Parking lot HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use super::dto::*;
use crate::application::{LotAdminService, ReservationService};
use crate::interfaces::http::common::{domain_error, money, ApiResponse, ApiResult};

#[derive(Clone)]
pub struct LotsState {
    pub lots: Arc<LotAdminService>,
    pub reservations: Arc<ReservationService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/lots",
    tag = "Lots",
    responses(
        (status = 200, description = "All parking lots", body = ApiResponse<Vec<LotDto>>)
    )
)]
pub async fn list_lots(State(state): State<LotsState>) -> ApiResult<Vec<LotDto>> {
    let lots = state.lots.list_lots().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(LotDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{lot_id}",
    tag = "Lots",
    params(("lot_id" = i32, Path, description = "Parking lot ID")),
    responses(
        (status = 200, description = "Lot details", body = ApiResponse<LotDto>),
        (status = 404, description = "Lot not found")
    )
)]
pub async fn get_lot(State(state): State<LotsState>, Path(lot_id): Path<i32>) -> ApiResult<LotDto> {
    let lot = state.lots.get_lot(lot_id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(LotDto::from(lot))))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{lot_id}/status",
    tag = "Lots",
    params(("lot_id" = i32, Path, description = "Parking lot ID")),
    responses(
        (status = 200, description = "Current availability", body = ApiResponse<LotStatusDto>),
        (status = 404, description = "Lot not found")
    )
)]
pub async fn lot_status(
    State(state): State<LotsState>,
    Path(lot_id): Path<i32>,
) -> ApiResult<LotStatusDto> {
    let availability = state
        .reservations
        .lot_status(lot_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(LotStatusDto::from(availability))))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{lot_id}/quote",
    tag = "Lots",
    params(
        ("lot_id" = i32, Path, description = "Parking lot ID"),
        QuoteParams
    ),
    responses(
        (status = 200, description = "Price of the window", body = ApiResponse<QuoteDto>),
        (status = 400, description = "Malformed or inverted window"),
        (status = 404, description = "Lot not found")
    )
)]
pub async fn quote(
    State(state): State<LotsState>,
    Path(lot_id): Path<i32>,
    Query(params): Query<QuoteParams>,
) -> ApiResult<QuoteDto> {
    let cost = state
        .reservations
        .quote(lot_id, &params.start_time, &params.end_time)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(QuoteDto {
        lot_id,
        start_time: params.start_time,
        end_time: params.end_time,
        total_cost: money(cost),
    })))
}
