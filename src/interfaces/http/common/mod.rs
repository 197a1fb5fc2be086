//! Shared HTTP plumbing: the response envelope and domain error mapping

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Map a domain failure onto its HTTP status
pub fn domain_error(err: DomainError) -> ApiError {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::InvalidRequest(_)
        | DomainError::AlreadyCancelled(_)
        | DomainError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
        DomainError::CapacityExceeded { .. } | DomainError::Conflict(_) => StatusCode::CONFLICT,
        // Ledger drift is logged where it is detected
        DomainError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Storage(_) => {
            error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::error(err.to_string())))
}

/// Money on the wire: always two decimal places
pub fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::not_found("Parking lot", "lot_id", 1), StatusCode::NOT_FOUND),
            (DomainError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (DomainError::AlreadyCancelled(3), StatusCode::BAD_REQUEST),
            (DomainError::CapacityExceeded { lot_id: 1 }, StatusCode::CONFLICT),
            (DomainError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                DomainError::InvariantViolation("drift".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (DomainError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, Json(body)) = domain_error(err);
            assert_eq!(status, expected);
            assert!(!body.success);
            assert!(body.error.is_some());
        }
    }

    #[test]
    fn money_keeps_two_places() {
        assert_eq!(money("10".parse().unwrap()), "10.00");
        assert_eq!(money("7.5".parse().unwrap()), "7.50");
        assert_eq!(money("0.31".parse().unwrap()), "0.31");
    }
}
