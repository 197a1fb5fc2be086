//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>` and then runs
//! `validator::Validate::validate()` on the deserialized value.
//! Body errors keep axum's status (400 for bad JSON, 415 for a missing
//! content type); constraint failures answer 422 with per-field messages.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

/// An extractor that deserializes JSON and validates it.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateLot {
///     #[validate(length(min = 1, max = 100))]
///     name: String,
///     #[validate(range(min = 1))]
///     total_spots: i32,
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<CreateLot>) { /* body is valid */ }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Invalid(ValidationErrors),
}

fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: failed '{}' check", field, e.code),
            })
        })
        .collect();
    // HashMap order is unstable
    fields.sort();

    if fields.is_empty() {
        "Validation failed".to_string()
    } else {
        fields.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Json(rejection) => (rejection.status(), format!("Invalid JSON: {}", rejection.body_text())),
            Self::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;
        value.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::Service;

    #[derive(Debug, Deserialize, Validate)]
    struct LotBody {
        #[validate(length(min = 1, max = 20))]
        name: String,
        #[validate(range(min = 1, max = 500))]
        total_spots: i32,
    }

    async fn handler(ValidatedJson(_body): ValidatedJson<LotBody>) -> &'static str {
        "ok"
    }

    async fn post_json(content_type: Option<&str>, body: &str) -> (StatusCode, String) {
        let mut builder = Request::builder().method("POST").uri("/lots");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();

        let mut svc = Router::new().route("/lots", post(handler)).into_service();
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let (status, _) =
            post_json(Some("application/json"), r#"{"name":"North","total_spots":40}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (status, body) = post_json(Some("application/json"), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("\"success\":false"));
    }

    #[tokio::test]
    async fn missing_content_type_is_415() {
        let (status, _) = post_json(None, r#"{"name":"North","total_spots":40}"#).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn constraint_failure_is_422_with_fields() {
        let (status, body) =
            post_json(Some("application/json"), r#"{"name":"","total_spots":0}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("name"));
        assert!(body.contains("total_spots"));
    }
}
