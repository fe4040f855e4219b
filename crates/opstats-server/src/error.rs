//! Mapping from pipeline errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use opstats_core::error::OpstatsError;
use serde_json::json;
use tracing::error;

/// Error type returned by every handler.
///
/// Client-side failures keep their message (validation violations become a
/// structured JSON list, matching the upload API contract). Server-side
/// failures are logged with full detail but answered with an opaque
/// "Internal server error" so no transaction internals leak.
#[derive(Debug)]
pub enum ApiError {
    /// A domain error from parsing, validation or persistence.
    Domain(OpstatsError),
    /// A malformed request that never reached the pipeline.
    BadRequest(String),
}

impl From<OpstatsError> for ApiError {
    fn from(err: OpstatsError) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Domain(OpstatsError::Validation(errors)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::Domain(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            ApiError::Domain(err) => {
                error!("request failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
