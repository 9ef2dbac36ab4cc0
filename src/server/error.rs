//! Error-to-HTTP response conversion.
//!
//! Only caller errors (unknown job, provider or preset, invalid request,
//! conflicting preset) reach the response body. Everything else is logged
//! in full and answered with a generic 503.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub const UNAVAILABLE_MESSAGE: &str = "sorry, this service is unavailable";

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError(pub orchestrator_common::Error);

impl From<orchestrator_common::Error> for AppError {
    fn from(e: orchestrator_common::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;
        if !err.is_caller_facing() {
            match &err {
                orchestrator_common::Error::Inconsistency { operation, .. } => {
                    tracing::error!(operation = %operation, error = %err, "state diverged, manual reconciliation needed")
                }
                _ => tracing::error!(error = %err, "server error in API handler"),
            }
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(json!({ "error": UNAVAILABLE_MESSAGE })),
            )
                .into_response();
        }

        let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
        let code = match &err {
            orchestrator_common::Error::PresetNotFound { .. } => "preset_not_found",
            orchestrator_common::Error::NotFound { .. } => "not_found",
            orchestrator_common::Error::Conflict(_) => "conflict",
            _ => "validation_error",
        };

        (
            status,
            axum::Json(json!({
                "error": err.to_string(),
                "code": code,
            })),
        )
            .into_response()
    }
}
