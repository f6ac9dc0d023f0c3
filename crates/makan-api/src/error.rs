//! Makan ranking pipeline — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use makan_core::error::PipelineError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// Pipeline initialization error (schema, search index).
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `PipelineError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            PipelineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            PipelineError::BusinessRule(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "business_rule_violation")
            }
            PipelineError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "transient_error"),
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// 404 body for read endpoints whose subject does not exist.
pub fn not_found(message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: "not_found",
        message: message.into(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use makan_core::error::{FieldIssue, ValidationError};

    fn status_of(err: PipelineError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = PipelineError::Validation(ValidationError::new(vec![FieldIssue::new(
            "event_id", "missing",
        )]));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_business_rule_maps_to_422() {
        assert_eq!(
            status_of(PipelineError::BusinessRule("no such dish".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_transient_maps_to_503() {
        assert_eq!(
            status_of(PipelineError::Transient("db down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
