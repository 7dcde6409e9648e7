use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use reporthub_service::ServiceError;

/// Top-level API error shared by all route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(serde_json::Value),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error("unexpected error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::BadRequest(message),
            ServiceError::NotFound(message) => Self::NotFound(message),
            ServiceError::Conflict(message) => Self::Conflict(message),
            ServiceError::Internal(source) => Self::Internal(source),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::SerdeJson(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };

        let payload = match self {
            ApiError::Validation(details) => json!({
                "error": { "code": code, "message": "Validation failed", "details": details }
            }),
            ApiError::Internal(source) => {
                // Log the cause, never leak it to the caller.
                tracing::error!(error = ?source, "unhandled internal error");
                json!({ "error": { "code": code, "message": "Unexpected error" } })
            }
            other => json!({ "error": { "code": code, "message": other.to_string() } }),
        };

        (status, Json(payload)).into_response()
    }
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}
