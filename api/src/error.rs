use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dost_core::error::{self, ApiError, CoreError};
use uuid::Uuid;

/// Internal error type that converts to structured API responses
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Validation error (400)
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Session does not exist or has already ended (404)
    #[error("session {session_id} not found")]
    SessionNotFound { session_id: Uuid },
    /// Too many concurrent sessions (429)
    #[error("session limit of {max} reached")]
    SessionLimit { max: usize },
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Validation {
            message: err.to_string(),
            field: Some(err.field().to_string()),
            received: Some(serde_json::Value::String(err.received().to_string())),
            docs_hint: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::SessionNotFound { session_id } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("Session '{session_id}' not found"),
                    field: Some("session_id".to_string()),
                    received: Some(serde_json::Value::String(session_id.to_string())),
                    request_id,
                    docs_hint: Some(
                        "Sessions end when deleted or after the idle timeout. \
                         Create a new one with POST /v1/sessions."
                            .to_string(),
                    ),
                },
            ),
            AppError::SessionLimit { max } => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiError {
                    error: error::codes::RATE_LIMITED.to_string(),
                    message: format!("Maximum number of concurrent sessions ({max}) reached"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: Some(
                        "End unused sessions with DELETE /v1/sessions/{id}.".to_string(),
                    ),
                },
            ),
        };

        (status, Json(api_error)).into_response()
    }
}
