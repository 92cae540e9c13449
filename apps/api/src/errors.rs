use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::ingest::orchestrator::PipelineError;
use crate::print::projector::ProjectionError;
use crate::record::controller::RecordError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Unprocessable entity: {message}")]
    Unprocessable {
        message: String,
        details: Option<Value>,
    },
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NoActiveRecord => AppError::NotFound(err.to_string()),
            RecordError::IndexOutOfRange { .. } | RecordError::NotEditable(_) => {
                AppError::Validation(err.to_string())
            }
        }
    }
}

impl From<ProjectionError> for AppError {
    fn from(err: ProjectionError) -> Self {
        AppError::Unprocessable {
            message: err.to_string(),
            details: serde_json::to_value(&err.violations).ok(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::UnsupportedFormat { .. } => {
                AppError::UnsupportedMediaType(err.to_string())
            }
            other => AppError::Unprocessable {
                message: other.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
            }
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg,
                None,
            ),
            AppError::Unprocessable { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                message,
                details,
            ),
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
