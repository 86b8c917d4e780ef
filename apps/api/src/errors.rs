use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Model-service failures during analysis or chat never reach this type:
/// they are folded into entry state by the pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Upload error: {message}")]
    Upload { status: StatusCode, message: String },
}

impl AppError {
    pub fn analysis_in_progress() -> Self {
        AppError::Conflict {
            code: "ANALYSIS_IN_PROGRESS",
            message: "An analysis run is already in progress".to_string(),
        }
    }

    pub fn chat_in_progress() -> Self {
        AppError::Conflict {
            code: "CHAT_IN_PROGRESS",
            message: "A reply is still pending for this candidate".to_string(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Upload {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, *code, message.clone()),
            AppError::Upload { status, message } => {
                tracing::warn!("Upload error ({status}): {message}");
                (*status, "UPLOAD_ERROR", message.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
