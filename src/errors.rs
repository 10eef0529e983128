use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::models::quiz::QuizError;
use crate::services::llm_provider::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("invalid-response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::InvalidResponse(reason) => AppError::InvalidResponse(reason),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Llm(e) => {
                tracing::warn!("LLM error: {e}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::InvalidResponse(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = axum::Json(ErrorResponse {
            error: message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}
