use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error surface for every REST handler. Storage failures carry the anyhow
/// chain for the log; clients only ever see the generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::Storage(_) => "storage",
        }
    }
}

/// Join failures from spawn_blocking count as storage errors; the cause goes
/// to the log here since the variant only keeps a flattened message.
pub fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    ApiError::Storage(anyhow::anyhow!("blocking task failed: {e}"))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Storage(e) => {
                error!("storage error: {:#}", e);
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "error_code": self.error_code(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
