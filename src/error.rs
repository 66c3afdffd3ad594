use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("Authentication required")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Config(_) | AppError::Io(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failure of the upstream session lookup. Never surfaces to HTTP callers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("session cookie could not be decrypted")]
    Tampered,
    #[error("session cookie is not a valid session: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("session provider unavailable: {0}")]
    Unavailable(String),
}
