//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to one HTTP status code. All of them end the request;
/// nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Token header missing or not equal to the configured secret.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Unauthorized")]
    Unauthorized,

    /// Origin/Referer not on the allow-list, or both absent.
    ///
    /// Returns HTTP 403 Forbidden. The string is the client-facing reason.
    #[error("{0}")]
    Forbidden(&'static str),

    /// The read query failed.
    #[error("Database query failed")]
    Query(#[source] sqlx::Error),

    /// The insert failed.
    #[error("Data insert failed")]
    Insert(#[source] sqlx::Error),

    /// Any other database failure (health check).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body could not be read as the expected JSON.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Query(_) | AppError::Insert(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// Rejections carry a message only:
/// ```json
/// { "success": false, "message": "Unauthorized" }
/// ```
///
/// Database failures also surface the driver message:
/// ```json
/// { "success": false, "message": "Database query failed", "error": "..." }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Query(source) | AppError::Insert(source) | AppError::Database(source) => {
                tracing::error!(error = %source, "{}", self);
                json!({
                    "success": false,
                    "message": self.to_string(),
                    "error": source.to_string(),
                })
            }
            AppError::InvalidRequest(detail) => json!({
                "success": false,
                "message": self.to_string(),
                "error": detail,
            }),
            AppError::Unauthorized | AppError::Forbidden(_) => json!({
                "success": false,
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
