//! Error types for the catalog server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Client-facing messages, kept verbatim for API compatibility.
pub mod messages {
    pub const INVALID_BOOK_DATA: &str = "Invalid book data";
    pub const INVALID_BOOK_ID: &str = "Invalid book ID";
    pub const INVALID_UPDATE: &str = "Invalid update";
    pub const INVALID_YEAR: &str = "Invalid year";
    pub const BOOK_NOT_FOUND: &str = "Book not found";
    pub const NEGATIVE_STOCK: &str = "Negative stock not allowed";
    pub const BOOK_HAS_COPIES: &str = "Cannot delete book with available copies";
    pub const BOOK_REMOVED: &str = "Book removed successfully";
    pub const INTERNAL: &str = "Internal server error";
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed input shape or type
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Well-formed request against an existing record that breaks a catalog rule
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_book_data() -> Self {
        AppError::Validation(messages::INVALID_BOOK_DATA.to_string())
    }

    pub fn invalid_book_id() -> Self {
        AppError::Validation(messages::INVALID_BOOK_ID.to_string())
    }

    pub fn invalid_update() -> Self {
        AppError::Validation(messages::INVALID_UPDATE.to_string())
    }

    pub fn book_not_found() -> Self {
        AppError::NotFound(messages::BOOK_NOT_FOUND.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BusinessRule(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, messages::INTERNAL.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, messages::INTERNAL.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
