//! Custom error types for the booking service

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the booking service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Flight number already exists")]
    DuplicateFlightNumber,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Password not match")]
    PasswordMismatch,

    /// No session cookie, or the session could not be resolved
    #[error("Unauthorized")]
    Unauthorized,

    /// Session token failed verification or names an unknown user
    #[error("Invalid token")]
    InvalidToken,

    /// Valid session, insufficient role
    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid flight id")]
    InvalidId,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("No flights found")]
    NoFlightsFound,

    #[error("Flight already booked")]
    AlreadyBooked,

    #[error("Only {available} seats available")]
    InsufficientSeats { available: i32 },

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::DuplicateFlightNumber
            | ApiError::EmailNotFound
            | ApiError::PasswordMismatch
            | ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::NoFlightsFound => StatusCode::NOT_FOUND,
            ApiError::AlreadyBooked | ApiError::InsufficientSeats { .. } => StatusCode::CONFLICT,
            ApiError::InternalServerError | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(e) => {
                error!("Database failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
