//! API error mapping
//!
//! Wraps the core error taxonomy so every kind surfaces as a distinct
//! HTTP status with a user-readable JSON message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fintrack_core::Error;

/// Handler result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Core error carried into the response layer
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            Error::Expired | Error::Mismatch | Error::Validation(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            Error::InvalidCredentials | Error::Token(_) => {
                (StatusCode::UNAUTHORIZED, self.0.to_string())
            }
            Error::Unverified => (StatusCode::FORBIDDEN, self.0.to_string()),
            Error::Delivery(_) => (StatusCode::BAD_GATEWAY, self.0.to_string()),
            // Internal kinds are logged in full but kept generic on the wire
            Error::Database(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Other(_) => {
                tracing::error!("internal error: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
