//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Every failure a service can produce maps to exactly one variant so the
/// HTTP layer can give each kind a distinct status and message.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The one-time code's window has passed. The stored code is cleared
    /// when this is raised.
    #[error("Verification code has expired")]
    Expired,

    /// Wrong one-time code, or the code was already consumed.
    #[error("Invalid verification code")]
    Mismatch,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account exists but its email was never confirmed.
    #[error("Email address is not verified")]
    Unverified,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Outbound email could not be delivered. Surfaced, never retried
    /// automatically; the caller may re-issue the code.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
