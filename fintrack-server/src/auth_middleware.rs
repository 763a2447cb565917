//! JWT authentication middleware
//!
//! Extracts the token from `Authorization: Bearer <token>`, validates it,
//! and provides `Claims` to downstream handlers through request extensions.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use fintrack_core::domain::token::{self, Claims};

/// Shared JWT configuration for the middleware
pub struct JwtState {
    pub secret: String,
}

/// Error type for authentication failures
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "missing authorization token".to_string(),
            ),
            AuthError::InvalidToken(e) => {
                (StatusCode::UNAUTHORIZED, format!("invalid token: {}", e))
            }
        };
        let body = serde_json::json!({ "message": msg });
        (status, axum::Json(body)).into_response()
    }
}

/// Middleware that extracts and validates the JWT from the Authorization header.
///
/// If the request path is in the public list, the middleware passes through.
/// Otherwise, it requires a valid JWT and stores Claims in request extensions.
pub async fn auth_middleware(
    State(jwt_state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let path = request.uri().path().to_string();

    if is_public_path(&path) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let claims: Claims = token::decode_token(&jwt_state.secret, token)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    // Store claims in request extensions for handlers to access
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Check if a request path is public (no auth required)
fn is_public_path(path: &str) -> bool {
    matches!(
        path,
        "/" | "/health"
            | "/version"
            | "/api/v1/auth/register"
            | "/api/v1/auth/login"
            | "/api/v1/auth/verify-otp"
            | "/api/v1/auth/resend-otp"
            | "/api/v1/auth/upload-image"
    ) || path.starts_with("/uploads/")
}
