//! Auth handlers - registration, login, verification, profile

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use fintrack_core::domain::token::Claims;
use fintrack_core::{Error, NewUser};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::routes::AppState;

/// File extensions accepted for profile images
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub user_id: Uuid,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    pub user_id: Uuid,
}

/// Handle POST /api/v1/auth/register
///
/// Creates the unverified account and sends the first verification code.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.context.auth_service.register(input).await?;
    state.context.otp_service.issue(profile.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": profile.id,
            "message": "Verification code sent to your email",
        })),
    ))
}

/// Handle POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state
        .context
        .auth_service
        .login(&body.email, &body.password)
        .await?;
    Ok(Json(result))
}

/// Handle POST /api/v1/auth/verify-otp
///
/// Activates the account and returns the first session token.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> ApiResult<impl IntoResponse> {
    let verified = state
        .context
        .otp_service
        .verify(body.user_id, &body.otp)
        .await?;
    Ok(Json(verified))
}

/// Handle POST /api/v1/auth/resend-otp
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpRequest>,
) -> ApiResult<impl IntoResponse> {
    state.context.otp_service.issue(body.user_id).await?;
    Ok(Json(serde_json::json!({
        "message": "Verification code sent to your email",
    })))
}

/// Handle GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .context
        .auth_service
        .get_user(claims.user_id()?)
        .await?;
    Ok(Json(profile))
}

/// Handle POST /api/v1/auth/upload-image
///
/// Accepts a multipart `image` field, stores the file under the uploads
/// directory, and returns its public URL. Called before registration, so
/// the endpoint is public.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError(Error::validation(format!("invalid upload: {}", e))))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| name.rsplit('.').next())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| ApiError(Error::validation("file name is missing an extension")))?;
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError(Error::validation(
                "only png, jpg, jpeg and webp images are accepted",
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError(Error::validation(format!("invalid upload: {}", e))))?;
        if bytes.is_empty() {
            return Err(ApiError(Error::validation("uploaded file is empty")));
        }

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&state.uploads_dir)
            .await
            .map_err(Error::from)?;
        tokio::fs::write(state.uploads_dir.join(&filename), &bytes)
            .await
            .map_err(Error::from)?;

        let base = state.context.config.base_url.trim_end_matches('/');
        return Ok(Json(serde_json::json!({
            "imageUrl": format!("{}/uploads/{}", base, filename),
        })));
    }

    Err(ApiError(Error::validation("no image file uploaded")))
}
