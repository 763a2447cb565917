//! Dashboard handler

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use fintrack_core::domain::token::Claims;

use crate::error::ApiResult;
use crate::routes::AppState;

/// Handle GET /api/v1/dashboard
pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let summary = state
        .context
        .dashboard_service
        .summary(claims.user_id()?)
        .await?;
    Ok(Json(summary))
}
