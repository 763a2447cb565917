//! Expense handlers

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use fintrack_core::domain::token::Claims;
use fintrack_core::{NewTransaction, TransactionKind};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::routes::AppState;

/// Handle POST /api/v1/expense
pub async fn add(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<NewTransaction>,
) -> ApiResult<impl IntoResponse> {
    let tx = state
        .context
        .transaction_service
        .add(claims.user_id()?, TransactionKind::Expense, input)
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// Handle GET /api/v1/expense
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let transactions = state
        .context
        .transaction_service
        .list(claims.user_id()?, TransactionKind::Expense)
        .await?;
    Ok(Json(transactions))
}

/// Handle DELETE /api/v1/expense/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state
        .context
        .transaction_service
        .delete(claims.user_id()?, id)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Expense deleted" })))
}

/// Handle GET /api/v1/expense/download
pub async fn download(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let csv = state
        .context
        .transaction_service
        .export_csv(claims.user_id()?, TransactionKind::Expense)
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expense_details.csv\"",
            ),
        ],
        csv,
    ))
}
