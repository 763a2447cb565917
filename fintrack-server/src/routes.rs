//! Route registration - REST surface over the core services

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use fintrack_core::AppContext;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth_middleware::{self, JwtState};
use crate::handlers;

/// Application shared state
///
/// Cheap to clone - everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<AppContext>,
    pub jwt: Arc<JwtState>,
    /// Directory uploaded profile images are written to and served from
    pub uploads_dir: PathBuf,
}

/// Build the complete router with all routes, CORS, and tracing
pub fn build_router(state: AppState) -> Router {
    let jwt_state = state.jwt.clone();

    let cors = cors_layer(state.context.config.cors_origin.as_deref());

    let api = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/verify-otp", post(handlers::auth::verify_otp))
        .route("/auth/resend-otp", post(handlers::auth::resend_otp))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/upload-image", post(handlers::auth::upload_image))
        .route(
            "/income",
            post(handlers::income::add).get(handlers::income::list),
        )
        .route("/income/download", get(handlers::income::download))
        .route("/income/:id", delete(handlers::income::remove))
        .route(
            "/expense",
            post(handlers::expense::add).get(handlers::expense::list),
        )
        .route("/expense/download", get(handlers::expense::download))
        .route("/expense/:id", delete(handlers::expense::remove))
        .route("/dashboard", get(handlers::dashboard::summary));

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .nest("/api/v1", api)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(middleware::from_fn_with_state(
            jwt_state,
            auth_middleware::auth_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(configured_origin: Option<&str>) -> CorsLayer {
    let origin = match configured_origin {
        Some(origin) if origin != "*" => match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("invalid corsOrigin {:?}, allowing any origin", origin);
                AllowOrigin::any()
            }
        },
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "fintrackd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
