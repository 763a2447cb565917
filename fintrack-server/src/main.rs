//! fintrackd - personal finance REST server

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod auth_middleware;
mod error;
mod handlers;
mod routes;

use auth_middleware::JwtState;
use fintrack_core::AppContext;
use routes::AppState;

/// fintrack - personal finance REST server
#[derive(Parser)]
#[command(name = "fintrackd", version, about, long_about = None)]
struct Cli {
    /// Data directory (database, settings.json, uploads).
    /// Defaults to ~/.fintrack
    #[arg(long, env = "FINTRACK_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .context("could not determine home directory; pass --data-dir")?
            .join(".fintrack"),
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let context = Arc::new(AppContext::new(&data_dir)?);
    let jwt = Arc::new(JwtState {
        secret: context.config.jwt_secret.clone(),
    });
    let uploads_dir = data_dir.join("uploads");
    std::fs::create_dir_all(&uploads_dir)?;

    let bind = context.config.bind.clone();
    let app = routes::build_router(AppState {
        context,
        jwt,
        uploads_dir,
    });

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!("fintrackd listening on {}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}
