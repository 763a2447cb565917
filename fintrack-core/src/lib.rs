//! fintrack core - business logic for the personal finance service
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Transaction, tokens)
//! - **ports**: Trait definitions for external dependencies (stores, Notifier, Clock)
//! - **services**: Business logic orchestration (auth, OTP, transactions, dashboard)
//! - **adapters**: Concrete implementations (DuckDB, mail relay, test doubles)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::{DuckDbRepository, HttpMailer, NoopMailer};
use config::Config;
use ports::{Clock, Notifier, SystemClock};
use services::{AuthService, DashboardService, OtpService, TransactionService};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{
    NewTransaction, NewUser, Transaction, TransactionKind, User, UserProfile,
};
pub use services::DashboardSummary;

/// Main context for fintrack operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct AppContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub auth_service: AuthService,
    pub otp_service: OtpService,
    pub transaction_service: TransactionService,
    pub dashboard_service: DashboardService,
}

impl AppContext {
    /// Create a new context rooted at the data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        if config.jwt_secret.is_empty() {
            anyhow::bail!(
                "JWT secret is not configured; set auth.jwtSecret in settings.json \
                 or the FINTRACK_JWT_SECRET environment variable"
            );
        }

        let db_path = data_dir.join("fintrack.duckdb");
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);
        repository.ensure_schema()?;

        let notifier: Arc<dyn Notifier> = match &config.mailer_endpoint {
            Some(endpoint) => Arc::new(HttpMailer::new(
                endpoint,
                config.mailer_api_token.clone(),
                config.mail_from_address.clone(),
                config.mail_from_name.clone(),
            )?),
            None => Arc::new(NoopMailer),
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let auth_service = AuthService::new(
            repository.clone(),
            clock.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_secs,
        );
        let otp_service = OtpService::new(
            repository.clone(),
            notifier,
            clock.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_secs,
            config.otp_ttl_secs,
            config.otp_max_attempts,
        );
        let transaction_service = TransactionService::new(repository.clone(), clock.clone());
        let dashboard_service = DashboardService::new(repository.clone(), clock);

        Ok(Self {
            config,
            repository,
            auth_service,
            otp_service,
            transaction_service,
            dashboard_service,
        })
    }
}
