//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod auth;
mod dashboard;
pub mod migration;
mod otp;
mod transactions;

pub use auth::{AuthService, LoginResult};
pub use dashboard::{
    recent, totals, windowed, DashboardService, DashboardSummary, Totals, WindowedSection,
};
pub use migration::{MigrationResult, MigrationService};
pub use otp::{OtpService, VerifiedOtp, OTP_DIGITS};
pub use transactions::TransactionService;
