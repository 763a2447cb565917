//! Repository ports - database abstraction

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Transaction, TransactionKind, User};

/// User persistence abstraction
///
/// Implementations (adapters) provide the actual database access logic.
/// The OTP operations are split out so the consume path can be atomic:
/// `verify_and_clear_otp` must check the stored code and clear it in a
/// single step, otherwise two concurrent verify calls could both succeed
/// on one code.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by id
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Get a user by normalized email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert a new user
    async fn add_user(&self, user: &User) -> Result<()>;

    /// Record an uploaded profile image URL
    async fn set_profile_image(&self, id: Uuid, url: &str) -> Result<()>;

    /// Store a fresh OTP challenge, resetting the attempt counter
    async fn set_otp(&self, id: Uuid, code: &str, expiry: DateTime<Utc>) -> Result<()>;

    /// Clear any pending OTP challenge (expiry, attempt cap)
    async fn clear_otp(&self, id: Uuid) -> Result<()>;

    /// Count one failed attempt against the pending challenge,
    /// returning the new total
    async fn record_otp_failure(&self, id: Uuid) -> Result<u32>;

    /// Atomically clear the challenge and mark the user verified,
    /// guarded on the stored code still matching `code`.
    ///
    /// Returns false when the guard fails - the code was already
    /// consumed (possibly by a concurrent call) or never matched.
    async fn verify_and_clear_otp(&self, id: Uuid, code: &str) -> Result<bool>;
}

/// Transaction persistence abstraction
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a new transaction
    async fn add_transaction(&self, tx: &Transaction) -> Result<()>;

    /// All of a user's transactions of one kind, date descending
    async fn get_transactions(&self, user_id: Uuid, kind: TransactionKind)
        -> Result<Vec<Transaction>>;

    /// Delete a transaction owned by `user_id`. Returns false if no such
    /// row exists (wrong id or not the owner).
    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> Result<bool>;
}
