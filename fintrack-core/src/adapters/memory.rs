//! In-memory adapters for tests
//!
//! Store, notifier, and clock doubles with the same contracts as the
//! real adapters. The store keeps the atomic guard semantics of
//! `verify_and_clear_otp` under a single mutex.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Transaction, TransactionKind, User};
use crate::ports::{Clock, Notifier, TransactionStore, UserStore};

/// In-memory user + transaction store
#[derive(Default)]
pub struct MemoryRepository {
    users: Mutex<HashMap<Uuid, User>>,
    transactions: Mutex<Vec<Transaction>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, bypassing registration
    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    /// Flip the verified flag directly, bypassing the OTP flow
    pub fn mark_verified(&self, id: Uuid) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.verified = true;
        }
    }
}

#[async_trait]
impl UserStore for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn add_user(&self, user: &User) -> Result<()> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn set_profile_image(&self, id: Uuid, url: &str) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        user.profile_image_url = Some(url.to_string());
        Ok(())
    }

    async fn set_otp(&self, id: Uuid, code: &str, expiry: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        user.otp_code = Some(code.to_string());
        user.otp_expiry = Some(expiry);
        user.otp_attempts = 0;
        Ok(())
    }

    async fn clear_otp(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        user.otp_code = None;
        user.otp_expiry = None;
        user.otp_attempts = 0;
        Ok(())
    }

    async fn record_otp_failure(&self, id: Uuid) -> Result<u32> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        user.otp_attempts += 1;
        Ok(user.otp_attempts)
    }

    async fn verify_and_clear_otp(&self, id: Uuid, code: &str) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        if user.otp_code.as_deref() != Some(code) {
            return Ok(false);
        }
        user.otp_code = None;
        user.otp_expiry = None;
        user.otp_attempts = 0;
        user.verified = true;
        Ok(true)
    }
}

#[async_trait]
impl TransactionStore for MemoryRepository {
    async fn add_transaction(&self, tx: &Transaction) -> Result<()> {
        self.transactions.lock().unwrap().push(tx.clone());
        Ok(())
    }

    async fn get_transactions(
        &self,
        user_id: Uuid,
        kind: TransactionKind,
    ) -> Result<Vec<Transaction>> {
        let mut matching: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| tx.user_id == user_id && tx.kind == kind)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(matching)
    }

    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut transactions = self.transactions.lock().unwrap();
        let before = transactions.len();
        transactions.retain(|tx| !(tx.id == id && tx.user_id == user_id));
        Ok(transactions.len() < before)
    }
}

/// A sent email captured by the mock notifier
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notifier double recording every send
#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<SentEmail>>,
    fail_next: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next send fail with a delivery error
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::delivery("mock notifier failure"));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Clock double pinned to an explicit instant
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
