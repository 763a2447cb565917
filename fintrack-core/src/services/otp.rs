//! OTP service - email ownership verification
//!
//! Issues one-time codes at registration and validates them to activate
//! the account. A code is single-use: success or expiry consumes it, a
//! wrong guess only burns an attempt.

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::token;
use crate::ports::{Clock, Notifier, UserStore};

/// Number of digits in a one-time code
pub const OTP_DIGITS: u32 = 6;

/// OTP service for email verification
pub struct OtpService {
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    jwt_secret: String,
    token_ttl_secs: u64,
    otp_ttl_secs: u64,
    max_attempts: u32,
}

/// Result of a successful verification
#[derive(Debug, Serialize)]
pub struct VerifiedOtp {
    pub token: String,
}

impl OtpService {
    pub fn new(
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        jwt_secret: String,
        token_ttl_secs: u64,
        otp_ttl_secs: u64,
        max_attempts: u32,
    ) -> Self {
        Self {
            users,
            notifier,
            clock,
            jwt_secret,
            token_ttl_secs,
            otp_ttl_secs,
            max_attempts,
        }
    }

    /// Generate and deliver a fresh code for the user
    ///
    /// One store write (the new challenge replaces any previous one),
    /// then one email send. A delivery failure surfaces to the caller;
    /// the stored challenge stays valid so the user can retry delivery
    /// by calling issue again.
    pub async fn issue(&self, user_id: Uuid) -> Result<()> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {}", user_id)))?;

        let code = generate_code();
        let expiry = self.clock.now() + Duration::seconds(self.otp_ttl_secs as i64);
        self.users.set_otp(user_id, &code, expiry).await?;

        let minutes = self.otp_ttl_secs / 60;
        let body = format!(
            "Hi {},\n\nYour verification code is {}. It expires in {} minutes.\n\n\
             If you did not create an account, you can ignore this email.",
            user.full_name, code, minutes
        );
        self.notifier
            .send(&user.email, "Verify your email address", &body)
            .await
    }

    /// Validate a submitted code and activate the account
    ///
    /// On success the challenge is consumed atomically in the store and
    /// a session token is returned. See the error taxonomy for the
    /// failure cases; only expiry and success consume the code.
    pub async fn verify(&self, user_id: Uuid, submitted: &str) -> Result<VerifiedOtp> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {}", user_id)))?;

        let (code, expiry) = match (user.otp_code, user.otp_expiry) {
            (Some(code), Some(expiry)) => (code, expiry),
            // No pending challenge: already consumed or never issued
            _ => return Err(Error::Mismatch),
        };

        if self.clock.now() > expiry {
            // One-shot: the code must never validate after its window
            self.users.clear_otp(user_id).await?;
            return Err(Error::Expired);
        }

        if !constant_time_eq(submitted.trim(), &code) {
            let attempts = self.users.record_otp_failure(user_id).await?;
            if attempts >= self.max_attempts {
                self.users.clear_otp(user_id).await?;
            }
            return Err(Error::Mismatch);
        }

        // Compare-and-clear: the store only flips verified if the code
        // is still present. A concurrent verify that won the race leaves
        // nothing to clear and this call reports Mismatch.
        if !self.users.verify_and_clear_otp(user_id, &code).await? {
            return Err(Error::Mismatch);
        }

        let token = token::issue_token(
            &self.jwt_secret,
            user_id,
            self.clock.now(),
            self.token_ttl_secs,
        )?;
        Ok(VerifiedOtp { token })
    }
}

/// Uniformly random fixed-length numeric code
fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..10u32.pow(OTP_DIGITS));
    format!("{:0width$}", n, width = OTP_DIGITS as usize)
}

/// Compare two codes without an early exit on the first differing byte
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{FixedClock, MemoryRepository, MockNotifier};
    use crate::domain::User;
    use chrono::{TimeZone, Utc};

    fn service(
        repo: Arc<MemoryRepository>,
        notifier: Arc<MockNotifier>,
        clock: Arc<FixedClock>,
    ) -> OtpService {
        OtpService::new(repo, notifier, clock, "test-secret".to_string(), 3600, 600, 5)
    }

    fn seeded() -> (Arc<MemoryRepository>, Arc<MockNotifier>, Arc<FixedClock>, Uuid) {
        let repo = Arc::new(MemoryRepository::new());
        let notifier = Arc::new(MockNotifier::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let user = User::new(
            Uuid::new_v4(),
            "ada@example.com",
            "$argon2id$stub",
            "Ada Lovelace",
            clock.now(),
        );
        let user_id = user.id;
        repo.insert_user(user);
        (repo, notifier, clock, user_id)
    }

    #[tokio::test]
    async fn test_issue_stores_challenge_and_sends_one_email() {
        let (repo, notifier, clock, user_id) = seeded();
        let svc = service(repo.clone(), notifier.clone(), clock.clone());

        svc.issue(user_id).await.unwrap();

        let user = repo.get_user(user_id).await.unwrap().unwrap();
        let code = user.otp_code.expect("challenge stored");
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            user.otp_expiry.unwrap(),
            clock.now() + Duration::seconds(600)
        );

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert!(sent[0].body.contains(&code));
    }

    #[tokio::test]
    async fn test_issue_surfaces_delivery_failure_and_keeps_challenge() {
        let (repo, notifier, clock, user_id) = seeded();
        notifier.fail_next();
        let svc = service(repo.clone(), notifier, clock);

        let err = svc.issue(user_id).await.unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
        // The challenge stays so a re-issue can succeed
        let user = repo.get_user(user_id).await.unwrap().unwrap();
        assert!(user.otp_code.is_some());
    }

    #[tokio::test]
    async fn test_verify_succeeds_exactly_once() {
        let (repo, notifier, clock, user_id) = seeded();
        let svc = service(repo.clone(), notifier, clock.clone());
        svc.issue(user_id).await.unwrap();
        let code = repo.get_user(user_id).await.unwrap().unwrap().otp_code.unwrap();

        clock.advance(Duration::minutes(5));
        let verified = svc.verify(user_id, &code).await.unwrap();
        assert!(!verified.token.is_empty());

        let user = repo.get_user(user_id).await.unwrap().unwrap();
        assert!(user.verified);
        assert!(user.otp_code.is_none());

        // Second call with the same code: already consumed
        assert!(matches!(
            svc.verify(user_id, &code).await,
            Err(Error::Mismatch)
        ));
    }

    #[tokio::test]
    async fn test_verify_after_expiry_fails_and_consumes() {
        let (repo, notifier, clock, user_id) = seeded();
        let svc = service(repo.clone(), notifier, clock.clone());
        svc.issue(user_id).await.unwrap();
        let code = repo.get_user(user_id).await.unwrap().unwrap().otp_code.unwrap();

        clock.advance(Duration::minutes(11));
        assert!(matches!(
            svc.verify(user_id, &code).await,
            Err(Error::Expired)
        ));

        // Even the correct code never validates again
        assert!(matches!(
            svc.verify(user_id, &code).await,
            Err(Error::Mismatch)
        ));
    }

    #[tokio::test]
    async fn test_wrong_code_burns_attempt_but_keeps_challenge() {
        let (repo, notifier, clock, user_id) = seeded();
        let svc = service(repo.clone(), notifier, clock);
        svc.issue(user_id).await.unwrap();
        let code = repo.get_user(user_id).await.unwrap().unwrap().otp_code.unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        assert!(matches!(
            svc.verify(user_id, wrong).await,
            Err(Error::Mismatch)
        ));
        // Challenge survives a wrong guess; the right code still works
        assert!(svc.verify(user_id, &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_attempt_cap_invalidates_challenge() {
        let (repo, notifier, clock, user_id) = seeded();
        let svc = service(repo.clone(), notifier, clock);
        svc.issue(user_id).await.unwrap();
        let code = repo.get_user(user_id).await.unwrap().unwrap().otp_code.unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        for _ in 0..5 {
            assert!(svc.verify(user_id, wrong).await.is_err());
        }
        // Cap reached: the real code is dead too
        assert!(matches!(
            svc.verify(user_id, &code).await,
            Err(Error::Mismatch)
        ));
    }

    #[tokio::test]
    async fn test_verify_unknown_user() {
        let (repo, notifier, clock, _) = seeded();
        let svc = service(repo, notifier, clock);
        assert!(matches!(
            svc.verify(Uuid::new_v4(), "123456").await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("482913", "482913"));
        assert!(!constant_time_eq("482913", "482914"));
        assert!(!constant_time_eq("482913", "48291"));
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
