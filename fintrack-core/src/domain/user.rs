//! User domain model

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered account
///
/// Created unverified at registration with a pending one-time code.
/// The OTP verifier flips `verified` and clears the challenge on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique, stored lowercased
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub full_name: String,
    pub profile_image_url: Option<String>,
    /// Pending one-time code, if any
    pub otp_code: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
    /// Failed verification attempts against the current code
    pub otp_attempts: u32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified user with required fields
    pub fn new(
        id: Uuid,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        full_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            password_hash: password_hash.into(),
            full_name: full_name.into(),
            profile_image_url: None,
            otp_code: None,
            otp_expiry: None,
            otp_attempts: 0,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public view of the account, safe to return from the API
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            profile_image_url: self.profile_image_url.clone(),
            verified: self.verified,
            created_at: self.created_at,
        }
    }
}

/// Account view without credentials or the OTP challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profile_image_url: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated registration input
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl NewUser {
    /// Check all fields before anything reaches the store
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(Error::validation("Full name is required"));
        }
        validate_email(&self.email)?;
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

/// Trim and lowercase an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email shape: local part, one @, dotted domain
pub fn validate_email(email: &str) -> Result<()> {
    let email_re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    if email_re.is_match(email.trim()) {
        Ok(())
    } else {
        Err(Error::validation("Please enter a valid email address"))
    }
}
