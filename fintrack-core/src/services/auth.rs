//! Auth service - registration, login, profile lookup

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{normalize_email, token, NewUser, User, UserProfile};
use crate::ports::{Clock, UserStore};

/// Auth service for account lifecycle around the OTP flow
pub struct AuthService {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    jwt_secret: String,
    token_ttl_secs: u64,
}

/// Result of a successful login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub id: Uuid,
    pub user: UserProfile,
    pub token: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        jwt_secret: String,
        token_ttl_secs: u64,
    ) -> Self {
        Self {
            users,
            clock,
            jwt_secret,
            token_ttl_secs,
        }
    }

    /// Create an unverified account
    ///
    /// The caller follows up with `OtpService::issue` to start email
    /// verification; no session token is handed out here.
    pub async fn register(&self, input: NewUser) -> Result<UserProfile> {
        input.validate()?;

        let email = normalize_email(&input.email);
        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(Error::validation("Email already in use"));
        }

        let mut user = User::new(
            Uuid::new_v4(),
            email,
            hash_password(&input.password)?,
            input.full_name.trim(),
            self.clock.now(),
        );
        user.profile_image_url = input
            .profile_image_url
            .filter(|url| !url.trim().is_empty());

        self.users.add_user(&user).await?;
        Ok(user.profile())
    }

    /// Exchange credentials for a session token
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller. An unverified account never gets a token from this path;
    /// only OTP verification can issue its first session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult> {
        let user = self
            .users
            .get_user_by_email(&normalize_email(email))
            .await?
            .ok_or(Error::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        if !user.verified {
            return Err(Error::Unverified);
        }

        let token = token::issue_token(
            &self.jwt_secret,
            user.id,
            self.clock.now(),
            self.token_ttl_secs,
        )?;
        Ok(LoginResult {
            id: user.id,
            user: user.profile(),
            token,
        })
    }

    /// Profile of an authenticated user
    pub async fn get_user(&self, id: Uuid) -> Result<UserProfile> {
        self.users
            .get_user(id)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| Error::not_found(format!("user {}", id)))
    }
}

/// Hash a password with Argon2id and a fresh random salt
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Other(format!("password hashing failed: {}", e)))
}

/// Check a password against a stored PHC hash string
fn verify_password(password: &str, stored_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| Error::Other(format!("stored password hash is invalid: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| Error::InvalidCredentials)
}
