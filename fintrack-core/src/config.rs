//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { "baseUrl": "https://fintrack.example.com" },
//!   "server": { "bind": "127.0.0.1:8777", "corsOrigin": "*" },
//!   "auth": { "jwtSecret": "...", "tokenTtlSecs": 604800,
//!             "otpTtlSecs": 600, "otpMaxAttempts": 5 },
//!   "mailer": { "endpoint": "https://mail.example.com/v1/send",
//!               "apiToken": "...", "fromAddress": "no-reply@example.com",
//!               "fromName": "fintrack" }
//! }
//! ```
//! Deploy-sensitive values can be overridden through the environment:
//! `FINTRACK_JWT_SECRET`, `FINTRACK_MAILER_TOKEN`, `FINTRACK_BIND`.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    server: ServerSettings,
    #[serde(default)]
    auth: AuthSettings,
    #[serde(default)]
    mailer: MailerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    /// Public base URL used when building upload links
    #[serde(default = "default_base_url")]
    base_url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default)]
    cors_origin: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default)]
    jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl")]
    token_ttl_secs: u64,
    #[serde(default = "default_otp_ttl")]
    otp_ttl_secs: u64,
    #[serde(default = "default_otp_max_attempts")]
    otp_max_attempts: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl(),
            otp_ttl_secs: default_otp_ttl(),
            otp_max_attempts: default_otp_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailerSettings {
    /// HTTPS mail-relay endpoint; unset means log-only delivery
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    from_address: Option<String>,
    #[serde(default)]
    from_name: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8777".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8777".to_string()
}

fn default_token_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_otp_ttl() -> u64 {
    10 * 60
}

fn default_otp_max_attempts() -> u32 {
    5
}

/// Resolved fintrack configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub bind: String,
    pub cors_origin: Option<String>,
    /// Empty until provided by settings or FINTRACK_JWT_SECRET
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub otp_ttl_secs: u64,
    pub otp_max_attempts: u32,
    pub mailer_endpoint: Option<String>,
    pub mailer_api_token: Option<String>,
    pub mail_from_address: String,
    pub mail_from_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default())
    }
}

impl Config {
    /// Load config from the data directory, falling back to defaults
    /// when settings.json is absent
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let mut config = Self::from_settings(raw);

        // Environment overrides for deploy-sensitive values
        if let Ok(secret) = std::env::var("FINTRACK_JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = secret;
            }
        }
        if let Ok(token) = std::env::var("FINTRACK_MAILER_TOKEN") {
            if !token.is_empty() {
                config.mailer_api_token = Some(token);
            }
        }
        if let Ok(bind) = std::env::var("FINTRACK_BIND") {
            if !bind.is_empty() {
                config.bind = bind;
            }
        }

        Ok(config)
    }

    fn from_settings(raw: SettingsFile) -> Self {
        Self {
            base_url: raw.app.base_url,
            bind: raw.server.bind,
            cors_origin: raw.server.cors_origin,
            jwt_secret: raw.auth.jwt_secret.unwrap_or_default(),
            token_ttl_secs: raw.auth.token_ttl_secs,
            otp_ttl_secs: raw.auth.otp_ttl_secs,
            otp_max_attempts: raw.auth.otp_max_attempts,
            mailer_endpoint: raw.mailer.endpoint,
            mailer_api_token: raw.mailer.api_token,
            mail_from_address: raw
                .mailer
                .from_address
                .unwrap_or_else(|| "no-reply@localhost".to_string()),
            mail_from_name: raw
                .mailer
                .from_name
                .unwrap_or_else(|| "fintrack".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_settings_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.otp_ttl_secs, 600);
        assert_eq!(config.otp_max_attempts, 5);
        assert_eq!(config.token_ttl_secs, 604800);
        assert!(config.mailer_endpoint.is_none());
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"auth": {"jwtSecret": "file-secret", "otpTtlSecs": 300}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.otp_ttl_secs, 300);
        // Untouched sections keep defaults
        assert_eq!(config.bind, "127.0.0.1:8777");
        assert_eq!(config.otp_max_attempts, 5);
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8777");
    }
}
