//! Mail relay client
//!
//! Delivers email through an HTTPS relay endpoint that accepts a JSON
//! message body with a bearer token. Used as the Notifier implementation
//! in deployments; without a configured relay the NoopMailer logs the
//! message instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::ports::Notifier;

/// HTTP mail relay notifier
#[derive(Debug)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    from_address: String,
    from_name: String,
}

/// JSON message body accepted by the relay
#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: String,
}

impl HttpMailer {
    /// Create a mailer from a relay endpoint URL
    pub fn new(
        endpoint: &str,
        api_token: Option<String>,
        from_address: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Result<Self> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid mailer endpoint: {}", e)))?;

        // Credentials travel with every request; require TLS except for
        // a local relay
        let host = parsed.host_str().unwrap_or("");
        let local = host == "localhost" || host == "127.0.0.1";
        if parsed.scheme() != "https" && !local {
            return Err(Error::Config(
                "mailer endpoint must use HTTPS".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_token,
            from_address: from_address.into(),
            from_name: from_name.into(),
        })
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = OutboundMessage {
            from: format!("{} <{}>", self.from_name, self.from_address),
            to,
            subject,
            text: body,
            html: format!("<p>{}</p>", body.replace('\n', "<br/>")),
        };

        let mut request = self.client.post(&self.endpoint).json(&message);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::delivery(format!("mail relay unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::delivery(format!(
                "mail relay returned {}",
                response.status()
            )));
        }

        tracing::debug!(to, subject, "email handed to relay");
        Ok(())
    }
}

/// Notifier that only logs, for local runs without a relay
#[derive(Debug, Default)]
pub struct NoopMailer;

#[async_trait]
impl Notifier for NoopMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!(to, subject, body, "mailer not configured, logging email instead");
        Ok(())
    }
}
