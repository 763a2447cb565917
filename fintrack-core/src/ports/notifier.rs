//! Notifier port - outbound email abstraction

use async_trait::async_trait;

use crate::domain::result::Result;

/// Outbound email sender
///
/// Implementations deliver a single message best-effort; a failure
/// surfaces as `Error::Delivery` and is never retried here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}
