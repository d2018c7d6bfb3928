use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

/// Delivery channel for one-time codes.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reset_code(&self, email: &str, code: &str) -> anyhow::Result<()>;
}

/// Development notifier: writes to the log instead of delivering.
pub struct LogNotifier {
    log_plaintext: bool,
}

impl LogNotifier {
    pub fn new(log_plaintext: bool) -> Self {
        Self { log_plaintext }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reset_code(&self, email: &str, code: &str) -> anyhow::Result<()> {
        if self.log_plaintext {
            warn!(%email, %code, "password reset code (plaintext logging enabled)");
        } else {
            info!(%email, "password reset code issued");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ResetCodeMessage<'a> {
    kind: &'static str,
    email: &'a str,
    code: &'a str,
}

/// Posts codes as JSON to a delivery service (mailer, SMS gateway).
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build notifier http client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_reset_code(&self, email: &str, code: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&ResetCodeMessage {
                kind: "password_reset_code",
                email,
                code,
            })
            .send()
            .await
            .context("send reset code webhook")?;

        let status = response.status();
        if !status.is_success() {
            bail!("notifier webhook returned status {}", status.as_u16());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier::new(false)
            .send_reset_code("a@example.com", "123456")
            .await
            .unwrap();
    }

    #[test]
    fn webhook_message_shape() {
        let json = serde_json::to_value(ResetCodeMessage {
            kind: "password_reset_code",
            email: "a@example.com",
            code: "123456",
        })
        .unwrap();
        assert_eq!(json["kind"], "password_reset_code");
        assert_eq!(json["code"], "123456");
    }

    #[tokio::test]
    async fn webhook_failure_is_an_error() {
        // nothing listens on port 9 locally
        let n = WebhookNotifier::new("http://127.0.0.1:9/hook".into(), Duration::from_secs(1)).unwrap();
        assert!(n.send_reset_code("a@example.com", "123456").await.is_err());
    }
}
