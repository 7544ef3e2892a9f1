//! Notification infrastructure — implements `Notifier`.

use anyhow::{Context, Result};
use fleetops_common::Notification;
use reqwest::Client;

use crate::application::ports::Notifier;

/// Posts the notification as JSON to an incoming-webhook URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("fleetops/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .context("webhook request failed")?;
        let status = response.status();
        anyhow::ensure!(status.is_success(), "webhook returned HTTP {status}");
        tracing::debug!(%status, "notification delivered");
        Ok(())
    }
}

/// Used when no webhook is configured.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        tracing::debug!(job = %notification.job, "no webhook configured; notification dropped");
        Ok(())
    }
}

/// Either notifier, chosen from configuration at startup.
pub enum AnyNotifier {
    Webhook(WebhookNotifier),
    Null(NullNotifier),
}

impl AnyNotifier {
    /// Webhook notifier when `url` is set, otherwise the null notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_url(url: Option<&str>) -> Result<Self> {
        match url {
            Some(url) => Ok(Self::Webhook(WebhookNotifier::new(url)?)),
            None => Ok(Self::Null(NullNotifier)),
        }
    }
}

impl Notifier for AnyNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        match self {
            Self::Webhook(n) => n.notify(notification).await,
            Self::Null(n) => n.notify(notification).await,
        }
    }
}
