//! One-shot availability notifications.
//!
//! A notification is delivered exactly once per transition: by the time the
//! scheduler calls [`Notifier::notify`] the entry is on its way out of the
//! store, so a delivery failure is logged and accepted as a silent miss.
//! There is no retry and no re-insert.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::types::MonitorEntry;

/// Errors that can occur while delivering a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the message.
    #[error("notification rejected: {status} - {message}")]
    Rejected { status: u16, message: String },
}

/// Collaborator interface delivering the availability notice.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message about `entry`'s now-available code to its
    /// registered channel, mentioning the requester.
    async fn notify(&self, entry: &MonitorEntry) -> Result<(), NotifyError>;
}

/// Notifier posting a channel message through the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl DiscordNotifier {
    /// Creates a notifier against `api_base` with a per-call timeout.
    #[must_use]
    pub fn new(api_base: String, bot_token: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base,
            bot_token,
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, entry: &MonitorEntry) -> Result<(), NotifyError> {
        let url = format!("{}/channels/{}/messages", self.api_base, entry.channel_id);
        let content = format!(
            "<@{}> The vanity URL `{}` is now available! Grab it while you can.",
            entry.requester_id, entry.code
        );

        debug!(channel = %entry.channel_id, code = %entry.code, "Sending availability notice");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
