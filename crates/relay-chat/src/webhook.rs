//! Incoming-webhook chat sink.
//!
//! Posts Slack-compatible JSON (`text` or `attachments`) to a single webhook
//! URL, addressing rooms through the `channel` field. Mattermost and Rocket.Chat
//! accept the same shape.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::card::Card;
use crate::error::{ChatError, Result};
use crate::sink::ChatSink;

/// Configuration for a [`WebhookSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Incoming webhook URL.
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Display name for posted messages.
    #[serde(default)]
    pub username: Option<String>,
    /// Avatar URL for posted messages.
    #[serde(default)]
    pub icon_url: Option<String>,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl WebhookConfig {
    /// Creates a configuration for `url`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidConfig` if the URL is empty.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let config = Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            username: None,
            icon_url: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_icon_url(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidConfig` if the URL is empty or the timeout
    /// is zero.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ChatError::InvalidConfig {
                reason: "webhook URL cannot be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ChatError::InvalidConfig {
                reason: "webhook timeout must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Maps a color name to the hex value chat services expect.
///
/// `#rrggbb` values and unknown names pass through unchanged.
#[must_use]
pub fn color_hex(color: &str) -> &str {
    match color {
        "green" => "#2eb886",
        "blue" => "#1f78d1",
        "red" => "#d50200",
        "orange" => "#ff8c00",
        "yellow" => "#f2c744",
        "purple" => "#9b59b6",
        "grey" | "gray" => "#9e9e9e",
        other => other,
    }
}

/// Chat sink posting to an incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookSink {
    /// Creates a sink from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidConfig` for an invalid configuration and
    /// `ChatError::Transport` if the HTTP client cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Builds the JSON body for a text message.
    #[must_use]
    pub fn text_payload(&self, room: &str, text: &str) -> Value {
        let mut payload = self.base_payload(room);
        payload["text"] = json!(text);
        payload
    }

    /// Builds the JSON body for a card.
    #[must_use]
    pub fn card_payload(&self, room: &str, card: &Card) -> Value {
        let mut attachment = json!({
            "fallback": card.fallback_text(),
            "title": card.title,
            "color": color_hex(&card.color),
        });
        if let Some(link) = &card.link {
            attachment["title_link"] = json!(link);
        }
        if let Some(body) = &card.body {
            attachment["text"] = json!(body);
        }
        if let Some(image) = &card.image {
            attachment["image_url"] = json!(image);
        }

        let mut payload = self.base_payload(room);
        payload["attachments"] = json!([attachment]);
        payload
    }

    fn base_payload(&self, room: &str) -> Value {
        let mut payload = json!({ "channel": room });
        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }
        if let Some(icon) = &self.config.icon_url {
            payload["icon_url"] = json!(icon);
        }
        payload
    }

    async fn post(&self, payload: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.config.url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "webhook accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "webhook rejected message");
        Err(ChatError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send_text(&self, room: &str, text: &str) -> Result<()> {
        self.post(&self.text_payload(room, text)).await
    }

    async fn send_card(&self, room: &str, card: &Card) -> Result<()> {
        self.post(&self.card_payload(room, card)).await
    }
}
