//! Relay configuration.
//!
//! Loaded from a TOML file. Every field except `public_url` has a default,
//! and colors given in the file are merged over the built-in table.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use relay_alerts::ColorTable;
use relay_chat::{ChatSink, LogSink, WebhookConfig, WebhookSink};
use relay_registry::{DEFAULT_TOKEN_LENGTH, TokenGenerator};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Sample configuration written by `grafana-relay init-config`.
pub const SAMPLE_CONFIG: &str = r#"# grafana-relay configuration

# Address the webhook server listens on.
bind_addr = "0.0.0.0:3141"

# Externally reachable base URL, used to build webhook URLs for Grafana.
public_url = "http://your-relay:3141"

# Directory holding instances.json.
state_dir = "/var/lib/grafana-relay"

# Length of generated webhook tokens (16-256).
token_length = 48

# Senders allowed to run grafana commands. Empty allows everyone.
admins = []

# Read chat commands as JSON lines on stdin.
command_bridge = true

# Alert state -> card color.
[colors]
ok = "green"
paused = "blue"
alerting = "red"
pending = "orange"
no_data = "red"

# Where notifications go: "webhook" posts to an incoming webhook,
# "log" only writes them to the log.
[chat]
kind = "webhook"
url = "https://chat.example.com/hooks/xyz"
timeout_secs = 10
username = "grafana"
icon_url = "https://grafana.com/static/img/fav32.png"
"#;

/// Chat backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatConfig {
    /// Post to an incoming webhook.
    Webhook(WebhookConfig),
    /// Log notifications instead of sending them.
    Log,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::Log
    }
}

impl ChatConfig {
    /// Builds the configured sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook configuration is invalid or the HTTP
    /// client cannot be created.
    pub fn build_sink(&self) -> ServerResult<Arc<dyn ChatSink>> {
        Ok(match self {
            Self::Webhook(config) => Arc::new(WebhookSink::new(config.clone())?),
            Self::Log => Arc::new(LogSink::default()),
        })
    }
}

/// Top-level relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Listen address for the webhook server.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Externally reachable base URL of the webhook server.
    pub public_url: String,
    /// Directory for persisted state.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Length of generated tokens.
    #[serde(default = "default_token_length")]
    pub token_length: usize,
    /// Senders allowed to run commands. Empty allows everyone.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Whether to read commands from stdin.
    #[serde(default = "default_command_bridge")]
    pub command_bridge: bool,
    /// Color overrides by alert state.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    /// Chat backend.
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3141))
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("/var/lib/grafana-relay")
}

const fn default_token_length() -> usize {
    DEFAULT_TOKEN_LENGTH
}

const fn default_command_bridge() -> bool {
    true
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_url: "http://localhost:3141".to_string(),
            state_dir: default_state_dir(),
            token_length: default_token_length(),
            admins: Vec::new(),
            command_bridge: default_command_bridge(),
            colors: BTreeMap::new(),
            chat: ChatConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or validation fails.
    pub fn from_toml(content: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ServerError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range token length, an empty public
    /// URL or an invalid webhook backend.
    pub fn validate(&self) -> ServerResult<()> {
        if self.public_url.trim().is_empty() {
            return Err(ServerError::Config("public_url cannot be empty".to_string()));
        }
        self.token_generator()?;
        if let ChatConfig::Webhook(webhook) = &self.chat {
            webhook
                .validate()
                .map_err(|e| ServerError::Config(e.to_string()))?;
        }
        Ok(())
    }

    /// Token generator for the configured length.
    ///
    /// # Errors
    ///
    /// Returns an error if `token_length` is outside the accepted range.
    pub fn token_generator(&self) -> ServerResult<TokenGenerator> {
        TokenGenerator::new(self.token_length).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// The default color table with this file's overrides applied.
    #[must_use]
    pub fn color_table(&self) -> ColorTable {
        ColorTable::default().merged(&self.colors)
    }
}
