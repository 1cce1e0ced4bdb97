//! The Grafana alert webhook body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AlertError, Result};

/// Title used when the payload carries neither `title` nor `state`.
pub const UNKNOWN_TITLE: &str = "unknown";

/// State assumed when the payload carries none.
pub const DEFAULT_STATE: &str = "alerting";

/// Fields read from a Grafana alert notification.
///
/// Every field is optional. Keys holding something other than a string are
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    /// Alert title.
    pub title: Option<String>,
    /// Alert state (`ok`, `alerting`, `pending`, `no_data`, `paused`).
    pub state: Option<String>,
    /// Notification body.
    pub message: Option<String>,
    /// Rendered panel image.
    pub image_url: Option<String>,
    /// Link back to the alert rule.
    pub rule_url: Option<String>,
}

impl AlertPayload {
    /// Parses a webhook body.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::MalformedPayload` if the body is not a JSON object.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| AlertError::MalformedPayload {
                reason: e.to_string(),
            })?;

        match value {
            Value::Object(map) => Ok(Self::from_map(&map)),
            other => Err(AlertError::MalformedPayload {
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            title: field("title"),
            state: field("state"),
            message: field("message"),
            image_url: field("imageUrl"),
            rule_url: field("ruleUrl"),
        }
    }

    /// Title to display: `title`, else `state`, else `"unknown"`.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.state.as_deref())
            .unwrap_or(UNKNOWN_TITLE)
    }

    /// Alert state, defaulting to `"alerting"`.
    #[must_use]
    pub fn effective_state(&self) -> &str {
        self.state.as_deref().unwrap_or(DEFAULT_STATE)
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
