//! Error types for alert dispatch.

use thiserror::Error;

/// Errors that can occur while handling an alert webhook.
#[derive(Debug, Error)]
pub enum AlertError {
    /// No instance owns the presented token.
    #[error("unknown webhook token")]
    UnknownToken,

    /// The body is not a JSON object with the expected fields.
    #[error("malformed alert payload: {reason}")]
    MalformedPayload {
        /// Why the payload was rejected.
        reason: String,
    },

    /// The chat sink failed to deliver the notification.
    #[error("notification failed: {0}")]
    Delivery(#[from] relay_chat::ChatError),
}

impl AlertError {
    /// Returns true for failures that should surface as an internal error,
    /// as opposed to an access-control rejection.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        !matches!(self, Self::UnknownToken)
    }
}

/// Result type for alert dispatch.
pub type Result<T> = std::result::Result<T, AlertError>;
