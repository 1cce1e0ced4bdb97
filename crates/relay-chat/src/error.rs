//! Error types for chat delivery.

use thiserror::Error;

/// Errors raised while delivering a message to a chat room.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never reached the chat service.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The chat service answered with a non-success status.
    #[error("chat service rejected message with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The sink refused the message without contacting anything.
    #[error("delivery failed: {reason}")]
    DeliveryFailed {
        /// Why.
        reason: String,
    },

    /// The sink configuration is unusable.
    #[error("invalid sink configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
}

/// Result type for chat delivery.
pub type Result<T> = std::result::Result<T, ChatError>;
