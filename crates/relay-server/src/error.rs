//! Error types for the relay server.

use axum::http::StatusCode;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use relay_alerts::AlertError;
use thiserror::Error;

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the relay server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Opening or using the registry failed.
    #[error(transparent)]
    Registry(#[from] relay_registry::RegistryError),

    /// The chat backend could not be set up.
    #[error(transparent)]
    Chat(#[from] relay_chat::ChatError),

    /// An alert could not be relayed.
    #[error(transparent)]
    Alert(#[from] AlertError),

    /// Reading or writing the command bridge failed.
    #[error("command bridge I/O error: {0}")]
    Bridge(#[from] std::io::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Alert(AlertError::UnknownToken) => (StatusCode::FORBIDDEN, "Forbidden"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error."),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
