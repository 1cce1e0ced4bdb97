//! Error types for command handling.

use thiserror::Error;

/// Errors that can occur while running a chat command.
///
/// Every variant renders as a short sentence fit to post back into the chat.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The line is empty.
    #[error("no command given")]
    Empty,

    /// No handler is registered for the command.
    #[error("unknown command `{command}`. Available: {available}")]
    UnknownCommand {
        /// What the user typed.
        command: String,
        /// Registered command names.
        available: String,
    },

    /// The line has an unterminated quote or dangling escape.
    #[error("could not parse command line: {reason}")]
    Syntax {
        /// What went wrong.
        reason: String,
    },

    /// Arguments did not match the command's usage (also carries `--help`).
    #[error("{0}")]
    Usage(String),

    /// The sender may not run commands.
    #[error("{sender} is not allowed to run Grafana commands")]
    PermissionDenied {
        /// The rejected sender.
        sender: String,
    },

    /// The registry refused the operation.
    #[error(transparent)]
    Registry(#[from] relay_registry::RegistryError),
}

impl From<clap::Error> for CommandError {
    fn from(err: clap::Error) -> Self {
        Self::Usage(err.render().to_string().trim_end().to_string())
    }
}

/// Result type for command handling.
pub type Result<T> = std::result::Result<T, CommandError>;
