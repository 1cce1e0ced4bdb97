//! Error types for the relay-registry crate.

use thiserror::Error;

/// Errors returned by [`InstanceRegistry`](crate::InstanceRegistry) operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An instance with this name is already registered.
    #[error("{name} already exists as Grafana instance")]
    AlreadyExists {
        /// The duplicate name.
        name: String,
    },

    /// No instance is registered under this name.
    #[error("{name} does not exist as Grafana instance")]
    NotFound {
        /// The missing name.
        name: String,
    },

    /// No instance owns the presented token.
    #[error("no Grafana instance found for token")]
    UnknownToken,

    /// The record would violate a registry invariant.
    #[error("invalid instance: {reason}")]
    InvalidInstance {
        /// What is wrong with it.
        reason: String,
    },

    /// Repeated token generation kept colliding with existing tokens.
    #[error("could not generate a unique token after {attempts} attempts")]
    TokenSpaceExhausted {
        /// Attempts made before giving up.
        attempts: usize,
    },

    /// Loading the persisted snapshot failed.
    #[error("persistence error: {0}")]
    Persist(#[from] relay_persist::PersistError),
}

impl RegistryError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInstance {
            reason: reason.into(),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
