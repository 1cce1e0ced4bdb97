//! Registry of Grafana instances for grafana-relay.
//!
//! Each registered instance binds a name to a chat room and a secret token.
//! The token is the only credential on the public webhook path, so the
//! registry guarantees it is unique and unguessable.
//!
//! # Example
//!
//! ```rust
//! use relay_registry::{InstanceRegistry, NewInstance, TokenGenerator};
//!
//! let mut registry = InstanceRegistry::in_memory(TokenGenerator::default());
//! let prod = registry.add(NewInstance::new("prod", "#ops")).unwrap();
//!
//! let found = registry.find_by_token(&prod.token).unwrap();
//! assert_eq!(found.name, "prod");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod registry;
pub mod token;
pub mod types;

pub use error::{RegistryError, Result};
pub use registry::{InstanceRegistry, SharedRegistry};
pub use token::{DEFAULT_TOKEN_LENGTH, TokenGenerator};
pub use types::{Instance, InstanceUpdate, NewInstance};
