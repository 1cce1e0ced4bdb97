//! Chat command surface for grafana-relay.
//!
//! Operators manage Grafana instances by typing commands in chat:
//!
//! ```text
//! grafana add prod --room #ops --link-regex-find http://grafana.internal --link-regex-replace https://grafana.example.com
//! grafana list
//! grafana update prod --show-images false
//! grafana delete prod
//! ```
//!
//! A [`CommandRouter`] tokenizes the line, finds the handler and turns every
//! failure into a reply line. [`GrafanaCommands`] registers the four
//! instance management commands.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod grafana;
pub mod router;
pub mod tokenize;

pub use error::{CommandError, Result};
pub use grafana::GrafanaCommands;
pub use router::{CommandContext, CommandHandler, CommandReply, CommandRouter};
pub use tokenize::tokenize;
