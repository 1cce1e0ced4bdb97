//! Grafana alert webhook dispatch for grafana-relay.
//!
//! [`AlertDispatcher::handle_alert`] resolves the token in the webhook path
//! to a registered instance, reads the Grafana payload and posts a card to
//! the instance's room:
//!
//! - the title is prefixed with the instance name
//! - the color comes from the [`ColorTable`] entry for the alert state
//! - the rule link is passed through the instance's [`LinkRewrite`]
//! - the image is attached only when the instance shows images
//!
//! Bodies that are not JSON objects still produce a plain text notice.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod colors;
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod rewrite;

pub use colors::ColorTable;
pub use dispatcher::{AlertDispatcher, Delivery, build_card, unknown_alert_text};
pub use error::{AlertError, Result};
pub use payload::AlertPayload;
pub use rewrite::LinkRewrite;
