//! Chat delivery for grafana-relay.
//!
//! [`ChatSink`] is the seam between alert handling and whatever chat system
//! receives the messages. Three sinks ship with the crate:
//!
//! - [`WebhookSink`] posts to a Slack-compatible incoming webhook
//! - [`LogSink`] writes messages to the tracing log
//! - [`MemorySink`] keeps messages in memory
//!
//! # Example
//!
//! ```rust
//! use relay_chat::{Card, ChatSink, MemorySink};
//!
//! let sink = MemorySink::new();
//! let card = Card::new("[prod] High CPU", "red").with_body(Some("cpu > 90%".into()));
//! assert_eq!(card.fallback_text(), "[prod] High CPU\ncpu > 90%");
//! assert_eq!(sink.name(), "memory");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod card;
pub mod error;
pub mod sink;
pub mod webhook;

pub use card::Card;
pub use error::{ChatError, Result};
pub use sink::{ChatSink, LogSink, MemorySink, SentMessage};
pub use webhook::{WebhookConfig, WebhookSink, color_hex};
