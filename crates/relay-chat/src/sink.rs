//! The [`ChatSink`] trait and the local sink implementations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::card::Card;
use crate::error::{ChatError, Result};

/// Delivers messages into chat rooms.
///
/// Implement this trait to relay notifications through a different chat
/// backend.
#[async_trait]
pub trait ChatSink: Send + Sync + fmt::Debug {
    /// Returns the name of this sink.
    fn name(&self) -> &str;

    /// Sends a plain text message to `room`.
    async fn send_text(&self, room: &str, text: &str) -> Result<()>;

    /// Sends a rich card to `room`.
    async fn send_card(&self, room: &str, card: &Card) -> Result<()>;
}

/// A sink that only logs messages. Useful when no chat backend is wired up.
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Creates a new log sink.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new("log")
    }
}

#[async_trait]
impl ChatSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_text(&self, room: &str, text: &str) -> Result<()> {
        info!(sink = %self.name, room = %room, text = %text, "chat message");
        Ok(())
    }

    async fn send_card(&self, room: &str, card: &Card) -> Result<()> {
        info!(
            sink = %self.name,
            room = %room,
            title = %card.title,
            color = %card.color,
            link = ?card.link,
            image = ?card.image,
            "chat card"
        );
        Ok(())
    }
}

/// A message captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SentMessage {
    /// Plain text.
    Text {
        /// Destination room.
        room: String,
        /// Message text.
        text: String,
    },
    /// Rich card.
    Card {
        /// Destination room.
        room: String,
        /// The card.
        card: Card,
    },
}

impl SentMessage {
    /// Destination room of the message.
    #[must_use]
    pub fn room(&self) -> &str {
        match self {
            Self::Text { room, .. } | Self::Card { room, .. } => room,
        }
    }
}

/// A sink that keeps every message in memory.
///
/// Clones share the same buffer. A failing sink rejects every send, which
/// exercises delivery-failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: bool,
}

impl MemorySink {
    /// Creates an empty sink that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects every message.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            failing: true,
        }
    }

    /// Messages delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Removes and returns all delivered messages.
    pub fn take(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock())
    }

    fn record(&self, message: SentMessage) -> Result<()> {
        if self.failing {
            return Err(ChatError::DeliveryFailed {
                reason: format!("memory sink refused message for {}", message.room()),
            });
        }
        self.sent.lock().push(message);
        Ok(())
    }
}

#[async_trait]
impl ChatSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send_text(&self, room: &str, text: &str) -> Result<()> {
        self.record(SentMessage::Text {
            room: room.to_string(),
            text: text.to_string(),
        })
    }

    async fn send_card(&self, room: &str, card: &Card) -> Result<()> {
        self.record(SentMessage::Card {
            room: room.to_string(),
            card: card.clone(),
        })
    }
}
