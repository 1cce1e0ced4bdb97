//! Command name → handler routing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CommandError, Result};
use crate::tokenize::tokenize;

/// Where a command came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    /// Room the command was typed in.
    pub room: String,
    /// Who typed it.
    pub sender: String,
}

impl CommandContext {
    /// Creates a context.
    #[must_use]
    pub fn new(room: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            sender: sender.into(),
        }
    }
}

/// Lines to post back to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    /// Reply lines, in order.
    pub lines: Vec<String>,
}

impl CommandReply {
    /// A reply with a single line.
    #[must_use]
    pub fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
        }
    }

    /// Appends a line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// All lines joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A chat command implementation.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// One-line description shown in listings.
    fn summary(&self) -> &str;

    /// Runs the command with the words following its name.
    async fn handle(&self, ctx: &CommandContext, args: Vec<String>) -> Result<CommandReply>;
}

/// Maps command names to handlers.
///
/// Names are space separated (`grafana add`). Users may also type them with
/// underscores (`grafana_add`) and with a leading `!`.
#[derive(Clone, Default)]
pub struct CommandRouter {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
    admins: Vec<String>,
}

impl fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRouter")
            .field("commands", &self.handlers.keys().collect::<Vec<_>>())
            .field("admins", &self.admins)
            .finish()
    }
}

impl CommandRouter {
    /// Creates a router with no commands and no sender restriction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts commands to `admins`. An empty list allows everyone.
    #[must_use]
    pub fn with_admins(mut self, admins: Vec<String>) -> Self {
        self.admins = admins;
        self
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn register(&mut self, name: &str, handler: Arc<dyn CommandHandler>) {
        debug!(command = %name, "registered command");
        self.handlers.insert(name.to_string(), handler);
    }

    /// Registered command names with their summaries.
    pub fn commands(&self) -> Vec<(&str, &str)> {
        self.handlers
            .iter()
            .map(|(name, handler)| (name.as_str(), handler.summary()))
            .collect()
    }

    /// Runs `line`, turning any failure into a reply the user can read.
    pub async fn dispatch(&self, ctx: &CommandContext, line: &str) -> CommandReply {
        match self.try_dispatch(ctx, line).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(sender = %ctx.sender, room = %ctx.room, error = %e, "command failed");
                CommandReply::line(e.to_string())
            }
        }
    }

    /// Runs `line`.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, or a routing error if the line does not
    /// name a registered command or the sender is not an admin.
    pub async fn try_dispatch(&self, ctx: &CommandContext, line: &str) -> Result<CommandReply> {
        let words = tokenize(line)?;
        let (name, handler, args) = self.resolve(words)?;

        if !self.admins.is_empty() && !self.admins.iter().any(|a| a == &ctx.sender) {
            return Err(CommandError::PermissionDenied {
                sender: ctx.sender.clone(),
            });
        }

        info!(command = %name, sender = %ctx.sender, room = %ctx.room, "running command");
        handler.handle(ctx, args).await
    }

    fn resolve(&self, mut words: Vec<String>) -> Result<(String, Arc<dyn CommandHandler>, Vec<String>)> {
        let Some(first) = words.first_mut() else {
            return Err(CommandError::Empty);
        };
        if let Some(stripped) = first.strip_prefix('!') {
            *first = stripped.to_string();
        }

        if words.len() >= 2 {
            let name = format!("{} {}", words[0], words[1]);
            if let Some(handler) = self.handlers.get(&name) {
                return Ok((name, handler.clone(), words.split_off(2)));
            }
        }

        let name = words[0].replace('_', " ");
        if let Some(handler) = self.handlers.get(&name) {
            return Ok((name, handler.clone(), words.split_off(1)));
        }

        let typed = words.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
        Err(CommandError::UnknownCommand {
            command: typed,
            available: self
                .handlers
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}
