//! Instance records and the requests that create or change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Longest accepted instance name.
pub const MAX_NAME_LENGTH: usize = 64;

/// One registered Grafana deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique, immutable name.
    pub name: String,
    /// Secret webhook token, unique across the registry.
    pub token: String,
    /// Chat room alerts are posted to.
    pub room: String,
    /// Whether alert images are attached to cards.
    pub show_images: bool,
    /// Text replaced in incoming alert links.
    #[serde(default)]
    pub link_regex_find: Option<String>,
    /// Replacement for `link_regex_find` occurrences.
    #[serde(default)]
    pub link_regex_replace: Option<String>,
    /// Informational URL of the Grafana deployment.
    #[serde(default)]
    pub url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    /// Short token prefix that is safe to put in logs.
    #[must_use]
    pub fn token_hint(&self) -> &str {
        self.token.get(..6).unwrap_or(&self.token)
    }
}

/// Request to register a new instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstance {
    /// Instance name.
    pub name: String,
    /// Destination room.
    pub room: String,
    /// Attach alert images.
    pub show_images: bool,
    /// Link rewrite pattern.
    pub link_regex_find: Option<String>,
    /// Link rewrite replacement.
    pub link_regex_replace: Option<String>,
    /// Informational URL.
    pub url: Option<String>,
}

impl NewInstance {
    /// Creates a request with images enabled and no link rewrite.
    #[must_use]
    pub fn new(name: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            room: room.into(),
            show_images: true,
            link_regex_find: None,
            link_regex_replace: None,
            url: None,
        }
    }

    /// Sets whether images are attached.
    #[must_use]
    pub const fn show_images(mut self, show: bool) -> Self {
        self.show_images = show;
        self
    }

    /// Sets the link rewrite pair.
    #[must_use]
    pub fn link_rewrite(mut self, find: impl Into<String>, replace: impl Into<String>) -> Self {
        self.link_regex_find = Some(find.into());
        self.link_regex_replace = Some(replace.into());
        self
    }

    /// Sets the informational URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_room(&self.room)
    }
}

/// Field changes applied by an update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceUpdate {
    /// New room.
    pub room: Option<String>,
    /// New image setting.
    pub show_images: Option<bool>,
    /// New link rewrite pattern.
    pub link_regex_find: Option<String>,
    /// New link rewrite replacement.
    pub link_regex_replace: Option<String>,
    /// Remove the link rewrite pair. Applied before the two fields above.
    pub clear_link_regex: bool,
    /// New informational URL.
    pub url: Option<String>,
}

impl InstanceUpdate {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub(crate) fn apply(self, instance: &mut Instance) -> Result<()> {
        if let Some(room) = &self.room {
            validate_room(room)?;
        }

        if self.clear_link_regex {
            instance.link_regex_find = None;
            instance.link_regex_replace = None;
        }
        if let Some(room) = self.room {
            instance.room = room;
        }
        if let Some(show) = self.show_images {
            instance.show_images = show;
        }
        if let Some(find) = self.link_regex_find {
            instance.link_regex_find = non_empty(find);
        }
        if let Some(replace) = self.link_regex_replace {
            instance.link_regex_replace = Some(replace);
        }
        if let Some(url) = self.url {
            instance.url = Some(url);
        }
        instance.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RegistryError::invalid("name cannot be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(RegistryError::invalid(format!(
            "name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(RegistryError::invalid("name cannot contain whitespace"));
    }
    Ok(())
}

fn validate_room(room: &str) -> Result<()> {
    if room.trim().is_empty() {
        return Err(RegistryError::invalid("room cannot be empty"));
    }
    Ok(())
}

/// An empty find-string means no link rewrite.
pub(crate) fn non_empty(find: String) -> Option<String> {
    (!find.is_empty()).then_some(find)
}
