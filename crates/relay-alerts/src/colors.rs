//! Alert state to card color mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Color used for states missing from the table.
pub const FALLBACK_COLOR: &str = "red";

/// Maps alert state names to display colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTable {
    colors: BTreeMap<String, String>,
}

impl ColorTable {
    /// Creates an empty table; every state maps to the fallback color.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            colors: BTreeMap::new(),
        }
    }

    /// Sets the color for `state`.
    #[must_use]
    pub fn with(mut self, state: impl Into<String>, color: impl Into<String>) -> Self {
        self.colors.insert(state.into(), color.into());
        self
    }

    /// Overlays `overrides` on top of this table.
    #[must_use]
    pub fn merged(mut self, overrides: &BTreeMap<String, String>) -> Self {
        self.colors.extend(
            overrides
                .iter()
                .map(|(state, color)| (state.clone(), color.clone())),
        );
        self
    }

    /// Color for `state`, or red if the state is unknown.
    #[must_use]
    pub fn color_for(&self, state: &str) -> &str {
        self.colors
            .get(state)
            .map_or(FALLBACK_COLOR, String::as_str)
    }

    /// Iterates over configured `(state, color)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colors.iter().map(|(s, c)| (s.as_str(), c.as_str()))
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::empty()
            .with("ok", "green")
            .with("paused", "blue")
            .with("alerting", "red")
            .with("pending", "orange")
            .with("no_data", "red")
    }
}
