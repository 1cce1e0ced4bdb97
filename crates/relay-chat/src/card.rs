//! Rich notification cards.

use serde::{Deserialize, Serialize};

/// A structured chat message: title, body, optional image and link, color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card title.
    pub title: String,
    /// Body text.
    pub body: Option<String>,
    /// Image URL shown in the card.
    pub image: Option<String>,
    /// Link attached to the title.
    pub link: Option<String>,
    /// Color name (`red`, `green`, ...) or `#rrggbb`.
    pub color: String,
}

impl Card {
    /// Creates a card with just a title and color.
    #[must_use]
    pub fn new(title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            image: None,
            link: None,
            color: color.into(),
        }
    }

    /// Sets the body text.
    #[must_use]
    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// Sets the image URL.
    #[must_use]
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// Sets the link.
    #[must_use]
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    /// Plain-text rendering for clients that cannot show cards.
    #[must_use]
    pub fn fallback_text(&self) -> String {
        let mut text = self.title.clone();
        if let Some(body) = &self.body {
            text.push('\n');
            text.push_str(body);
        }
        if let Some(link) = &self.link {
            text.push('\n');
            text.push_str(link);
        }
        text
    }
}
