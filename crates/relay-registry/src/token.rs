//! Webhook token generation.
//!
//! Tokens are bearer secrets embedded in the public webhook path, so they are
//! drawn from the operating system CSPRNG.

use rand::Rng;
use rand::rngs::OsRng;

use crate::error::{RegistryError, Result};

/// Characters a token is built from.
pub const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Default token length.
pub const DEFAULT_TOKEN_LENGTH: usize = 48;

/// Shortest token length accepted.
pub const MIN_TOKEN_LENGTH: usize = 16;

/// Longest token length accepted.
pub const MAX_TOKEN_LENGTH: usize = 256;

/// Generates fixed-length lowercase alphanumeric tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGenerator {
    length: usize,
}

impl TokenGenerator {
    /// Creates a generator producing tokens of `length` characters.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidInstance` if the length is outside
    /// `MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH`.
    pub fn new(length: usize) -> Result<Self> {
        if !(MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&length) {
            return Err(RegistryError::invalid(format!(
                "token length must be between {MIN_TOKEN_LENGTH} and {MAX_TOKEN_LENGTH}, got {length}"
            )));
        }
        Ok(Self { length })
    }

    /// Returns the configured token length.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Draws a fresh token.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut rng = OsRng;
        (0..self.length)
            .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
            .collect()
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_TOKEN_LENGTH,
        }
    }
}
