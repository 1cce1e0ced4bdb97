//! Splits a chat command line into words.
//!
//! Words are separated by whitespace. Single quotes keep everything literal,
//! double quotes allow `\"` and `\\` escapes, and a backslash outside quotes
//! escapes the next character.

use crate::error::{CommandError, Result};

/// Splits `line` into words.
///
/// # Errors
///
/// Returns `CommandError::Syntax` for an unterminated quote or a trailing
/// backslash.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(syntax("unterminated single quote")),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(syntax("unterminated double quote")),
                        },
                        Some(c) => current.push(c),
                        None => return Err(syntax("unterminated double quote")),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(syntax("trailing backslash")),
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn syntax(reason: &str) -> CommandError {
    CommandError::Syntax {
        reason: reason.to_string(),
    }
}
