//! Tokens
//!
//!     The engine's output unit is a [`Token`]: a byte range into the lexed text, the
//!     [`TokenType`] assigned by the grammar and the text slice itself. Token text always
//!     borrows from the original document, including tokens produced by delegated
//!     sub-lexers and by the transcript merger, so a token stream can be checked against
//!     its source by simple slicing.
//!
//!     Token types form a small dotted hierarchy (`Name.Variable` is a `Name`), which is
//!     what grammar authors refer to in YAML/JSON definitions.

pub mod token_type;

pub use token_type::TokenType;

use serde::Serialize;
use std::ops::Range;

/// A single lexed token.
///
/// Serializes to the externally observable shape `{start, end, type, text}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Token<'t> {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: TokenType,
    pub text: &'t str,
}

impl<'t> Token<'t> {
    pub fn new(start: usize, kind: TokenType, text: &'t str) -> Self {
        Token {
            start,
            end: start + text.len(),
            kind,
            text,
        }
    }

    /// Byte range of the token in the document it was lexed from.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Shift the token into a parent document's coordinates.
    pub(crate) fn shifted(self, offset: usize) -> Self {
        Token {
            start: self.start + offset,
            end: self.end + offset,
            ..self
        }
    }
}
