//! Lexing
//!
//!     Walks text against a compiled [`Grammar`](crate::grammar::Grammar) and produces a
//!     lazy stream of [`Token`]s. The stream is gap-free: token texts concatenate to the
//!     input, offsets are contiguous and strictly increasing. Input never makes lexing
//!     fail; only grammar defects do (see [`LexError`]).
//!
//!     - [`stack`]: the state stack with its saturating pop.
//!     - [`engine`]: the step loop, the [`Tokens`] iterator and the [`Lexer`] entry point.
//!     - [`delegation`]: nested runs over a matched span.
//!
//!     Every run owns its stack and reads the grammar through a shared reference, so any
//!     number of runs can proceed concurrently over the same grammar. Abandoning a stream
//!     half way is fine; it holds no resources.

mod delegation;
pub mod engine;
pub mod stack;

pub use engine::{EngineOptions, Lexer, Tokens};
pub use stack::StateStack;

use crate::error::LexError;
use crate::grammar::{Grammar, StateId};
use crate::token::Token;
use std::borrow::Cow;

/// Lex `text` from the grammar's root state with default engine options.
pub fn tokenize<'g, 't>(text: &'t str, grammar: &'g Grammar) -> Tokens<'g, 't> {
    Lexer::new(grammar).tokenize(text)
}

/// Lex `text` with `state` active on top of the root.
pub fn tokenize_from<'g, 't>(text: &'t str, grammar: &'g Grammar, state: StateId) -> Tokens<'g, 't> {
    Lexer::new(grammar).tokenize_from(text, state)
}

/// Lex the whole of `text`, stopping at the first grammar error.
pub fn tokenize_all<'t>(text: &'t str, grammar: &Grammar) -> Result<Vec<Token<'t>>, LexError> {
    Lexer::new(grammar).tokenize_all(text)
}

/// Preprocesses source text to ensure it ends with a newline.
///
/// Line-oriented grammars often anchor their last rule on `\n`. Returns the input
/// unchanged if it is empty or already ends with a newline.
pub fn ensure_source_ends_with_newline(source: &str) -> Cow<'_, str> {
    if !source.is_empty() && !source.ends_with('\n') {
        Cow::Owned(format!("{}\n", source))
    } else {
        Cow::Borrowed(source)
    }
}
