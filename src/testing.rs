//! Testing utilities for token streams
//!
//! # Token Testing Guidelines
//!
//! Token streams are long and every offset matters, so hand-writing `Token { start, end,
//! .. }` literals is error prone. This module provides three tools:
//!
//! 1. **[mk_tokens]** - build an expected stream from `(type, text)` pairs; offsets are
//!    computed by laying the texts end to end from 0.
//! 2. **[assert_covers]** - check the coverage invariant: texts concatenate to the input,
//!    offsets are contiguous, every token's text is the slice its offsets name.
//! 3. **[render]** - a compact one-token-per-line dump for snapshot tests.
//!
//! ```rust-example
//! let tokens = tokenize_all("foo bar", &grammar)?;
//! assert_covers("foo bar", &tokens);
//! assert_eq!(tokens, mk_tokens(&[
//!     (TokenType::Name, "foo"),
//!     (TokenType::Text, " "),
//!     (TokenType::Name, "bar"),
//! ]));
//! insta::assert_snapshot!(render(&tokens), @r###"..."###);
//! ```
//!
//! Prefer comparing whole streams over spot-checking single tokens: a stray extra token
//! is exactly the kind of defect spot checks miss.

use crate::token::{Token, TokenType};
use std::fmt::Write;

/// Tokens laid out contiguously from offset 0.
pub fn mk_tokens<'t>(pairs: &[(TokenType, &'t str)]) -> Vec<Token<'t>> {
    let mut start = 0;
    pairs.iter()
        .map(|&(kind, text)| {
            let token = Token::new(start, kind, text);
            start = token.end;
            token
        })
        .collect()
}

/// Panics unless `tokens` exactly and contiguously cover `text`.
pub fn assert_covers(text: &str, tokens: &[Token<'_>]) {
    let mut pos = 0;
    for (i, token) in tokens.iter().enumerate() {
        assert_eq!(
            token.start, pos,
            "token {} {:?} starts at {}, expected {}",
            i, token, token.start, pos
        );
        assert!(!token.is_empty(), "token {} {:?} is empty", i, token);
        assert_eq!(
            text.get(token.span()),
            Some(token.text),
            "token {} {:?} text does not match its span",
            i,
            token
        );
        pos = token.end;
    }
    assert_eq!(pos, text.len(), "tokens end at {}, text is {} bytes", pos, text.len());
}

/// One line per token: `start..end Type "text"`.
pub fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    for token in tokens {
        let _ = writeln!(
            out,
            "{}..{} {} {:?}",
            token.start, token.end, token.kind, token.text
        );
    }
    out
}
