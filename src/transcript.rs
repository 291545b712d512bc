//! Terminal transcripts
//!
//!     A transcript is a captured terminal session: prompts, the commands typed after
//!     them, and whatever the commands printed. [`merge_transcript`] turns one into a
//!     single token stream over the whole document:
//!
//!     - prompts and continuation markers become `Generic.Prompt` tokens,
//!     - command text is lexed with a command grammar, one buffer per run of
//!       consecutive prompted lines,
//!     - every other line becomes one opaque `Generic.Output` token.
//!
//!     The stream covers the transcript exactly, in order, and every token's offsets are
//!     absolute positions in the transcript.
//!
//!     Which lines are prompts is decided by a [`PromptMatcher`]; [`segment`] exposes that
//!     classification on its own.

pub mod merge;
pub mod prompt;
pub mod segment;

pub use merge::Merge;
pub use prompt::PromptMatcher;
pub use segment::{segment, Segments, TranscriptSpan};

use crate::grammar::Grammar;
use crate::lexing::Lexer;

/// Merge a transcript with default engine options.
pub fn merge_transcript<'a, 't>(
    text: &'t str,
    matcher: &'a PromptMatcher,
    grammar: &'a Grammar,
) -> Merge<'a, 't> {
    Merge::new(text, matcher, Lexer::new(grammar))
}
