//! Command buffers and token merging
//!
//!     Consecutive prompted lines accumulate into one command buffer: the command
//!     fragments are concatenated (prompts removed) and lexed together, so constructs
//!     spanning lines (here-documents, `\` continuations, open quotes) lex as a unit.
//!     Every prompt or continuation marker is remembered as an insertion at the buffer
//!     offset where its fragment begins.
//!
//!     When the buffer is flushed, the engine tokens and the insertions are interleaved
//!     by buffer offset, insertions first on ties. An engine token crossing a fragment
//!     boundary is cut there, because the two halves are not adjacent in the transcript.
//!     Each piece is then mapped back to its absolute position, so every emitted token
//!     borrows its text straight from the transcript.

use super::prompt::PromptMatcher;
use super::segment::{segment, Segments, TranscriptSpan};
use crate::error::LexError;
use crate::lexing::Lexer;
use crate::token::{Token, TokenType};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use tracing::debug;

/// A run of command text that is contiguous in the transcript.
#[derive(Debug, Clone)]
struct Fragment<'t> {
    /// Where the fragment starts in the buffer.
    offset: usize,
    /// Where it starts in the transcript.
    start: usize,
    len: usize,
    /// Prompt or continuation marker inserted before the fragment.
    marker: Token<'t>,
}

#[derive(Debug, Clone, Default)]
struct CommandBuffer<'t> {
    text: String,
    fragments: Vec<Fragment<'t>>,
}

impl<'t> CommandBuffer<'t> {
    fn push(&mut self, start: usize, prompt: &'t str, command: &'t str) {
        self.fragments.push(Fragment {
            offset: self.text.len(),
            start: start + prompt.len(),
            len: command.len(),
            marker: Token::new(start, TokenType::GenericPrompt, prompt),
        });
        self.text.push_str(command);
    }

    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Lazy merged token stream over a transcript.
///
/// Only as much of the transcript is read as is needed to produce the next token: one
/// output line, or one complete command buffer.
#[derive(Debug, Clone)]
pub struct Merge<'a, 't> {
    text: &'t str,
    lexer: Lexer<'a>,
    segments: Segments<'a, 't>,
    buffer: CommandBuffer<'t>,
    pending: VecDeque<Token<'t>>,
    finished: bool,
}

impl<'a, 't> Merge<'a, 't> {
    pub fn new(text: &'t str, matcher: &'a PromptMatcher, lexer: Lexer<'a>) -> Self {
        Merge {
            text,
            lexer,
            segments: segment(text, matcher),
            buffer: CommandBuffer::default(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Read one line, queueing whatever tokens it completes. Returns `false` at the end.
    fn advance(&mut self) -> Result<bool, LexError> {
        match self.segments.next() {
            Some(TranscriptSpan::Prompted {
                start,
                prompt,
                command,
                ..
            }) => {
                self.buffer.push(start, prompt, command);
                Ok(true)
            }
            Some(TranscriptSpan::Output { start, text }) => {
                self.flush()?;
                self.queue(Token::new(start, TokenType::GenericOutput, text));
                Ok(true)
            }
            None => {
                self.flush()?;
                Ok(false)
            }
        }
    }

    fn flush(&mut self) -> Result<(), LexError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let buffer = std::mem::take(&mut self.buffer);
        let lexed = self
            .lexer
            .tokenize(&buffer.text)
            .map(|token| token.map(|t| (t.span(), t.kind)))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            start = buffer.fragments.first().map_or(0, |f| f.marker.start),
            len = buffer.text.len(),
            insertions = buffer.fragments.len(),
            tokens = lexed.len(),
            "flushed command buffer"
        );

        let fragments = &buffer.fragments;
        let mut inserted = 0;
        for (range, kind) in lexed {
            let mut pos = range.start;
            while pos < range.end {
                while inserted < fragments.len() && fragments[inserted].offset <= pos {
                    self.queue(fragments[inserted].marker);
                    inserted += 1;
                }
                let Some(fragment) = inserted.checked_sub(1).map(|i| &fragments[i]) else {
                    break;
                };
                let end = range.end.min(fragment.offset + fragment.len);
                if end <= pos {
                    break;
                }
                let start = fragment.start + (pos - fragment.offset);
                let text = self.text;
                self.queue(Token::new(start, kind, &text[start..start + (end - pos)]));
                pos = end;
            }
        }
        for fragment in &fragments[inserted..] {
            self.queue(fragment.marker);
        }
        Ok(())
    }

    fn queue(&mut self, token: Token<'t>) {
        if !token.is_empty() {
            self.pending.push_back(token);
        }
    }
}

impl<'t> Iterator for Merge<'_, 't> {
    type Item = Result<Token<'t>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if self.finished {
                return None;
            }
            match self.advance() {
                Ok(true) => {}
                Ok(false) => self.finished = true,
                Err(err) => {
                    self.finished = true;
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl FusedIterator for Merge<'_, '_> {}
