//! Line classification
//!
//! Splits a transcript into physical lines (the last one may lack its newline) and
//! classifies each as a prompted command line, a continuation of the open command, or
//! output. A continuation marker only counts while a command is open; after output it
//! is just more output. Prompts win over continuation markers.

use super::prompt::PromptMatcher;
use std::iter::FusedIterator;
use std::ops::Range;
use std::str::SplitInclusive;

/// One classified transcript line, with its absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptSpan<'t> {
    /// `prompt` followed by `command` (which includes the line's newline, if any).
    Prompted {
        start: usize,
        prompt: &'t str,
        command: &'t str,
        /// The prompt is a continuation marker extending the open command.
        continuation: bool,
    },
    /// A passthrough line, never lexed.
    Output { start: usize, text: &'t str },
}

impl<'t> TranscriptSpan<'t> {
    pub fn start(&self) -> usize {
        match self {
            TranscriptSpan::Prompted { start, .. } | TranscriptSpan::Output { start, .. } => *start,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TranscriptSpan::Prompted {
                prompt, command, ..
            } => prompt.len() + command.len(),
            TranscriptSpan::Output { text, .. } => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absolute byte range of the whole line.
    pub fn span(&self) -> Range<usize> {
        self.start()..self.start() + self.len()
    }
}

/// Lazily classify the lines of `text`.
pub fn segment<'m, 't>(text: &'t str, matcher: &'m PromptMatcher) -> Segments<'m, 't> {
    Segments {
        lines: text.split_inclusive('\n'),
        matcher,
        offset: 0,
        open: false,
    }
}

#[derive(Debug, Clone)]
pub struct Segments<'m, 't> {
    lines: SplitInclusive<'t, char>,
    matcher: &'m PromptMatcher,
    offset: usize,
    /// A command is being accumulated.
    open: bool,
}

impl<'t> Iterator for Segments<'_, 't> {
    type Item = TranscriptSpan<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        let start = self.offset;
        self.offset += line.len();

        let prompted = |len: usize, continuation: bool| {
            let (prompt, command) = line.split_at(len);
            TranscriptSpan::Prompted {
                start,
                prompt,
                command,
                continuation,
            }
        };

        if let Some(len) = self.matcher.prompt_len(line) {
            self.open = true;
            return Some(prompted(len, false));
        }
        if self.open {
            if let Some(len) = self.matcher.continuation_len(line) {
                return Some(prompted(len, true));
            }
        }
        self.open = false;
        Some(TranscriptSpan::Output { start, text: line })
    }
}

impl FusedIterator for Segments<'_, '_> {}
