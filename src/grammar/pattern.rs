//! Anchored patterns
//!
//! A rule only ever matches starting exactly at the cursor. Slicing the text at the
//! cursor would make `\b`, `^` and `$` misjudge the first character, so patterns run
//! over the whole document with an anchored search that starts at the cursor.
//!
//! Matching uses finite automata (no backtracking), so a single attempt is linear in the
//! remaining input whatever the pattern looks like. Look-around and backreferences are
//! not supported and are reported as invalid patterns.

use super::definition::PatternFlags;
use regex_automata::meta::Regex;
use regex_automata::util::captures::Captures;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input, PatternID};
use std::fmt;
use std::ops::Range;

/// A compiled rule pattern.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str, flags: PatternFlags) -> Result<Self, String> {
        let config = syntax::Config::new()
            .multi_line(flags.multi_line)
            .case_insensitive(flags.case_insensitive)
            .dot_matches_new_line(flags.dot_matches_new_line);
        let regex = Regex::builder()
            .syntax(config)
            .build(source)
            .map_err(|e| {
                e.syntax_error()
                    .map(|syntax| syntax.to_string())
                    .unwrap_or_else(|| e.to_string())
            })?;
        Ok(Pattern {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of capture groups, not counting the implicit whole-match group.
    pub fn group_count(&self) -> usize {
        self.regex
            .group_info()
            .group_len(PatternID::ZERO)
            .saturating_sub(1)
    }

    /// Byte range of a match starting exactly at `pos`, if any.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<Range<usize>> {
        let input = Input::new(text).range(pos..).anchored(Anchored::Yes);
        self.regex.search(&input).map(|m| m.range())
    }

    /// Group ranges of a match starting exactly at `pos`; index 0 is the whole match.
    /// Groups that did not participate are `None`.
    pub fn captures_at(&self, text: &str, pos: usize) -> Option<Vec<Option<Range<usize>>>> {
        let input = Input::new(text).range(pos..).anchored(Anchored::Yes);
        let mut caps: Captures = self.regex.create_captures();
        self.regex.search_captures(&input, &mut caps);
        if !caps.is_match() {
            return None;
        }
        Some(
            (0..=self.group_count())
                .map(|i| caps.get_group(i).map(|span| span.range()))
                .collect(),
        )
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Build an alternation matching any of `words`, longest first so the longest
/// candidate wins under first-match semantics.
///
/// The alternation is non-capturing; it does not add a group to the pattern.
pub fn words<S: AsRef<str>>(words: &[S], prefix: &str, suffix: &str) -> String {
    let mut sorted: Vec<&str> = words.iter().map(|w| w.as_ref()).collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted.dedup();
    let alternation: Vec<String> = sorted.into_iter().map(regex::escape).collect();
    format!("{}(?:{}){}", prefix, alternation.join("|"), suffix)
}
