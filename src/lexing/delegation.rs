//! Delegated sub-lexing
//!
//! A delegated span is lexed in isolation: a fresh stack seeded at the target state, the
//! span's text as the whole input (so `^`/`$` and `\b` see the span boundaries). The nested
//! run is drained eagerly and its tokens shifted back into the parent's coordinates before
//! the parent continues, so parent and child never share iterator state.
//!
//! A span shorter than the parent's text always shrinks the input, so such recursion ends.
//! A span covering the parent's whole text re-lexes the same input; if it starts a
//! (grammar, state) pair already running over that text the nested run would repeat
//! forever, and [`LexError::DelegationLoop`] is raised instead.

use super::engine::{EngineOptions, Tokens};
use crate::error::LexError;
use crate::grammar::{Delegate, DelegateTarget, Grammar, StateId};
use crate::token::Token;
use std::ops::Range;
use tracing::trace;

/// Lex `text[span]` with the delegate's grammar and state.
///
/// `grammar` is the grammar owning the delegating rule, `depth` the nesting level of the
/// run that matched it and `lineage` the runs lexing exactly `text`.
pub(crate) fn run<'g, 't>(
    grammar: &'g Grammar,
    delegate: &'g Delegate,
    text: &'t str,
    span: Range<usize>,
    options: EngineOptions,
    depth: usize,
    lineage: &[(&'g Grammar, StateId)],
) -> Result<Vec<Token<'t>>, LexError> {
    let target: &'g Grammar = match &delegate.target {
        DelegateTarget::This => grammar,
        DelegateTarget::Grammar(other) => other.as_ref(),
    };

    let lineage = if span.len() == text.len() {
        let repeats = lineage
            .iter()
            .any(|(g, s)| std::ptr::eq(*g, target) && *s == delegate.state);
        if repeats {
            return Err(LexError::DelegationLoop {
                grammar: target.name().to_string(),
                state: target.state_name(delegate.state).to_string(),
                offset: span.start,
            });
        }
        lineage.to_vec()
    } else {
        Vec::new()
    };
    if depth >= options.max_delegation_depth {
        return Err(LexError::DelegationTooDeep {
            grammar: target.name().to_string(),
            offset: span.start,
            depth: options.max_delegation_depth,
        });
    }

    let offset = span.start;
    trace!(
        grammar = target.name(),
        state = target.state_name(delegate.state),
        offset,
        len = span.len(),
        depth = depth + 1,
        "delegate"
    );
    let nested = Tokens::new(
        target,
        &text[span],
        delegate.state,
        options,
        depth + 1,
        lineage,
    );
    let tokens = nested
        .map(|token| token.map(|t| t.shifted(offset)))
        .collect::<Result<Vec<_>, _>>()?;
    trace!(grammar = target.name(), tokens = tokens.len(), "delegate done");
    Ok(tokens)
}
