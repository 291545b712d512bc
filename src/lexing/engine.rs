//! The stack automaton
//!
//!     Each step looks at the rules of the active state, in order, and takes the first one
//!     whose pattern matches exactly at the cursor. The rule's action runs first (emitting
//!     tokens or delegating), then its transition updates the stack, then the cursor moves
//!     past the match.
//!
//!     When nothing matches, the state's default transition (if any) is applied without
//!     consuming input and matching is retried. Without a default, one character is
//!     emitted as a fallback token and the cursor moves on, so arbitrary input always lexes.
//!
//! Zero-width Steps
//!
//!     Empty matches and default transitions do not move the cursor. Between two consuming
//!     steps the engine records every stack configuration it has been in; returning to one
//!     of them means the grammar cannot make progress and lexing stops with
//!     [`LexError::NoProgress`]. Transitions that shrink the stack always end at the root,
//!     so only the ones that keep or grow it count against `max_zero_width_steps`.

use super::delegation;
use super::stack::StateStack;
use crate::error::LexError;
use crate::grammar::{Action, Grammar, GroupAction, Rule, State, StateId, Transition};
use crate::token::{Token, TokenType};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::ops::Range;
use tracing::trace;

/// Engine limits; the `[engine]` table of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Zero-width transitions that do not shrink the stack, allowed between two
    /// consuming steps.
    pub max_zero_width_steps: usize,
    /// Resource limit on nested delegated runs. Every level is a nested call on the
    /// native stack.
    pub max_delegation_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_zero_width_steps: 64,
            max_delegation_depth: 256,
        }
    }
}

/// A grammar paired with engine options.
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'g> {
    grammar: &'g Grammar,
    options: EngineOptions,
}

impl<'g> Lexer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_options(grammar, EngineOptions::default())
    }

    pub fn with_options(grammar: &'g Grammar, options: EngineOptions) -> Self {
        Lexer { grammar, options }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Lex `text` starting in the root state.
    pub fn tokenize<'t>(&self, text: &'t str) -> Tokens<'g, 't> {
        self.tokenize_from(text, self.grammar.root())
    }

    /// Lex `text` with `state` active on top of the root.
    pub fn tokenize_from<'t>(&self, text: &'t str, state: StateId) -> Tokens<'g, 't> {
        Tokens::new(self.grammar, text, state, self.options, 0, Vec::new())
    }

    /// Lex the whole of `text` into a vector.
    pub fn tokenize_all<'t>(&self, text: &'t str) -> Result<Vec<Token<'t>>, LexError> {
        self.tokenize(text).collect()
    }
}

/// Lazy token stream over one text.
///
/// Yields tokens in document order; their texts concatenate to the input. A grammar
/// defect surfaces as a single `Err` item, after which the stream ends.
#[derive(Debug, Clone)]
pub struct Tokens<'g, 't> {
    grammar: &'g Grammar,
    text: &'t str,
    pos: usize,
    stack: StateStack,
    pending: VecDeque<Token<'t>>,
    options: EngineOptions,
    depth: usize,
    /// (grammar, start state) of this run and of the enclosing runs over the same text.
    lineage: Vec<(&'g Grammar, StateId)>,
    finished: bool,
}

/// Stack configurations visited since the last consuming step.
#[derive(Default)]
struct ZeroWidth {
    seen: Vec<StateStack>,
    not_shrinking: usize,
}

impl ZeroWidth {
    fn start(&mut self, stack: &StateStack) {
        if self.seen.is_empty() {
            self.seen.push(stack.clone());
        }
    }
}

impl<'g, 't> Tokens<'g, 't> {
    pub(crate) fn new(
        grammar: &'g Grammar,
        text: &'t str,
        state: StateId,
        options: EngineOptions,
        depth: usize,
        mut lineage: Vec<(&'g Grammar, StateId)>,
    ) -> Self {
        lineage.push((grammar, state));
        Tokens {
            grammar,
            text,
            pos: 0,
            stack: StateStack::seeded(grammar.root(), state),
            pending: VecDeque::new(),
            options,
            depth,
            lineage,
            finished: false,
        }
    }

    /// Byte offset of the next unconsumed character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn stack(&self) -> &StateStack {
        &self.stack
    }

    /// One consuming step: a non-empty match or a fallback character.
    fn step(&mut self) -> Result<(), LexError> {
        let grammar: &'g Grammar = self.grammar;
        let mut history = ZeroWidth::default();

        loop {
            let state: &'g State = grammar.state(self.stack.top());

            if let Some((rule, span)) = find_rule(state, self.text, self.pos) {
                let zero_width = span.is_empty();
                if zero_width {
                    history.start(&self.stack);
                }
                self.run_action(rule, span.clone())?;
                self.transition(rule.transition());
                if !zero_width {
                    self.pos = span.end;
                    return Ok(());
                }
                self.check_progress(&mut history)?;
                continue;
            }

            if let Some(default) = state.default_transition() {
                history.start(&self.stack);
                self.transition(default);
                self.check_progress(&mut history)?;
                continue;
            }

            self.fallback();
            return Ok(());
        }
    }

    fn run_action(&mut self, rule: &'g Rule, span: Range<usize>) -> Result<(), LexError> {
        match rule.action() {
            Action::Emit(kind) => {
                self.emit(span, *kind);
                Ok(())
            }
            Action::EmitGroups(groups) => self.emit_groups(rule, groups, span),
            Action::Delegate(delegate) => {
                let tokens = delegation::run(
                    self.grammar,
                    delegate,
                    self.text,
                    span,
                    self.options,
                    self.depth,
                    &self.lineage,
                )?;
                self.pending.extend(tokens);
                Ok(())
            }
        }
    }

    /// Tokens for each participating group, in order. Text of the match not claimed by a
    /// group (separators, skipped groups) becomes `Text` so nothing is lost. Groups nested
    /// inside an earlier group are covered by that group.
    fn emit_groups(
        &mut self,
        rule: &'g Rule,
        groups: &'g [GroupAction],
        span: Range<usize>,
    ) -> Result<(), LexError> {
        let captures = rule
            .pattern()
            .captures_at(self.text, span.start)
            .unwrap_or_default();
        let mut cursor = span.start;

        for (range, action) in captures.into_iter().skip(1).zip(groups) {
            let Some(range) = range else { continue };
            if range.is_empty() || range.start < cursor {
                continue;
            }
            match action {
                GroupAction::Skip => continue,
                GroupAction::Emit(kind) => {
                    self.emit(cursor..range.start, TokenType::Text);
                    self.emit(range.clone(), *kind);
                }
                GroupAction::Delegate(delegate) => {
                    self.emit(cursor..range.start, TokenType::Text);
                    let tokens = delegation::run(
                        self.grammar,
                        delegate,
                        self.text,
                        range.clone(),
                        self.options,
                        self.depth,
                        &self.lineage,
                    )?;
                    self.pending.extend(tokens);
                }
            }
            cursor = range.end;
        }

        self.emit(cursor..span.end, TokenType::Text);
        Ok(())
    }

    fn emit(&mut self, range: Range<usize>, kind: TokenType) {
        if range.is_empty() {
            return;
        }
        let text = self.text;
        self.pending
            .push_back(Token::new(range.start, kind, &text[range]));
    }

    fn transition(&mut self, transition: &Transition) {
        if *transition == Transition::Stay {
            return;
        }
        let from = self.stack.top();
        self.stack.apply(transition);
        trace!(
            grammar = self.grammar.name(),
            from = self.grammar.state_name(from),
            to = self.grammar.state_name(self.stack.top()),
            depth = self.stack.depth(),
            offset = self.pos,
            "transition"
        );
    }

    fn check_progress(&self, history: &mut ZeroWidth) -> Result<(), LexError> {
        let shrank = history
            .seen
            .last()
            .is_some_and(|last| self.stack.depth() < last.depth());
        if !shrank {
            history.not_shrinking += 1;
        }
        if history.seen.contains(&self.stack)
            || history.not_shrinking > self.options.max_zero_width_steps
        {
            return Err(LexError::NoProgress {
                grammar: self.grammar.name().to_string(),
                state: self.grammar.state_name(self.stack.top()).to_string(),
                offset: self.pos,
            });
        }
        history.seen.push(self.stack.clone());
        Ok(())
    }

    fn fallback(&mut self) {
        let Some(ch) = self.text[self.pos..].chars().next() else {
            self.pos = self.text.len();
            return;
        };
        let end = self.pos + ch.len_utf8();
        let kind = if ch == '\n' && self.grammar.resets_on_newline() {
            self.stack.reset();
            TokenType::Text
        } else {
            self.grammar.fallback()
        };
        trace!(
            grammar = self.grammar.name(),
            state = self.grammar.state_name(self.stack.top()),
            offset = self.pos,
            kind = kind.as_str(),
            "fallback"
        );
        self.emit(self.pos..end, kind);
        self.pos = end;
    }
}

fn find_rule<'g>(state: &'g State, text: &str, pos: usize) -> Option<(&'g Rule, Range<usize>)> {
    state
        .rules()
        .iter()
        .find_map(|rule| rule.pattern().match_at(text, pos).map(|span| (rule, span)))
}

impl<'g, 't> Iterator for Tokens<'g, 't> {
    type Item = Result<Token<'t>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if self.finished || self.pos >= self.text.len() {
                return None;
            }
            if let Err(err) = self.step() {
                self.finished = true;
                self.pending.clear();
                return Some(Err(err));
            }
        }
    }
}

impl FusedIterator for Tokens<'_, '_> {}
