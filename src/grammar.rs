//! Grammar
//!
//!     A grammar is an immutable table from states to ordered rule lists. It is built in
//!     two layers:
//!
//!         1. Definitions ([`GrammarDef`]): plain, serializable data. State references are
//!            strings and transitions use the `#pop` / `#push` notation. YAML/JSON files and
//!            [`GrammarBuilder`] both produce definitions.
//!         2. The compiled [`Grammar`]: every state name resolved to a dense [`StateId`],
//!            every `include` flattened into the including state's rule list, every pattern
//!            compiled, every transition turned into stack arithmetic.
//!
//!     All grammar defects are reported by [`Grammar::compile`] except the ones that
//!     depend on the text being lexed (see [`LexError`](crate::error::LexError)).
//!
//! Rule Order
//!
//!     The first rule whose pattern matches at the cursor wins, not the longest one. An
//!     `include` splices the included state's (already flattened) rules at the position
//!     of the include entry, so grammar authors control priority by placement.
//!
//! Sharing
//!
//!     A compiled grammar is never mutated. Build it once, wrap it in an `Arc` when other
//!     grammars delegate to it (see [`Catalog`]) and hand out shared references to every
//!     lexing run, on any thread.

pub mod builder;
mod compile;
pub mod definition;
pub mod pattern;

pub use builder::GrammarBuilder;
pub use definition::{
    DelegateDef, GrammarDef, GroupDef, PatternFlags, RuleDef, TransitionDef, DEFAULT_ROOT,
};
pub use pattern::{words, Pattern};

use crate::error::GrammarError;
use crate::token::TokenType;
use std::collections::HashMap;
use std::sync::Arc;

/// Dense index of a state inside one compiled grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a successful match produces.
#[derive(Debug, Clone)]
pub enum Action {
    /// The whole match becomes one token.
    Emit(TokenType),
    /// One entry per capture group.
    EmitGroups(Vec<GroupAction>),
    /// The match is lexed by another grammar/state and the tokens spliced in place.
    Delegate(Delegate),
}

/// Action for a single capture group of an [`Action::EmitGroups`] rule.
#[derive(Debug, Clone)]
pub enum GroupAction {
    Emit(TokenType),
    /// No token of its own; the text is covered by a plain `Text` token.
    Skip,
    Delegate(Delegate),
}

#[derive(Debug, Clone)]
pub struct Delegate {
    pub target: DelegateTarget,
    /// State of the target grammar the nested run starts in.
    pub state: StateId,
}

#[derive(Debug, Clone)]
pub enum DelegateTarget {
    /// The grammar that owns the rule.
    This,
    Grammar(Arc<Grammar>),
}

/// How a match changes the state stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Stay,
    /// Push in listed order; the last one becomes active.
    Push(Vec<StateId>),
    /// Pop saturating at the root.
    Pop(usize),
    /// Push the active state again (`#push`).
    Duplicate,
    /// Mixed operations applied in order, e.g. `['#pop', else, compound]`.
    Sequence(Vec<StackOp>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOp {
    Push(StateId),
    Pop(usize),
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) pattern: Pattern,
    pub(crate) action: Action,
    pub(crate) transition: Transition,
}

impl Rule {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub(crate) name: String,
    pub(crate) rules: Vec<Rule>,
    pub(crate) default: Option<Transition>,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in match priority order, includes already flattened.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Zero-width transition taken when no rule matches.
    pub fn default_transition(&self) -> Option<&Transition> {
        self.default.as_ref()
    }
}

/// A compiled, immutable grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) states: Vec<State>,
    pub(crate) lookup: HashMap<String, StateId>,
    pub(crate) root: StateId,
    pub(crate) fallback: TokenType,
    pub(crate) reset_on_newline: bool,
}

impl Grammar {
    /// Compile a definition that does not delegate to other grammars.
    pub fn compile(def: &GrammarDef) -> Result<Grammar, GrammarError> {
        compile::compile(def, &Catalog::new())
    }

    /// Compile a definition, resolving delegations to other grammars through `catalog`.
    pub fn compile_with(def: &GrammarDef, catalog: &Catalog) -> Result<Grammar, GrammarError> {
        compile::compile(def, catalog)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.lookup.get(name).copied()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn state_name(&self, id: StateId) -> &str {
        &self.states[id.0].name
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Token type for characters no rule matches.
    pub fn fallback(&self) -> TokenType {
        self.fallback
    }

    pub fn resets_on_newline(&self) -> bool {
        self.reset_on_newline
    }
}

/// An immutable set of compiled grammars that delegations can name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    grammars: HashMap<String, Arc<Grammar>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grammar under its own name, replacing any previous one with that name.
    pub fn with(mut self, grammar: Arc<Grammar>) -> Self {
        self.grammars.insert(grammar.name.clone(), grammar);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Grammar>> {
        self.grammars.get(name)
    }

    pub fn grammars(&self) -> impl Iterator<Item = &Arc<Grammar>> {
        self.grammars.values()
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}
