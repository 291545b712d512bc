//! Fluent grammar construction
//!
//! ```ignore
//! let grammar = GrammarBuilder::new("calc")
//!     .state("root", vec![
//!         RuleDef::token(r"\(", TokenType::Punctuation).then("paren"),
//!         RuleDef::token(r"\d+", TokenType::Number),
//!         RuleDef::token(r"\s+", TokenType::Whitespace),
//!     ])
//!     .state("paren", vec![
//!         RuleDef::token(r"\)", TokenType::Punctuation).then("#pop"),
//!         RuleDef::include("root"),
//!     ])
//!     .build()?;
//! ```

use super::definition::{GrammarDef, PatternFlags, RuleDef};
use super::{Catalog, Grammar};
use crate::error::GrammarError;
use crate::token::TokenType;
use std::sync::Arc;

/// Assembles a [`GrammarDef`] and compiles it.
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    def: GrammarDef,
    catalog: Catalog,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        GrammarBuilder {
            def: GrammarDef::new(name),
            catalog: Catalog::new(),
        }
    }

    /// Start from an existing definition, e.g. one loaded from YAML.
    pub fn from_def(def: GrammarDef) -> Self {
        GrammarBuilder {
            def,
            catalog: Catalog::new(),
        }
    }

    pub fn root(mut self, state: impl Into<String>) -> Self {
        self.def.root = state.into();
        self
    }

    pub fn flags(mut self, flags: PatternFlags) -> Self {
        self.def.flags = flags;
        self
    }

    pub fn fallback(mut self, kind: TokenType) -> Self {
        self.def.fallback = kind;
        self
    }

    pub fn reset_on_newline(mut self, reset: bool) -> Self {
        self.def.reset_on_newline = reset;
        self
    }

    /// Define (or redefine) a state.
    pub fn state(mut self, name: impl Into<String>, rules: Vec<RuleDef>) -> Self {
        self.def.states.insert(name.into(), rules);
        self
    }

    /// Make `grammar` available to delegations by name.
    pub fn depends_on(mut self, grammar: Arc<Grammar>) -> Self {
        self.catalog = self.catalog.with(grammar);
        self
    }

    /// Splice `parent`'s rules into our `inherit` entries and copy its other states.
    pub fn inherit_from(mut self, parent: &GrammarDef) -> Self {
        self.def = self.def.inherit_from(parent);
        self
    }

    pub fn definition(&self) -> &GrammarDef {
        &self.def
    }

    pub fn into_definition(self) -> GrammarDef {
        self.def
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        Grammar::compile_with(&self.def, &self.catalog)
    }

    /// Compile against an external catalog in addition to our own dependencies.
    pub fn build_with(self, catalog: &Catalog) -> Result<Grammar, GrammarError> {
        let mut merged = catalog.clone();
        for grammar in self.catalog.grammars() {
            merged = merged.with(grammar.clone());
        }
        Grammar::compile_with(&self.def, &merged)
    }
}
