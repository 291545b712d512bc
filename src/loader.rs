//! Grammar loading
//!
//! This module reads grammar definitions written as YAML or JSON documents and compiles
//! them. The document shape is the serde form of [`GrammarDef`]:
//!
//! ```yaml
//! name: mini-shell
//! fallback: Error
//! states:
//!   root:
//!     - { match: '\$\(', token: Keyword, next: paren }
//!     - { match: '(\w+)(=)', groups: [Name.Variable, Operator] }
//!     - { words: [if, then, fi], suffix: '\b', token: Keyword }
//!   paren:
//!     - { match: '\)', token: Keyword, next: '#pop' }
//!     - include: root
//! ```
//!
//! # Architecture
//!
//! - String-based methods are the core functionality (parse source text)
//! - File-based methods are thin wrappers (read file, pick the format from the
//!   extension, then call the string method)
//! - Compilation goes through [`Grammar::compile_with`] against the loader's [`Catalog`],
//!   so grammars loaded earlier can be delegated to by name

use crate::error::LoadError;
use crate::grammar::{Catalog, Grammar, GrammarDef};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Serialization format of a grammar document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is read as YAML.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Loads and compiles grammar definitions, resolving delegations through a catalog.
#[derive(Debug, Clone, Default)]
pub struct GrammarLoader {
    catalog: Catalog,
}

impl GrammarLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Make `grammar` available to delegations in grammars loaded afterwards.
    pub fn register(&mut self, grammar: Arc<Grammar>) {
        self.catalog = std::mem::take(&mut self.catalog).with(grammar);
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ===== STRING-BASED LOADING (core methods) =====

    /// Deserialize a definition without compiling it.
    pub fn parse_definition(&self, source: &str, format: Format) -> Result<GrammarDef, LoadError> {
        let def: GrammarDef = match format {
            Format::Yaml => serde_yaml::from_str(source)?,
            Format::Json => serde_json::from_str(source)?,
        };
        Ok(def)
    }

    /// Deserialize and compile a definition.
    pub fn load(&self, source: &str, format: Format) -> Result<Grammar, LoadError> {
        let def = self.parse_definition(source, format)?;
        Ok(Grammar::compile_with(&def, &self.catalog)?)
    }

    /// Load a grammar and register it for later delegations.
    pub fn load_and_register(&mut self, source: &str, format: Format) -> Result<Arc<Grammar>, LoadError> {
        let grammar = Arc::new(self.load(source, format)?);
        self.register(grammar.clone());
        Ok(grammar)
    }

    // ===== FILE-BASED LOADING (convenience wrappers) =====

    pub fn read_definition(&self, path: impl AsRef<Path>) -> Result<GrammarDef, LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        self.parse_definition(&source, Format::from_path(path))
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Grammar, LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        self.load(&source, Format::from_path(path))
    }

    pub fn load_path_and_register(&mut self, path: impl AsRef<Path>) -> Result<Arc<Grammar>, LoadError> {
        let grammar = Arc::new(self.load_path(path)?);
        self.register(grammar.clone());
        Ok(grammar)
    }
}

/// Compile a YAML grammar that does not delegate to other grammars.
pub fn from_yaml(source: &str) -> Result<Grammar, LoadError> {
    GrammarLoader::new().load(source, Format::Yaml)
}

/// Compile a JSON grammar that does not delegate to other grammars.
pub fn from_json(source: &str) -> Result<Grammar, LoadError> {
    GrammarLoader::new().load(source, Format::Json)
}
