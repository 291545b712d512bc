//! Error types
//!
//! Lexing never fails on its input: unrecognised text becomes fallback tokens. What can
//! fail is the grammar. [`GrammarError`] covers defects caught while compiling a
//! definition, [`LexError`] covers defects that only show up while walking text (a
//! zero-width transition cycle, runaway delegation). [`LoadError`] wraps both the
//! reading/deserialising of definitions and their compilation.

use std::fmt;

/// Errors raised while compiling a grammar definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A pattern failed to compile.
    InvalidPattern {
        state: String,
        pattern: String,
        message: String,
    },
    /// A push, include or delegation names a state that does not exist.
    UnknownState { state: String, reference: String },
    /// States include each other in a loop.
    IncludeCycle { state: String },
    /// A rule definition has no pattern, or combines fields that exclude each other.
    MalformedRule {
        state: String,
        index: usize,
        reason: String,
    },
    /// An `EmitGroups` action lists a different number of entries than the pattern has groups.
    GroupMismatch {
        state: String,
        pattern: String,
        groups: usize,
        actions: usize,
    },
    /// A transition string could not be parsed (e.g. `#pop:x`).
    InvalidTransition { state: String, value: String },
    /// A delegation names a grammar missing from the catalog.
    UnknownGrammar { name: String },
    /// The designated root state is not defined.
    MissingRoot { root: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::InvalidPattern {
                state,
                pattern,
                message,
            } => write!(
                f,
                "Invalid pattern {:?} in state '{}': {}",
                pattern, state, message
            ),
            GrammarError::UnknownState { state, reference } => {
                write!(f, "State '{}' references unknown state '{}'", state, reference)
            }
            GrammarError::IncludeCycle { state } => {
                write!(f, "State '{}' includes itself", state)
            }
            GrammarError::MalformedRule {
                state,
                index,
                reason,
            } => write!(f, "Rule {} in state '{}' is malformed: {}", index, state, reason),
            GrammarError::GroupMismatch {
                state,
                pattern,
                groups,
                actions,
            } => write!(
                f,
                "Pattern {:?} in state '{}' has {} groups but {} group actions",
                pattern, state, groups, actions
            ),
            GrammarError::InvalidTransition { state, value } => {
                write!(f, "Invalid transition {:?} in state '{}'", value, state)
            }
            GrammarError::UnknownGrammar { name } => {
                write!(f, "Delegation to unknown grammar '{}'", name)
            }
            GrammarError::MissingRoot { root } => write!(f, "Root state '{}' is not defined", root),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Grammar defects detected while lexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// Zero-width transitions stopped making progress.
    NoProgress {
        grammar: String,
        state: String,
        offset: usize,
    },
    /// A delegation re-lexes its parent's whole text from a (grammar, state) pair that
    /// is already running over it.
    DelegationLoop {
        grammar: String,
        state: String,
        offset: usize,
    },
    /// Delegated sub-lexing nested deeper than the configured resource limit.
    DelegationTooDeep {
        grammar: String,
        offset: usize,
        depth: usize,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::NoProgress {
                grammar,
                state,
                offset,
            } => write!(
                f,
                "Grammar '{}' loops without consuming input in state '{}' at offset {}",
                grammar, state, offset
            ),
            LexError::DelegationLoop {
                grammar,
                state,
                offset,
            } => write!(
                f,
                "Delegation into state '{}' of grammar '{}' at offset {} re-lexes the same text forever",
                state, grammar, offset
            ),
            LexError::DelegationTooDeep {
                grammar,
                offset,
                depth,
            } => write!(
                f,
                "Delegation into grammar '{}' at offset {} exceeds depth {}",
                grammar, offset, depth
            ),
        }
    }
}

impl std::error::Error for LexError {}

/// Errors raised while loading a grammar definition from text or disk.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// IO error when reading a file
    Io(String),
    /// The document is not a valid YAML/JSON grammar definition
    Parse(String),
    /// The definition parsed but does not compile
    Grammar(GrammarError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "IO error: {}", msg),
            LoadError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LoadError::Grammar(err) => write!(f, "Grammar error: {}", err),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(err: serde_yaml::Error) -> Self {
        LoadError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Parse(err.to_string())
    }
}

impl From<GrammarError> for LoadError {
    fn from(err: GrammarError) -> Self {
        LoadError::Grammar(err)
    }
}
