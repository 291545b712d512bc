//! # stacklex
//!
//! A grammar-driven, stack-based lexing engine, plus a transcript merger for captured
//! terminal sessions.
//!
//! - [`grammar`]: define grammars (Rust builder or YAML/JSON) and compile them into
//!   immutable state tables.
//! - [`lexing`]: walk text against a grammar, producing a lazy, gap-free token stream.
//! - [`transcript`]: split a terminal session into prompts, commands and output, lex the
//!   commands and merge everything back into one stream.
//! - [`loader`]: read grammar definitions from YAML/JSON strings or files.
//! - [`config`]: engine limits and prompt settings, layered over embedded defaults.
//!
//! ## Testing
//!
//! For token stream assertions, see the [testing module](crate::testing).

pub mod config;
pub mod error;
pub mod grammar;
pub mod lexing;
pub mod loader;
pub mod testing;
pub mod token;
pub mod transcript;

pub use error::{GrammarError, LexError, LoadError};
pub use grammar::{Catalog, Grammar, GrammarBuilder, GrammarDef, RuleDef, StateId};
pub use lexing::{tokenize, tokenize_all, tokenize_from, EngineOptions, Lexer, Tokens};
pub use token::{Token, TokenType};
pub use transcript::{merge_transcript, PromptMatcher};
