//! Configuration loading
//!
//! Engine limits and transcript prompt settings. The embedded
//! `defaults/stacklex.default.toml` is always the bottom layer; [`Loader`] stacks TOML
//! files, `STACKLEX_*` environment variables and single-key overrides on top.

use crate::grammar::Grammar;
use crate::lexing::{EngineOptions, Lexer};
use crate::transcript::PromptMatcher;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_TOML: &str = include_str!("../defaults/stacklex.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StacklexConfig {
    pub engine: EngineOptions,
    pub transcript: TranscriptOptions,
}

impl StacklexConfig {
    /// A lexer over `grammar` using the configured engine limits.
    pub fn lexer<'g>(&self, grammar: &'g Grammar) -> Lexer<'g> {
        Lexer::with_options(grammar, self.engine)
    }
}

/// How transcript prompts are recognised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptOptions {
    /// Preset name or raw prompt regex.
    pub prompt: String,
    #[serde(default)]
    pub continuation: Option<String>,
}

impl TranscriptOptions {
    pub fn matcher(&self) -> Result<PromptMatcher, regex::Error> {
        let matcher = match PromptMatcher::preset(&self.prompt) {
            Some(preset) => preset,
            None => PromptMatcher::new(&self.prompt, None)?,
        };
        match self.continuation.as_deref() {
            None => Ok(matcher),
            Some("") => matcher.with_continuation(None),
            Some(pattern) => matcher.with_continuation(Some(pattern)),
        }
    }
}

/// Builds a [`StacklexConfig`] from `defaults/stacklex.default.toml` plus any number of
/// layers; later layers win key by key.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file that must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer a TOML file if it exists, e.g. a per-project `stacklex.toml`.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    /// Layer `STACKLEX_<TABLE>__<KEY>` environment variables, e.g.
    /// `STACKLEX_ENGINE__MAX_DELEGATION_DEPTH=512`.
    pub fn with_env(mut self) -> Self {
        let env = Environment::with_prefix("STACKLEX")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        self.builder = self.builder.add_source(env);
        self
    }

    /// Set one dotted key, e.g. `engine.max_delegation_depth`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<StacklexConfig, ConfigError> {
        let config: StacklexConfig = self.builder.build()?.try_deserialize()?;
        debug!(
            max_zero_width_steps = config.engine.max_zero_width_steps,
            max_delegation_depth = config.engine.max_delegation_depth,
            prompt = %config.transcript.prompt,
            "loaded configuration"
        );
        Ok(config)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path)
            .format(FileFormat::Toml)
            .required(required);
        self.builder = self.builder.add_source(source);
        self
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone.
pub fn load_defaults() -> Result<StacklexConfig, ConfigError> {
    Loader::new().build()
}
