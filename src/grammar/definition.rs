//! Grammar definitions
//!
//! The definition layer is plain data: state names are strings, transitions use the
//! familiar `#pop` / `#push` notation and nothing is validated yet. Definitions are what
//! YAML/JSON grammar files deserialize into and what [`GrammarBuilder`] assembles; they
//! become an executable table only through [`Grammar::compile`].
//!
//! [`GrammarBuilder`]: super::GrammarBuilder
//! [`Grammar::compile`]: super::Grammar::compile

use crate::token::TokenType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_ROOT: &str = "root";

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_fallback() -> TokenType {
    TokenType::Error
}

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A complete, uncompiled grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarDef {
    pub name: String,
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub flags: PatternFlags,
    /// Token type for characters no rule matches.
    #[serde(default = "default_fallback")]
    pub fallback: TokenType,
    /// Whether an unmatched newline resets the stack to the root state.
    #[serde(default = "default_true")]
    pub reset_on_newline: bool,
    pub states: BTreeMap<String, Vec<RuleDef>>,
}

impl GrammarDef {
    pub fn new(name: impl Into<String>) -> Self {
        GrammarDef {
            name: name.into(),
            root: default_root(),
            flags: PatternFlags::default(),
            fallback: default_fallback(),
            reset_on_newline: true,
            states: BTreeMap::new(),
        }
    }

    /// Derive a grammar from `parent`.
    ///
    /// Every `inherit` entry in one of our states is replaced by the parent's rules for
    /// the state of the same name; parent states we do not define are copied as is.
    /// Names inside the spliced rules resolve against the derived grammar.
    pub fn inherit_from(&self, parent: &GrammarDef) -> GrammarDef {
        let mut states = BTreeMap::new();
        for (name, rules) in &self.states {
            let mut spliced = Vec::with_capacity(rules.len());
            for rule in rules {
                if rule.inherit {
                    if let Some(inherited) = parent.states.get(name) {
                        spliced.extend(inherited.iter().cloned());
                    }
                } else {
                    spliced.push(rule.clone());
                }
            }
            states.insert(name.clone(), spliced);
        }
        for (name, rules) in &parent.states {
            states
                .entry(name.clone())
                .or_insert_with(|| rules.clone());
        }
        GrammarDef {
            states,
            ..self.clone()
        }
    }
}

/// Regex flags applied to every pattern of a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternFlags {
    /// `^` and `$` match at line boundaries
    pub multi_line: bool,
    pub case_insensitive: bool,
    /// `.` also matches `\n`
    pub dot_matches_new_line: bool,
}

impl Default for PatternFlags {
    fn default() -> Self {
        PatternFlags {
            multi_line: true,
            case_insensitive: false,
            dot_matches_new_line: false,
        }
    }
}

/// One entry of a state's rule list.
///
/// Exactly one shape is valid per entry:
/// - a matching rule: `match` (or `words`) plus one of `token` / `groups` / `using`,
///   optionally with `next`
/// - `include: <state>`
/// - `inherit: true`
/// - `default: <transition>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Option<GroupDef>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using: Option<DelegateDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<TransitionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inherit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<TransitionDef>,
}

impl RuleDef {
    /// Emit the whole match as one token.
    pub fn token(pattern: impl Into<String>, kind: TokenType) -> Self {
        RuleDef {
            pattern: Some(pattern.into()),
            token: Some(kind),
            ..Default::default()
        }
    }

    /// Emit each capture group as its own token; `None` entries emit nothing.
    pub fn groups(pattern: impl Into<String>, kinds: &[Option<TokenType>]) -> Self {
        let groups = kinds.iter().map(|kind| kind.map(GroupDef::Token)).collect();
        Self::group_actions(pattern, groups)
    }

    /// Like [`RuleDef::groups`] but entries may also delegate.
    pub fn group_actions(pattern: impl Into<String>, groups: Vec<Option<GroupDef>>) -> Self {
        RuleDef {
            pattern: Some(pattern.into()),
            groups: Some(groups),
            ..Default::default()
        }
    }

    /// Lex the whole match with another grammar (or this one) starting in `state`.
    pub fn using(pattern: impl Into<String>, delegate: DelegateDef) -> Self {
        RuleDef {
            pattern: Some(pattern.into()),
            using: Some(delegate),
            ..Default::default()
        }
    }

    /// Match any of `words`, wrapped in `prefix` / `suffix` (e.g. `\b`).
    pub fn words<S: AsRef<str>>(words: &[S], prefix: &str, suffix: &str, kind: TokenType) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RuleDef {
            words: Some(words.iter().map(|w| w.as_ref().to_string()).collect()),
            prefix: non_empty(prefix),
            suffix: non_empty(suffix),
            token: Some(kind),
            ..Default::default()
        }
    }

    pub fn include(state: impl Into<String>) -> Self {
        RuleDef {
            include: Some(state.into()),
            ..Default::default()
        }
    }

    pub fn inherit() -> Self {
        RuleDef {
            inherit: true,
            ..Default::default()
        }
    }

    /// Zero-width transition taken when no rule of the state matches.
    pub fn default_to(next: impl Into<TransitionDef>) -> Self {
        RuleDef {
            default: Some(next.into()),
            ..Default::default()
        }
    }

    /// Set the transition applied after this rule matches.
    pub fn then(mut self, next: impl Into<TransitionDef>) -> Self {
        self.next = Some(next.into());
        self
    }
}

/// Per-group action inside a `groups` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupDef {
    Token(TokenType),
    Using { using: DelegateDef },
}

impl From<TokenType> for GroupDef {
    fn from(kind: TokenType) -> Self {
        GroupDef::Token(kind)
    }
}

impl From<DelegateDef> for GroupDef {
    fn from(using: DelegateDef) -> Self {
        GroupDef::Using { using }
    }
}

/// Target of a delegated sub-lexing. No grammar name means the grammar being defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegateDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar: Option<String>,
    #[serde(default = "default_root")]
    pub state: String,
}

impl DelegateDef {
    /// Delegate to a state of the grammar being defined.
    pub fn this(state: impl Into<String>) -> Self {
        DelegateDef {
            grammar: None,
            state: state.into(),
        }
    }

    /// Delegate to a state of a grammar from the catalog.
    pub fn grammar(name: impl Into<String>, state: impl Into<String>) -> Self {
        DelegateDef {
            grammar: Some(name.into()),
            state: state.into(),
        }
    }
}

/// Transition notation: a state name (push), `#pop`, `#pop:N`, `#push`, or a list of
/// those applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransitionDef {
    One(String),
    Many(Vec<String>),
}

impl TransitionDef {
    pub fn pop(count: usize) -> Self {
        if count == 1 {
            TransitionDef::One("#pop".to_string())
        } else {
            TransitionDef::One(format!("#pop:{}", count))
        }
    }

    pub fn push(state: impl Into<String>) -> Self {
        TransitionDef::One(state.into())
    }
}

impl From<&str> for TransitionDef {
    fn from(value: &str) -> Self {
        TransitionDef::One(value.to_string())
    }
}

impl From<String> for TransitionDef {
    fn from(value: String) -> Self {
        TransitionDef::One(value)
    }
}

impl From<Vec<&str>> for TransitionDef {
    fn from(values: Vec<&str>) -> Self {
        TransitionDef::Many(values.into_iter().map(str::to_string).collect())
    }
}
