//! Definition to table compilation
//!
//! Compilation runs in two passes. The first compiles every state's own entries in
//! isolation (patterns, actions, transitions) and leaves includes as references. The
//! second flattens includes depth-first with memoisation, so every pattern is compiled
//! once no matter how many states include it, and reports include cycles.

use super::definition::{DelegateDef, GrammarDef, GroupDef, RuleDef, TransitionDef};
use super::pattern::{self, Pattern};
use super::{
    Action, Catalog, Delegate, DelegateTarget, Grammar, GroupAction, Rule, StackOp, State,
    StateId, Transition,
};
use crate::error::GrammarError;
use std::collections::HashMap;
use tracing::debug;

enum Entry {
    Rule(Rule),
    Include(StateId),
}

struct CompiledState {
    entries: Vec<Entry>,
    default: Option<Transition>,
}

type Flattened = (Vec<Rule>, Option<Transition>);

/// The valid shapes of a [`RuleDef`].
enum Shape<'d> {
    Match,
    Include(&'d str),
    Inherit,
    Default(&'d TransitionDef),
}

pub(super) fn compile(def: &GrammarDef, catalog: &Catalog) -> Result<Grammar, GrammarError> {
    let names: Vec<&String> = def.states.keys().collect();
    let lookup: HashMap<String, StateId> = names
        .iter()
        .enumerate()
        .map(|(i, name)| ((*name).clone(), StateId(i)))
        .collect();
    let root = *lookup
        .get(&def.root)
        .ok_or_else(|| GrammarError::MissingRoot {
            root: def.root.clone(),
        })?;

    let compiler = Compiler {
        def,
        catalog,
        lookup: &lookup,
    };
    let compiled = def
        .states
        .iter()
        .map(|(name, rules)| compiler.compile_state(name, rules))
        .collect::<Result<Vec<_>, _>>()?;

    let mut flattener = Flattener {
        compiled: &compiled,
        names: &names,
        done: vec![None; names.len()],
        visiting: vec![false; names.len()],
    };
    let mut states = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        let (rules, default) = flattener.flatten(StateId(i))?;
        states.push(State {
            name: (*name).clone(),
            rules,
            default,
        });
    }

    debug!(
        grammar = %def.name,
        states = states.len(),
        rules = states.iter().map(|s| s.rules.len()).sum::<usize>(),
        "compiled grammar"
    );

    Ok(Grammar {
        name: def.name.clone(),
        states,
        lookup,
        root,
        fallback: def.fallback,
        reset_on_newline: def.reset_on_newline,
    })
}

struct Compiler<'a> {
    def: &'a GrammarDef,
    catalog: &'a Catalog,
    lookup: &'a HashMap<String, StateId>,
}

impl Compiler<'_> {
    fn compile_state(&self, state: &str, rules: &[RuleDef]) -> Result<CompiledState, GrammarError> {
        let mut entries = Vec::with_capacity(rules.len());
        let mut default = None;

        for (index, rule) in rules.iter().enumerate() {
            let shape = shape(rule).map_err(|reason| GrammarError::MalformedRule {
                state: state.to_string(),
                index,
                reason,
            })?;
            match shape {
                Shape::Include(target) => {
                    entries.push(Entry::Include(self.resolve_state(state, target)?));
                }
                // Inherit markers are spliced by `GrammarDef::inherit_from`; one left over
                // has no parent to draw from.
                Shape::Inherit => {}
                Shape::Default(next) => {
                    // Later defaults are unreachable, the first one always applies.
                    if default.is_none() {
                        default = Some(self.transition(state, Some(next))?);
                    }
                }
                Shape::Match => entries.push(Entry::Rule(self.compile_rule(state, index, rule)?)),
            }
        }

        Ok(CompiledState { entries, default })
    }

    fn compile_rule(&self, state: &str, index: usize, rule: &RuleDef) -> Result<Rule, GrammarError> {
        let malformed = |reason: &str| GrammarError::MalformedRule {
            state: state.to_string(),
            index,
            reason: reason.to_string(),
        };
        let source = match (&rule.pattern, &rule.words) {
            (Some(source), None) => source.clone(),
            (None, Some(words)) if words.is_empty() => return Err(malformed("empty word list")),
            (None, Some(words)) => pattern::words(
                words,
                rule.prefix.as_deref().unwrap_or(""),
                rule.suffix.as_deref().unwrap_or(""),
            ),
            _ => return Err(malformed("needs exactly one of match or words")),
        };
        let pattern =
            Pattern::new(&source, self.def.flags).map_err(|message| GrammarError::InvalidPattern {
                state: state.to_string(),
                pattern: source.clone(),
                message,
            })?;

        let action = if let Some(kind) = rule.token {
            Action::Emit(kind)
        } else if let Some(groups) = &rule.groups {
            if groups.len() != pattern.group_count() {
                return Err(GrammarError::GroupMismatch {
                    state: state.to_string(),
                    pattern: source,
                    groups: pattern.group_count(),
                    actions: groups.len(),
                });
            }
            let actions = groups
                .iter()
                .map(|group| match group {
                    None => Ok(GroupAction::Skip),
                    Some(GroupDef::Token(kind)) => Ok(GroupAction::Emit(*kind)),
                    Some(GroupDef::Using { using }) => {
                        self.delegate(state, using).map(GroupAction::Delegate)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Action::EmitGroups(actions)
        } else if let Some(using) = &rule.using {
            Action::Delegate(self.delegate(state, using)?)
        } else {
            return Err(malformed("needs exactly one of token, groups or using"));
        };

        Ok(Rule {
            pattern,
            action,
            transition: self.transition(state, rule.next.as_ref())?,
        })
    }

    fn resolve_state(&self, state: &str, reference: &str) -> Result<StateId, GrammarError> {
        self.lookup
            .get(reference)
            .copied()
            .ok_or_else(|| GrammarError::UnknownState {
                state: state.to_string(),
                reference: reference.to_string(),
            })
    }

    fn delegate(&self, state: &str, using: &DelegateDef) -> Result<Delegate, GrammarError> {
        match &using.grammar {
            Some(name) if name != &self.def.name || self.catalog.get(name).is_some() => {
                let grammar =
                    self.catalog
                        .get(name)
                        .ok_or_else(|| GrammarError::UnknownGrammar {
                            name: name.clone(),
                        })?;
                let target = grammar.state_id(&using.state).ok_or_else(|| {
                    GrammarError::UnknownState {
                        state: state.to_string(),
                        reference: format!("{}:{}", name, using.state),
                    }
                })?;
                Ok(Delegate {
                    target: DelegateTarget::Grammar(grammar.clone()),
                    state: target,
                })
            }
            _ => Ok(Delegate {
                target: DelegateTarget::This,
                state: self.resolve_state(state, &using.state)?,
            }),
        }
    }

    fn transition(&self, state: &str, next: Option<&TransitionDef>) -> Result<Transition, GrammarError> {
        let ops = match next {
            None => return Ok(Transition::Stay),
            Some(TransitionDef::One(value)) => vec![self.stack_op(state, value)?],
            Some(TransitionDef::Many(values)) => values
                .iter()
                .map(|value| self.stack_op(state, value))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let transition = match ops.as_slice() {
            [] => Transition::Stay,
            [StackOp::Pop(count)] => Transition::Pop(*count),
            [StackOp::Duplicate] => Transition::Duplicate,
            _ if ops.iter().all(|op| matches!(op, StackOp::Push(_))) => Transition::Push(
                ops.iter()
                    .filter_map(|op| match op {
                        StackOp::Push(id) => Some(*id),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Transition::Sequence(ops),
        };
        Ok(transition)
    }

    fn stack_op(&self, state: &str, value: &str) -> Result<StackOp, GrammarError> {
        let invalid = || GrammarError::InvalidTransition {
            state: state.to_string(),
            value: value.to_string(),
        };
        match value {
            "#pop" => Ok(StackOp::Pop(1)),
            "#push" => Ok(StackOp::Duplicate),
            _ => {
                if let Some(count) = value.strip_prefix("#pop:") {
                    count.parse().map(StackOp::Pop).map_err(|_| invalid())
                } else if value.starts_with('#') {
                    Err(invalid())
                } else {
                    self.resolve_state(state, value).map(StackOp::Push)
                }
            }
        }
    }
}

fn shape(rule: &RuleDef) -> Result<Shape<'_>, String> {
    let is_match = rule.pattern.is_some() || rule.words.is_some();
    let kinds = [
        is_match,
        rule.include.is_some(),
        rule.inherit,
        rule.default.is_some(),
    ];
    match kinds.iter().filter(|k| **k).count() {
        0 => return Err("needs one of match, words, include, inherit or default".to_string()),
        1 => {}
        _ => return Err("combines match/words, include, inherit and default".to_string()),
    }

    let actions = [
        rule.token.is_some(),
        rule.groups.is_some(),
        rule.using.is_some(),
    ]
    .iter()
    .filter(|a| **a)
    .count();
    let has_match_fields = actions > 0
        || rule.next.is_some()
        || rule.prefix.is_some()
        || rule.suffix.is_some();

    if !is_match {
        if has_match_fields {
            return Err("include, inherit and default entries take no other fields".to_string());
        }
        if let Some(state) = &rule.include {
            return Ok(Shape::Include(state));
        }
        if let Some(next) = &rule.default {
            return Ok(Shape::Default(next));
        }
        return Ok(Shape::Inherit);
    }

    if rule.pattern.is_some() && rule.words.is_some() {
        return Err("has both match and words".to_string());
    }
    if rule.words.is_none() && (rule.prefix.is_some() || rule.suffix.is_some()) {
        return Err("prefix and suffix only apply to words".to_string());
    }
    if actions != 1 {
        return Err("needs exactly one of token, groups or using".to_string());
    }
    Ok(Shape::Match)
}

struct Flattener<'a> {
    compiled: &'a [CompiledState],
    names: &'a [&'a String],
    done: Vec<Option<Flattened>>,
    visiting: Vec<bool>,
}

impl Flattener<'_> {
    fn flatten(&mut self, id: StateId) -> Result<Flattened, GrammarError> {
        if let Some(done) = &self.done[id.0] {
            return Ok(done.clone());
        }
        if self.visiting[id.0] {
            return Err(GrammarError::IncludeCycle {
                state: self.names[id.0].clone(),
            });
        }
        self.visiting[id.0] = true;

        let compiled = self.compiled;
        let state = &compiled[id.0];
        let mut rules = Vec::new();
        let mut default = state.default.clone();
        for entry in &state.entries {
            match entry {
                Entry::Rule(rule) => rules.push(rule.clone()),
                Entry::Include(target) => {
                    let (included, included_default) = self.flatten(*target)?;
                    rules.extend(included);
                    if default.is_none() {
                        default = included_default;
                    }
                }
            }
        }

        self.visiting[id.0] = false;
        self.done[id.0] = Some((rules.clone(), default.clone()));
        Ok((rules, default))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GrammarError;
    use crate::grammar::*;
    use crate::token::TokenType;
    use std::sync::Arc;

    fn single_state(rules: Vec<RuleDef>) -> Result<Grammar, GrammarError> {
        GrammarBuilder::new("test").state("root", rules).build()
    }

    #[test]
    fn test_missing_root_is_reported() {
        let err = GrammarBuilder::new("test")
            .state("main", vec![RuleDef::token("a", TokenType::Name)])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GrammarError::MissingRoot {
                root: "root".into()
            }
        );
    }

    #[test]
    fn test_unknown_push_target_is_reported() {
        let err = single_state(vec![RuleDef::token("a", TokenType::Name).then("nowhere")])
            .unwrap_err();
        assert_eq!(
            err,
            GrammarError::UnknownState {
                state: "root".into(),
                reference: "nowhere".into()
            }
        );
    }

    #[test]
    fn test_unknown_include_is_reported() {
        let err = single_state(vec![RuleDef::include("basic")]).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownState { reference, .. } if reference == "basic"));
    }

    #[test]
    fn test_include_cycle_is_reported() {
        let err = GrammarBuilder::new("test")
            .state("root", vec![RuleDef::include("a")])
            .state("a", vec![RuleDef::include("b")])
            .state("b", vec![RuleDef::include("a")])
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::IncludeCycle { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = single_state(vec![RuleDef::token("(unclosed", TokenType::Name)]).unwrap_err();
        assert!(
            matches!(err, GrammarError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed")
        );
    }

    #[test]
    fn test_group_count_must_match_group_actions() {
        let err = single_state(vec![RuleDef::groups(
            r"(\w+)(=)",
            &[Some(TokenType::NameVariable)],
        )])
        .unwrap_err();
        assert_eq!(
            err,
            GrammarError::GroupMismatch {
                state: "root".into(),
                pattern: r"(\w+)(=)".into(),
                groups: 2,
                actions: 1
            }
        );
    }

    #[test]
    fn test_rule_without_action_is_malformed() {
        let rule = RuleDef {
            pattern: Some("a".into()),
            ..Default::default()
        };
        let err = single_state(vec![rule]).unwrap_err();
        assert!(matches!(err, GrammarError::MalformedRule { index: 0, .. }));
    }

    #[test]
    fn test_include_with_extra_fields_is_malformed() {
        let mut rule = RuleDef::include("root");
        rule.token = Some(TokenType::Name);
        let err = single_state(vec![rule]).unwrap_err();
        assert!(matches!(err, GrammarError::MalformedRule { .. }));
    }

    #[test]
    fn test_bad_pop_count_is_invalid_transition() {
        let err = single_state(vec![RuleDef::token("a", TokenType::Name).then("#pop:x")])
            .unwrap_err();
        assert_eq!(
            err,
            GrammarError::InvalidTransition {
                state: "root".into(),
                value: "#pop:x".into()
            }
        );
    }

    #[test]
    fn test_transition_notation_compiles_to_stack_ops() {
        let grammar = GrammarBuilder::new("test")
            .state(
                "root",
                vec![
                    RuleDef::token("a", TokenType::Name).then("#pop:3"),
                    RuleDef::token("b", TokenType::Name).then("#push"),
                    RuleDef::token("c", TokenType::Name).then(vec!["x", "y"]),
                    RuleDef::token("d", TokenType::Name).then(vec!["#pop", "x"]),
                    RuleDef::token("e", TokenType::Name),
                ],
            )
            .state("x", vec![])
            .state("y", vec![])
            .build()
            .unwrap();
        let x = grammar.state_id("x").unwrap();
        let y = grammar.state_id("y").unwrap();
        let transitions: Vec<_> = grammar
            .state(grammar.root())
            .rules()
            .iter()
            .map(|r| r.transition().clone())
            .collect();
        assert_eq!(
            transitions,
            vec![
                Transition::Pop(3),
                Transition::Duplicate,
                Transition::Push(vec![x, y]),
                Transition::Sequence(vec![StackOp::Pop(1), StackOp::Push(x)]),
                Transition::Stay,
            ]
        );
    }

    #[test]
    fn test_default_is_inherited_through_include() {
        let grammar = GrammarBuilder::new("test")
            .state("root", vec![RuleDef::include("base")])
            .state("base", vec![RuleDef::default_to("#pop")])
            .state(
                "own",
                vec![RuleDef::default_to("#push"), RuleDef::include("base")],
            )
            .build()
            .unwrap();
        let root = grammar.state(grammar.root());
        assert_eq!(root.default_transition(), Some(&Transition::Pop(1)));
        let own = grammar.state(grammar.state_id("own").unwrap());
        assert_eq!(own.default_transition(), Some(&Transition::Duplicate));
    }

    #[test]
    fn test_delegation_resolves_through_catalog() {
        let inner = Arc::new(
            GrammarBuilder::new("inner")
                .state("root", vec![RuleDef::token(r"\d+", TokenType::Number)])
                .build()
                .unwrap(),
        );
        let catalog = Catalog::new().with(inner);
        let outer = GrammarBuilder::new("outer")
            .state(
                "root",
                vec![RuleDef::using(r"\[\d+\]", DelegateDef::grammar("inner", "root"))],
            )
            .build_with(&catalog)
            .unwrap();
        let rule = &outer.state(outer.root()).rules()[0];
        assert!(matches!(
            rule.action(),
            Action::Delegate(Delegate {
                target: DelegateTarget::Grammar(g),
                ..
            }) if g.name() == "inner"
        ));

        let err = GrammarBuilder::new("outer")
            .state(
                "root",
                vec![RuleDef::using("x", DelegateDef::grammar("missing", "root"))],
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GrammarError::UnknownGrammar {
                name: "missing".into()
            }
        );
    }

    #[test]
    fn test_delegation_by_own_name_targets_this() {
        let grammar = GrammarBuilder::new("self")
            .state(
                "root",
                vec![RuleDef::using("x", DelegateDef::grammar("self", "root"))],
            )
            .build()
            .unwrap();
        let rule = &grammar.state(grammar.root()).rules()[0];
        assert!(matches!(
            rule.action(),
            Action::Delegate(Delegate {
                target: DelegateTarget::This,
                ..
            })
        ));
    }

    #[test]
    fn test_words_compile_to_alternation() {
        let grammar = single_state(vec![RuleDef::words(
            &["if", "fi"],
            r"\b",
            r"\b",
            TokenType::Keyword,
        )])
        .unwrap();
        let rule = &grammar.state(grammar.root()).rules()[0];
        assert_eq!(rule.pattern().as_str(), r"\b(?:fi|if)\b");

        let err = single_state(vec![RuleDef::words::<&str>(&[], "", "", TokenType::Keyword)])
            .unwrap_err();
        assert!(matches!(err, GrammarError::MalformedRule { ref reason, .. } if reason == "empty word list"));
    }
}
