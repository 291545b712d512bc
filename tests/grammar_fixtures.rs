//! Grammars loaded from the YAML/JSON fixtures under `tests/fixtures/`.

use rstest::rstest;
use stacklex::grammar::{DelegateDef, GrammarBuilder, RuleDef};
use stacklex::loader::{Format, GrammarLoader};
use stacklex::testing::{assert_covers, mk_tokens, render};
use stacklex::{tokenize_all, Grammar, GrammarError, LoadError, TokenType};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn mini_shell() -> Grammar {
    GrammarLoader::new()
        .load_path(fixture("mini_shell.yaml"))
        .expect("fixture grammar to load")
}

#[test]
fn test_command_substitution() {
    let text = "x=$(ls) # list\n";
    let tokens = tokenize_all(text, &mini_shell()).unwrap();
    assert_covers(text, &tokens);
    insta::assert_snapshot!(render(&tokens), @r###"
    0..1 Name.Variable "x"
    1..2 Operator "="
    2..4 Keyword "$("
    4..6 Name.Builtin "ls"
    6..7 Keyword ")"
    7..8 Text " "
    8..14 Comment.Single "# list"
    14..15 Text "\n"
    "###);
}

#[rstest]
#[case("if", TokenType::Keyword)]
#[case("done", TokenType::Keyword)]
#[case("echo", TokenType::NameBuiltin)]
#[case("export", TokenType::NameBuiltin)]
#[case("$HOME", TokenType::NameVariable)]
#[case("iffy", TokenType::Text)]
fn test_single_word(#[case] word: &str, #[case] kind: TokenType) {
    let tokens = tokenize_all(word, &mini_shell()).unwrap();
    assert_eq!(tokens, mk_tokens(&[(kind, word)]));
}

#[test]
fn test_skipped_group_becomes_text() {
    let tokens = tokenize_all("a  =b", &mini_shell()).unwrap();
    assert_eq!(
        tokens,
        mk_tokens(&[
            (TokenType::NameVariable, "a"),
            (TokenType::Text, "  "),
            (TokenType::Operator, "="),
            (TokenType::Text, "b"),
        ])
    );
}

#[test]
fn test_unterminated_string_runs_to_end() {
    let text = "echo \"open\nstill\n";
    let tokens = tokenize_all(text, &mini_shell()).unwrap();
    assert_covers(text, &tokens);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenType::StringDouble));
}

#[test]
fn test_json_fixture_as_delegation_target() {
    let mut loader = GrammarLoader::new();
    let digits = loader
        .load_path_and_register(fixture("digits.json"))
        .expect("json fixture to load");
    assert_eq!(digits.name(), "digits");

    let outer = GrammarBuilder::new("list")
        .depends_on(digits)
        .state(
            "root",
            vec![
                RuleDef::groups(r"(\[)", &[Some(TokenType::Punctuation)]).then("items"),
                RuleDef::token(r"\s+", TokenType::Whitespace),
            ],
        )
        .state(
            "items",
            vec![
                RuleDef::token(r"\]", TokenType::Punctuation).then("#pop"),
                RuleDef::using(r"[^\]]+", DelegateDef::grammar("digits", "root")),
            ],
        )
        .build()
        .unwrap();

    let text = "[1,x2] ";
    let tokens = tokenize_all(text, &outer).unwrap();
    assert_eq!(
        tokens,
        mk_tokens(&[
            (TokenType::Punctuation, "["),
            (TokenType::Number, "1"),
            (TokenType::Punctuation, ","),
            // digits' own fallback type
            (TokenType::Text, "x"),
            (TokenType::Number, "2"),
            (TokenType::Punctuation, "]"),
            (TokenType::Whitespace, " "),
        ])
    );
}

#[test]
fn test_inherited_grammar_extends_parent() {
    let parent = GrammarLoader::new()
        .read_definition(fixture("mini_shell.yaml"))
        .unwrap();
    let child = GrammarBuilder::new("mini-shell-ext")
        .state(
            "basic",
            vec![
                RuleDef::words(&["alias", "unset"], r"\b", r"\b", TokenType::NameBuiltin),
                RuleDef::inherit(),
            ],
        )
        .inherit_from(&parent)
        .build()
        .unwrap();

    let tokens = tokenize_all("unset x", &child).unwrap();
    assert_eq!(tokens[0], stacklex::Token::new(0, TokenType::NameBuiltin, "unset"));
    // parent's rules still apply after the inherited splice
    let tokens = tokenize_all("echo $x", &child).unwrap();
    assert_eq!(tokens[0].kind, TokenType::NameBuiltin);
    assert_eq!(tokens[2].kind, TokenType::NameVariable);
}

#[test]
fn test_yaml_defects_are_reported() {
    let loader = GrammarLoader::new();
    let cycle = "name: c\nstates:\n  root:\n    - include: a\n  a:\n    - include: root\n";
    assert!(matches!(
        loader.load(cycle, Format::Yaml),
        Err(LoadError::Grammar(GrammarError::IncludeCycle { .. }))
    ));

    let bad_pattern = "name: p\nstates:\n  root:\n    - { match: '(', token: Text }\n";
    assert!(matches!(
        loader.load(bad_pattern, Format::Yaml),
        Err(LoadError::Grammar(GrammarError::InvalidPattern { .. }))
    ));

    let groups = "name: g\nstates:\n  root:\n    - { match: '(a)(b)', groups: [Name] }\n";
    assert!(matches!(
        loader.load(groups, Format::Yaml),
        Err(LoadError::Grammar(GrammarError::GroupMismatch { groups: 2, actions: 1, .. }))
    ));

    let missing_root = "name: r\nroot: main\nstates:\n  other: []\n";
    assert!(matches!(
        loader.load(missing_root, Format::Yaml),
        Err(LoadError::Grammar(GrammarError::MissingRoot { .. }))
    ));
}
