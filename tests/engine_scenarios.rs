//! End-to-end behaviour of the lexing engine on small hand-built grammars.

use rstest::rstest;
use stacklex::grammar::{GrammarBuilder, RuleDef};
use stacklex::testing::{assert_covers, mk_tokens};
use stacklex::{tokenize, tokenize_all, tokenize_from, Grammar, LexError, Token, TokenType};
use std::sync::Arc;
use std::thread;

fn words_grammar() -> Grammar {
    GrammarBuilder::new("words")
        .state(
            "root",
            vec![
                RuleDef::token(r"\w+", TokenType::Name),
                RuleDef::token(r"\s+", TokenType::Text),
            ],
        )
        .build()
        .expect("grammar to compile")
}

fn paren_grammar() -> Grammar {
    GrammarBuilder::new("parens")
        .state(
            "root",
            vec![
                RuleDef::token(r"\(", TokenType::Punctuation).then("paren"),
                RuleDef::token(r"\w+", TokenType::Name),
                RuleDef::token(r"\s+", TokenType::Text),
            ],
        )
        .state(
            "paren",
            vec![
                RuleDef::token(r"\)", TokenType::Punctuation).then("#pop"),
                RuleDef::include("root"),
            ],
        )
        .build()
        .expect("grammar to compile")
}

#[test]
fn test_words_and_spaces() {
    let tokens = tokenize_all("foo bar", &words_grammar()).unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::new(0, TokenType::Name, "foo"),
            Token::new(3, TokenType::Text, " "),
            Token::new(4, TokenType::Name, "bar"),
        ]
    );
}

#[rstest]
#[case("", &[])]
#[case("a", &[(TokenType::Name, "a")])]
#[case("a-b", &[(TokenType::Name, "a"), (TokenType::Error, "-"), (TokenType::Name, "b")])]
#[case("\t\n", &[(TokenType::Text, "\t\n")])]
#[case("€€", &[(TokenType::Error, "€"), (TokenType::Error, "€")])]
fn test_fallback_keeps_every_byte(#[case] input: &str, #[case] expected: &[(TokenType, &str)]) {
    let tokens = tokenize_all(input, &words_grammar()).unwrap();
    assert_covers(input, &tokens);
    assert_eq!(tokens, mk_tokens(expected));
}

#[test]
fn test_push_and_pop_return_to_root() {
    let grammar = paren_grammar();
    let mut stream = tokenize("(a)", &grammar);
    let tokens: Vec<_> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        tokens,
        mk_tokens(&[
            (TokenType::Punctuation, "("),
            (TokenType::Name, "a"),
            (TokenType::Punctuation, ")"),
        ])
    );
    assert_eq!(stream.position(), 3);
    assert_eq!(stream.stack().depth(), 1);
    assert_eq!(stream.stack().top(), grammar.root());
}

#[test]
fn test_nested_parens_track_depth() {
    let grammar = paren_grammar();
    let mut stream = tokenize("((a) b", &grammar);
    let tokens: Vec<_> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    assert_covers("((a) b", &tokens);
    assert_eq!(stream.stack().depth(), 2);
}

#[test]
fn test_emit_groups() {
    let grammar = GrammarBuilder::new("assign")
        .state(
            "root",
            vec![RuleDef::groups(
                r"(\w+)(=)",
                &[Some(TokenType::NameVariable), Some(TokenType::Operator)],
            )],
        )
        .build()
        .unwrap();
    assert_eq!(
        tokenize_all("x=", &grammar).unwrap(),
        vec![
            Token::new(0, TokenType::NameVariable, "x"),
            Token::new(1, TokenType::Operator, "="),
        ]
    );
}

#[test]
fn test_default_into_state_without_match_falls_back() {
    let grammar = GrammarBuilder::new("defaults")
        .state(
            "root",
            vec![
                RuleDef::token("a", TokenType::Name),
                RuleDef::default_to("b"),
            ],
        )
        .state("b", vec![RuleDef::token("x", TokenType::Keyword)])
        .build()
        .unwrap();

    let mut stream = tokenize("zx", &grammar);
    let tokens: Vec<_> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        tokens,
        mk_tokens(&[(TokenType::Error, "z"), (TokenType::Keyword, "x")])
    );
    assert_eq!(stream.stack().depth(), 2);
}

#[test]
fn test_popping_past_root_keeps_root() {
    let grammar = GrammarBuilder::new("floor")
        .state(
            "root",
            vec![
                RuleDef::token(r"\)", TokenType::Punctuation).then("#pop:3"),
                RuleDef::token(r"\w", TokenType::Name),
            ],
        )
        .build()
        .unwrap();
    let mut stream = tokenize("))a)b", &grammar);
    let tokens: Vec<_> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenType::Punctuation,
            TokenType::Punctuation,
            TokenType::Name,
            TokenType::Punctuation,
            TokenType::Name,
        ]
    );
    assert_eq!(stream.stack().depth(), 1);
}

#[test]
fn test_start_in_named_state() {
    let grammar = paren_grammar();
    let paren = grammar.state_id("paren").unwrap();
    let mut stream = tokenize_from("a)b", &grammar, paren);
    let tokens: Vec<_> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(tokens[1], Token::new(1, TokenType::Punctuation, ")"));
    assert_eq!(stream.stack().depth(), 1);
}

#[test]
fn test_multi_level_push_and_sequence() {
    let grammar = GrammarBuilder::new("seq")
        .state(
            "root",
            vec![
                RuleDef::token("<", TokenType::Punctuation).then(vec!["outer", "inner"]),
                RuleDef::token(r"\w", TokenType::Name),
            ],
        )
        .state(
            "outer",
            vec![
                RuleDef::token(">", TokenType::Punctuation).then("#pop"),
                RuleDef::token(r"\w", TokenType::NameLabel),
            ],
        )
        .state(
            "inner",
            vec![
                RuleDef::token(r"\|", TokenType::Operator).then(vec!["#pop", "#push"]),
                RuleDef::token(";", TokenType::Punctuation).then("#pop"),
                RuleDef::token(r"\w", TokenType::NameConstant),
            ],
        )
        .build()
        .unwrap();

    let tokens = tokenize_all("<a|b;c>d", &grammar).unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenType::Punctuation,
            TokenType::NameConstant,
            TokenType::Operator,
            // `#pop` then `#push` duplicates `outer`
            TokenType::NameLabel,
            TokenType::Error,
            TokenType::NameLabel,
            TokenType::Punctuation,
            TokenType::NameLabel,
        ]
    );
}

#[test]
fn test_no_progress_is_reported_not_looped() {
    let grammar = GrammarBuilder::new("loop")
        .state("root", vec![RuleDef::default_to("a")])
        .state("a", vec![RuleDef::default_to("#pop")])
        .build()
        .unwrap();
    let mut stream = tokenize("x", &grammar);
    assert!(matches!(
        stream.next(),
        Some(Err(LexError::NoProgress { .. }))
    ));
    assert!(stream.next().is_none());
}

#[test]
fn test_one_grammar_lexes_on_many_threads() {
    fn shared<T: Send + Sync>() {}
    shared::<Grammar>();

    let grammar = Arc::new(paren_grammar());
    let text = "(a (b c)) d ((e)";
    let expected: Vec<(usize, TokenType)> = tokenize_all(text, &grammar)
        .unwrap()
        .iter()
        .map(|t| (t.start, t.kind))
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let grammar = Arc::clone(&grammar);
            thread::spawn(move || {
                tokenize_all(text, &grammar)
                    .unwrap()
                    .iter()
                    .map(|t| (t.start, t.kind))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
