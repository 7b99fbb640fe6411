use vela::lexing::TokenKind;

mod common;
use common::*;

fn kinds_and_texts(text: &str) -> Vec<(TokenKind, String)> {
    let (tokens, diagnostics) = lex(text);
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
    tokens
        .into_iter()
        .map(|token| (token.kind, token.text))
        .collect()
}

#[test]
fn math() {
    assert_eq!(
        kinds_and_texts("4 + 5"),
        vec![
            (TokenKind::Number, String::from("4")),
            (TokenKind::Symbol, String::from("+")),
            (TokenKind::Number, String::from("5")),
            (TokenKind::Eof, String::new()),
        ]
    );
}

#[test]
fn keywords_and_identifiers() {
    let tokens = kinds_and_texts("let mutable fn fnord");
    assert_eq!(tokens[0], (TokenKind::Keyword, String::from("let")));
    assert_eq!(tokens[1], (TokenKind::Identifier, String::from("mutable")));
    assert_eq!(tokens[2], (TokenKind::Keyword, String::from("fn")));
    assert_eq!(tokens[3], (TokenKind::Identifier, String::from("fnord")));
}

#[test]
fn comment_runs_to_end_of_line() {
    assert_eq!(
        kinds_and_texts("4 // if let 99\n5"),
        vec![
            (TokenKind::Number, String::from("4")),
            (TokenKind::Number, String::from("5")),
            (TokenKind::Eof, String::new()),
        ]
    );
}

#[test]
fn compound_symbols_win_over_prefixes() {
    let tokens = kinds_and_texts("== = => .. ..= -> && ||");
    let texts: Vec<&str> = tokens.iter().map(|(_, text)| text.as_str()).collect();
    assert_eq!(texts, vec!["==", "=", "=>", "..", "..=", "->", "&&", "||", ""]);
}

#[test]
fn string_escapes() {
    let tokens = kinds_and_texts(r#""a\nb" "say \"hi\"" "back\\slash""#);
    assert_eq!(tokens[0], (TokenKind::Str, String::from("a\nb")));
    assert_eq!(tokens[1], (TokenKind::Str, String::from("say \"hi\"")));
    assert_eq!(tokens[2], (TokenKind::Str, String::from("back\\slash")));
}

#[test]
fn token_positions() {
    let (tokens, _) = lex("let x\n  = 4");
    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
    assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    assert_eq!((tokens[3].line, tokens[3].column), (2, 5));
}

#[test]
fn unexpected_character() {
    let (_, diagnostics) = lex("4 $ 5");
    assert_has_message(&diagnostics, "Unexpected character '$' at 1:3");
}
