#![allow(dead_code)]

use vela::diagnostic::{Diagnostic, Diagnostics};
use vela::lexing::{Lexer, Token};
use vela::parsing::{Item, Parser};
use vela::source;
use vela::type_checker::TypeChecker;

pub type TestResult = std::result::Result<(), String>;

pub fn lex(text: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let source = source::text("<test>", text);
    let mut diagnostics = Diagnostics::new();
    let tokens = Lexer::new(&source)
        .lex(&mut diagnostics)
        .unwrap_or_default();
    (tokens, diagnostics.into_items())
}

pub fn parse(text: &str) -> (Vec<Item>, Vec<Diagnostic>) {
    let source = source::text("<test>", text);
    let mut diagnostics = Diagnostics::new();
    let tokens = match Lexer::new(&source).lex(&mut diagnostics) {
        Ok(tokens) => tokens,
        Err(_) => return (Vec::new(), diagnostics.into_items()),
    };
    let items = Parser::new(&source, &tokens, &mut diagnostics)
        .parse()
        .map(|module| module.items)
        .unwrap_or_default();
    (items, diagnostics.into_items())
}

/// Lexes, parses, and type checks a program; panics on syntax failures so
/// checker tests only ever see checker diagnostics.
pub fn check(text: &str) -> (bool, Vec<Diagnostic>) {
    let (items, parse_diagnostics) = parse(text);
    assert!(
        parse_diagnostics.is_empty(),
        "program failed to parse: {:?}",
        parse_diagnostics
    );
    let mut diagnostics = Diagnostics::new();
    let success = TypeChecker::check(&items, &mut diagnostics);
    (success, diagnostics.into_items())
}

pub fn assert_checks(text: &str) {
    let (success, diagnostics) = check(text);
    assert!(success, "expected success, got: {:?}", diagnostics);
    assert!(
        diagnostics.iter().all(Diagnostic::is_warning),
        "unexpected errors: {:?}",
        diagnostics
    );
}

pub fn assert_check_error(text: &str, expected: &str) {
    let (success, diagnostics) = check(text);
    assert!(!success, "expected failure containing '{}'", expected);
    assert_has_message(&diagnostics, expected);
}

pub fn assert_check_warning(text: &str, expected: &str) {
    let (success, diagnostics) = check(text);
    assert!(success, "expected success, got: {:?}", diagnostics);
    assert_has_message(&diagnostics, expected);
}

pub fn assert_has_message(diagnostics: &[Diagnostic], expected: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|diagnostic| diagnostic.message.contains(expected)),
        "no diagnostic containing '{}' in {:?}",
        expected,
        diagnostics
    );
}
