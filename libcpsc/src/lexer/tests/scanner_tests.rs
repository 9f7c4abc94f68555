// Copyright 2025 Neil Henderson, Blue Tarp Media.

use crate::compiler_driver::{Driver, ErrorKind};
use crate::core::SourceLocation;

use super::super::tokens::{Keyword, TokenType};

fn lex_types(source: &str) -> Vec<TokenType> {
    let mut driver = Driver::for_testing();
    let tokens = crate::lexer::lex(&mut driver, source);
    assert!(!driver.has_error_diagnostics(), "unexpected diagnostics: {:?}", driver.diagnostics());
    tokens.into_iter().map(|t| t.token_type).collect()
}

#[test]
fn punctuation_and_operators() {
    let tokens = lex_types("( ) { } [ ] ; : , . + - * / % = ! < > ?");

    assert_eq!(
        tokens,
        vec![
            TokenType::OpenParen,
            TokenType::CloseParen,
            TokenType::OpenBrace,
            TokenType::CloseBrace,
            TokenType::OpenSqBracket,
            TokenType::CloseSqBracket,
            TokenType::Semicolon,
            TokenType::Colon,
            TokenType::Comma,
            TokenType::Dot,
            TokenType::Plus,
            TokenType::Minus,
            TokenType::Multiply,
            TokenType::Divide,
            TokenType::Remainder,
            TokenType::Assignment,
            TokenType::LogicalNot,
            TokenType::LessThan,
            TokenType::GreaterThan,
            TokenType::Ternary,
        ]
    );
}

#[test]
fn two_character_operators() {
    let tokens = lex_types("== != <= >= && ||");

    assert_eq!(
        tokens,
        vec![
            TokenType::EqualTo,
            TokenType::NotEqualTo,
            TokenType::LessThanOrEqualTo,
            TokenType::GreaterThanOrEqualTo,
            TokenType::LogicalAnd,
            TokenType::LogicalOr,
        ]
    );
}

#[test]
fn adjacent_operators_split_correctly() {
    // '===' must lex as '==' then '='; '!==' as '!=' then '='.
    let tokens = lex_types("a===b");
    assert_eq!(
        tokens,
        vec![
            TokenType::Identifier("a".to_string()),
            TokenType::EqualTo,
            TokenType::Assignment,
            TokenType::Identifier("b".to_string()),
        ]
    );
}

#[test]
fn keywords_and_identifiers() {
    let tokens = lex_types("let x while whilex foreach in integer");

    assert_eq!(
        tokens,
        vec![
            TokenType::Keyword(Keyword::Let),
            TokenType::Identifier("x".to_string()),
            TokenType::Keyword(Keyword::While),
            TokenType::Identifier("whilex".to_string()),
            TokenType::Keyword(Keyword::Foreach),
            TokenType::Keyword(Keyword::In),
            TokenType::Keyword(Keyword::Integer),
        ]
    );
}

#[test]
fn numeric_literals() {
    let tokens = lex_types("0 42 3.14 10.0");

    assert_eq!(
        tokens,
        vec![
            TokenType::IntegerLiteral { literal: "0".to_string(), value: 0 },
            TokenType::IntegerLiteral { literal: "42".to_string(), value: 42 },
            TokenType::FloatLiteral { literal: "3.14".to_string() },
            TokenType::FloatLiteral { literal: "10.0".to_string() },
        ]
    );
}

#[test]
fn member_access_is_not_a_float() {
    // A dot not followed by a digit stays a Dot token, so `a.b` and `1 .x` lex as members.
    let tokens = lex_types("p.x");
    assert_eq!(
        tokens,
        vec![
            TokenType::Identifier("p".to_string()),
            TokenType::Dot,
            TokenType::Identifier("x".to_string()),
        ]
    );
}

#[test]
fn string_literals_keep_quotes_and_escapes() {
    let tokens = lex_types(r#"print("hola\n");"#);

    assert_eq!(
        tokens,
        vec![
            TokenType::Keyword(Keyword::Print),
            TokenType::OpenParen,
            TokenType::StringLiteral { literal: r#""hola\n""#.to_string() },
            TokenType::CloseParen,
            TokenType::Semicolon,
        ]
    );
}

#[test]
fn comments_are_skipped() {
    let tokens = lex_types("1 // line comment\n/* block\ncomment */ 2");

    assert_eq!(
        tokens,
        vec![
            TokenType::IntegerLiteral { literal: "1".to_string(), value: 1 },
            TokenType::IntegerLiteral { literal: "2".to_string(), value: 2 },
        ]
    );
}

#[test]
fn locations_are_one_based() {
    let mut driver = Driver::for_testing();
    let tokens = crate::lexer::lex(&mut driver, "let x;\n  x = 1;");

    assert_eq!(tokens[0].loc, SourceLocation::new(1, 1)); // let
    assert_eq!(tokens[1].loc, SourceLocation::new(1, 5)); // x
    assert_eq!(tokens[3].loc, SourceLocation::new(2, 3)); // x on line 2
}

#[test]
fn unterminated_string_is_a_lexical_error() {
    let mut driver = Driver::for_testing();
    _ = crate::lexer::lex(&mut driver, "let s = \"oops;\n");

    assert!(driver.diagnostics().iter().any(|d| d.kind() == ErrorKind::Lexical));
}

#[test]
fn stray_character_is_a_lexical_error_and_scanning_continues() {
    let mut driver = Driver::for_testing();
    let tokens = crate::lexer::lex(&mut driver, "let @ x");

    assert_eq!(driver.error_count(), 1);
    assert!(driver.diagnostics()[0].kind() == ErrorKind::Lexical);

    // The scanner keeps going past the bad character.
    assert_eq!(tokens.len(), 2);
}
