// Copyright 2025-2026 Neil Henderson
//
//! The `lexer` module handles lexical analysis of CompiScript source text and produces
//! a vector of tokens for the parser.

mod scanner;
mod tokens;


use crate::compiler_driver::Driver;

pub use tokens::{Keyword, Token, TokenType};

/// Performs lexical analysis of the source text and returns the token stream.
///
/// Lexical errors are recorded as diagnostics on the `driver`; scanning continues past them so
/// that several can be reported in one run.
pub fn lex(driver: &mut Driver, source: &str) -> Vec<Token> {
    scanner::Scanner::new(source).scan(driver)
}
