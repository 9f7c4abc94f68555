// Copyright 2025-2026 Neil Henderson
//
//! The `parser` module turns the lexer's token stream into an abstract syntax tree.

mod abstract_syntax_tree;
mod recursive_descent;
mod token_stream;


use crate::compiler_driver::Driver;
use crate::lexer::Token;

pub use abstract_syntax_tree::*;
pub use token_stream::TokenStream;

/// Parses the token stream into an [AstProgram].
///
/// Syntax errors are recorded as diagnostics on the `driver`; the parser recovers at statement
/// boundaries so that several can be reported in one run. The returned tree only contains the
/// constructs that parsed cleanly and is only meaningful when no diagnostics were emitted.
pub fn parse(driver: &mut Driver, tokens: Vec<Token>) -> AstProgram {
    recursive_descent::Parser::new(tokens).parse_program(driver)
}
