// Copyright 2025-2026 Neil Henderson
//
//! Shared helpers for the integration tests: run in-memory CompiScript programs through the
//! pipeline and hand back the stage outputs.

use libcpsc::compiler_driver::{CompilerOutput, Driver, DriverError, ErrorKind};
use libcpsc::ir::{IrProgram, Quadruple};
use libcpsc::{ir, lexer, parser, sema};

/// Compiles source text through the whole pipeline.
pub fn compile(source: &str) -> (Driver, Result<CompilerOutput, DriverError>) {
    let mut driver = Driver::for_testing();
    let result = driver.compile_source(source);
    (driver, result)
}

/// Compiles source text that is expected to be valid and returns the assembly.
pub fn compile_to_assembly(source: &str) -> String {
    let (driver, result) = compile(source);

    match result {
        Ok(CompilerOutput::Assembly(assembly)) => assembly,
        other => {
            driver.print_diagnostics_to_buffer(std::io::stderr());
            panic!("expected assembly output, got {other:?}");
        }
    }
}

/// Runs source text up to IR generation and returns the quadruple program.
pub fn compile_to_ir(source: &str) -> IrProgram {
    let mut driver = Driver::for_testing();

    let tokens = lexer::lex(&mut driver, source);
    assert!(!driver.has_error_diagnostics(), "lexing failed: {:?}", driver.diagnostics());

    let program = parser::parse(&mut driver, tokens);
    assert!(!driver.has_error_diagnostics(), "parsing failed: {:?}", driver.diagnostics());

    let analysis = sema::analyze(&mut driver, &program);
    assert!(!driver.has_error_diagnostics(), "sema failed: {:?}", driver.diagnostics());

    ir::translate(&program, &analysis)
}

/// The quadruple stream of a valid program.
pub fn quads_for(source: &str) -> Vec<Quadruple> {
    compile_to_ir(source).quads
}

/// Compiles source text that is expected to be rejected, and asserts that at least one
/// diagnostic of the given kind was emitted.
pub fn expect_error(source: &str, kind: ErrorKind) {
    let (driver, result) = compile(source);

    assert!(result.is_err(), "expected compilation to fail");
    assert!(
        driver.diagnostics().iter().any(|d| d.kind() == kind),
        "expected a {kind} diagnostic, got: {:?}",
        driver.diagnostics()
    );
}
