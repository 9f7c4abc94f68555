// Copyright 2025-2026 Neil Henderson
//
//! The `sema` module performs semantic analysis: it populates the symbol table and class
//! registry, attaches a type to every expression, resolves every name reference, and enforces
//! the language's static rules.

pub mod class_registry;
pub mod symbol_table;
pub mod types;

mod analysis;
mod checker;


use crate::compiler_driver::Driver;
use crate::parser::AstProgram;

pub use analysis::{Analysis, CallTarget, ContextInfo, MemberRef, VarAccess, GLOBAL_CONTEXT};

/// Runs semantic analysis over the program.
///
/// Errors are batched on the `driver`: analysis continues past the first error (the offending
/// expression receives the sentinel error type, which is silently compatible with everything) so
/// as many errors as possible surface in one run. The returned [Analysis] is only meaningful
/// when no diagnostics were emitted.
pub fn analyze(driver: &mut Driver, program: &AstProgram) -> Analysis {
    checker::Checker::new().check_program(driver, program)
}
