// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `codegen` module converts the quadruple stream into MIPS32 assembly text.

mod mips;

use thiserror::Error;

use crate::compiler_driver::{Diagnostic, ErrorKind};
use crate::core::SourceLocation;
use crate::ir::IrProgram;

/// A fail-fast backend error. The first one halts code generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Register allocation ran out of registers. There is no spilling; this is a hard error.
    #[error("Register pool exhausted: no free {pool} register is available")]
    RegisterPoolExhausted { pool: &'static str },
}

impl GenerationError {
    /// Converts the error into a driver diagnostic.
    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(ErrorKind::Resource, self.to_string(), SourceLocation::none())
    }
}

/// Generates the MIPS assembly text for the given IR program.
pub fn generate(program: &IrProgram) -> Result<String, GenerationError> {
    mips::emit_program(program)
}
