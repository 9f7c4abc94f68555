// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `ir` module lowers the typed AST into three-address-code quadruples.

pub mod printer;

mod label_maker;
mod quadruple;
mod temp_maker;
mod translator;

#[cfg(test)]
mod tests;

use crate::parser::AstProgram;
use crate::sema::Analysis;

pub use label_maker::{LabelMaker, LoopLabels, LoopStack};
pub use quadruple::{QuadOp, Quadruple, QuadrupleList};
pub use temp_maker::TempMaker;
pub use translator::{IrProgram, MemberLayouts};

/// Lowers the typed AST into a flat quadruple stream.
///
/// Semantic analysis has already validated the program; this stage reads the frozen [Analysis]
/// and cannot fail on any program that passed it.
pub fn translate(program: &AstProgram, analysis: &Analysis) -> IrProgram {
    translator::Translator::new(analysis).translate_program(program)
}
