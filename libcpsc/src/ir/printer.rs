// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `printer` module renders the quadruple stream as numbered text, for `--print-ir`.

use super::translator::IrProgram;

/// Renders the quadruple list, one numbered line per quadruple.
pub fn dump(program: &IrProgram) -> String {
    let mut out = String::new();

    for (index, quad) in program.quads.iter().enumerate() {
        out.push_str(&format!("{index:4}: {quad}\n"));
    }

    out
}
