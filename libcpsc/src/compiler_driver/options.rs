// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `options` module defines the compiler driver's options.

/// Options that control the compiler driver's behavior.
#[derive(Debug, Default, Clone)]
pub struct DriverOptions {
    /// The file to write the generated assembly to. When `None`, assembly goes to stdout.
    pub output_file: Option<String>,

    /// Run up to IR generation, print the quadruple list, and stop.
    pub print_ir: bool,

    /// Run up to semantic analysis, print the scope dump, and stop.
    pub print_symbols: bool,
}
