// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `compiler_driver` module defines the functions and types which orchestrate the different
//! compilation stages.

pub mod options;

mod diagnostics;
mod driver;

pub use diagnostics::{Diagnostic, ErrorKind};
pub use driver::Driver;

/// An error returned by the compiler driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The source file could not be read, or the output file could not be written.
    IoFailed(String),

    /// One or more diagnostics were emitted; see the driver's diagnostic list.
    CompilerFailed,
}

/// The artifact produced by a successful driver run.
#[derive(Debug, Clone)]
pub enum CompilerOutput {
    /// No artifact was produced (a print-and-stop mode such as `--print-ir`).
    None,

    /// The generated MIPS assembly text.
    Assembly(String),
}
