// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `driver` module defines `Driver`, which is the CompiScript compiler driver type.

use std::fs;
use std::io::Write;

use crate::codegen;
use crate::ir;
use crate::lexer;
use crate::parser;
use crate::sema;

use super::diagnostics::Diagnostic;
use super::options::DriverOptions;
use super::{CompilerOutput, DriverError};

/// The CompiScript compiler driver.
///
/// The driver owns the diagnostics for one compilation. Front-end and semantic errors are
/// batched here so a run can report as many as possible; IR generation and backend errors are
/// fail-fast and become the final diagnostic of the run.
pub struct Driver {
    /// The path to the source `.cps` file.
    pub source_filename: String,

    /// Options that control the driver.
    options: DriverOptions,

    /// Diagnostics emitted by the compilation stages.
    errors: Vec<Diagnostic>,
}

impl Driver {
    /// Creates a new compiler driver configured to compile the given source file.
    pub fn new(source_filename: &str, options: DriverOptions) -> Self {
        Self { source_filename: source_filename.to_string(), options, errors: Vec::new() }
    }

    /// Creates a new compiler driver for unit tests, with default options and no source filename.
    pub fn for_testing() -> Self {
        Self { source_filename: String::new(), options: DriverOptions::default(), errors: Vec::new() }
    }

    /// Runs the compiler pipeline over the driver's source file.
    pub fn run(&mut self) -> Result<CompilerOutput, DriverError> {
        let source = fs::read_to_string(&self.source_filename)
            .map_err(|e| DriverError::IoFailed(format!("Cannot read '{}': {e}", self.source_filename)))?;

        self.compile_source(&source)
    }

    /// Runs the compiler pipeline over in-memory source text.
    ///
    /// This is the whole pipeline behind [Driver::run]; integration tests call it directly with
    /// inline programs.
    pub fn compile_source(&mut self, source: &str) -> Result<CompilerOutput, DriverError> {
        // Lexical analysis. Errors are batched; don't parse a broken token stream.
        let tokens = lexer::lex(self, source);
        if self.has_error_diagnostics() {
            return Err(DriverError::CompilerFailed);
        }

        // Parsing, with statement-boundary recovery so several syntax errors surface at once.
        let program = parser::parse(self, tokens);
        if self.has_error_diagnostics() {
            return Err(DriverError::CompilerFailed);
        }

        // Semantic analysis: batched. No IR is produced if any error was recorded.
        let analysis = sema::analyze(self, &program);
        if self.has_error_diagnostics() {
            return Err(DriverError::CompilerFailed);
        }

        if self.options.print_symbols {
            print!("{}", analysis.scope_dump());
            return Ok(CompilerOutput::None);
        }

        // IR generation: reads the frozen analysis, never mutates it.
        let ir_program = ir::translate(&program, &analysis);

        if self.options.print_ir {
            print!("{}", ir::printer::dump(&ir_program));
            return Ok(CompilerOutput::None);
        }

        // MIPS backend: fail-fast.
        match codegen::generate(&ir_program) {
            Ok(assembly) => Ok(CompilerOutput::Assembly(assembly)),
            Err(error) => {
                self.add_diagnostic(error.into_diagnostic());
                Err(DriverError::CompilerFailed)
            }
        }
    }

    /// Writes the generated assembly to the configured output file, or to stdout.
    pub fn write_output(&self, assembly: &str) -> Result<(), DriverError> {
        match &self.options.output_file {
            Some(path) => fs::write(path, assembly)
                .map_err(|e| DriverError::IoFailed(format!("Cannot write '{path}': {e}"))),
            None => {
                print!("{assembly}");
                Ok(())
            }
        }
    }

    /// The compiler driver's options.
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Adds an error diagnostic.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    /// Are there any error diagnostics?
    pub fn has_error_diagnostics(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// The recorded diagnostics, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Prints all diagnostics to `stderr`, sorted by source position.
    pub fn print_diagnostics(&self) {
        self.print_diagnostics_to_buffer(std::io::stderr());
    }

    /// Prints all diagnostics to the given `buffer`, sorted by source position.
    pub fn print_diagnostics_to_buffer(&self, mut buffer: impl Write) {
        let mut sorted: Vec<&Diagnostic> = self.errors.iter().collect();
        sorted.sort_by_key(|d| d.location());

        for diagnostic in sorted {
            _ = writeln!(buffer, "{diagnostic}");
        }
    }
}
