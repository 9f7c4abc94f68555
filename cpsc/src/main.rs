// Copyright 2025-2026 Neil Henderson

//! main entry point for the compiler driver executable.

use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};

use libcpsc::compiler_driver::options::DriverOptions;
use libcpsc::compiler_driver::{CompilerOutput, Driver, DriverError};

fn main() -> ExitCode {
    let matches = Command::new("cpsc")
        .about("CompiScript compiler: lowers .cps source text to MIPS32 assembly")
        .arg(Arg::new("source").value_name("FILE").required(true).help("The CompiScript source file"))
        .arg(
            Arg::new("output")
                .short('o')
                .value_name("FILE")
                .help("Write the generated assembly to FILE instead of stdout"),
        )
        .arg(
            Arg::new("print-ir")
                .long("print-ir")
                .action(ArgAction::SetTrue)
                .help("Stop after IR generation and print the quadruple list"),
        )
        .arg(
            Arg::new("print-symbols")
                .long("print-symbols")
                .action(ArgAction::SetTrue)
                .help("Stop after semantic analysis and print the scope dump"),
        )
        .get_matches();

    let source_file = matches.get_one::<String>("source").expect("'source' is a required argument");

    let options = DriverOptions {
        output_file: matches.get_one::<String>("output").cloned(),
        print_ir: matches.get_flag("print-ir"),
        print_symbols: matches.get_flag("print-symbols"),
    };

    let mut driver = Driver::new(source_file, options);

    // Exit codes: 0 on success, 1 on any compilation error, 2 on I/O failure.
    match driver.run() {
        Ok(CompilerOutput::Assembly(assembly)) => match driver.write_output(&assembly) {
            Ok(()) => ExitCode::SUCCESS,
            Err(DriverError::IoFailed(message)) => {
                eprintln!("error: {message}");
                ExitCode::from(2)
            }
            Err(DriverError::CompilerFailed) => ExitCode::from(1),
        },

        Ok(CompilerOutput::None) => ExitCode::SUCCESS,

        Err(DriverError::CompilerFailed) => {
            driver.print_diagnostics();
            ExitCode::from(1)
        }

        Err(DriverError::IoFailed(message)) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
    }
}
