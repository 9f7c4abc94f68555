// Copyright 2025-2026 Neil Henderson

//! Tests that ill-formed programs are rejected with the right kind of diagnostic.

use cpsc_tests::{compile, expect_error};
use libcpsc::compiler_driver::ErrorKind;

#[test]
fn assigning_string_to_integer() {
    expect_error("let x: integer = \"hi\";", ErrorKind::Type);
}

#[test]
fn calling_with_missing_arguments() {
    expect_error(
        "function fact(n: integer): integer { if (n <= 1) { return 1; } return n * fact(n - 1); } \
         print(fact());",
        ErrorKind::Type,
    );
}

#[test]
fn break_at_the_top_level() {
    expect_error("break;", ErrorKind::ControlFlow);
}

#[test]
fn redeclaring_in_the_same_block() {
    expect_error("let x = 1; let x = 2;", ErrorKind::Name);
    expect_error("{ let y = 1; let y = 2; }", ErrorKind::Name);
}

#[test]
fn overriding_with_a_different_return_type() {
    expect_error(
        "class Base { function value(): integer { return 1; } } \
         class Derived : Base { function value(): string { return \"x\"; } }",
        ErrorKind::Class,
    );
}

#[test]
fn using_an_undeclared_name() {
    expect_error("print(missing);", ErrorKind::Name);
}

#[test]
fn this_outside_a_method() {
    expect_error("function f() { print(this); }", ErrorKind::Name);
}

#[test]
fn return_at_the_top_level() {
    expect_error("return 1;", ErrorKind::ControlFlow);
}

#[test]
fn missing_return_on_a_path() {
    expect_error("function f(n: integer): integer { if (n > 0) { return 1; } }", ErrorKind::ControlFlow);
}

#[test]
fn reassigning_a_const() {
    expect_error("const limit = 10; limit = 11;", ErrorKind::Type);
}

#[test]
fn foreach_over_a_non_array() {
    expect_error("let n = 3; foreach (x in n) { }", ErrorKind::Type);
}

#[test]
fn unterminated_string_literal() {
    expect_error("let s = \"oops;", ErrorKind::Lexical);
}

#[test]
fn missing_semicolon() {
    expect_error("let x = 1", ErrorKind::Syntax);
}

#[test]
fn semantic_errors_are_batched_per_program() {
    let (driver, result) = compile(
        "let a: integer = \"one\"; \
         let b: boolean = 2; \
         print(missing);",
    );

    assert!(result.is_err());
    assert!(driver.error_count() >= 3, "expected all errors in one run: {:?}", driver.diagnostics());
}

#[test]
fn no_assembly_is_produced_for_a_rejected_program() {
    let (_, result) = compile("let x: integer = \"hi\";");
    assert!(result.is_err());
}
