// Copyright 2025 Neil Henderson, Blue Tarp Media.

use crate::compiler_driver::{Driver, ErrorKind};
use crate::lexer;
use crate::parser::{self, AstBinaryOp, AstBlockItem, AstDeclaration, AstExpression, AstStatement, AstTypeName};

fn parse_ok(source: &str) -> parser::AstProgram {
    let mut driver = Driver::for_testing();
    let tokens = lexer::lex(&mut driver, source);
    let program = parser::parse(&mut driver, tokens);
    assert!(!driver.has_error_diagnostics(), "unexpected diagnostics: {:?}", driver.diagnostics());
    program
}

fn parse_err(source: &str) -> Driver {
    let mut driver = Driver::for_testing();
    let tokens = lexer::lex(&mut driver, source);
    _ = parser::parse(&mut driver, tokens);
    assert!(driver.has_error_diagnostics(), "expected syntax errors");
    driver
}

/// The single expression inside `let x = <expr>;`.
fn initializer_of(source: &str) -> AstExpression {
    let program = parse_ok(source);
    let AstBlockItem::Declaration(AstDeclaration::Variable(decl)) = &program.0[0] else {
        panic!("expected a variable declaration");
    };
    decl.initializer.clone().expect("expected an initializer")
}

#[test]
fn variable_declarations() {
    let program = parse_ok("let a = 1; var b: integer; const c: float = 1.5;");

    assert_eq!(program.0.len(), 3);

    let AstBlockItem::Declaration(AstDeclaration::Variable(a)) = &program.0[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(a.name, "a");
    assert!(!a.is_const);
    assert!(a.declared_type.is_none());

    let AstBlockItem::Declaration(AstDeclaration::Variable(b)) = &program.0[1] else {
        panic!("expected a declaration");
    };
    assert_eq!(b.declared_type, Some(AstTypeName::Integer));
    assert!(b.initializer.is_none());

    let AstBlockItem::Declaration(AstDeclaration::Variable(c)) = &program.0[2] else {
        panic!("expected a declaration");
    };
    assert!(c.is_const);
}

#[test]
fn array_types_nest() {
    let program = parse_ok("let grid: integer[][] = [];");

    let AstBlockItem::Declaration(AstDeclaration::Variable(decl)) = &program.0[0] else {
        panic!("expected a declaration");
    };

    assert_eq!(
        decl.declared_type,
        Some(AstTypeName::Array(Box::new(AstTypeName::Array(Box::new(AstTypeName::Integer)))))
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let expr = initializer_of("let x = 1 + 2 * 3;");

    let AstExpression::Binary { op: AstBinaryOp::Add, rhs, .. } = expr else {
        panic!("expected '+' at the root");
    };
    assert!(matches!(*rhs, AstExpression::Binary { op: AstBinaryOp::Multiply, .. }));
}

#[test]
fn comparison_binds_tighter_than_logical_and() {
    let expr = initializer_of("let x = a == 1 && b == 0;");

    let AstExpression::Binary { op: AstBinaryOp::LogicalAnd, lhs, rhs, .. } = expr else {
        panic!("expected '&&' at the root");
    };
    assert!(matches!(*lhs, AstExpression::Binary { op: AstBinaryOp::EqualTo, .. }));
    assert!(matches!(*rhs, AstExpression::Binary { op: AstBinaryOp::EqualTo, .. }));
}

#[test]
fn assignment_is_right_associative() {
    let program = parse_ok("a = b = 1;");

    let AstBlockItem::Statement(AstStatement::Expression(AstExpression::Assignment { value, .. })) = &program.0[0]
    else {
        panic!("expected an assignment statement");
    };
    assert!(matches!(**value, AstExpression::Assignment { .. }));
}

#[test]
fn postfix_chains() {
    let expr = initializer_of("let x = p.items[0].total();");

    // The chain parses outside-in: Call(Member(Index(Member(p, items), 0), total)).
    let AstExpression::Call { callee, args, .. } = expr else {
        panic!("expected a call at the root");
    };
    assert!(args.is_empty());

    let AstExpression::Member { object, member, .. } = *callee else {
        panic!("expected a member access");
    };
    assert_eq!(member, "total");
    assert!(matches!(*object, AstExpression::Index { .. }));
}

#[test]
fn else_if_chains_nest() {
    let program = parse_ok("if (a) { } else if (b) { } else { }");

    let AstBlockItem::Statement(AstStatement::If { else_block: Some(else_block), .. }) = &program.0[0] else {
        panic!("expected an if statement with an else");
    };

    assert_eq!(else_block.0.len(), 1);
    assert!(matches!(&else_block.0[0], AstBlockItem::Statement(AstStatement::If { .. })));
}

#[test]
fn for_statement_clauses() {
    let program = parse_ok("for (let i = 0; i < 10; i = i + 1) { }");

    let AstBlockItem::Statement(AstStatement::For { init, condition, update, .. }) = &program.0[0] else {
        panic!("expected a for statement");
    };
    assert!(init.is_some());
    assert!(condition.is_some());
    assert!(update.is_some());
}

#[test]
fn foreach_statement() {
    let program = parse_ok("foreach (x in a) { print(x); }");

    let AstBlockItem::Statement(AstStatement::Foreach { var_name, .. }) = &program.0[0] else {
        panic!("expected a foreach statement");
    };
    assert_eq!(var_name, "x");
}

#[test]
fn class_with_fields_and_methods() {
    let program = parse_ok("class P : Base { var x: integer; function sum(): integer { return 1; } }");

    let AstBlockItem::Declaration(AstDeclaration::Class(class)) = &program.0[0] else {
        panic!("expected a class declaration");
    };

    assert_eq!(class.name, "P");
    assert_eq!(class.superclass.as_ref().map(|(name, _)| name.as_str()), Some("Base"));
    assert_eq!(class.members.len(), 2);
}

#[test]
fn nested_function_declarations() {
    let program = parse_ok("function outer() { function inner() { } inner(); }");

    let AstBlockItem::Declaration(AstDeclaration::Function(outer)) = &program.0[0] else {
        panic!("expected a function declaration");
    };
    assert!(matches!(&outer.body.0[0], AstBlockItem::Declaration(AstDeclaration::Function(_))));
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
    let driver = parse_err("let x = 1");
    assert!(driver.diagnostics().iter().all(|d| d.kind() == ErrorKind::Syntax));
}

#[test]
fn recovery_reports_multiple_errors() {
    // Two independent broken statements; recovery at ';' should surface both.
    let driver = parse_err("let = 1; let y 2;");
    assert!(driver.error_count() >= 2);
}

#[test]
fn const_requires_initializer() {
    let driver = parse_err("const x: integer;");
    assert!(driver.diagnostics().iter().any(|d| d.kind() == ErrorKind::Syntax));
}
