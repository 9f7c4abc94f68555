// Copyright 2025 Neil Henderson, Blue Tarp Media.

use crate::core::{SourceLocation, SymbolKind};

use super::super::symbol_table::{ScopeKind, Symbol, SymbolTable};
use super::super::types::Type;

fn loc() -> SourceLocation {
    SourceLocation::new(1, 1)
}

#[test]
fn declare_and_resolve() {
    let mut table = SymbolTable::new();

    assert!(table.declare(Symbol::variable("x", Type::Integer, false, 0, loc())).is_ok());
    assert!(table.resolve("x").is_some_and(|s| s.kind == SymbolKind::Variable));
    assert!(table.resolve("y").is_none());
}

#[test]
fn duplicate_in_same_scope_is_rejected() {
    let mut table = SymbolTable::new();

    assert!(table.declare(Symbol::variable("x", Type::Integer, false, 0, loc())).is_ok());
    assert!(table.declare(Symbol::variable("x", Type::Float, false, 0, loc())).is_err());
}

#[test]
fn shadowing_across_scopes_is_allowed() {
    let mut table = SymbolTable::new();

    assert!(table.declare(Symbol::variable("x", Type::Integer, false, 0, loc())).is_ok());

    table.enter_scope(ScopeKind::Block, "");
    assert!(table.declare(Symbol::variable("x", Type::Str, false, 0, loc())).is_ok());

    // The inner declaration wins while its scope is open.
    assert!(table.resolve("x").is_some_and(|s| s.ty == Type::Str));

    table.exit_scope();
    assert!(table.resolve("x").is_some_and(|s| s.ty == Type::Integer));
}

#[test]
fn current_function_and_class() {
    let mut table = SymbolTable::new();
    assert!(table.current_function().is_none());
    assert!(table.current_class().is_none());

    table.enter_scope(ScopeKind::Class, "P");
    table.enter_scope(ScopeKind::Function, "P.sum");
    table.enter_scope(ScopeKind::Block, "");

    assert_eq!(table.current_function(), Some("P.sum"));
    assert_eq!(table.current_class(), Some("P"));
}

#[test]
fn loop_depth_stops_at_function_boundaries() {
    let mut table = SymbolTable::new();
    assert_eq!(table.current_loop_depth(), 0);

    table.enter_scope(ScopeKind::Loop, "");
    table.enter_scope(ScopeKind::Foreach, "");
    assert_eq!(table.current_loop_depth(), 2);

    // A function nested inside a loop starts from zero: its `break` would be illegal.
    table.enter_scope(ScopeKind::Function, "f");
    assert_eq!(table.current_loop_depth(), 0);
}

#[test]
fn enter_and_exit_balance() {
    let mut table = SymbolTable::new();
    assert!(table.is_balanced());

    table.enter_scope(ScopeKind::Function, "f");
    table.enter_scope(ScopeKind::Block, "");
    assert!(!table.is_balanced());

    table.exit_scope();
    table.exit_scope();
    assert!(table.is_balanced());
    assert_eq!(table.scope_depth(), 1);
}
