// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `symbol_table` module defines the [SymbolTable]: a stack of nested lexical scopes
//! mapping names to symbols.

use std::collections::HashMap;

use crate::ICE;
use crate::core::{SourceLocation, SymbolKind};

use super::types::Type;

/// The kind of a scope.
///
/// Scope kinds gate the validity of `break`/`continue` (loop or foreach scope on the chain),
/// `return` (function scope on the chain) and `this` (class scope on the chain).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
    Class,
    Loop,
    Foreach,
}

/// Metadata about a declared name.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub is_const: bool,

    /// The function context (see `sema::ContextInfo`) the symbol belongs to. Used to detect
    /// captures: a reference from a deeper context promotes the symbol to an environment field.
    pub ctx: usize,

    /// For function symbols: the index of the function's own context.
    pub fn_ctx: Option<usize>,

    pub loc: SourceLocation,
}

impl Symbol {
    /// Creates a variable symbol.
    pub fn variable(name: &str, ty: Type, is_const: bool, ctx: usize, loc: SourceLocation) -> Self {
        let kind = if is_const { SymbolKind::Constant } else { SymbolKind::Variable };
        Self { name: name.to_string(), kind, ty, is_const, ctx, fn_ctx: None, loc }
    }

    /// Creates a parameter symbol.
    pub fn parameter(name: &str, ty: Type, ctx: usize, loc: SourceLocation) -> Self {
        Self { name: name.to_string(), kind: SymbolKind::Parameter, ty, is_const: false, ctx, fn_ctx: None, loc }
    }

    /// Creates a function symbol whose body is the context `fn_ctx`.
    pub fn function(name: &str, ty: Type, ctx: usize, fn_ctx: usize, loc: SourceLocation) -> Self {
        Self { name: name.to_string(), kind: SymbolKind::Function, ty, is_const: false, ctx, fn_ctx: Some(fn_ctx), loc }
    }

    /// Creates a class symbol. Class members live in the class registry, not in scopes.
    pub fn class(name: &str, loc: SourceLocation) -> Self {
        Self {
            name: name.to_string(),
            kind: SymbolKind::Class,
            ty: Type::Class(name.to_string()),
            is_const: false,
            ctx: 0,
            fn_ctx: None,
            loc,
        }
    }
}

/// One lexical scope: a name-to-symbol map plus its kind.
#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    name: String,
    symbols: HashMap<String, Symbol>,

    /// Declaration order, for the scope dump.
    order: Vec<String>,
}

/// The symbol table: a stack of nested scopes.
///
/// Lookup walks the stack from the innermost scope outward. Redeclaring a name within one scope
/// is an error; shadowing a name from an outer scope is allowed.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    enter_count: usize,
    exit_count: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Creates a symbol table holding only the global scope.
    pub fn new() -> Self {
        let global = Scope { kind: ScopeKind::Global, name: "__global__".to_string(), symbols: HashMap::new(), order: Vec::new() };
        Self { scopes: vec![global], enter_count: 0, exit_count: 0 }
    }

    /// Pushes a new scope of the given kind.
    pub fn enter_scope(&mut self, kind: ScopeKind, name: &str) {
        if kind == ScopeKind::Global {
            ICE!("The global scope cannot be re-entered");
        }

        self.enter_count += 1;
        self.scopes.push(Scope { kind, name: name.to_string(), symbols: HashMap::new(), order: Vec::new() });
    }

    /// Pops the current scope and returns a printable dump of its entries.
    pub fn exit_scope(&mut self) -> String {
        if self.scopes.len() == 1 {
            ICE!("Cannot exit the global scope");
        }

        self.exit_count += 1;
        let scope = self.scopes.pop().expect("scope stack is never empty");
        dump_scope(&scope)
    }

    /// Declares a symbol in the current scope.
    ///
    /// Returns `Err` with the previously declared symbol when the name already exists in this
    /// scope (shadowing across scopes is fine; collision within one scope is not).
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");

        if let Some(existing) = scope.symbols.get(&symbol.name) {
            return Err(existing.clone());
        }

        scope.order.push(symbol.name.clone());
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Resolves a name by walking the scope chain from the innermost scope outward.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(name))
    }

    /// The name of the innermost enclosing function scope, or None at the top level.
    pub fn current_function(&self) -> Option<&str> {
        self.scopes.iter().rev().find(|s| s.kind == ScopeKind::Function).map(|s| s.name.as_str())
    }

    /// The name of the innermost enclosing class scope, or None outside any class body.
    pub fn current_class(&self) -> Option<&str> {
        self.scopes.iter().rev().find(|s| s.kind == ScopeKind::Class).map(|s| s.name.as_str())
    }

    /// The number of loop (or foreach) scopes on the current chain, stopping at the enclosing
    /// function boundary: a `break` inside a function nested in a loop is still illegal.
    pub fn current_loop_depth(&self) -> usize {
        let mut depth = 0;
        for scope in self.scopes.iter().rev() {
            match scope.kind {
                ScopeKind::Loop | ScopeKind::Foreach => depth += 1,
                ScopeKind::Function => break,
                _ => {}
            }
        }
        depth
    }

    /// The current nesting depth (1 = global scope only).
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Have `enter_scope` and `exit_scope` been called an equal number of times?
    pub fn is_balanced(&self) -> bool {
        self.enter_count == self.exit_count && self.scopes.len() == 1
    }

    /// Dumps the global scope's entries (the inner scopes dump themselves as they exit).
    pub fn dump_global(&self) -> String {
        dump_scope(&self.scopes[0])
    }
}

fn dump_scope(scope: &Scope) -> String {
    let mut out = format!("{:?} {}\n", scope.kind, scope.name);

    for name in &scope.order {
        let symbol = &scope.symbols[name];
        out.push_str(&format!("  {}: {} {}\n", symbol.name, symbol.kind, symbol.ty));
    }

    out
}
