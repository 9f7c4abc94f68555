// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `checker` module implements the semantic analyzer: a single pass over the AST that
//! populates symbols, types every expression, resolves every name, and enforces the static
//! rules. Class and top-level function signatures are collected up front so that forward and
//! recursive references resolve.

use crate::compiler_driver::{Diagnostic, Driver, ErrorKind};
use crate::core::{SourceLocation, SymbolKind};
use crate::parser::{
    AstBlock, AstBlockItem, AstBinaryOp, AstClass, AstClassMember, AstDeclaration, AstExpression, AstFunction,
    AstProgram, AstStatement, AstTypeName, AstUnaryOp, AstVariableDecl, NodeId,
};

use super::analysis::{Analysis, CallTarget, ContextInfo, MemberRef, VarAccess, GLOBAL_CONTEXT};
use super::class_registry::{ClassInfo, FieldInfo, MethodInfo};
use super::symbol_table::{ScopeKind, Symbol, SymbolTable};
use super::types::{self, Type};

/// A name reference whose access path (direct or environment field) is finalized once capture
/// analysis has seen the whole program.
struct PendingAccess {
    name: String,
    owner_ctx: usize,
}

/// The semantic analyzer's mutable state.
pub struct Checker {
    symbols: SymbolTable,
    analysis: Analysis,

    /// Stack of active function contexts; `last()` is the context being checked.
    context_stack: Vec<usize>,

    /// Return types of the enclosing functions, innermost last.
    return_type_stack: Vec<Type>,

    pending_accesses: Vec<(NodeId, PendingAccess)>,

    /// Call-graph edges (caller context, callee context), for environment forwarding.
    call_edges: Vec<(usize, usize)>,

    scope_dumps: String,
}

impl Checker {
    /// Creates a new checker.
    pub fn new() -> Self {
        let mut analysis = Analysis::default();
        analysis.contexts.push(ContextInfo {
            label: "main".to_string(),
            depth: 0,
            parent: None,
            params: Vec::new(),
            method_of: None,
            return_type: Type::Void,
            captured: Vec::new(),
            takes_env: false,
        });

        Self {
            symbols: SymbolTable::new(),
            analysis,
            context_stack: vec![GLOBAL_CONTEXT],
            return_type_stack: Vec::new(),
            pending_accesses: Vec::new(),
            call_edges: Vec::new(),
            scope_dumps: String::new(),
        }
    }

    /// Runs the analysis and returns the frozen result.
    pub fn check_program(mut self, driver: &mut Driver, program: &AstProgram) -> Analysis {
        self.collect_class_names(driver, program);
        self.collect_class_members(driver, program);
        self.finish_class_layouts(driver, program);
        self.collect_function_signatures(driver, program);

        let mut terminated = false;
        for item in &program.0 {
            if terminated {
                self.error(driver, ErrorKind::ControlFlow, "Unreachable code", item_location(item));
            }
            terminated |= self.check_block_item(driver, item);
        }

        self.propagate_env_forwarding();
        self.finalize_accesses();

        self.scope_dumps.push_str(&self.symbols.dump_global());
        self.analysis.scope_dump = std::mem::take(&mut self.scope_dumps);

        debug_assert!(self.symbols.is_balanced());

        self.analysis
    }

    // ---------------- Signature collection ----------------

    /// Registers every class name so that types and superclasses resolve regardless of
    /// declaration order.
    fn collect_class_names(&mut self, driver: &mut Driver, program: &AstProgram) {
        for item in &program.0 {
            let AstBlockItem::Declaration(AstDeclaration::Class(class)) = item else {
                continue;
            };

            if !self.analysis.classes.register(ClassInfo { name: class.name.clone(), ..ClassInfo::default() }) {
                let message = format!("Redeclaration of class '{}'", class.name);
                self.error(driver, ErrorKind::Name, &message, class.loc);
                continue;
            }

            if self.symbols.declare(Symbol::class(&class.name, class.loc)).is_err() {
                let message = format!("Redeclaration of '{}'", class.name);
                self.error(driver, ErrorKind::Name, &message, class.loc);
            }
        }
    }

    /// Fills in superclass links, fields and method signatures.
    fn collect_class_members(&mut self, driver: &mut Driver, program: &AstProgram) {
        for item in &program.0 {
            let AstBlockItem::Declaration(AstDeclaration::Class(class)) = item else {
                continue;
            };

            if let Some((super_name, super_loc)) = &class.superclass {
                if self.analysis.classes.contains(super_name) {
                    if let Some(info) = self.analysis.classes.get_mut(&class.name) {
                        info.superclass = Some(super_name.clone());
                    }
                } else {
                    let message = format!("Undefined superclass '{super_name}'");
                    self.error(driver, ErrorKind::Class, &message, *super_loc);
                }
            }

            let mut fields = Vec::new();
            let mut methods = Vec::new();

            for member in &class.members {
                match member {
                    AstClassMember::Field(field) => {
                        if field.initializer.is_some() {
                            let message = format!(
                                "Field '{}' cannot have an initializer; assign it after 'new' or in 'init'",
                                field.name
                            );
                            self.error(driver, ErrorKind::Class, &message, field.loc);
                        }

                        let Some(type_name) = &field.declared_type else {
                            let message = format!("Field '{}' requires a type annotation", field.name);
                            self.error(driver, ErrorKind::Type, &message, field.loc);
                            continue;
                        };

                        let ty = self.resolve_type(driver, type_name, field.loc);

                        if fields.iter().any(|f: &FieldInfo| f.name == field.name) {
                            let message = format!("Redeclaration of field '{}'", field.name);
                            self.error(driver, ErrorKind::Name, &message, field.loc);
                            continue;
                        }

                        // Offsets are provisional (own-field index); finish_class_layouts adds
                        // the inherited prefix once every superclass is known.
                        fields.push(FieldInfo { name: field.name.clone(), ty, offset: fields.len() });
                    }

                    AstClassMember::Method(method) => {
                        let params = method
                            .params
                            .iter()
                            .map(|p| self.resolve_type(driver, &p.type_name, p.loc))
                            .collect::<Vec<Type>>();

                        let ret = match &method.return_type {
                            Some(type_name) => self.resolve_type(driver, type_name, method.loc),
                            None => Type::Void,
                        };

                        if methods.iter().any(|m: &MethodInfo| m.name == method.name) {
                            let message = format!("Redeclaration of method '{}'", method.name);
                            self.error(driver, ErrorKind::Name, &message, method.loc);
                            continue;
                        }

                        let ctx = self.make_context(
                            format!("{}.{}", class.name, method.name),
                            GLOBAL_CONTEXT,
                            method.params.iter().map(|p| p.name.clone()).zip(params.iter().cloned()).collect(),
                            Some(class.name.clone()),
                            ret.clone(),
                        );
                        self.analysis.fn_contexts.insert(method.id, ctx);

                        methods.push(MethodInfo { name: method.name.clone(), params, ret, ctx });
                    }
                }
            }

            if let Some(info) = self.analysis.classes.get_mut(&class.name) {
                info.fields = fields;
                info.methods = methods.into_iter().map(|m| (m.name.clone(), m)).collect();
            }
        }
    }

    /// Validates the inheritance graph, fixes field offsets, and checks override signatures.
    fn finish_class_layouts(&mut self, driver: &mut Driver, program: &AstProgram) {
        for item in &program.0 {
            let AstBlockItem::Declaration(AstDeclaration::Class(class)) = item else {
                continue;
            };

            if self.analysis.classes.has_inheritance_cycle(&class.name) {
                let message = format!("Inheritance cycle involving class '{}'", class.name);
                self.error(driver, ErrorKind::Class, &message, class.loc);
                if let Some(info) = self.analysis.classes.get_mut(&class.name) {
                    info.superclass = None;
                }
            }
        }

        for item in &program.0 {
            let AstBlockItem::Declaration(AstDeclaration::Class(class)) = item else {
                continue;
            };

            let Some(info) = self.analysis.classes.get(&class.name) else {
                continue;
            };

            // Inherited fields come first: shift this class's own offsets past them.
            let inherited = match &info.superclass {
                Some(super_name) => self.analysis.classes.size_in_words(super_name),
                None => 0,
            };

            let super_name = info.superclass.clone();

            if inherited > 0 {
                if let Some(info) = self.analysis.classes.get_mut(&class.name) {
                    for field in &mut info.fields {
                        field.offset += inherited;
                    }
                }
            }

            // Field name collisions with inherited fields.
            if let Some(super_name) = &super_name {
                let own_fields: Vec<(String, SourceLocation)> = class
                    .members
                    .iter()
                    .filter_map(|m| match m {
                        AstClassMember::Field(f) => Some((f.name.clone(), f.loc)),
                        AstClassMember::Method(_) => None,
                    })
                    .collect();

                for (field_name, field_loc) in own_fields {
                    if self.analysis.classes.resolve_field(super_name, &field_name).is_some() {
                        let message = format!("Field '{field_name}' is already declared in a superclass");
                        self.error(driver, ErrorKind::Class, &message, field_loc);
                    }
                }

                // Overriding requires identical parameter types and return type.
                for member in &class.members {
                    let AstClassMember::Method(method) = member else {
                        continue;
                    };

                    let Some(base) = self.analysis.classes.resolve_method(super_name, &method.name) else {
                        continue;
                    };

                    let Some(own) = self.analysis.classes.resolve_method(&class.name, &method.name) else {
                        continue;
                    };

                    if own.params != base.params || own.ret != base.ret {
                        let message = format!(
                            "Override of method '{}' does not match the signature declared in class '{}'",
                            method.name, base.owner
                        );
                        self.error(driver, ErrorKind::Class, &message, method.loc);
                    }
                }
            }
        }
    }

    /// Declares every top-level function so that calls resolve before the declaration point.
    fn collect_function_signatures(&mut self, driver: &mut Driver, program: &AstProgram) {
        for item in &program.0 {
            let AstBlockItem::Declaration(AstDeclaration::Function(function)) = item else {
                continue;
            };

            self.declare_function(driver, function);
        }
    }

    /// Declares a function symbol and creates its body's context. Used for top-level functions
    /// during signature collection and for nested functions at their declaration point.
    fn declare_function(&mut self, driver: &mut Driver, function: &AstFunction) {
        // The backend owns the `main` entry label for top-level code.
        if function.name == "main" {
            self.error(driver, ErrorKind::Name, "'main' is reserved for top-level code", function.loc);
        }

        let params: Vec<(String, Type)> = function
            .params
            .iter()
            .map(|p| (p.name.clone(), self.resolve_type(driver, &p.type_name, p.loc)))
            .collect();

        let ret = match &function.return_type {
            Some(type_name) => self.resolve_type(driver, type_name, function.loc),
            None => Type::Void,
        };

        let parent = self.current_ctx();
        let label = if parent == GLOBAL_CONTEXT {
            function.name.clone()
        } else {
            format!("{}.{}", self.analysis.contexts[parent].label, function.name)
        };

        let ctx = self.make_context(label, parent, params.clone(), None, ret.clone());
        self.analysis.fn_contexts.insert(function.id, ctx);

        let fn_type = Type::Function { params: params.into_iter().map(|(_, ty)| ty).collect(), ret: Box::new(ret) };
        let symbol = Symbol::function(&function.name, fn_type, parent, ctx, function.loc);

        if self.symbols.declare(symbol).is_err() {
            let message = format!("Redeclaration of '{}'", function.name);
            self.error(driver, ErrorKind::Name, &message, function.loc);
        }
    }

    fn make_context(
        &mut self,
        label: String,
        parent: usize,
        params: Vec<(String, Type)>,
        method_of: Option<String>,
        return_type: Type,
    ) -> usize {
        let depth = self.analysis.contexts[parent].depth + 1;

        self.analysis.contexts.push(ContextInfo {
            label,
            depth,
            parent: Some(parent),
            params: params.into_iter().map(|(name, _)| name).collect(),
            method_of,
            return_type,
            captured: Vec::new(),
            takes_env: false,
        });

        self.analysis.contexts.len() - 1
    }

    // ---------------- Declarations, statements, blocks ----------------

    /// Checks one block item. Returns true when the item unconditionally transfers control
    /// (return, break, continue, or a construct all of whose paths do).
    fn check_block_item(&mut self, driver: &mut Driver, item: &AstBlockItem) -> bool {
        match item {
            AstBlockItem::Statement(stmt) => self.check_statement(driver, stmt),

            AstBlockItem::Declaration(AstDeclaration::Variable(decl)) => {
                self.check_variable_decl(driver, decl);
                false
            }

            AstBlockItem::Declaration(AstDeclaration::Function(function)) => {
                // Top-level functions were declared during signature collection; nested ones
                // are declared here, at their declaration point (recursion still resolves).
                if self.current_ctx() != GLOBAL_CONTEXT || self.symbols.scope_depth() > 1 {
                    self.declare_function(driver, function);
                }

                let ctx = self.analysis.fn_context(function.id);
                self.check_function_body(driver, function, ctx);
                false
            }

            AstBlockItem::Declaration(AstDeclaration::Class(class)) => {
                if self.symbols.scope_depth() > 1 {
                    let message = format!("Class '{}' must be declared at the top level", class.name);
                    self.error(driver, ErrorKind::Name, &message, class.loc);
                    return false;
                }

                self.check_class_body(driver, class);
                false
            }
        }
    }

    fn check_variable_decl(&mut self, driver: &mut Driver, decl: &AstVariableDecl) {
        let annotated = decl.declared_type.as_ref().map(|t| self.resolve_type(driver, t, decl.loc));

        let init_type = decl.initializer.as_ref().map(|e| self.check_expression(driver, e));

        let ty = match (&annotated, &init_type) {
            (Some(annotated), Some(init)) => {
                if !types::are_assignable(init, annotated) {
                    let message = format!("Incompatible assignment: {annotated} = {init}");
                    self.error(driver, ErrorKind::Type, &message, decl.loc);
                }
                annotated.clone()
            }
            (Some(annotated), None) => annotated.clone(),
            (None, Some(init)) => {
                if *init == Type::Void {
                    let message = format!("Cannot declare '{}' with a void initializer", decl.name);
                    self.error(driver, ErrorKind::Type, &message, decl.loc);
                    Type::Error
                } else {
                    init.clone()
                }
            }
            (None, None) => {
                let message = format!("Cannot infer the type of '{}' without an initializer", decl.name);
                self.error(driver, ErrorKind::Type, &message, decl.loc);
                Type::Error
            }
        };

        let ctx = self.current_ctx();
        let symbol = Symbol::variable(&decl.name, ty.clone(), decl.is_const, ctx, decl.loc);

        if self.symbols.declare(symbol).is_err() {
            let message = format!("Redeclaration of '{}'", decl.name);
            self.error(driver, ErrorKind::Name, &message, decl.loc);
        }

        self.analysis.node_types.insert(decl.id, ty);
        self.pending_accesses.push((decl.id, PendingAccess { name: decl.name.clone(), owner_ctx: ctx }));
    }

    fn check_statement(&mut self, driver: &mut Driver, stmt: &AstStatement) -> bool {
        match stmt {
            AstStatement::Expression(expr) => {
                self.check_expression(driver, expr);
                false
            }

            AstStatement::If { condition, then_block, else_block } => {
                self.check_condition(driver, condition, "if");

                let then_terminates = self.check_block(driver, then_block);

                match else_block {
                    Some(else_block) => {
                        let else_terminates = self.check_block(driver, else_block);
                        then_terminates && else_terminates
                    }
                    None => false,
                }
            }

            AstStatement::While { condition, body } => {
                self.check_condition(driver, condition, "while");

                self.symbols.enter_scope(ScopeKind::Loop, "");
                self.check_block(driver, body);
                self.pop_scope();

                false
            }

            AstStatement::DoWhile { body, condition } => {
                self.symbols.enter_scope(ScopeKind::Loop, "");
                self.check_block(driver, body);
                self.pop_scope();

                self.check_condition(driver, condition, "do-while");

                false
            }

            AstStatement::For { init, condition, update, body } => {
                // The loop scope covers the whole statement, so `for (let i = ...)` variables
                // are local to the loop.
                self.symbols.enter_scope(ScopeKind::Loop, "");

                if let Some(init) = init {
                    self.check_block_item(driver, init);
                }

                if let Some(condition) = condition {
                    self.check_condition(driver, condition, "for");
                }

                if let Some(update) = update {
                    self.check_expression(driver, update);
                }

                self.check_block(driver, body);
                self.pop_scope();

                false
            }

            AstStatement::Foreach { id, var_name, iterable, body, loc } => {
                let iterable_type = self.check_expression(driver, iterable);

                let element_type = match iterable_type.element_type() {
                    Some(element) => element.clone(),
                    None => {
                        if !iterable_type.is_error() {
                            let message = format!("foreach requires an array, found '{iterable_type}'");
                            self.error(driver, ErrorKind::Type, &message, *loc);
                        }
                        Type::Error
                    }
                };

                self.symbols.enter_scope(ScopeKind::Foreach, "");

                let ctx = self.current_ctx();
                let symbol = Symbol::variable(var_name, element_type.clone(), false, ctx, *loc);
                _ = self.symbols.declare(symbol);

                self.analysis.node_types.insert(*id, element_type);
                self.pending_accesses.push((*id, PendingAccess { name: var_name.clone(), owner_ctx: ctx }));

                self.check_block(driver, body);
                self.pop_scope();

                false
            }

            AstStatement::Break { loc } => {
                if self.symbols.current_loop_depth() == 0 {
                    self.error(driver, ErrorKind::ControlFlow, "'break' outside of a loop", *loc);
                }
                true
            }

            AstStatement::Continue { loc } => {
                if self.symbols.current_loop_depth() == 0 {
                    self.error(driver, ErrorKind::ControlFlow, "'continue' outside of a loop", *loc);
                }
                true
            }

            AstStatement::Return { value, loc } => {
                self.check_return(driver, value.as_ref(), *loc);
                true
            }

            AstStatement::Print { value, loc } => {
                let ty = self.check_expression(driver, value);
                if ty == Type::Void {
                    self.error(driver, ErrorKind::Type, "Cannot print a void expression", *loc);
                }
                false
            }

            AstStatement::Block(block) => self.check_block(driver, block),
        }
    }

    fn check_block(&mut self, driver: &mut Driver, block: &AstBlock) -> bool {
        self.symbols.enter_scope(ScopeKind::Block, "");

        let mut terminated = false;
        for item in &block.0 {
            if terminated {
                self.error(driver, ErrorKind::ControlFlow, "Unreachable code", item_location(item));
            }
            terminated |= self.check_block_item(driver, item);
        }

        self.pop_scope();
        terminated
    }

    fn check_condition(&mut self, driver: &mut Driver, condition: &AstExpression, construct: &str) {
        let ty = self.check_expression(driver, condition);

        if ty != Type::Boolean && !ty.is_error() {
            let message = format!("The {construct} condition must be boolean, found '{ty}'");
            self.error(driver, ErrorKind::Type, &message, condition.location());
        }
    }

    fn check_return(&mut self, driver: &mut Driver, value: Option<&AstExpression>, loc: SourceLocation) {
        let Some(expected) = self.return_type_stack.last().cloned() else {
            self.error(driver, ErrorKind::ControlFlow, "'return' outside of a function", loc);
            if let Some(value) = value {
                self.check_expression(driver, value);
            }
            return;
        };

        match value {
            Some(value) => {
                let ty = self.check_expression(driver, value);
                if expected == Type::Void {
                    self.error(driver, ErrorKind::Type, "A void function cannot return a value", loc);
                } else if !types::are_assignable(&ty, &expected) {
                    let message = format!("Return type mismatch: expected '{expected}', found '{ty}'");
                    self.error(driver, ErrorKind::Type, &message, loc);
                }
            }
            None => {
                if expected != Type::Void {
                    let message = format!("Return without a value in a function returning '{expected}'");
                    self.error(driver, ErrorKind::Type, &message, loc);
                }
            }
        }
    }

    fn check_function_body(&mut self, driver: &mut Driver, function: &AstFunction, ctx: usize) {
        let context = self.analysis.contexts[ctx].clone();

        self.context_stack.push(ctx);
        self.return_type_stack.push(context.return_type.clone());
        self.symbols.enter_scope(ScopeKind::Function, &context.label);

        // Methods receive the receiver as the implicit parameter `this`.
        if let Some(class_name) = &context.method_of {
            let this = Symbol::parameter("this", Type::Class(class_name.clone()), ctx, function.loc);
            _ = self.symbols.declare(this);
        }

        for (param, param_type) in function.params.iter().zip(self.param_types(function, driver)) {
            let symbol = Symbol::parameter(&param.name, param_type, ctx, param.loc);
            if self.symbols.declare(symbol).is_err() {
                let message = format!("Duplicate parameter '{}'", param.name);
                self.error(driver, ErrorKind::Name, &message, param.loc);
            }
        }

        let body_returns = self.check_block(driver, &function.body);

        if context.return_type != Type::Void && !context.return_type.is_error() && !body_returns {
            let message = format!("Function '{}' is missing a return on some control-flow path", function.name);
            self.error(driver, ErrorKind::ControlFlow, &message, function.loc);
        }

        self.pop_scope();
        self.return_type_stack.pop();
        self.context_stack.pop();
    }

    /// Parameter types for body checking. Signature collection already resolved (and
    /// diagnosed) them; re-resolve quietly here to avoid duplicate diagnostics.
    fn param_types(&mut self, function: &AstFunction, _driver: &mut Driver) -> Vec<Type> {
        function.params.iter().map(|p| self.resolve_type_quiet(&p.type_name)).collect()
    }

    fn check_class_body(&mut self, driver: &mut Driver, class: &AstClass) {
        self.symbols.enter_scope(ScopeKind::Class, &class.name);

        for member in &class.members {
            if let AstClassMember::Method(method) = member {
                let ctx = self.analysis.fn_context(method.id);
                self.check_function_body(driver, method, ctx);
            }
        }

        self.pop_scope();
    }

    // ---------------- Expressions ----------------

    fn check_expression(&mut self, driver: &mut Driver, expr: &AstExpression) -> Type {
        let ty = self.check_expression_inner(driver, expr);
        self.analysis.node_types.insert(expr.id(), ty.clone());
        ty
    }

    fn check_expression_inner(&mut self, driver: &mut Driver, expr: &AstExpression) -> Type {
        match expr {
            AstExpression::IntegerLiteral { .. } => Type::Integer,
            AstExpression::FloatLiteral { .. } => Type::Float,
            AstExpression::StringLiteral { .. } => Type::Str,
            AstExpression::BooleanLiteral { .. } => Type::Boolean,
            AstExpression::NullLiteral { .. } => Type::Null,

            AstExpression::ArrayLiteral { elements, loc, .. } => self.check_array_literal(driver, elements, *loc),

            AstExpression::Identifier { id, name, loc } => self.check_identifier(driver, *id, name, *loc),

            AstExpression::This { id, loc } => self.check_this(driver, *id, *loc),

            AstExpression::New { class_name, args, loc, .. } => {
                for arg in args {
                    self.check_expression(driver, arg);
                }

                if !self.analysis.classes.contains(class_name) {
                    let message = format!("Unknown class '{class_name}'");
                    self.error(driver, ErrorKind::Name, &message, *loc);
                    return Type::Error;
                }

                if !args.is_empty() {
                    let message =
                        format!("'new {class_name}' does not take arguments; call 'init' explicitly");
                    self.error(driver, ErrorKind::Type, &message, *loc);
                }

                Type::Class(class_name.clone())
            }

            AstExpression::Unary { op, operand, loc, .. } => self.check_unary(driver, *op, operand, *loc),

            AstExpression::Binary { op, lhs, rhs, loc, .. } => self.check_binary(driver, *op, lhs, rhs, *loc),

            AstExpression::Ternary { condition, then_expr, else_expr, loc, .. } => {
                self.check_condition(driver, condition, "ternary");

                let then_type = self.check_expression(driver, then_expr);
                let else_type = self.check_expression(driver, else_expr);

                match types::common_type(&then_type, &else_type) {
                    Some(Type::Void) => {
                        self.error(driver, ErrorKind::Type, "Ternary branches cannot be void", *loc);
                        Type::Error
                    }
                    Some(common) => common,
                    None => {
                        let message =
                            format!("Ternary branches have incompatible types ('{then_type}' and '{else_type}')");
                        self.error(driver, ErrorKind::Type, &message, *loc);
                        Type::Error
                    }
                }
            }

            AstExpression::Assignment { target, value, loc, .. } => self.check_assignment(driver, target, value, *loc),

            AstExpression::Call { id, callee, args, loc } => self.check_call(driver, *id, callee, args, *loc),

            AstExpression::Index { array, index, loc, .. } => self.check_index(driver, array, index, *loc),

            AstExpression::Member { id, object, member, loc } => self.check_member(driver, *id, object, member, *loc),
        }
    }

    fn check_array_literal(&mut self, driver: &mut Driver, elements: &[AstExpression], loc: SourceLocation) -> Type {
        if elements.is_empty() {
            return Type::array_of(Type::Null);
        }

        let first = self.check_expression(driver, &elements[0]);

        for element in &elements[1..] {
            let ty = self.check_expression(driver, element);
            if !types::are_assignable(&ty, &first) {
                let message = format!("Array literal elements have mixed types ('{first}' and '{ty}')");
                self.error(driver, ErrorKind::Type, &message, loc);
                return Type::array_of(first);
            }
        }

        Type::array_of(first)
    }

    fn check_identifier(&mut self, driver: &mut Driver, id: NodeId, name: &str, loc: SourceLocation) -> Type {
        let Some(symbol) = self.symbols.resolve(name) else {
            let message = format!("Undeclared name '{name}'");
            self.error(driver, ErrorKind::Name, &message, loc);
            return Type::Error;
        };

        let kind = symbol.kind;
        let ty = symbol.ty.clone();
        let owner_ctx = symbol.ctx;

        match kind {
            SymbolKind::Variable | SymbolKind::Constant | SymbolKind::Parameter => {
                self.record_access(id, name, owner_ctx);
                ty
            }

            SymbolKind::Function => {
                let message = format!("Function '{name}' is not a value; call it instead");
                self.error(driver, ErrorKind::Type, &message, loc);
                Type::Error
            }

            SymbolKind::Class => {
                let message = format!("Class '{name}' cannot be used as a value");
                self.error(driver, ErrorKind::Type, &message, loc);
                Type::Error
            }

            SymbolKind::Field | SymbolKind::Method => {
                // Fields and methods never live in lexical scopes.
                let message = format!("'{name}' cannot be used here");
                self.error(driver, ErrorKind::Name, &message, loc);
                Type::Error
            }
        }
    }

    fn check_this(&mut self, driver: &mut Driver, id: NodeId, loc: SourceLocation) -> Type {
        if self.symbols.current_class().is_none() {
            self.error(driver, ErrorKind::Name, "'this' outside of a method", loc);
            return Type::Error;
        }

        // `this` is declared as an implicit parameter of the method, so capture analysis and
        // the register allocator treat it like any other name.
        let Some(symbol) = self.symbols.resolve("this") else {
            self.error(driver, ErrorKind::Name, "'this' outside of a method", loc);
            return Type::Error;
        };

        let ty = symbol.ty.clone();
        let owner_ctx = symbol.ctx;
        self.record_access(id, "this", owner_ctx);

        ty
    }

    fn check_unary(
        &mut self,
        driver: &mut Driver,
        op: AstUnaryOp,
        operand: &AstExpression,
        loc: SourceLocation,
    ) -> Type {
        let ty = self.check_expression(driver, operand);

        match op {
            AstUnaryOp::Negate => {
                if ty.is_numeric() || ty.is_error() {
                    ty
                } else {
                    let message = format!("Unary '-' requires a numeric operand, found '{ty}'");
                    self.error(driver, ErrorKind::Type, &message, loc);
                    Type::Error
                }
            }

            AstUnaryOp::LogicalNot => {
                if ty != Type::Boolean && !ty.is_error() {
                    let message = format!("Unary '!' requires a boolean operand, found '{ty}'");
                    self.error(driver, ErrorKind::Type, &message, loc);
                }
                Type::Boolean
            }
        }
    }

    fn check_binary(
        &mut self,
        driver: &mut Driver,
        op: AstBinaryOp,
        lhs: &AstExpression,
        rhs: &AstExpression,
        loc: SourceLocation,
    ) -> Type {
        let left = self.check_expression(driver, lhs);
        let right = self.check_expression(driver, rhs);

        match op {
            AstBinaryOp::Add => {
                // `+` is overloaded: string concatenation when either operand is a string.
                if left == Type::Str || right == Type::Str {
                    return Type::Str;
                }

                match types::promote(&left, &right) {
                    Some(ty) => ty,
                    None => {
                        self.binary_operand_error(driver, op, &left, &right, loc);
                        Type::Error
                    }
                }
            }

            AstBinaryOp::Subtract | AstBinaryOp::Multiply | AstBinaryOp::Divide | AstBinaryOp::Remainder => {
                match types::promote(&left, &right) {
                    Some(ty) => ty,
                    None => {
                        self.binary_operand_error(driver, op, &left, &right, loc);
                        Type::Error
                    }
                }
            }

            AstBinaryOp::EqualTo | AstBinaryOp::NotEqualTo => {
                if !types::are_assignable(&left, &right) && !types::are_assignable(&right, &left) {
                    let message = format!("Equality comparison between incompatible types ('{left}' and '{right}')");
                    self.error(driver, ErrorKind::Type, &message, loc);
                }
                Type::Boolean
            }

            AstBinaryOp::LessThan
            | AstBinaryOp::LessThanOrEqualTo
            | AstBinaryOp::GreaterThan
            | AstBinaryOp::GreaterThanOrEqualTo => {
                if (!left.is_numeric() && !left.is_error()) || (!right.is_numeric() && !right.is_error()) {
                    let message = format!("Ordering comparison requires numeric operands ('{left}' and '{right}')");
                    self.error(driver, ErrorKind::Type, &message, loc);
                }
                Type::Boolean
            }

            AstBinaryOp::LogicalAnd | AstBinaryOp::LogicalOr => {
                for (side, ty) in [("left", &left), ("right", &right)] {
                    if *ty != Type::Boolean && !ty.is_error() {
                        let message = format!("The {side} operand of '{op}' must be boolean, found '{ty}'");
                        self.error(driver, ErrorKind::Type, &message, loc);
                    }
                }
                Type::Boolean
            }
        }
    }

    fn binary_operand_error(
        &mut self,
        driver: &mut Driver,
        op: AstBinaryOp,
        left: &Type,
        right: &Type,
        loc: SourceLocation,
    ) {
        let message = format!("Invalid operand types in binary '{op}' ('{left}' and '{right}')");
        self.error(driver, ErrorKind::Type, &message, loc);
    }

    fn check_assignment(
        &mut self,
        driver: &mut Driver,
        target: &AstExpression,
        value: &AstExpression,
        loc: SourceLocation,
    ) -> Type {
        let value_type = self.check_expression(driver, value);

        if !target.is_lvalue() {
            self.error(driver, ErrorKind::Type, "Expression is not assignable (must be an l-value)", loc);
            return Type::Error;
        }

        let target_type = match target {
            AstExpression::Identifier { id, name, loc: target_loc } => {
                let Some(symbol) = self.symbols.resolve(name) else {
                    let message = format!("Undeclared name '{name}'");
                    self.error(driver, ErrorKind::Name, &message, *target_loc);
                    return Type::Error;
                };

                let kind = symbol.kind;
                let is_const = symbol.is_const;
                let ty = symbol.ty.clone();
                let owner_ctx = symbol.ctx;

                match kind {
                    SymbolKind::Variable | SymbolKind::Parameter => {
                        self.record_access(*id, name, owner_ctx);
                        ty
                    }
                    SymbolKind::Constant => {
                        debug_assert!(is_const);
                        let message = format!("Cannot reassign const '{name}'");
                        self.error(driver, ErrorKind::Type, &message, *target_loc);
                        return Type::Error;
                    }
                    _ => {
                        let message = format!("'{name}' is not assignable");
                        self.error(driver, ErrorKind::Type, &message, *target_loc);
                        return Type::Error;
                    }
                }
            }

            AstExpression::Member { id, object, member, loc: member_loc } => {
                self.check_member_target(driver, *id, object, member, *member_loc)
            }

            AstExpression::Index { array, index, loc: index_loc, id: _ } => {
                self.check_index(driver, array, index, *index_loc)
            }

            _ => return Type::Error, // is_lvalue() excludes everything else
        };

        self.analysis.node_types.insert(target.id(), target_type.clone());

        if !types::are_assignable(&value_type, &target_type) {
            let message = format!("Incompatible assignment: {target_type} = {value_type}");
            self.error(driver, ErrorKind::Type, &message, loc);
        }

        target_type
    }

    /// Checks a field access used as an assignment target and records its resolution.
    fn check_member_target(
        &mut self,
        driver: &mut Driver,
        id: NodeId,
        object: &AstExpression,
        member: &str,
        loc: SourceLocation,
    ) -> Type {
        let object_type = self.check_expression(driver, object);

        let Type::Class(class_name) = &object_type else {
            if !object_type.is_error() {
                let message = format!("Field access on non-object type '{object_type}'");
                self.error(driver, ErrorKind::Name, &message, loc);
            }
            return Type::Error;
        };

        match self.analysis.classes.resolve_field(class_name, member) {
            Some(field) => {
                self.analysis.member_refs.insert(id, MemberRef { owner: field.owner, field: member.to_string() });
                field.ty
            }
            None => {
                if self.analysis.classes.resolve_method(class_name, member).is_some() {
                    let message = format!("Cannot assign to method '{member}'");
                    self.error(driver, ErrorKind::Type, &message, loc);
                } else {
                    let message = format!("No member '{member}' on class '{class_name}'");
                    self.error(driver, ErrorKind::Name, &message, loc);
                }
                Type::Error
            }
        }
    }

    fn check_call(
        &mut self,
        driver: &mut Driver,
        id: NodeId,
        callee: &AstExpression,
        args: &[AstExpression],
        loc: SourceLocation,
    ) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.check_expression(driver, arg)).collect();

        match callee {
            // Free (or nested) function call.
            AstExpression::Identifier { name, loc: callee_loc, .. } => {
                let Some((kind, fn_ctx, fn_type)) =
                    self.symbols.resolve(name).map(|s| (s.kind, s.fn_ctx, s.ty.clone()))
                else {
                    let message = format!("Undeclared name '{name}'");
                    self.error(driver, ErrorKind::Name, &message, *callee_loc);
                    return Type::Error;
                };

                if kind != SymbolKind::Function {
                    let message = format!("'{name}' is not a function");
                    self.error(driver, ErrorKind::Name, &message, *callee_loc);
                    return Type::Error;
                }

                let Some(ctx) = fn_ctx else {
                    crate::ICE!("Function symbol '{name}' has no context");
                };

                let Type::Function { params, ret } = fn_type else {
                    crate::ICE!("Function symbol '{name}' has a non-function type");
                };

                self.check_call_args(driver, name, &params, &arg_types, loc);
                self.analysis.call_targets.insert(id, CallTarget::Function { ctx });
                self.call_edges.push((self.current_ctx(), ctx));

                (*ret).clone()
            }

            // Method call: statically resolved against the receiver's declared class.
            AstExpression::Member { object, member, loc: member_loc, .. } => {
                let object_type = self.check_expression(driver, object);

                let Type::Class(class_name) = &object_type else {
                    if !object_type.is_error() {
                        let message = format!("Method call on non-object type '{object_type}'");
                        self.error(driver, ErrorKind::Name, &message, *member_loc);
                    }
                    return Type::Error;
                };

                let Some(method) = self.analysis.classes.resolve_method(class_name, member) else {
                    if self.analysis.classes.resolve_field(class_name, member).is_some() {
                        let message = format!("Member '{member}' of class '{class_name}' is a field, not a method");
                        self.error(driver, ErrorKind::Name, &message, *member_loc);
                    } else {
                        let message = format!("No method '{member}' on class '{class_name}'");
                        self.error(driver, ErrorKind::Name, &message, *member_loc);
                    }
                    return Type::Error;
                };

                self.check_call_args(driver, member, &method.params, &arg_types, loc);
                self.analysis.call_targets.insert(id, CallTarget::Method { ctx: method.ctx });
                self.call_edges.push((self.current_ctx(), method.ctx));

                method.ret
            }

            _ => {
                self.error(driver, ErrorKind::Name, "Calling a non-function", loc);
                Type::Error
            }
        }
    }

    fn check_call_args(
        &mut self,
        driver: &mut Driver,
        callee: &str,
        params: &[Type],
        args: &[Type],
        loc: SourceLocation,
    ) {
        if params.len() != args.len() {
            let message =
                format!("'{callee}' expects {} argument(s), but {} were provided", params.len(), args.len());
            self.error(driver, ErrorKind::Type, &message, loc);
            return;
        }

        for (i, (param, arg)) in params.iter().zip(args).enumerate() {
            if !types::are_assignable(arg, param) {
                let message = format!("Argument {} of '{callee}': expected '{param}', found '{arg}'", i + 1);
                self.error(driver, ErrorKind::Type, &message, loc);
            }
        }
    }

    fn check_index(
        &mut self,
        driver: &mut Driver,
        array: &AstExpression,
        index: &AstExpression,
        loc: SourceLocation,
    ) -> Type {
        let array_type = self.check_expression(driver, array);
        let index_type = self.check_expression(driver, index);

        if index_type != Type::Integer && !index_type.is_error() {
            let message = format!("Array index must be an integer, found '{index_type}'");
            self.error(driver, ErrorKind::Type, &message, loc);
        }

        match array_type.element_type() {
            Some(element) => element.clone(),
            None => {
                if !array_type.is_error() {
                    let message = format!("Cannot index non-array type '{array_type}'");
                    self.error(driver, ErrorKind::Name, &message, loc);
                }
                Type::Error
            }
        }
    }

    fn check_member(
        &mut self,
        driver: &mut Driver,
        id: NodeId,
        object: &AstExpression,
        member: &str,
        loc: SourceLocation,
    ) -> Type {
        let object_type = self.check_expression(driver, object);

        let Type::Class(class_name) = &object_type else {
            if !object_type.is_error() {
                let message = format!("Field access on non-object type '{object_type}'");
                self.error(driver, ErrorKind::Name, &message, loc);
            }
            return Type::Error;
        };

        match self.analysis.classes.resolve_field(class_name, member) {
            Some(field) => {
                self.analysis.member_refs.insert(id, MemberRef { owner: field.owner, field: member.to_string() });
                field.ty
            }
            None => {
                if self.analysis.classes.resolve_method(class_name, member).is_some() {
                    let message = format!("Method '{member}' is not a value; call it instead");
                    self.error(driver, ErrorKind::Type, &message, loc);
                } else {
                    let message = format!("No member '{member}' on class '{class_name}'");
                    self.error(driver, ErrorKind::Name, &message, loc);
                }
                Type::Error
            }
        }
    }

    // ---------------- Captures and access resolution ----------------

    /// Records a variable access. When the owning context differs from the current one, the
    /// variable is captured: it becomes a field of the owner's environment record, and every
    /// context on the chain between them must receive and forward the environment.
    fn record_access(&mut self, id: NodeId, name: &str, owner_ctx: usize) {
        let current = self.current_ctx();

        if owner_ctx != current {
            let ty = self
                .symbols
                .resolve(name)
                .map(|s| s.ty.clone())
                .unwrap_or(Type::Error);

            let captured = &mut self.analysis.contexts[owner_ctx].captured;
            if !captured.iter().any(|(n, _)| n == name) {
                captured.push((name.to_string(), ty));
            }

            let mut ctx = current;
            while ctx != owner_ctx {
                self.analysis.contexts[ctx].takes_env = true;
                ctx = match self.analysis.contexts[ctx].parent {
                    Some(parent) => parent,
                    None => crate::ICE!("Capture of '{name}' does not resolve through the context chain"),
                };
            }
        }

        self.pending_accesses.push((id, PendingAccess { name: name.to_string(), owner_ctx }));
    }

    /// Propagates environment forwarding along the call graph.
    ///
    /// A caller of a function that takes an environment record must be able to produce that
    /// record: every context on the chain from the caller up to the callee's defining context
    /// must itself receive (and forward) the environment. Marking a caller can in turn affect
    /// its own callers, so this iterates to a fixpoint.
    fn propagate_env_forwarding(&mut self) {
        loop {
            let mut changed = false;

            for &(caller, callee) in &self.call_edges {
                if !self.analysis.contexts[callee].takes_env {
                    continue;
                }

                let defining = match self.analysis.contexts[callee].parent {
                    Some(parent) => parent,
                    None => continue,
                };

                let mut ctx = caller;
                while ctx != defining {
                    if !self.analysis.contexts[ctx].takes_env {
                        self.analysis.contexts[ctx].takes_env = true;
                        changed = true;
                    }
                    ctx = match self.analysis.contexts[ctx].parent {
                        Some(parent) => parent,
                        None => break,
                    };
                }
            }

            if !changed {
                break;
            }
        }
    }

    /// Converts the pending accesses into final [VarAccess] entries, now that every capture in
    /// the program is known. An access recorded before the capturing nested function was even
    /// declared still resolves to the environment field.
    fn finalize_accesses(&mut self) {
        for (id, pending) in std::mem::take(&mut self.pending_accesses) {
            let captured =
                self.analysis.contexts[pending.owner_ctx].captured.iter().any(|(name, _)| *name == pending.name);

            let access = if captured {
                VarAccess::Captured { owner_ctx: pending.owner_ctx }
            } else {
                VarAccess::Direct
            };

            self.analysis.var_access.insert(id, access);
        }
    }

    // ---------------- Helpers ----------------

    fn current_ctx(&self) -> usize {
        *self.context_stack.last().expect("context stack is never empty")
    }

    fn pop_scope(&mut self) {
        let dump = self.symbols.exit_scope();
        self.scope_dumps.push_str(&dump);
    }

    fn resolve_type(&mut self, driver: &mut Driver, type_name: &AstTypeName, loc: SourceLocation) -> Type {
        match type_name {
            AstTypeName::Integer => Type::Integer,
            AstTypeName::Float => Type::Float,
            AstTypeName::Boolean => Type::Boolean,
            AstTypeName::Str => Type::Str,
            AstTypeName::Void => Type::Void,
            AstTypeName::Array(element) => Type::array_of(self.resolve_type(driver, element, loc)),
            AstTypeName::Class(name) => {
                if self.analysis.classes.contains(name) {
                    Type::Class(name.clone())
                } else {
                    let message = format!("Unknown type '{name}'");
                    self.error(driver, ErrorKind::Name, &message, loc);
                    Type::Error
                }
            }
        }
    }

    /// Resolves a type without emitting diagnostics (used where signature collection already
    /// reported the problem).
    fn resolve_type_quiet(&self, type_name: &AstTypeName) -> Type {
        match type_name {
            AstTypeName::Integer => Type::Integer,
            AstTypeName::Float => Type::Float,
            AstTypeName::Boolean => Type::Boolean,
            AstTypeName::Str => Type::Str,
            AstTypeName::Void => Type::Void,
            AstTypeName::Array(element) => Type::array_of(self.resolve_type_quiet(element)),
            AstTypeName::Class(name) => {
                if self.analysis.classes.contains(name) { Type::Class(name.clone()) } else { Type::Error }
            }
        }
    }

    fn error(&mut self, driver: &mut Driver, kind: ErrorKind, message: &str, loc: SourceLocation) {
        driver.add_diagnostic(Diagnostic::error(kind, message.to_string(), loc));
    }
}

/// The source location of a block item, for unreachable-code diagnostics.
fn item_location(item: &AstBlockItem) -> SourceLocation {
    match item {
        AstBlockItem::Statement(stmt) => statement_location(stmt),
        AstBlockItem::Declaration(AstDeclaration::Variable(decl)) => decl.loc,
        AstBlockItem::Declaration(AstDeclaration::Function(function)) => function.loc,
        AstBlockItem::Declaration(AstDeclaration::Class(class)) => class.loc,
    }
}

fn statement_location(stmt: &AstStatement) -> SourceLocation {
    match stmt {
        AstStatement::Expression(expr) => expr.location(),
        AstStatement::If { condition, .. } => condition.location(),
        AstStatement::While { condition, .. } => condition.location(),
        AstStatement::DoWhile { condition, .. } => condition.location(),
        AstStatement::For { body, .. } => block_location(body),
        AstStatement::Foreach { loc, .. } => *loc,
        AstStatement::Break { loc } => *loc,
        AstStatement::Continue { loc } => *loc,
        AstStatement::Return { loc, .. } => *loc,
        AstStatement::Print { loc, .. } => *loc,
        AstStatement::Block(block) => block_location(block),
    }
}

fn block_location(block: &AstBlock) -> SourceLocation {
    block.0.first().map(item_location).unwrap_or_else(SourceLocation::none)
}
