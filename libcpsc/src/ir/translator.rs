// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `translator` module lowers the typed AST into the quadruple stream.
//!
//! Top-level statements form the `main` body; every function and method body (nested functions
//! included) is lowered into its own `BEGIN_FUNC`/`END_FUNC` block appended after it, so the
//! final stream never nests function definitions. Captured variables are rewritten as fields of
//! synthesized environment records, per the closure flattening design.

use std::collections::HashMap;

use crate::ICE;
use crate::parser::{
    AstBlockItem, AstBinaryOp, AstClassMember, AstDeclaration, AstExpression, AstFunction, AstProgram, AstStatement,
    AstUnaryOp, AstVariableDecl, NodeId,
};
use crate::sema::{Analysis, CallTarget, VarAccess, GLOBAL_CONTEXT};
use crate::sema::types::Type;

use super::label_maker::{LabelMaker, LoopLabels, LoopStack};
use super::quadruple::{QuadOp, Quadruple, QuadrupleList};
use super::temp_maker::TempMaker;

/// The local name holding the current function's own environment record.
const ENV_LOCAL: &str = "__env";

/// The implicit parameter holding the defining context's environment record.
const ENV_PARAM: &str = "__envp";

/// Member layout tables for the backend: class-qualified field tokens to word offsets, and
/// class names to object sizes in words. Includes the synthesized environment records.
#[derive(Debug, Default, Clone)]
pub struct MemberLayouts {
    pub field_offsets: HashMap<String, usize>,
    pub class_sizes: HashMap<String, usize>,
}

/// The IR artifact handed to the backend: the flat quadruple stream plus the side tables the
/// emitter needs (member layouts and per-function parameter lists).
#[derive(Debug)]
pub struct IrProgram {
    pub quads: Vec<Quadruple>,
    pub layouts: MemberLayouts,

    /// Function label to parameter names in argument order, implicit parameters (`this`, the
    /// environment record) included.
    pub frames: HashMap<String, Vec<String>>,
}

/// The translator holds the state for lowering one program.
pub struct Translator<'a> {
    analysis: &'a Analysis,
    labels: LabelMaker,
    temps: TempMaker,
    loops: LoopStack,

    /// The context currently being lowered.
    ctx: usize,

    /// Per context: does it allocate an environment record of its own?
    has_env: Vec<bool>,

    /// The emission buffer of the body currently being lowered.
    out: QuadrupleList,

    /// Finished function blocks, appended after the main body.
    fn_blocks: Vec<QuadrupleList>,

    frames: HashMap<String, Vec<String>>,

    /// Counter for synthesized loop locals (`__arr0`, `__len0`, `__idx0`).
    hidden_counter: usize,
}

impl<'a> Translator<'a> {
    /// Creates a translator over the frozen analysis.
    pub fn new(analysis: &'a Analysis) -> Self {
        // A context owns an environment record when it has captured variables, or when a
        // directly nested context needs to receive one (possibly just to climb through).
        let has_env = (0..analysis.contexts.len())
            .map(|i| {
                !analysis.contexts[i].captured.is_empty()
                    || analysis.contexts.iter().any(|c| c.parent == Some(i) && c.takes_env)
            })
            .collect();

        Self {
            analysis,
            labels: LabelMaker::new(),
            temps: TempMaker::new(),
            loops: LoopStack::new(),
            ctx: GLOBAL_CONTEXT,
            has_env,
            out: QuadrupleList::new(),
            fn_blocks: Vec::new(),
            frames: HashMap::new(),
            hidden_counter: 0,
        }
    }

    /// Lowers the whole program and returns the IR artifact.
    pub fn translate_program(mut self, program: &AstProgram) -> IrProgram {
        self.emit_env_prologue();

        for item in &program.0 {
            self.lower_block_item(item);
        }

        let layouts = self.build_layouts();

        let mut quads = self.out;
        for block in self.fn_blocks {
            quads.append(block);
        }

        IrProgram { quads: quads.into_vec(), layouts, frames: self.frames }
    }

    // ---------------- Functions ----------------

    /// Lowers a function (or method) body into its own `BEGIN_FUNC`/`END_FUNC` block.
    fn translate_function(&mut self, function: &AstFunction) {
        let ctx = self.analysis.fn_context(function.id);
        let info = &self.analysis.contexts[ctx];
        let label = info.label.clone();

        // Function bodies never interleave with the enclosing body's quadruples: swap in a
        // fresh buffer and fresh per-function state, and restore the enclosing state after.
        let saved_out = std::mem::take(&mut self.out);
        let saved_temps = std::mem::take(&mut self.temps);
        let saved_loops = std::mem::take(&mut self.loops);
        let saved_ctx = self.ctx;
        let saved_hidden = self.hidden_counter;

        self.ctx = ctx;
        self.hidden_counter = 0;

        self.out.emit(QuadOp::BeginFunc, label.clone(), None, None);

        // Record the parameter binding order for the backend: receiver first, then the
        // environment record, then the declared parameters.
        let mut params = Vec::new();
        if info.method_of.is_some() {
            params.push("this".to_string());
        }
        if info.takes_env {
            params.push(ENV_PARAM.to_string());
        }
        params.extend(info.params.iter().cloned());
        self.frames.insert(label.clone(), params);

        self.emit_env_prologue();

        for item in &function.body.0 {
            self.lower_block_item(item);
        }

        // A body whose last statement is not a return gets the implicit void return.
        if !matches!(self.out.last(), Some(Quadruple { op: QuadOp::Return, .. })) {
            self.out.emit(QuadOp::Return, None, None, None);
        }

        self.out.emit(QuadOp::EndFunc, label, None, None);

        let block = std::mem::replace(&mut self.out, saved_out);
        self.fn_blocks.push(block);

        self.temps = saved_temps;
        self.loops = saved_loops;
        self.ctx = saved_ctx;
        self.hidden_counter = saved_hidden;
    }

    /// Allocates and fills the current context's environment record, when it has one.
    fn emit_env_prologue(&mut self) {
        if !self.has_env[self.ctx] {
            return;
        }

        let info = &self.analysis.contexts[self.ctx];
        let env_class = info.env_class();

        let t = self.temps.new_temp();
        self.out.emit(QuadOp::New, env_class.clone(), None, t.clone());
        self.out.emit(QuadOp::Assign, t, None, ENV_LOCAL.to_string());

        // Chain to the received environment, so nested functions can climb past this one.
        if info.takes_env {
            self.out.emit(
                QuadOp::SetField,
                ENV_PARAM.to_string(),
                ENV_LOCAL.to_string(),
                format!("{env_class}.__up"),
            );
        }

        // Captured parameters (including `this`) are copied into the record at entry; every
        // later access goes through the record.
        for (name, _) in &info.captured {
            let is_param =
                info.params.iter().any(|p| p == name) || (name == "this" && info.method_of.is_some());

            if is_param {
                self.out.emit(QuadOp::SetField, name.clone(), ENV_LOCAL.to_string(), format!("{env_class}.{name}"));
            }
        }

        self.temps.recycle_statement();
    }

    // ---------------- Statements ----------------

    fn lower_block_item(&mut self, item: &AstBlockItem) {
        match item {
            AstBlockItem::Statement(stmt) => self.lower_statement(stmt),

            AstBlockItem::Declaration(AstDeclaration::Variable(decl)) => self.lower_variable_decl(decl),

            AstBlockItem::Declaration(AstDeclaration::Function(function)) => self.translate_function(function),

            AstBlockItem::Declaration(AstDeclaration::Class(class)) => {
                for member in &class.members {
                    if let AstClassMember::Method(method) = member {
                        self.translate_function(method);
                    }
                }
            }
        }
    }

    /// Declarations assign the initializer (or the type's default value) into the variable.
    fn lower_variable_decl(&mut self, decl: &AstVariableDecl) {
        let value = match &decl.initializer {
            Some(initializer) => self.lower_expression(initializer),
            None => self.analysis.node_type(decl.id).default_value_token().to_string(),
        };

        self.write_variable(&decl.name, decl.id, value);
        self.temps.recycle_statement();
    }

    fn lower_statement(&mut self, stmt: &AstStatement) {
        match stmt {
            AstStatement::Expression(expr) => {
                match expr {
                    // A bare call may be void; don't demand a result token.
                    AstExpression::Call { .. } => {
                        self.lower_call(expr);
                    }
                    _ => {
                        self.lower_expression(expr);
                    }
                }
                self.temps.recycle_statement();
            }

            AstStatement::If { condition, then_block, else_block } => {
                let end_label = self.labels.new_label("IF_END");

                let condition_token = self.lower_expression(condition);

                match else_block {
                    Some(else_block) => {
                        let else_label = self.labels.new_label("ELSE");
                        self.out.emit(QuadOp::IfFalse, condition_token, else_label.clone(), None);
                        self.temps.recycle_statement();

                        self.lower_block_items(&then_block.0);
                        self.out.emit(QuadOp::Goto, end_label.clone(), None, None);

                        self.out.emit(QuadOp::Label, else_label, None, None);
                        self.lower_block_items(&else_block.0);
                    }
                    None => {
                        self.out.emit(QuadOp::IfFalse, condition_token, end_label.clone(), None);
                        self.temps.recycle_statement();

                        self.lower_block_items(&then_block.0);
                    }
                }

                self.out.emit(QuadOp::Label, end_label, None, None);
            }

            AstStatement::While { condition, body } => {
                let start = self.labels.new_label("WHILE");
                let end = self.labels.new_label("WHILE");

                // The condition is re-evaluated at the loop head, so `continue` jumps there.
                self.loops.push(LoopLabels { start: start.clone(), end: end.clone(), continue_label: start.clone() });

                self.out.emit(QuadOp::Label, start.clone(), None, None);

                let condition_token = self.lower_expression(condition);
                self.out.emit(QuadOp::IfFalse, condition_token, end.clone(), None);
                self.temps.recycle_statement();

                self.lower_block_items(&body.0);

                self.out.emit(QuadOp::Goto, start, None, None);
                self.out.emit(QuadOp::Label, end, None, None);

                self.loops.pop();
            }

            AstStatement::DoWhile { body, condition } => {
                let start = self.labels.new_label("DOWHILE");
                let end = self.labels.new_label("DOWHILE");
                let continue_label = self.labels.new_label("DOWHILE");

                self.loops.push(LoopLabels {
                    start: start.clone(),
                    end: end.clone(),
                    continue_label: continue_label.clone(),
                });

                self.out.emit(QuadOp::Label, start.clone(), None, None);

                self.lower_block_items(&body.0);

                self.emit_label_if_referenced(continue_label);
                let condition_token = self.lower_expression(condition);
                self.out.emit(QuadOp::IfTrue, condition_token, start, None);
                self.temps.recycle_statement();

                self.emit_label_if_referenced(end);

                self.loops.pop();
            }

            AstStatement::For { init, condition, update, body } => {
                if let Some(init) = init {
                    self.lower_block_item(init);
                }

                let start = self.labels.new_label("FOR");
                let end = self.labels.new_label("FOR");
                let continue_label = self.labels.new_label("FOR");

                self.loops.push(LoopLabels {
                    start: start.clone(),
                    end: end.clone(),
                    continue_label: continue_label.clone(),
                });

                self.out.emit(QuadOp::Label, start.clone(), None, None);

                if let Some(condition) = condition {
                    let condition_token = self.lower_expression(condition);
                    self.out.emit(QuadOp::IfFalse, condition_token, end.clone(), None);
                    self.temps.recycle_statement();
                }

                self.lower_block_items(&body.0);

                self.emit_label_if_referenced(continue_label);

                if let Some(update) = update {
                    self.lower_expression(update);
                    self.temps.recycle_statement();
                }

                self.out.emit(QuadOp::Goto, start, None, None);
                self.emit_label_if_referenced(end);

                self.loops.pop();
            }

            AstStatement::Foreach { id, var_name, iterable, body, .. } => self.lower_foreach(*id, var_name, iterable, body),

            AstStatement::Break { .. } => {
                let Some(label) = self.loops.break_label() else {
                    ICE!("'break' survived semantic analysis outside a loop");
                };
                self.out.emit(QuadOp::Goto, label.to_string(), None, None);
            }

            AstStatement::Continue { .. } => {
                let Some(label) = self.loops.continue_label() else {
                    ICE!("'continue' survived semantic analysis outside a loop");
                };
                self.out.emit(QuadOp::Goto, label.to_string(), None, None);
            }

            AstStatement::Return { value, .. } => {
                let token = value.as_ref().map(|v| self.lower_expression(v));
                self.out.emit(QuadOp::Return, token, None, None);
                self.temps.recycle_statement();
            }

            AstStatement::Print { value, .. } => {
                let token = self.lower_expression(value);
                self.out.emit(QuadOp::Print, token, None, None);
                self.temps.recycle_statement();
            }

            AstStatement::Block(block) => self.lower_block_items(&block.0),
        }
    }

    fn lower_block_items(&mut self, items: &[AstBlockItem]) {
        for item in items {
            self.lower_block_item(item);
        }
    }

    /// Foreach iterates by index over the array's runtime length.
    ///
    /// The array, length and index live in synthesized locals (not temporaries) because their
    /// values span every statement of the loop body.
    fn lower_foreach(&mut self, id: NodeId, var_name: &str, iterable: &AstExpression, body: &crate::parser::AstBlock) {
        let array = self.hidden_name("arr");
        let length = self.hidden_name("len");
        let index = self.hidden_name("idx");

        let iterable_token = self.lower_expression(iterable);
        self.out.emit(QuadOp::Assign, iterable_token, None, array.clone());
        self.out.emit(QuadOp::ArrayLen, array.clone(), None, length.clone());
        self.out.emit(QuadOp::Assign, "0".to_string(), None, index.clone());
        self.temps.recycle_statement();

        let start = self.labels.new_label("FOREACH");
        let end = self.labels.new_label("FOREACH");
        let continue_label = self.labels.new_label("FOREACH");

        self.loops.push(LoopLabels { start: start.clone(), end: end.clone(), continue_label: continue_label.clone() });

        self.out.emit(QuadOp::Label, start.clone(), None, None);

        let condition = self.temps.new_temp();
        self.out.emit(QuadOp::Lt, index.clone(), length, condition.clone());
        self.out.emit(QuadOp::IfFalse, condition, end.clone(), None);
        self.temps.recycle_statement();

        // Bind the iteration variable to the current element.
        match self.analysis.var_access(id) {
            VarAccess::Direct => {
                self.out.emit(QuadOp::ArrayLoad, array, index.clone(), var_name.to_string());
            }
            VarAccess::Captured { owner_ctx } => {
                let owner_ctx = *owner_ctx;
                let element = self.temps.new_temp();
                self.out.emit(QuadOp::ArrayLoad, array, index.clone(), element.clone());

                let base = self.env_token(owner_ctx);
                let field = format!("{}.{}", self.analysis.contexts[owner_ctx].env_class(), var_name);
                self.out.emit(QuadOp::SetField, element, base, field);
            }
        }
        self.temps.recycle_statement();

        self.lower_block_items(&body.0);

        self.emit_label_if_referenced(continue_label);
        self.out.emit(QuadOp::Add, index.clone(), "1".to_string(), index);
        self.out.emit(QuadOp::Goto, start, None, None);
        self.out.emit(QuadOp::Label, end, None, None);

        self.loops.pop();
    }

    // ---------------- Expressions ----------------

    /// Lowers an expression and returns the token holding its value.
    ///
    /// Literals and directly accessible names emit nothing and return their own token.
    fn lower_expression(&mut self, expr: &AstExpression) -> String {
        match expr {
            AstExpression::IntegerLiteral { literal, .. } => literal.clone(),
            AstExpression::FloatLiteral { literal, .. } => literal.clone(),
            AstExpression::StringLiteral { literal, .. } => literal.clone(),
            AstExpression::BooleanLiteral { value, .. } => if *value { "true" } else { "false" }.to_string(),
            AstExpression::NullLiteral { .. } => "null".to_string(),

            AstExpression::Identifier { id, name, .. } => self.read_variable(name, *id),

            AstExpression::This { id, .. } => self.read_variable("this", *id),

            AstExpression::ArrayLiteral { elements, .. } => {
                let array = self.temps.new_temp();
                self.out.emit(QuadOp::ArrayNew, elements.len().to_string(), None, array.clone());

                for (i, element) in elements.iter().enumerate() {
                    let value = self.lower_expression(element);
                    self.out.emit(QuadOp::ArrayStore, value, array.clone(), i.to_string());
                }

                array
            }

            AstExpression::New { class_name, .. } => {
                let object = self.temps.new_temp();
                self.out.emit(QuadOp::New, class_name.clone(), None, object.clone());
                object
            }

            AstExpression::Unary { op, operand, .. } => {
                let value = self.lower_expression(operand);
                let result = self.temps.new_temp();

                let quad_op = match op {
                    AstUnaryOp::Negate => QuadOp::Neg,
                    AstUnaryOp::LogicalNot => QuadOp::Not,
                };

                self.out.emit(quad_op, value, None, result.clone());
                result
            }

            AstExpression::Binary { op: AstBinaryOp::LogicalAnd, lhs, rhs, .. } => {
                self.lower_short_circuit(lhs, rhs, true)
            }

            AstExpression::Binary { op: AstBinaryOp::LogicalOr, lhs, rhs, .. } => {
                self.lower_short_circuit(lhs, rhs, false)
            }

            AstExpression::Binary { op, lhs, rhs, .. } => {
                let left = self.lower_expression(lhs);
                let right = self.lower_expression(rhs);
                let result = self.temps.new_temp();

                self.out.emit(binary_quad_op(*op), left, right, result.clone());
                result
            }

            AstExpression::Ternary { condition, then_expr, else_expr, .. } => {
                let result = self.temps.new_temp();
                let else_label = self.labels.new_label("TERN");
                let end_label = self.labels.new_label("TERN");

                let condition_token = self.lower_expression(condition);
                self.out.emit(QuadOp::IfFalse, condition_token, else_label.clone(), None);

                let then_token = self.lower_expression(then_expr);
                self.out.emit(QuadOp::Assign, then_token, None, result.clone());
                self.out.emit(QuadOp::Goto, end_label.clone(), None, None);

                self.out.emit(QuadOp::Label, else_label, None, None);
                let else_token = self.lower_expression(else_expr);
                self.out.emit(QuadOp::Assign, else_token, None, result.clone());

                self.out.emit(QuadOp::Label, end_label, None, None);
                result
            }

            AstExpression::Assignment { target, value, .. } => self.lower_assignment(target, value),

            AstExpression::Call { .. } => match self.lower_call(expr) {
                Some(result) => result,
                None => ICE!("A void call reached value position past semantic analysis"),
            },

            AstExpression::Index { array, index, .. } => {
                let array_token = self.lower_expression(array);
                let index_token = self.lower_expression(index);
                let result = self.temps.new_temp();

                self.out.emit(QuadOp::ArrayLoad, array_token, index_token, result.clone());
                result
            }

            AstExpression::Member { id, object, .. } => {
                let object_token = self.lower_expression(object);
                let result = self.temps.new_temp();
                let field = self.analysis.member_ref(*id).token();

                self.out.emit(QuadOp::GetField, object_token, field, result.clone());
                result
            }
        }
    }

    /// Short-circuit lowering for `&&` (`is_and`) and `||`.
    ///
    /// The result defaults to the short-circuit value, the right operand is only evaluated when
    /// the left does not decide, and a single label joins the two paths.
    fn lower_short_circuit(&mut self, lhs: &AstExpression, rhs: &AstExpression, is_and: bool) -> String {
        let result = self.temps.new_temp();
        let (prefix, default, branch) =
            if is_and { ("AND", "false", QuadOp::IfFalse) } else { ("OR", "true", QuadOp::IfTrue) };

        let end_label = self.labels.new_label(prefix);

        let left = self.lower_expression(lhs);
        self.out.emit(QuadOp::Assign, default.to_string(), None, result.clone());
        self.out.emit(branch, left, end_label.clone(), None);

        let right = self.lower_expression(rhs);
        self.out.emit(QuadOp::Assign, right, None, result.clone());

        self.out.emit(QuadOp::Label, end_label, None, None);
        result
    }

    fn lower_assignment(&mut self, target: &AstExpression, value: &AstExpression) -> String {
        let value_token = self.lower_expression(value);

        match target {
            AstExpression::Identifier { id, name, .. } => {
                self.write_variable(name, *id, value_token.clone());

                match self.analysis.var_access(*id) {
                    VarAccess::Direct => name.clone(),
                    VarAccess::Captured { .. } => value_token,
                }
            }

            AstExpression::Member { id, object, .. } => {
                let object_token = self.lower_expression(object);
                let field = self.analysis.member_ref(*id).token();
                self.out.emit(QuadOp::SetField, value_token.clone(), object_token, field);
                value_token
            }

            AstExpression::Index { array, index, .. } => {
                let array_token = self.lower_expression(array);
                let index_token = self.lower_expression(index);
                self.out.emit(QuadOp::ArrayStore, value_token.clone(), array_token, index_token);
                value_token
            }

            _ => ICE!("Invalid assignment target survived semantic analysis"),
        }
    }

    /// Lowers a call. Returns the result token, or None for a void call.
    ///
    /// Arguments are evaluated first; the `PARAM` quadruples are then emitted contiguously
    /// (environment record first, when the callee takes one) so the param group sits directly
    /// before its `CALL`.
    fn lower_call(&mut self, expr: &AstExpression) -> Option<String> {
        let AstExpression::Call { id, callee, args, .. } = expr else {
            ICE!("lower_call invoked on a non-call expression");
        };

        match self.analysis.call_target(*id) {
            CallTarget::Function { ctx } => {
                let ctx = *ctx;

                let arg_tokens: Vec<String> = args.iter().map(|a| self.lower_expression(a)).collect();

                let env_token = self.callee_env_token(ctx);

                let info = &self.analysis.contexts[ctx];
                let label = info.label.clone();
                let returns_value = info.return_type != Type::Void;

                let mut count = arg_tokens.len();
                if let Some(env) = env_token {
                    self.out.emit(QuadOp::Param, env, None, None);
                    count += 1;
                }
                for token in arg_tokens {
                    self.out.emit(QuadOp::Param, token, None, None);
                }

                let result = returns_value.then(|| self.temps.new_temp());
                self.out.emit(QuadOp::Call, label, count.to_string(), result.clone());
                result
            }

            CallTarget::Method { ctx } => {
                let ctx = *ctx;

                let AstExpression::Member { object, .. } = callee.as_ref() else {
                    ICE!("Method call without a member callee");
                };

                let object_token = self.lower_expression(object);
                let arg_tokens: Vec<String> = args.iter().map(|a| self.lower_expression(a)).collect();

                let env_token = self.callee_env_token(ctx);

                let info = &self.analysis.contexts[ctx];
                let label = info.label.clone();
                let returns_value = info.return_type != Type::Void;

                if let Some(env) = env_token {
                    self.out.emit(QuadOp::Param, env, None, None);
                }
                for token in arg_tokens {
                    self.out.emit(QuadOp::Param, token, None, None);
                }

                let result = returns_value.then(|| self.temps.new_temp());
                self.out.emit(QuadOp::CallMethod, object_token, label, result.clone());
                result
            }
        }
    }

    /// The environment token to pass to a callee, or None when it takes no environment.
    fn callee_env_token(&mut self, callee_ctx: usize) -> Option<String> {
        if !self.analysis.contexts[callee_ctx].takes_env {
            return None;
        }

        let Some(defining) = self.analysis.contexts[callee_ctx].parent else {
            ICE!("A context that takes an environment has no parent");
        };

        Some(self.env_token(defining))
    }

    // ---------------- Variable access ----------------

    /// Reads a variable, returning the token that holds its value.
    fn read_variable(&mut self, name: &str, id: NodeId) -> String {
        match self.analysis.var_access(id) {
            VarAccess::Direct => name.to_string(),

            VarAccess::Captured { owner_ctx } => {
                let owner_ctx = *owner_ctx;
                let base = self.env_token(owner_ctx);
                let field = format!("{}.{}", self.analysis.contexts[owner_ctx].env_class(), name);

                let result = self.temps.new_temp();
                self.out.emit(QuadOp::GetField, base, field, result.clone());
                result
            }
        }
    }

    /// Writes a value into a variable.
    fn write_variable(&mut self, name: &str, id: NodeId, value_token: String) {
        match self.analysis.var_access(id) {
            VarAccess::Direct => {
                self.out.emit(QuadOp::Assign, value_token, None, name.to_string());
            }

            VarAccess::Captured { owner_ctx } => {
                let owner_ctx = *owner_ctx;
                let base = self.env_token(owner_ctx);
                let field = format!("{}.{}", self.analysis.contexts[owner_ctx].env_class(), name);
                self.out.emit(QuadOp::SetField, value_token, base, field);
            }
        }
    }

    /// Returns a token holding the environment record of the given context, climbing the
    /// `__up` chain from the received environment when the owner is further out.
    fn env_token(&mut self, owner: usize) -> String {
        if owner == self.ctx {
            return ENV_LOCAL.to_string();
        }

        let Some(mut ctx) = self.analysis.contexts[self.ctx].parent else {
            ICE!("Environment access does not resolve through the context chain");
        };

        let mut token = ENV_PARAM.to_string();

        while ctx != owner {
            let env_class = self.analysis.contexts[ctx].env_class();
            let next = self.temps.new_temp();
            self.out.emit(QuadOp::GetField, token, format!("{env_class}.__up"), next.clone());
            token = next;

            ctx = match self.analysis.contexts[ctx].parent {
                Some(parent) => parent,
                None => ICE!("Environment access walked past the global context"),
            };
        }

        token
    }

    /// Emits a `LABEL` only when some jump in the current body targets it.
    ///
    /// Loop exit and continue labels are reference targets for `break`/`continue`; when a loop
    /// has neither, dropping the unreferenced marker keeps every emitted label live.
    fn emit_label_if_referenced(&mut self, label: String) {
        let referenced = self.out.iter().any(|q| q.is_jump() && q.label_operand() == Some(label.as_str()));

        if referenced {
            self.out.emit(QuadOp::Label, label, None, None);
        }
    }

    fn hidden_name(&mut self, kind: &str) -> String {
        let name = format!("__{kind}{}", self.hidden_counter);
        self.hidden_counter += 1;
        name
    }

    // ---------------- Layouts ----------------

    /// Combines the user classes with the synthesized environment records into the backend's
    /// member layout tables.
    fn build_layouts(&self) -> MemberLayouts {
        let mut field_offsets = self.analysis.classes.field_offsets();
        let mut class_sizes = self.analysis.classes.class_sizes();

        for (i, info) in self.analysis.contexts.iter().enumerate() {
            if !self.has_env[i] {
                continue;
            }

            let env_class = info.env_class();
            let mut offset = 0;

            for (name, _) in &info.captured {
                field_offsets.insert(format!("{env_class}.{name}"), offset);
                offset += 1;
            }

            if info.takes_env {
                field_offsets.insert(format!("{env_class}.__up"), offset);
                offset += 1;
            }

            class_sizes.insert(env_class, offset);
        }

        MemberLayouts { field_offsets, class_sizes }
    }
}

fn binary_quad_op(op: AstBinaryOp) -> QuadOp {
    match op {
        AstBinaryOp::Add => QuadOp::Add,
        AstBinaryOp::Subtract => QuadOp::Sub,
        AstBinaryOp::Multiply => QuadOp::Mul,
        AstBinaryOp::Divide => QuadOp::Div,
        AstBinaryOp::Remainder => QuadOp::Mod,
        AstBinaryOp::EqualTo => QuadOp::Eq,
        AstBinaryOp::NotEqualTo => QuadOp::Ne,
        AstBinaryOp::LessThan => QuadOp::Lt,
        AstBinaryOp::LessThanOrEqualTo => QuadOp::Le,
        AstBinaryOp::GreaterThan => QuadOp::Gt,
        AstBinaryOp::GreaterThanOrEqualTo => QuadOp::Ge,
        AstBinaryOp::LogicalAnd | AstBinaryOp::LogicalOr => {
            ICE!("Short-circuit operators lower through control flow, not a binary quadruple")
        }
    }
}
