// Copyright 2025-2026 Neil Henderson
//
//! The `analysis` module defines [Analysis], the frozen output of semantic analysis.
//!
//! The AST itself stays immutable; sema attaches its results to node IDs in side tables. IR
//! generation reads the analysis and never mutates it.

use std::collections::HashMap;

use crate::ICE;
use crate::parser::NodeId;

use super::class_registry::ClassRegistry;
use super::types::Type;

/// The index of the synthetic context for top-level code (the `main` body).
pub const GLOBAL_CONTEXT: usize = 0;

/// One function context: the body of a function or method, or the top-level program code.
///
/// Contexts form a tree through `parent`, mirroring lexical function nesting. Capture analysis
/// fills `captured` (this context's variables that some nested function reads or writes) and
/// `takes_env` (this context receives its parent's environment record as an implicit first
/// argument).
#[derive(Debug, Clone)]
pub struct ContextInfo {
    /// Qualified name: `main`, `fact`, `outer.inner`, `P.sum`.
    pub label: String,

    /// Nesting depth; the global context is 0.
    pub depth: usize,

    /// Parent context, None for the global context.
    pub parent: Option<usize>,

    /// Parameter names in order, excluding implicit ones (`this`, the environment record).
    pub params: Vec<String>,

    /// The receiver class when this context is a method body.
    pub method_of: Option<String>,

    pub return_type: Type,

    /// Variables of this context promoted to environment-record fields, in declaration order.
    pub captured: Vec<(String, Type)>,

    /// Does this context receive its defining context's environment record?
    pub takes_env: bool,
}

impl ContextInfo {
    /// The name of this context's synthesized environment class.
    pub fn env_class(&self) -> String {
        format!("__env_{}", self.label)
    }

    /// The label mangled for MIPS (qualified names carry '.', which assemblers reject).
    pub fn mangled_label(&self) -> String {
        self.label.replace('.', "_")
    }
}

/// How a name reference reaches its variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarAccess {
    /// The variable lives in the current function context; quadruples carry its name directly.
    Direct,

    /// The variable was promoted to a field of its owning context's environment record.
    Captured { owner_ctx: usize },
}

/// A resolved field reference on a `Member` expression node.
#[derive(Debug, Clone)]
pub struct MemberRef {
    /// The class that declares the field (after walking the inheritance chain).
    pub owner: String,
    pub field: String,
}

impl MemberRef {
    /// The class-qualified token carried in quadruples, e.g. `P.x`.
    pub fn token(&self) -> String {
        format!("{}.{}", self.owner, self.field)
    }
}

/// The statically resolved target of a `Call` expression node.
#[derive(Debug, Clone)]
pub enum CallTarget {
    /// A free (or nested) function; `ctx` indexes into [Analysis::contexts].
    Function { ctx: usize },

    /// A method, statically resolved against the receiver's declared class; `ctx` is the
    /// method body's context.
    Method { ctx: usize },
}

/// The frozen result of semantic analysis.
#[derive(Debug, Default)]
pub struct Analysis {
    pub(super) node_types: HashMap<NodeId, Type>,
    pub(super) var_access: HashMap<NodeId, VarAccess>,
    pub(super) member_refs: HashMap<NodeId, MemberRef>,
    pub(super) call_targets: HashMap<NodeId, CallTarget>,

    pub classes: ClassRegistry,
    pub contexts: Vec<ContextInfo>,

    /// Maps a function declaration's node ID to its body's context index.
    pub(super) fn_contexts: HashMap<NodeId, usize>,

    pub(super) scope_dump: String,
}

impl Analysis {
    /// The type attached to an expression (or declaration) node.
    pub fn node_type(&self, id: NodeId) -> &Type {
        match self.node_types.get(&id) {
            Some(ty) => ty,
            None => ICE!("No type recorded for node {id}"),
        }
    }

    /// Like [Analysis::node_type], for nodes that may not have been typed (error recovery).
    pub fn try_node_type(&self, id: NodeId) -> Option<&Type> {
        self.node_types.get(&id)
    }

    /// The access path for a name reference or variable binding.
    pub fn var_access(&self, id: NodeId) -> &VarAccess {
        match self.var_access.get(&id) {
            Some(access) => access,
            None => ICE!("No access recorded for node {id}"),
        }
    }

    /// The resolved field for a `Member` expression node.
    pub fn member_ref(&self, id: NodeId) -> &MemberRef {
        match self.member_refs.get(&id) {
            Some(member) => member,
            None => ICE!("No member resolution recorded for node {id}"),
        }
    }

    /// The resolved target for a `Call` expression node.
    pub fn call_target(&self, id: NodeId) -> &CallTarget {
        match self.call_targets.get(&id) {
            Some(target) => target,
            None => ICE!("No call target recorded for node {id}"),
        }
    }

    /// The context for a function declaration node.
    pub fn fn_context(&self, id: NodeId) -> usize {
        match self.fn_contexts.get(&id) {
            Some(ctx) => *ctx,
            None => ICE!("No context recorded for function node {id}"),
        }
    }

    /// The printable scope dump, for `--print-symbols`.
    pub fn scope_dump(&self) -> &str {
        &self.scope_dump
    }
}
