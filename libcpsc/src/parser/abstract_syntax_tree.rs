// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `abstract_syntax_tree` module defines the AST node types produced by the parser.

use std::fmt;

use crate::core::SourceLocation;

/// Identifies an AST node.
///
/// Expression nodes and declarations carry a `NodeId` so that semantic analysis can attach
/// types and resolved accesses to them in side tables, leaving the tree itself immutable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A type as written in the source, before semantic resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstTypeName {
    Integer,
    Float,
    Boolean,
    Str,
    Void,
    Class(String),
    Array(Box<AstTypeName>),
}

impl fmt::Display for AstTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstTypeName::Integer => write!(f, "integer"),
            AstTypeName::Float => write!(f, "float"),
            AstTypeName::Boolean => write!(f, "boolean"),
            AstTypeName::Str => write!(f, "string"),
            AstTypeName::Void => write!(f, "void"),
            AstTypeName::Class(name) => write!(f, "{name}"),
            AstTypeName::Array(element) => write!(f, "{element}[]"),
        }
    }
}

/// Unary operator.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AstUnaryOp {
    Negate,
    LogicalNot,
}

/// Binary operator.
///
/// `&&` and `||` are listed here but lower through short-circuit control flow, not a plain
/// binary quadruple.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AstBinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LogicalAnd,
    LogicalOr,
}

impl fmt::Display for AstBinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstBinaryOp::Add => write!(f, "+"),
            AstBinaryOp::Subtract => write!(f, "-"),
            AstBinaryOp::Multiply => write!(f, "*"),
            AstBinaryOp::Divide => write!(f, "/"),
            AstBinaryOp::Remainder => write!(f, "%"),
            AstBinaryOp::EqualTo => write!(f, "=="),
            AstBinaryOp::NotEqualTo => write!(f, "!="),
            AstBinaryOp::LessThan => write!(f, "<"),
            AstBinaryOp::LessThanOrEqualTo => write!(f, "<="),
            AstBinaryOp::GreaterThan => write!(f, ">"),
            AstBinaryOp::GreaterThanOrEqualTo => write!(f, ">="),
            AstBinaryOp::LogicalAnd => write!(f, "&&"),
            AstBinaryOp::LogicalOr => write!(f, "||"),
        }
    }
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum AstExpression {
    IntegerLiteral { id: NodeId, literal: String, value: i64, loc: SourceLocation },

    /// The literal text is kept as written (decimal with a dot); the IR carries it verbatim.
    FloatLiteral { id: NodeId, literal: String, loc: SourceLocation },

    /// The literal includes its double quotes and unevaluated escape sequences.
    StringLiteral { id: NodeId, literal: String, loc: SourceLocation },

    BooleanLiteral { id: NodeId, value: bool, loc: SourceLocation },

    NullLiteral { id: NodeId, loc: SourceLocation },

    ArrayLiteral { id: NodeId, elements: Vec<AstExpression>, loc: SourceLocation },

    Identifier { id: NodeId, name: String, loc: SourceLocation },

    This { id: NodeId, loc: SourceLocation },

    /// `new C()`. Constructor arguments are rejected during semantic analysis; initialization
    /// is an explicit `init(...)` call.
    New { id: NodeId, class_name: String, args: Vec<AstExpression>, loc: SourceLocation },

    Unary { id: NodeId, op: AstUnaryOp, operand: Box<AstExpression>, loc: SourceLocation },

    Binary { id: NodeId, op: AstBinaryOp, lhs: Box<AstExpression>, rhs: Box<AstExpression>, loc: SourceLocation },

    Ternary {
        id: NodeId,
        condition: Box<AstExpression>,
        then_expr: Box<AstExpression>,
        else_expr: Box<AstExpression>,
        loc: SourceLocation,
    },

    /// Assignment is an expression; its value and type are those of the assigned value.
    Assignment { id: NodeId, target: Box<AstExpression>, value: Box<AstExpression>, loc: SourceLocation },

    Call { id: NodeId, callee: Box<AstExpression>, args: Vec<AstExpression>, loc: SourceLocation },

    Index { id: NodeId, array: Box<AstExpression>, index: Box<AstExpression>, loc: SourceLocation },

    Member { id: NodeId, object: Box<AstExpression>, member: String, loc: SourceLocation },
}

impl AstExpression {
    /// The node's identifier.
    pub fn id(&self) -> NodeId {
        match self {
            AstExpression::IntegerLiteral { id, .. }
            | AstExpression::FloatLiteral { id, .. }
            | AstExpression::StringLiteral { id, .. }
            | AstExpression::BooleanLiteral { id, .. }
            | AstExpression::NullLiteral { id, .. }
            | AstExpression::ArrayLiteral { id, .. }
            | AstExpression::Identifier { id, .. }
            | AstExpression::This { id, .. }
            | AstExpression::New { id, .. }
            | AstExpression::Unary { id, .. }
            | AstExpression::Binary { id, .. }
            | AstExpression::Ternary { id, .. }
            | AstExpression::Assignment { id, .. }
            | AstExpression::Call { id, .. }
            | AstExpression::Index { id, .. }
            | AstExpression::Member { id, .. } => *id,
        }
    }

    /// The node's source location.
    pub fn location(&self) -> SourceLocation {
        match self {
            AstExpression::IntegerLiteral { loc, .. }
            | AstExpression::FloatLiteral { loc, .. }
            | AstExpression::StringLiteral { loc, .. }
            | AstExpression::BooleanLiteral { loc, .. }
            | AstExpression::NullLiteral { loc, .. }
            | AstExpression::ArrayLiteral { loc, .. }
            | AstExpression::Identifier { loc, .. }
            | AstExpression::This { loc, .. }
            | AstExpression::New { loc, .. }
            | AstExpression::Unary { loc, .. }
            | AstExpression::Binary { loc, .. }
            | AstExpression::Ternary { loc, .. }
            | AstExpression::Assignment { loc, .. }
            | AstExpression::Call { loc, .. }
            | AstExpression::Index { loc, .. }
            | AstExpression::Member { loc, .. } => *loc,
        }
    }

    /// Is this expression a valid assignment target (variable, field access, array index)?
    pub fn is_lvalue(&self) -> bool {
        matches!(self, AstExpression::Identifier { .. } | AstExpression::Member { .. } | AstExpression::Index { .. })
    }
}

/// A statement node.
#[derive(Debug, Clone)]
pub enum AstStatement {
    Expression(AstExpression),

    If { condition: AstExpression, then_block: AstBlock, else_block: Option<AstBlock> },

    While { condition: AstExpression, body: AstBlock },

    DoWhile { body: AstBlock, condition: AstExpression },

    For {
        init: Option<Box<AstBlockItem>>,
        condition: Option<AstExpression>,
        update: Option<AstExpression>,
        body: AstBlock,
    },

    Foreach { id: NodeId, var_name: String, iterable: AstExpression, body: AstBlock, loc: SourceLocation },

    Break { loc: SourceLocation },

    Continue { loc: SourceLocation },

    Return { value: Option<AstExpression>, loc: SourceLocation },

    Print { value: AstExpression, loc: SourceLocation },

    Block(AstBlock),
}

/// A braced block of statements and declarations.
#[derive(Debug, Clone, Default)]
pub struct AstBlock(pub Vec<AstBlockItem>);

/// An item inside a block (or at the top level of the program).
#[derive(Debug, Clone)]
pub enum AstBlockItem {
    Statement(AstStatement),
    Declaration(AstDeclaration),
}

/// A declaration.
#[derive(Debug, Clone)]
pub enum AstDeclaration {
    Variable(AstVariableDecl),
    Function(AstFunction),
    Class(AstClass),
}

/// A `let`/`var`/`const` declaration.
#[derive(Debug, Clone)]
pub struct AstVariableDecl {
    pub id: NodeId,
    pub name: String,
    pub declared_type: Option<AstTypeName>,
    pub initializer: Option<AstExpression>,
    pub is_const: bool,
    pub loc: SourceLocation,
}

/// A function parameter.
#[derive(Debug, Clone)]
pub struct AstParam {
    pub name: String,
    pub type_name: AstTypeName,
    pub loc: SourceLocation,
}

/// A function or method declaration.
///
/// Functions may be declared inside other functions' bodies; captured variables are rewritten
/// through environment records during lowering.
#[derive(Debug, Clone)]
pub struct AstFunction {
    pub id: NodeId,
    pub name: String,
    pub params: Vec<AstParam>,
    pub return_type: Option<AstTypeName>,
    pub body: AstBlock,
    pub loc: SourceLocation,
}

/// A class declaration.
#[derive(Debug, Clone)]
pub struct AstClass {
    pub name: String,
    pub superclass: Option<(String, SourceLocation)>,
    pub members: Vec<AstClassMember>,
    pub loc: SourceLocation,
}

/// A member of a class body.
#[derive(Debug, Clone)]
pub enum AstClassMember {
    Field(AstVariableDecl),
    Method(AstFunction),
}

/// The root of the AST: the program's top-level statements and declarations, in source order.
#[derive(Debug, Clone, Default)]
pub struct AstProgram(pub Vec<AstBlockItem>);
