// Copyright 2025-2026 Neil Henderson
//
//! The `quadruple` module defines the three-address-code instruction `(op, arg1, arg2, result)`
//! and the ordered list the IR generator appends to.

use std::fmt;

/// The fixed quadruple operation set.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QuadOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,

    // Logical
    And,
    Or,
    Not,

    // Relational
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,

    // Data
    Assign,
    Copy,

    // Control
    Goto,
    IfFalse,
    IfTrue,
    Label,

    // Functions
    Param,
    Call,
    Return,
    BeginFunc,
    EndFunc,

    // Arrays
    ArrayNew,
    ArrayLoad,
    ArrayStore,
    ArrayLen,

    // Objects
    New,
    GetField,
    SetField,
    CallMethod,

    // I/O
    Print,
}

impl fmt::Display for QuadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuadOp::Add => write!(f, "ADD"),
            QuadOp::Sub => write!(f, "SUB"),
            QuadOp::Mul => write!(f, "MUL"),
            QuadOp::Div => write!(f, "DIV"),
            QuadOp::Mod => write!(f, "MOD"),
            QuadOp::Neg => write!(f, "NEG"),
            QuadOp::And => write!(f, "AND"),
            QuadOp::Or => write!(f, "OR"),
            QuadOp::Not => write!(f, "NOT"),
            QuadOp::Lt => write!(f, "LT"),
            QuadOp::Le => write!(f, "LE"),
            QuadOp::Gt => write!(f, "GT"),
            QuadOp::Ge => write!(f, "GE"),
            QuadOp::Eq => write!(f, "EQ"),
            QuadOp::Ne => write!(f, "NE"),
            QuadOp::Assign => write!(f, "ASSIGN"),
            QuadOp::Copy => write!(f, "COPY"),
            QuadOp::Goto => write!(f, "GOTO"),
            QuadOp::IfFalse => write!(f, "IF_FALSE"),
            QuadOp::IfTrue => write!(f, "IF_TRUE"),
            QuadOp::Label => write!(f, "LABEL"),
            QuadOp::Param => write!(f, "PARAM"),
            QuadOp::Call => write!(f, "CALL"),
            QuadOp::Return => write!(f, "RETURN"),
            QuadOp::BeginFunc => write!(f, "BEGIN_FUNC"),
            QuadOp::EndFunc => write!(f, "END_FUNC"),
            QuadOp::ArrayNew => write!(f, "ARRAY_NEW"),
            QuadOp::ArrayLoad => write!(f, "ARRAY_LOAD"),
            QuadOp::ArrayStore => write!(f, "ARRAY_STORE"),
            QuadOp::ArrayLen => write!(f, "ARRAY_LEN"),
            QuadOp::New => write!(f, "NEW"),
            QuadOp::GetField => write!(f, "GET_FIELD"),
            QuadOp::SetField => write!(f, "SET_FIELD"),
            QuadOp::CallMethod => write!(f, "CALL_METHOD"),
            QuadOp::Print => write!(f, "PRINT"),
        }
    }
}

/// A three-address-code instruction.
///
/// Each operand position holds a value token: a user name, a temporary (`t0`, `t1`, ...), a
/// label, an inline literal, or nothing. Integer literals are decimal, floats keep their
/// decimal point, strings keep their quotes and escapes, booleans are `true`/`false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadruple {
    pub op: QuadOp,
    pub arg1: Option<String>,
    pub arg2: Option<String>,
    pub result: Option<String>,
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.op)?;

        for arg in [&self.arg1, &self.arg2, &self.result].into_iter().flatten() {
            write!(f, ", {arg}")?;
        }

        write!(f, ")")
    }
}

impl Quadruple {
    /// Is this a `LABEL` marker?
    pub fn is_label(&self) -> bool {
        self.op == QuadOp::Label
    }

    /// Is this an unconditional or conditional jump?
    pub fn is_jump(&self) -> bool {
        matches!(self.op, QuadOp::Goto | QuadOp::IfFalse | QuadOp::IfTrue)
    }

    /// The label this quadruple defines or jumps to, if any.
    pub fn label_operand(&self) -> Option<&str> {
        match self.op {
            QuadOp::Label | QuadOp::Goto => self.arg1.as_deref(),
            QuadOp::IfFalse | QuadOp::IfTrue => self.arg2.as_deref(),
            _ => None,
        }
    }

    /// Does this quadruple mark a function boundary?
    pub fn is_function_boundary(&self) -> bool {
        matches!(self.op, QuadOp::BeginFunc | QuadOp::EndFunc)
    }
}

/// An ordered list of quadruples, appended in execution order.
#[derive(Debug, Default)]
pub struct QuadrupleList {
    quads: Vec<Quadruple>,
}

impl QuadrupleList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a quadruple and returns its index.
    pub fn emit<A1, A2, R>(&mut self, op: QuadOp, arg1: A1, arg2: A2, result: R) -> usize
    where
        A1: Into<Option<String>>,
        A2: Into<Option<String>>,
        R: Into<Option<String>>,
    {
        self.quads.push(Quadruple { op, arg1: arg1.into(), arg2: arg2.into(), result: result.into() });
        self.quads.len() - 1
    }

    /// The number of quadruples emitted so far.
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Is the list empty?
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// The last quadruple, if any.
    pub fn last(&self) -> Option<&Quadruple> {
        self.quads.last()
    }

    /// Consumes the list and returns the quadruples.
    pub fn into_vec(self) -> Vec<Quadruple> {
        self.quads
    }

    /// Appends another list to this one.
    pub fn append(&mut self, mut other: QuadrupleList) {
        self.quads.append(&mut other.quads);
    }
}

impl std::ops::Deref for QuadrupleList {
    type Target = [Quadruple];

    fn deref(&self) -> &Self::Target {
        &self.quads
    }
}
