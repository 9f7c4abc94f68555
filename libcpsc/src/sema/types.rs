// Copyright 2025-2026 Neil Henderson
//
//! The `types` module defines the CompiScript type universe and its conversion rules.

use std::fmt;

/// A semantic type.
///
/// The universe is closed: scalars, `void`, `null`, arbitrarily nested arrays, named class
/// types, and function types. `Error` is the sentinel attached to expressions that already
/// produced a diagnostic; it is silently compatible with everything to avoid error cascades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Integer,
    Float,
    Boolean,
    Str,
    Void,
    Null,
    Error,
    Array(Box<Type>),
    Class(String),
    Function { params: Vec<Type>, ret: Box<Type> },
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::Boolean => write!(f, "boolean"),
            Type::Str => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Error => write!(f, "<error>"),
            Type::Array(element) => write!(f, "{element}[]"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Function { params, ret } => {
                write!(f, "function(")?;
                let mut first = true;
                for param in params {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                    first = false;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}

impl Type {
    /// Creates an array type with the given element type.
    pub fn array_of(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    /// Is this `integer` or `float`?
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    /// Is this the sentinel error type?
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// Is this a heap reference type (class instance or array)?
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_))
    }

    /// The element type, when this is an array.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element) => Some(element),
            _ => None,
        }
    }

    /// The size of a value of this type, in 4-byte words. Scalars and references are one word.
    pub fn size_in_words(&self) -> usize {
        1
    }

    /// The literal token that initializes a declaration of this type when no initializer is
    /// written: `0`, `0.0`, `false`, the empty string literal, or `null`.
    pub fn default_value_token(&self) -> &'static str {
        match self {
            Type::Integer => "0",
            Type::Float => "0.0",
            Type::Boolean => "false",
            Type::Str => "\"\"",
            _ => "null",
        }
    }
}

/// Is a value of type `from` assignable to a target of type `to`?
///
/// `T` is assignable to `T`; `integer` widens to `float`; `null` is assignable to any class or
/// array type. The error sentinel is assignable in both directions.
pub fn are_assignable(from: &Type, to: &Type) -> bool {
    if from.is_error() || to.is_error() {
        return true;
    }

    if from == to {
        return true;
    }

    if *from == Type::Integer && *to == Type::Float {
        return true;
    }

    if *from == Type::Null && to.is_reference() {
        return true;
    }

    false
}

/// Returns the common arithmetic type of two numeric operands, or None when either operand is
/// not numeric. Mixing `integer` with `float` widens to `float`.
pub fn promote(a: &Type, b: &Type) -> Option<Type> {
    if a.is_error() || b.is_error() {
        return Some(Type::Error);
    }

    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }

    if *a == Type::Integer && *b == Type::Integer { Some(Type::Integer) } else { Some(Type::Float) }
}

/// Returns the common type of two expressions (for ternary branches), or None when the types
/// are incompatible.
pub fn common_type(a: &Type, b: &Type) -> Option<Type> {
    if a.is_error() || b.is_error() {
        return Some(Type::Error);
    }

    if a == b {
        return Some(a.clone());
    }

    if let Some(promoted) = promote(a, b) {
        return Some(promoted);
    }

    if *a == Type::Null && b.is_reference() {
        return Some(b.clone());
    }

    if *b == Type::Null && a.is_reference() {
        return Some(a.clone());
    }

    None
}
