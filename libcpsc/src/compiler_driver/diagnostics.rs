// Copyright 2025-2026 Neil Henderson
//
//! The `diagnostics` module defines the error diagnostics emitted by the compiler.

use std::fmt;

use crate::core::SourceLocation;

/// The kind of error a diagnostic reports.
///
/// Every kind is fatal to the current compilation. Lexical and syntax errors come from the front
/// end; the remaining kinds follow the phases that detect them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Name,
    Type,
    ControlFlow,
    Class,
    Resource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "LexicalError"),
            ErrorKind::Syntax => write!(f, "SyntaxError"),
            ErrorKind::Name => write!(f, "NameError"),
            ErrorKind::Type => write!(f, "TypeError"),
            ErrorKind::ControlFlow => write!(f, "ControlFlowError"),
            ErrorKind::Class => write!(f, "ClassError"),
            ErrorKind::Resource => write!(f, "ResourceError"),
        }
    }
}

/// A diagnostic emitted by the compiler.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    kind: ErrorKind,
    message: String,
    loc: SourceLocation,
}

impl Diagnostic {
    /// Creates an error diagnostic with the given kind, message and source location.
    pub fn error(kind: ErrorKind, message: String, loc: SourceLocation) -> Self {
        Self { kind, message, loc }
    }

    /// The kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The diagnostic's message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The source location the diagnostic refers to.
    pub fn location(&self) -> SourceLocation {
        self.loc
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_none() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{}: {}: {}", self.loc, self.kind, self.message)
        }
    }
}
