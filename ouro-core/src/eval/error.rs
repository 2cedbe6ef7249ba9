use thiserror::Error;

use crate::{
    environment::prelude::Value,
    utils::prelude::{Diagnostic, Severity, SrcSpan}
};

/// Errors that abort the current top-level call. Recoverable problems
/// such as division by zero are reported as diagnostics instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("undefined variable '{name}'")]
    UndefinedVariable {
        name: String,
        location: SrcSpan,
    },
    #[error("undefined function '{name}'")]
    UndefinedFunction {
        name: String,
        location: SrcSpan,
    },
    #[error("class '{class}' has no method '{name}'")]
    UndefinedMethod {
        class: String,
        name: String,
        location: SrcSpan,
    },
    #[error("unknown class '{name}'")]
    UndefinedClass {
        name: String,
        location: SrcSpan,
    },
    #[error("operator '{operator}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
        location: SrcSpan,
    },
    #[error("operator '{operator}' cannot be applied to {operand}")]
    InvalidOperand {
        operator: &'static str,
        operand: &'static str,
        location: SrcSpan,
    },
    #[error("cannot access member '{name}' on a value of type {ty}")]
    BadMemberAccess {
        name: String,
        ty: &'static str,
        location: SrcSpan,
    },
    #[error("a value of type {ty} is not callable")]
    NotCallable {
        ty: &'static str,
        location: SrcSpan,
    },
    #[error("cannot assign to constant '{name}'")]
    ConstAssignment {
        name: String,
        location: SrcSpan,
    },
    #[error("invalid assignment target")]
    InvalidTarget {
        location: SrcSpan,
    },
    #[error("'{keyword}' outside of a loop")]
    OutsideLoop {
        keyword: &'static str,
        location: SrcSpan,
    },
    #[error("cannot iterate over a value of type {ty}")]
    NotIterable {
        ty: &'static str,
        location: SrcSpan,
    },
    #[error("maximum call depth of {limit} exceeded")]
    CallDepthExceeded {
        limit: usize,
        location: SrcSpan,
    },
    #[error("uncaught exception: {value}")]
    Thrown {
        value: Value,
        location: SrcSpan,
    },
}

impl RuntimeError {
    pub fn location(&self) -> SrcSpan {
        match self {
            RuntimeError::UndefinedVariable { location, .. }
            | RuntimeError::UndefinedFunction { location, .. }
            | RuntimeError::UndefinedMethod { location, .. }
            | RuntimeError::UndefinedClass { location, .. }
            | RuntimeError::InvalidOperands { location, .. }
            | RuntimeError::InvalidOperand { location, .. }
            | RuntimeError::BadMemberAccess { location, .. }
            | RuntimeError::NotCallable { location, .. }
            | RuntimeError::ConstAssignment { location, .. }
            | RuntimeError::InvalidTarget { location }
            | RuntimeError::OutsideLoop { location, .. }
            | RuntimeError::NotIterable { location, .. }
            | RuntimeError::CallDepthExceeded { location, .. }
            | RuntimeError::Thrown { location, .. } => *location
        }
    }

    /// Value bound to the variable of a `catch` clause: the thrown value
    /// itself or the message of an internal error.
    pub fn caught_value(&self) -> Value {
        match self {
            RuntimeError::Thrown { value, .. } => value.clone(),
            error => Value::String(error.to_string()),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(Severity::Runtime, self.location(), self.to_string())
    }
}
