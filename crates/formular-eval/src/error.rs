//! Evaluation errors

use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating an expression
///
/// These are per-entity failures: the processor records them on the
/// offending result and keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Operator applied to incompatible operand types
    #[error("unsupported operand types for {operator}: {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },

    /// Operator applied to a single incompatible operand
    #[error("invalid operand for {operator}: {message}")]
    InvalidOperand { operator: String, message: String },

    /// Division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflow
    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: String },

    /// Name that never resolved to a value (bare identifier or a token
    /// belonging to a different entity type)
    #[error("unresolved reference: {name}")]
    UnresolvedReference { name: String },

    /// Function name missing from the registry
    #[error("unknown function: {name}")]
    UndefinedFunction { name: String },

    /// Function called with bad arguments
    #[error("invalid arguments for {function}: {message}")]
    InvalidArgument { function: String, message: String },
}

impl EvalError {
    /// Create a type mismatch error
    pub fn type_mismatch(
        operator: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            operator: operator.into(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// Create an invalid operand error
    pub fn invalid_operand(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            operator: operator.into(),
            message: message.into(),
        }
    }

    /// Create an overflow error
    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved_reference(name: impl Into<String>) -> Self {
        Self::UnresolvedReference { name: name.into() }
    }

    /// Create an undefined function error
    pub fn undefined_function(name: impl Into<String>) -> Self {
        Self::UndefinedFunction { name: name.into() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }
}
