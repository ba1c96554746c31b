//! Type and numeric errors

use crate::{DataType, OpType};
use pmml_diagnostics::{ErrorCode, PMML0001, PMML0002, PMML0003, PMML0004, PMML0005};
use thiserror::Error;

/// Result type for type-system operations
pub type TypeResult<T> = Result<T, TypeError>;

/// Errors raised while parsing, casting or comparing values
///
/// Parse failures are kept apart from type mismatches: callers may fall back to
/// treating unparseable text as a categorical string, but never a mismatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// Text does not follow the grammar of the requested data type
    #[error("Cannot parse '{text}' as {data_type}")]
    Parse { data_type: DataType, text: String },

    /// A typed value cannot be coerced to the requested representation
    #[error("Type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    /// Two data types have no least-restrictive common type
    #[error("Incompatible data types: {left} and {right}")]
    Incompatible { left: DataType, right: DataType },

    /// The operation is not defined for the operational type
    #[error("Operation '{operation}' is not supported for {op_type} values")]
    OpType { operation: String, op_type: OpType },

    /// Values have no defined order (NaN, or not part of an ordinal ordering)
    #[error("Values {left} and {right} cannot be ordered")]
    Unordered { left: String, right: String },
}

impl TypeError {
    /// Create a parse error
    pub fn parse(data_type: DataType, text: impl Into<String>) -> Self {
        Self::Parse {
            data_type,
            text: text.into(),
        }
    }

    /// Create a type mismatch error
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Mismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported operational type error
    pub fn op_type(operation: impl Into<String>, op_type: OpType) -> Self {
        Self::OpType {
            operation: operation.into(),
            op_type,
        }
    }

    /// Create an unordered comparison error
    pub fn unordered(left: impl ToString, right: impl ToString) -> Self {
        Self::Unordered {
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Whether this error stems from malformed text
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Diagnostic code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => PMML0001,
            Self::Mismatch { .. } | Self::Unordered { .. } => PMML0002,
            Self::Incompatible { .. } => PMML0003,
            Self::OpType { .. } => PMML0004,
        }
    }
}

/// Result type for numeric accumulator operations
pub type NumericResult<T> = Result<T, NumericError>;

/// Edge cases of the numeric accumulator algebra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NumericError {
    /// Division (or reciprocal) by zero
    #[error("Division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    /// Argument outside of the function's domain
    #[error("Argument outside of the domain of {operation}")]
    Domain { operation: &'static str },

    /// The operation produced (or received) a NaN
    #[error("{operation} produced NaN")]
    NotANumber { operation: &'static str },
}

impl NumericError {
    /// Name of the failing operation
    pub fn operation(&self) -> &'static str {
        match self {
            Self::DivisionByZero { operation }
            | Self::Domain { operation }
            | Self::NotANumber { operation } => operation,
        }
    }

    /// Diagnostic code for this error
    pub fn code(&self) -> ErrorCode {
        PMML0005
    }
}
