//! Evaluation errors for the PMML engine

use crate::context::Guard;
use crate::preparation::{Treatment, ValueStatus};
use pmml_diagnostics::{
    Diagnostic, ErrorCode, PMML0001, PMML0002, PMML0005, PMML0100, PMML0101, PMML0102, PMML0104, PMML0200,
    PMML0201, PMML0202, PMML0203, PMML0204, PMML0205, PMML0300, PMML0301,
};
use pmml_types::{DataType, NumericError, TypeError};
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur during evaluation
///
/// A missing value is not an error: it is `None`. Errors are either data
/// problems the model's policies did not absorb (type mismatches, invalid
/// inputs) or structural violations that make the whole record unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Referenced field is neither supplied, derived nor declared in scope
    #[error("Missing field: {name}")]
    MissingField { name: String },

    /// Value present but not usable as the requested type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Text does not follow the grammar of the requested data type
    #[error("Cannot parse '{text}' as {data_type}")]
    Parse { data_type: DataType, text: String },

    /// A function produced an invalid result under a return-invalid policy
    #[error("Invalid result of function '{function}'")]
    InvalidResult { function: String },

    /// An input value was rejected by a return-invalid policy
    #[error("Input field '{field}' rejected: {status} value under {policy}")]
    InvalidInput {
        field: String,
        status: ValueStatus,
        policy: Treatment,
    },

    /// No built-in or user-defined function with this name
    #[error("Unsupported function: {name}")]
    UnsupportedFunction { name: String },

    /// Operator not applicable to its operands
    #[error("Unsupported operator {operator}: {detail}")]
    UnsupportedOperator { operator: String, detail: String },

    /// Derived field or function nesting exceeded the configured budget
    #[error("Recursion limit exceeded: {guard} depth above {limit}")]
    RecursionLimitExceeded { guard: Guard, limit: usize },

    /// A field's derivation depends on itself
    #[error("Cyclic reference to field {key}")]
    CyclicReference { key: String },

    /// A field key was declared twice in the same context
    #[error("Duplicate declaration of {key}")]
    DuplicateDeclaration { key: String },

    /// Malformed model metadata
    #[error("Invalid model: {message}")]
    InvalidModel { message: String },

    /// Edge case of the numeric accumulator
    #[error(transparent)]
    Numeric(#[from] NumericError),

    /// Evaluation configuration could not be read
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// The context failed earlier and must not be reused
    #[error("Evaluation context is poisoned by an earlier failure")]
    ContextPoisoned,
}

impl EvalError {
    /// Create a missing field error
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField { name: name.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid result error
    pub fn invalid_result(function: impl Into<String>) -> Self {
        Self::InvalidResult {
            function: function.into(),
        }
    }

    /// Create an unsupported function error
    pub fn unsupported_function(name: impl Into<String>) -> Self {
        Self::UnsupportedFunction { name: name.into() }
    }

    /// Create an unsupported operator error
    pub fn unsupported_operator(operator: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
            detail: detail.into(),
        }
    }

    /// Create a cyclic reference error
    pub fn cyclic_reference(key: impl ToString) -> Self {
        Self::CyclicReference {
            key: key.to_string(),
        }
    }

    /// Create a duplicate declaration error
    pub fn duplicate_declaration(key: impl ToString) -> Self {
        Self::DuplicateDeclaration {
            key: key.to_string(),
        }
    }

    /// Create an invalid model error
    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error is a structural violation of the model or context
    ///
    /// Structural errors can never be absorbed by a treatment policy; the
    /// other errors are caused by the record's data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::UnsupportedFunction { .. }
                | Self::UnsupportedOperator { .. }
                | Self::RecursionLimitExceeded { .. }
                | Self::CyclicReference { .. }
                | Self::DuplicateDeclaration { .. }
                | Self::InvalidModel { .. }
                | Self::Configuration { .. }
                | Self::ContextPoisoned
        )
    }

    /// Diagnostic code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. } => PMML0200,
            Self::TypeMismatch { .. } => PMML0002,
            Self::Parse { .. } => PMML0001,
            Self::InvalidResult { .. } => PMML0204,
            Self::InvalidInput {
                status: ValueStatus::Missing,
                ..
            } => PMML0301,
            Self::InvalidInput { .. } => PMML0300,
            Self::UnsupportedFunction { .. } => PMML0101,
            Self::UnsupportedOperator { .. } => PMML0102,
            Self::RecursionLimitExceeded { .. } => PMML0203,
            Self::CyclicReference { .. } => PMML0202,
            Self::DuplicateDeclaration { .. } => PMML0201,
            Self::InvalidModel { .. } => PMML0100,
            Self::Numeric(_) => PMML0005,
            Self::Configuration { .. } => PMML0104,
            Self::ContextPoisoned => PMML0205,
        }
    }

    /// Error as a diagnostic record, with the code's help text
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = self.code();
        let mut diagnostic = Diagnostic::error(code, self.to_string());
        match self {
            Self::MissingField { name } => diagnostic = diagnostic.with_field(name),
            Self::InvalidInput { field, .. } => diagnostic = diagnostic.with_field(field),
            _ => {}
        }
        if let Some(help) = code.info().help {
            diagnostic = diagnostic.with_help(help);
        }
        diagnostic
    }
}

impl From<TypeError> for EvalError {
    fn from(error: TypeError) -> Self {
        match error {
            TypeError::Parse { data_type, text } => Self::Parse { data_type, text },
            TypeError::Mismatch { expected, found } => Self::TypeMismatch { expected, found },
            TypeError::Incompatible { left, right } => {
                Self::type_mismatch(left.to_string(), right.to_string())
            }
            TypeError::OpType { operation, op_type } => {
                Self::unsupported_operator(operation, format!("not defined for {} values", op_type))
            }
            TypeError::Unordered { left, right } => {
                Self::type_mismatch("ordered values", format!("{} and {}", left, right))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_error_conversion() {
        let err: EvalError = TypeError::parse(DataType::Integer, "x").into();
        assert_eq!(err.code(), PMML0001);

        let err: EvalError = TypeError::mismatch("integer", "string").into();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_structural_errors_are_fatal() {
        assert!(EvalError::missing_field("x").is_fatal());
        assert!(EvalError::cyclic_reference("a").is_fatal());
        assert!(EvalError::ContextPoisoned.is_fatal());
        assert!(!EvalError::invalid_result("/").is_fatal());
    }

    #[test]
    fn test_invalid_input_code_follows_status() {
        let missing = EvalError::InvalidInput {
            field: "x".into(),
            status: ValueStatus::Missing,
            policy: Treatment::Missing(pmml_ast::MissingValueTreatment::ReturnInvalid),
        };
        assert_eq!(missing.code(), PMML0301);
    }

    #[test]
    fn test_to_diagnostic_names_the_field() {
        let diagnostic = EvalError::missing_field("age").to_diagnostic();
        assert_eq!(diagnostic.code, PMML0200);
        assert_eq!(diagnostic.field.as_deref(), Some("age"));
        assert!(diagnostic.help.is_some());
        assert!(diagnostic.to_string().starts_with("error: PMML0200"));
    }
}
