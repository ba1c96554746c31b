//! PMML typed values, expressions and predicates for Rust
//!
//! This crate bundles the pieces needed to evaluate the transformation layer
//! of a PMML model for one record:
//! - Typed values with data and operational types
//! - Field declarations with validity, missing value and outlier policies
//! - Expression and predicate evaluation with memoized field resolution
//! - Diagnostics with stable error codes
//!
//! # Example
//!
//! ```ignore
//! use pmml::{evaluate_field, Dictionary, Record};
//!
//! let value = evaluate_field(&dictionary, "monthly_income", &Record::new().with("income", "1200"))?;
//! ```

// Re-export all public APIs from internal crates
pub use pmml_ast as ast;
pub use pmml_diagnostics as diagnostics;
pub use pmml_eval as eval;
pub use pmml_types as types;

// Convenience re-exports
pub use pmml_ast::{Dictionary, Expression, Predicate};
pub use pmml_diagnostics::{Diagnostic, ErrorCode};
pub use pmml_eval::{
    Arguments, CompoundPredicateResult, EvalError, EvalResult, EvaluationContext, ModelIndex,
    PmmlEngine, Record,
};
pub use pmml_types::{DataType, OpType, Value};

/// Compile `dictionary` and evaluate one field for one record
///
/// Convenient for one-off evaluations; models evaluated repeatedly should
/// compile a [`ModelIndex`] once and share it.
pub fn evaluate_field(
    dictionary: &Dictionary,
    name: &str,
    arguments: &dyn Arguments,
) -> EvalResult<Option<Value>> {
    let index = ModelIndex::shared(dictionary)?;
    let mut ctx = EvaluationContext::new(index, arguments);
    PmmlEngine::new().evaluate_field(name, &mut ctx)
}
