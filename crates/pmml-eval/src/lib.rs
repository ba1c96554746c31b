//! PMML Evaluation Engine
//!
//! This crate evaluates the typed-value layer of PMML models for one record
//! at a time:
//!
//! - **Field preparation**: classify raw inputs as valid, invalid or missing
//!   and apply outlier, missing value and invalid value treatments
//! - **Expressions**: constants, field references, normalization,
//!   discretization, table lookups, function application, aggregations and lags
//! - **Predicates**: simple comparisons, set membership and compound predicates
//!   with three-valued logic
//! - **Functions**: the built-in arithmetic, comparison, boolean, string,
//!   date, trigonometric and distribution functions, plus user-defined ones
//!
//! # Example
//!
//! ```ignore
//! use pmml_eval::{EvaluationContext, ModelIndex, PmmlEngine, Record};
//!
//! let index = ModelIndex::shared(&dictionary)?;
//! let record = Record::new().with("age", "42");
//! let mut ctx = EvaluationContext::new(index, &record);
//!
//! let engine = PmmlEngine::new();
//! let value = engine.evaluate_expression(&expression, &mut ctx)?;
//! ```
//!
//! # Architecture
//!
//! - `ModelIndex`: model metadata compiled once and shared by `Arc`
//! - `EvaluationContext`: per-record memo of field values, nesting guards and
//!   warnings
//! - `PmmlEngine`: stateless dispatcher over expressions and predicates
//! - `functions`: the registry of built-in functions
//!
//! # Missing Values
//!
//! Missing is `None`, never an error. Predicates over missing values are
//! unknown (`None`) and follow Kleene logic:
//!
//! - `and`: false dominates (unknown and false = false)
//! - `or`: true dominates (unknown or true = true)
//! - `xor`: any unknown operand makes the result unknown

pub mod arguments;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod expressions;
pub mod functions;
pub mod index;
pub mod key;
pub mod predicate;
pub mod preparation;

// Re-export main types
pub use arguments::{Arguments, NoArguments, Record};
pub use config::EvaluationConfig;
pub use context::{EvaluationContext, EvaluationContextBuilder, Guard, Scope};
pub use engine::PmmlEngine;
pub use error::{EvalError, EvalResult};
pub use expressions::denormalize;
pub use functions::{standard_registry, Arity, FunctionRegistry, MissingArgs, Outcome};
pub use index::{ModelIndex, PreparedField};
pub use key::{AggregateKey, FieldKey, LagKey};
pub use predicate::CompoundPredicateResult;
pub use preparation::{
    prepare_field, prepare_field_with_status, Preparation, Rejection, Treatment, ValueStatus,
};
