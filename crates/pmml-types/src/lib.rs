//! PMML type system
//!
//! This crate defines the typed value model shared by every evaluator layer:
//! - Data types (string, numeric, boolean, temporal and "since epoch" counts)
//! - Operational types (continuous, categorical, ordinal)
//! - Parsing, casting and least-restrictive type unification
//! - Values with equality and ordering semantics
//! - The numeric accumulator used by model-specific scorers

mod data;
mod data_type;
mod error;
pub mod numeric;
mod temporal;
mod value;

pub use data::*;
pub use data_type::*;
pub use error::*;
pub use numeric::{DoubleValue, FloatValue, NumericValue, Real};
pub use temporal::*;
pub use value::*;
