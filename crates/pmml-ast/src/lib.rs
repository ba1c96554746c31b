//! PMML model metadata
//!
//! This crate defines the already-parsed model elements consumed by the
//! evaluator: expressions, predicates, field specifications with their
//! treatment policies, derived fields and user-defined functions. Loading
//! these from a PMML document is the caller's concern.

mod dictionary;
mod expression;
mod field;
mod interval;
mod predicate;

pub use dictionary::*;
pub use expression::*;
pub use field::*;
pub use interval::*;
pub use predicate::*;
