//! PMML diagnostics
//!
//! This crate provides the shared error-code registry and the diagnostic records
//! that the evaluator uses for its warning side channel.

mod diagnostic;
mod error_code;

pub use diagnostic::*;
pub use error_code::*;
