//! Expression evaluation
//!
//! Each module adds the `eval_*` methods for one family of expressions to
//! [`PmmlEngine`](crate::engine::PmmlEngine).

pub mod aggregate;
pub mod apply;
pub mod discretize;
pub mod map_values;
pub mod normalization;

pub use normalization::denormalize;
