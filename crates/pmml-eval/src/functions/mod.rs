//! Built-in functions callable from `Apply`
//!
//! Functions are registered by name in a [`FunctionRegistry`] together with
//! their arity and their handling of missing arguments. A function returns an
//! [`Outcome`] rather than a bare value, because "missing result" and
//! "invalid result" are answered by different policies of the enclosing
//! `Apply`.

pub mod arithmetic;
pub mod boolean;
pub mod comparison;
pub mod datetime;
pub mod distribution;
pub mod string;
pub mod trigonometric;

use crate::error::{EvalError, EvalResult};
use once_cell::sync::Lazy;
use pmml_types::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Result of a function call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    Missing,
    /// Result outside of the function's domain; the value, if any, is what
    /// an `asIs` policy passes through
    Invalid(Option<Value>),
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Option<Value>> for Outcome {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => (min..=max).contains(&count),
            Self::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::Range(min, max) => write!(f, "{} to {}", min, max),
            Self::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

/// How a function treats missing arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingArgs {
    /// Any missing argument makes the result missing
    Propagate,
    /// Missing arguments are dropped before the call
    Skip,
    /// The function sees missing arguments as `None`
    Accept,
}

/// Type alias for function implementations
pub type FunctionFn = Arc<dyn Fn(&[Option<Value>]) -> EvalResult<Outcome> + Send + Sync>;

/// A registered function
#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: String,
    pub arity: Arity,
    pub missing: MissingArgs,
    implementation: FunctionFn,
}

impl BuiltinFunction {
    /// Check arity, apply the missing argument policy and call
    pub fn call(&self, args: &[Option<Value>]) -> EvalResult<Outcome> {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::invalid_model(format!(
                "function '{}' takes {} arguments, got {}",
                self.name,
                self.arity,
                args.len()
            )));
        }

        match self.missing {
            MissingArgs::Propagate if args.iter().any(Option::is_none) => Ok(Outcome::Missing),
            MissingArgs::Skip => {
                let present: Vec<Option<Value>> =
                    args.iter().filter(|arg| arg.is_some()).cloned().collect();
                (self.implementation)(&present)
            }
            _ => (self.implementation)(args),
        }
    }
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("missing", &self.missing)
            .finish()
    }
}

/// Registry of built-in functions
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, BuiltinFunction>,
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every standard function
    pub fn with_standard_functions() -> Self {
        let mut registry = Self::new();
        arithmetic::register(&mut registry);
        comparison::register(&mut registry);
        boolean::register(&mut registry);
        string::register(&mut registry);
        datetime::register(&mut registry);
        trigonometric::register(&mut registry);
        distribution::register(&mut registry);
        registry
    }

    /// Register a function, replacing any previous one of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, arity: Arity, missing: MissingArgs, f: F)
    where
        F: Fn(&[Option<Value>]) -> EvalResult<Outcome> + Send + Sync + 'static,
    {
        let name = name.into();
        self.functions.insert(
            name.clone(),
            BuiltinFunction {
                name,
                arity,
                missing,
                implementation: Arc::new(f),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Call a function by name
    pub fn call(&self, name: &str, args: &[Option<Value>]) -> EvalResult<Outcome> {
        self.get(name)
            .ok_or_else(|| EvalError::unsupported_function(name))?
            .call(args)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

static STANDARD: Lazy<Arc<FunctionRegistry>> =
    Lazy::new(|| Arc::new(FunctionRegistry::with_standard_functions()));

/// Shared registry of the standard functions
pub fn standard_registry() -> Arc<FunctionRegistry> {
    Arc::clone(&STANDARD)
}

/// Present argument at `index`
///
/// Only called by implementations whose missing policy guarantees presence.
pub(crate) fn arg<'v>(args: &'v [Option<Value>], index: usize) -> EvalResult<&'v Value> {
    args.get(index)
        .and_then(Option::as_ref)
        .ok_or_else(|| EvalError::invalid_model(format!("argument {} is missing", index + 1)))
}

/// All arguments, which must be present
pub(crate) fn present(args: &[Option<Value>]) -> EvalResult<Vec<&Value>> {
    (0..args.len()).map(|i| arg(args, i)).collect()
}
