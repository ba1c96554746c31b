//! Evaluation context for one record
//!
//! The context memoizes every field value it resolves, so each field key is
//! computed at most once per record. A key moves through three states:
//!
//! | state      | memo                   | next lookup                  |
//! |------------|------------------------|------------------------------|
//! | unresolved | absent                 | runs the derivation          |
//! | resolving  | `Slot::Resolving`      | cyclic reference error       |
//! | resolved   | `Slot::Resolved(..)`   | returns the memo             |
//!
//! A resolved entry may hold no value; "missing" and "not yet resolved" are
//! distinct states. After a fatal error the context is poisoned and refuses
//! further work: build a fresh context for the next record.

use crate::arguments::{Arguments, NO_ARGUMENTS};
use crate::config::EvaluationConfig;
use crate::error::{EvalError, EvalResult};
use crate::index::ModelIndex;
use crate::key::FieldKey;
use crate::preparation::ValueStatus;
use pmml_diagnostics::{Diagnostic, ErrorCode};
use pmml_types::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Nesting guard that bounds recursive evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guard {
    DerivedField,
    Function,
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DerivedField => write!(f, "derived field"),
            Self::Function => write!(f, "function"),
        }
    }
}

/// Fields visible to an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Input and derived fields of the model
    Model,
    /// Parameters of a user-defined function only
    Function,
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Resolving,
    Resolved(Option<Value>),
}

/// Per-record state of an evaluation
pub struct EvaluationContext<'a> {
    index: Arc<ModelIndex>,
    arguments: &'a dyn Arguments,
    config: EvaluationConfig,
    scope: Scope,
    slots: HashMap<FieldKey, Slot>,
    statuses: HashMap<String, ValueStatus>,
    warnings: Vec<Diagnostic>,
    derived_depth: usize,
    function_depth: usize,
    poisoned: bool,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context over a model index and one record's arguments
    pub fn new(index: Arc<ModelIndex>, arguments: &'a dyn Arguments) -> Self {
        Self {
            index,
            arguments,
            config: EvaluationConfig::default(),
            scope: Scope::Model,
            slots: HashMap::new(),
            statuses: HashMap::new(),
            warnings: Vec::new(),
            derived_depth: 0,
            function_depth: 0,
            poisoned: false,
        }
    }

    pub fn builder() -> EvaluationContextBuilder {
        EvaluationContextBuilder::new()
    }

    pub fn index(&self) -> &Arc<ModelIndex> {
        &self.index
    }

    pub fn arguments(&self) -> &'a dyn Arguments {
        self.arguments
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Memoized value of a key; never computes anything
    ///
    /// A key that was never resolved or declared is a missing field.
    pub fn lookup(&self, key: &FieldKey) -> EvalResult<Option<Value>> {
        match self.slots.get(key) {
            Some(Slot::Resolved(value)) => Ok(value.clone()),
            Some(Slot::Resolving) => Err(EvalError::cyclic_reference(key)),
            None => Err(EvalError::missing_field(key.field_name())),
        }
    }

    /// Whether a key holds a resolved entry, present or missing
    pub fn is_resolved(&self, key: &FieldKey) -> bool {
        matches!(self.slots.get(key), Some(Slot::Resolved(_)))
    }

    /// Memoized value of a key, computing it with `derive` on first use
    ///
    /// Re-entering a key that is still being derived is a cyclic reference.
    /// A failed derivation leaves the key unresolved; a fatal failure also
    /// poisons the context.
    pub fn resolve<F>(&mut self, key: FieldKey, derive: F) -> EvalResult<Option<Value>>
    where
        F: FnOnce(&mut Self) -> EvalResult<Option<Value>>,
    {
        self.ensure_usable()?;

        match self.slots.get(&key) {
            Some(Slot::Resolved(value)) => return Ok(value.clone()),
            Some(Slot::Resolving) => {
                self.poisoned = true;
                return Err(EvalError::cyclic_reference(&key));
            }
            None => {}
        }

        log::debug!("resolving {}", key);
        self.slots.insert(key.clone(), Slot::Resolving);

        match derive(self) {
            Ok(value) => {
                log::debug!(
                    "resolved {} = {}",
                    key,
                    value.as_ref().map_or_else(|| "missing".to_string(), Value::to_string)
                );
                self.slots.insert(key, Slot::Resolved(value.clone()));
                Ok(value)
            }
            Err(error) => {
                self.slots.remove(&key);
                if error.is_fatal() {
                    self.poisoned = true;
                }
                Err(error)
            }
        }
    }

    /// Memoize a computed value, present or missing
    ///
    /// A key may be declared once: declaring over any existing entry is an
    /// error, whether that entry holds a value, holds nothing or is still
    /// being resolved.
    pub fn declare(&mut self, key: FieldKey, value: Option<Value>) -> EvalResult<()> {
        self.ensure_usable()?;

        if self.slots.contains_key(&key) {
            self.poisoned = true;
            return Err(EvalError::duplicate_declaration(&key));
        }

        log::debug!("declared {}", key);
        self.slots.insert(key, Slot::Resolved(value));
        Ok(())
    }

    /// Run `f` one level deeper under a nesting guard
    pub fn guarded<T, F>(&mut self, guard: Guard, f: F) -> EvalResult<T>
    where
        F: FnOnce(&mut Self) -> EvalResult<T>,
    {
        let (depth, limit) = match guard {
            Guard::DerivedField => (self.derived_depth, self.config.max_derived_field_depth),
            Guard::Function => (self.function_depth, self.config.max_function_depth),
        };
        if depth >= limit {
            self.poisoned = true;
            return Err(EvalError::RecursionLimitExceeded { guard, limit });
        }

        self.set_depth(guard, depth + 1);
        let result = f(self);
        self.set_depth(guard, depth);
        result
    }

    fn set_depth(&mut self, guard: Guard, depth: usize) {
        match guard {
            Guard::DerivedField => self.derived_depth = depth,
            Guard::Function => self.function_depth = depth,
        }
    }

    /// Current nesting depth of a guard
    pub fn depth(&self, guard: Guard) -> usize {
        match guard {
            Guard::DerivedField => self.derived_depth,
            Guard::Function => self.function_depth,
        }
    }

    /// Fresh context for the body of a user-defined function
    ///
    /// The child sees no record arguments and no model fields, only what is
    /// declared into it. It inherits the nesting depths, so recursion through
    /// functions stays bounded.
    pub fn function_scope(&self) -> EvaluationContext<'a> {
        EvaluationContext {
            index: Arc::clone(&self.index),
            arguments: &NO_ARGUMENTS,
            config: self.config.clone(),
            scope: Scope::Function,
            slots: HashMap::new(),
            statuses: HashMap::new(),
            warnings: Vec::new(),
            derived_depth: self.derived_depth,
            function_depth: self.function_depth,
            poisoned: false,
        }
    }

    /// Take over the warnings and failure state of a finished child context
    pub fn absorb(&mut self, child: EvaluationContext<'_>) {
        self.warnings.extend(child.warnings);
        self.poisoned |= child.poisoned;
    }

    pub(crate) fn set_status(&mut self, name: &str, status: ValueStatus) {
        self.statuses.insert(name.to_string(), status);
    }

    /// Classification of a prepared input field
    pub fn field_status(&self, name: &str) -> Option<ValueStatus> {
        self.statuses.get(name).copied()
    }

    /// Record a warning; warnings never change the result
    pub fn warn(&mut self, code: ErrorCode, field: Option<&str>, message: impl Into<String>) {
        let mut diagnostic = Diagnostic::warning(code, message);
        if let Some(field) = field {
            diagnostic = diagnostic.with_field(field);
        }
        log::warn!("{}", diagnostic);
        self.warnings.push(diagnostic);
    }

    /// Warnings in the order they were recorded
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn warning_messages(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().map(|w| w.message.as_str())
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Fail if an earlier fatal error left the context unusable
    pub fn ensure_usable(&self) -> EvalResult<()> {
        if self.poisoned {
            Err(EvalError::ContextPoisoned)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("scope", &self.scope)
            .field("resolved", &self.slots.len())
            .field("warnings", &self.warnings.len())
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

/// Builder for [`EvaluationContext`]
#[derive(Debug, Default)]
pub struct EvaluationContextBuilder {
    index: Option<Arc<ModelIndex>>,
    config: EvaluationConfig,
}

impl EvaluationContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: Arc<ModelIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_derived_field_depth(mut self, depth: usize) -> Self {
        self.config.max_derived_field_depth = depth;
        self
    }

    pub fn with_max_function_depth(mut self, depth: usize) -> Self {
        self.config.max_function_depth = depth;
        self
    }

    pub fn with_lenient_categorical_comparison(mut self, lenient: bool) -> Self {
        self.config.lenient_categorical_comparison = lenient;
        self
    }

    /// Build a context over one record's arguments
    pub fn build<'a>(self, arguments: &'a dyn Arguments) -> EvalResult<EvaluationContext<'a>> {
        self.config.validate()?;
        let index = self.index.unwrap_or_else(|| Arc::new(ModelIndex::empty()));
        let mut context = EvaluationContext::new(index, arguments);
        context.config = self.config;
        Ok(context)
    }
}
