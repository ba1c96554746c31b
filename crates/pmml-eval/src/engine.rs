//! PMML Evaluation Engine
//!
//! This module provides the main [`PmmlEngine`] struct which evaluates
//! expressions, predicates and fields against an evaluation context.

use crate::context::{EvaluationContext, Guard, Scope};
use crate::error::{EvalError, EvalResult};
use crate::functions::{standard_registry, FunctionRegistry};
use crate::key::FieldKey;
use crate::predicate::CompoundPredicateResult;
use crate::preparation::prepare_field_with_status;
use pmml_ast::{Constant, Expression, FieldRef, Predicate};
use pmml_types::{common_data_type, Collection, DataType, RawValue, TypeError, Value};
use std::sync::Arc;

/// The main PMML evaluation engine
///
/// The engine is stateless apart from its function registry; all per-record
/// state lives in the [`EvaluationContext`]. One engine may serve any number
/// of contexts on any number of threads.
#[derive(Debug, Clone)]
pub struct PmmlEngine {
    registry: Arc<FunctionRegistry>,
}

impl Default for PmmlEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PmmlEngine {
    /// Create a new engine with the standard functions
    pub fn new() -> Self {
        Self {
            registry: standard_registry(),
        }
    }

    /// Create an engine with a custom registry
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    // =========================================================================
    // Public Entry Points
    // =========================================================================

    /// Evaluate an expression; `None` is a missing result
    ///
    /// Any error poisons the context.
    pub fn evaluate_expression(
        &self,
        expr: &Expression,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        ctx.ensure_usable()?;
        let result = self.eval(expr, ctx);
        poison_on_error(ctx, result)
    }

    /// Evaluate a predicate; `None` is unknown
    pub fn evaluate_predicate(
        &self,
        predicate: &Predicate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<bool>> {
        self.evaluate_predicate_result(predicate, ctx)
            .map(|result| result.value)
    }

    /// Evaluate a predicate, reporting whether a surrogate alternative decided it
    pub fn evaluate_predicate_result(
        &self,
        predicate: &Predicate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<CompoundPredicateResult> {
        ctx.ensure_usable()?;
        let result = self.eval_predicate(predicate, ctx);
        poison_on_error(ctx, result)
    }

    /// Value of an input or derived field, prepared and memoized
    pub fn evaluate_field(
        &self,
        name: &str,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        ctx.ensure_usable()?;
        let result = self.resolve_field(name, ctx);
        poison_on_error(ctx, result)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Main expression evaluation dispatcher
    pub(crate) fn eval(
        &self,
        expr: &Expression,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        log::trace!("evaluating {}", expr.kind());

        match expr {
            Expression::Constant(constant) => self.eval_constant(constant),
            Expression::FieldRef(field_ref) => self.eval_field_ref(field_ref, ctx),
            Expression::NormContinuous(norm) => self.eval_norm_continuous(norm, ctx),
            Expression::NormDiscrete(norm) => self.eval_norm_discrete(norm, ctx),
            Expression::Discretize(discretize) => self.eval_discretize(discretize, ctx),
            Expression::MapValues(map) => self.eval_map_values(map, ctx),
            Expression::Apply(apply) => self.eval_apply(apply, ctx),
            Expression::Aggregate(aggregate) => self.eval_aggregate(aggregate, ctx),
            Expression::Lag(lag) => self.eval_lag(lag, ctx),
        }
    }

    // =========================================================================
    // Literals and References
    // =========================================================================

    fn eval_constant(&self, constant: &Constant) -> EvalResult<Option<Value>> {
        let Some(text) = &constant.value else {
            return Ok(None);
        };
        match constant.data_type {
            Some(data_type) => typed_literal(text, data_type).map(Some),
            None => Ok(Some(infer_literal(text))),
        }
    }

    fn eval_field_ref(
        &self,
        field_ref: &FieldRef,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        let value = self.resolve_field(&field_ref.field, ctx)?;
        match (value, &field_ref.map_missing_to) {
            (None, Some(text)) => {
                let replacement = match ctx.index().field_type(&field_ref.field) {
                    Some((data_type, op_type)) => {
                        Value::create(data_type, op_type, &RawValue::from(text.as_str()))?
                    }
                    None => infer_literal(text),
                };
                Ok(Some(replacement))
            }
            (value, _) => Ok(value),
        }
    }

    /// Memoized value of a field by name
    pub(crate) fn resolve_field(
        &self,
        name: &str,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        ctx.resolve(FieldKey::name(name), |ctx| self.derive_field(name, ctx))
    }

    fn derive_field(&self, name: &str, ctx: &mut EvaluationContext<'_>) -> EvalResult<Option<Value>> {
        // Function bodies only see their declared parameters
        if ctx.scope() == Scope::Function {
            return Err(EvalError::missing_field(name));
        }

        let index = Arc::clone(ctx.index());

        if let Some(field) = index.field(name) {
            let raw = ctx.arguments().get(name);
            let preparation = prepare_field_with_status(raw.as_ref(), field);
            ctx.set_status(name, preparation.status);
            return match preparation.outcome {
                Ok(value) => Ok(Some(value)),
                Err(rejection) if rejection.is_missing() => Ok(None),
                Err(rejection) => Err(EvalError::InvalidInput {
                    field: name.to_string(),
                    status: rejection.status,
                    policy: rejection.policy,
                }),
            };
        }

        if let Some(derived) = index.derived_field(name) {
            let value = ctx.guarded(Guard::DerivedField, |ctx| self.eval(&derived.expression, ctx))?;
            return match value {
                Some(value) => Ok(Some(value.cast_to(derived.data_type, derived.op_type())?)),
                None => Ok(None),
            };
        }

        // Undeclared but supplied: the record's own typing stands
        match ctx.arguments().get(name) {
            Some(raw) => infer_raw(&raw).map(Some),
            None => Err(EvalError::missing_field(name)),
        }
    }
}

fn poison_on_error<T>(ctx: &mut EvaluationContext<'_>, result: EvalResult<T>) -> EvalResult<T> {
    if let Err(error) = &result {
        log::debug!("evaluation failed: {}", error);
        ctx.poison();
    }
    result
}

// =========================================================================
// Literal Helpers
// =========================================================================

/// Value of an untyped literal: integer, else float, else string
///
/// A decimal outside the float range keeps double precision.
pub(crate) fn infer_literal(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::integer(i);
    }
    // Rust also parses "inf" and "NaN"; those stay strings
    match trimmed.parse::<f64>() {
        Ok(x) if trimmed.chars().any(|c| c.is_ascii_digit()) => {
            let narrow = x as f32;
            if narrow.is_infinite() || (narrow == 0.0 && x != 0.0) {
                Value::double(x)
            } else {
                Value::float(narrow)
            }
        }
        _ => Value::string(text),
    }
}

/// Literal parsed as `data_type`, with that type's default operational type
pub(crate) fn typed_literal(text: &str, data_type: DataType) -> EvalResult<Value> {
    let raw = RawValue::from(text);
    Ok(Value::create(data_type, data_type.default_op_type(), &raw)?)
}

/// Whether `value` equals a literal read as the value's own type
///
/// A literal that does not parse as that type is simply unequal.
pub(crate) fn matches_literal(value: &Value, text: &str) -> EvalResult<bool> {
    match value.parse_literal(text) {
        Ok(literal) => Ok(value.equals_value(&literal)?),
        Err(TypeError::Parse { .. }) => Ok(false),
        Err(error) => Err(error.into()),
    }
}

fn infer_raw(raw: &RawValue) -> EvalResult<Value> {
    match raw {
        RawValue::Text(text) => Ok(infer_literal(text)),
        RawValue::Data(data) => Ok(Value::new(data.clone(), data.data_type().default_op_type())?),
        RawValue::List(items) => {
            let elements = items
                .iter()
                .map(|item| item.as_ref().map(infer_raw).transpose())
                .collect::<EvalResult<Vec<_>>>()?;
            let types: Vec<DataType> = elements.iter().flatten().map(Value::data_type).collect();
            let data_type = common_data_type(&types)?.unwrap_or(DataType::String);
            let op_type = data_type.default_op_type();
            let elements = elements
                .iter()
                .map(|element| element.as_ref().map(|v| v.cast_to(data_type, op_type)).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Collection(Collection::new(data_type, op_type, elements)))
        }
    }
}
