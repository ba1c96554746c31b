//! Aggregations over one record's data
//!
//! `Aggregate` reduces a collection-valued field of the current record.
//! `Lag` looks back into the history the caller keeps for an input field:
//! either the single value `n` records back or a reduction over the last `n`
//! records. Cross-record state is never kept here; the history comes from
//! [`Arguments::history`](crate::arguments::Arguments::history).

use crate::context::EvaluationContext;
use crate::engine::PmmlEngine;
use crate::error::{EvalError, EvalResult};
use crate::functions::arithmetic::{
    average, maximum, median, minimum, product, sample_stddev, sum,
};
use crate::functions::Outcome;
use crate::index::PreparedField;
use crate::key::{AggregateKey, FieldKey, LagKey};
use crate::preparation::prepare_field;
use pmml_ast::{Aggregate, AggregateFunction, Lag, LagAggregate};
use pmml_types::{RawValue, Value};
use std::sync::Arc;

impl PmmlEngine {
    pub(crate) fn eval_aggregate(
        &self,
        aggregate: &Aggregate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        let key = FieldKey::Aggregate(AggregateKey {
            name: aggregate.field.clone(),
            function: aggregate.function,
            group_field: aggregate.group_field.clone(),
        });
        ctx.resolve(key, |ctx| self.derive_aggregate(aggregate, ctx))
    }

    fn derive_aggregate(
        &self,
        aggregate: &Aggregate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        if let Some(group) = &aggregate.group_field {
            let grouping = self.resolve_field(group, ctx)?;
            if grouping.as_ref().is_some_and(Value::is_collection) {
                return Err(EvalError::invalid_model(format!(
                    "group field '{}' of an aggregation must be scalar",
                    group
                )));
            }
        }

        let Some(value) = self.resolve_field(&aggregate.field, ctx)? else {
            return Ok(None);
        };
        let Some(collection) = value.as_collection() else {
            return Err(EvalError::type_mismatch(
                "collection",
                format!("{} value", value.data_type()),
            ));
        };

        let present: Vec<&Value> = collection.present().collect();
        let outcome = match aggregate.function {
            AggregateFunction::Count => Outcome::Value(Value::integer(present.len() as i64)),
            AggregateFunction::Sum => sum(&present)?,
            AggregateFunction::Average => average(&present)?,
            AggregateFunction::Min => minimum(&present)?,
            AggregateFunction::Max => maximum(&present)?,
        };
        reduction_value(outcome, &aggregate.function.to_string())
    }

    // =========================================================================
    // Lag
    // =========================================================================

    pub(crate) fn eval_lag(
        &self,
        lag: &Lag,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        if lag.n == 0 {
            return Err(EvalError::invalid_model(format!(
                "lag of '{}' must look back at least one record",
                lag.field
            )));
        }

        let index = Arc::clone(ctx.index());
        let Some(field) = index.field(&lag.field) else {
            return Err(EvalError::invalid_model(format!(
                "lag of '{}' needs an input field",
                lag.field
            )));
        };

        let key = FieldKey::Lag(LagKey {
            name: lag.field.clone(),
            n: lag.n,
            block_indicators: lag.block_indicators.clone(),
            aggregate: lag.aggregate,
        });
        ctx.resolve(key, |ctx| self.derive_lag(lag, field, ctx))
    }

    fn derive_lag(
        &self,
        lag: &Lag,
        field: &PreparedField,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        let mut block = Vec::with_capacity(lag.block_indicators.len());
        for indicator in &lag.block_indicators {
            block.push(self.resolve_field(indicator, ctx)?);
        }

        let history = ctx.arguments().history(&lag.field, &block);
        log::trace!("lag('{}', {}): {} earlier records", lag.field, lag.n, history.len());

        if lag.aggregate == LagAggregate::None {
            return match history.get(lag.n - 1) {
                Some(raw) => prepare_earlier(raw.as_ref(), field),
                None => Ok(None),
            };
        }

        let mut window = Vec::with_capacity(lag.n);
        for raw in history.iter().take(lag.n) {
            if let Some(value) = prepare_earlier(raw.as_ref(), field)? {
                window.push(value);
            }
        }
        let window: Vec<&Value> = window.iter().collect();

        let outcome = match lag.aggregate {
            LagAggregate::Avg => average(&window)?,
            LagAggregate::Max => maximum(&window)?,
            LagAggregate::Median => median(&window)?,
            LagAggregate::Min => minimum(&window)?,
            LagAggregate::Product => product(&window)?,
            LagAggregate::Sum => sum(&window)?,
            LagAggregate::Stddev => sample_stddev(&window)?,
            LagAggregate::None => return Ok(None),
        };
        reduction_value(outcome, &lag.aggregate.to_string())
    }
}

/// Earlier record's raw value, prepared like the current one
fn prepare_earlier(raw: Option<&RawValue>, field: &PreparedField) -> EvalResult<Option<Value>> {
    match prepare_field(raw, field) {
        Ok(value) => Ok(Some(value)),
        Err(rejection) if rejection.is_missing() => Ok(None),
        Err(rejection) => Err(EvalError::InvalidInput {
            field: field.name().to_string(),
            status: rejection.status,
            policy: rejection.policy,
        }),
    }
}

fn reduction_value(outcome: Outcome, function: &str) -> EvalResult<Option<Value>> {
    match outcome {
        Outcome::Value(value) => Ok(Some(value)),
        Outcome::Missing => Ok(None),
        Outcome::Invalid(_) => Err(EvalError::invalid_result(function)),
    }
}
