//! Discretization of continuous values into labeled bins

use crate::context::EvaluationContext;
use crate::engine::{typed_literal, PmmlEngine};
use crate::error::{EvalError, EvalResult};
use pmml_ast::Discretize;
use pmml_types::{DataType, Value};

impl PmmlEngine {
    /// Label of the first bin containing the field's value
    ///
    /// A missing input takes `map_missing_to`, else the default label; a
    /// value outside every bin (or NaN) takes the default label.
    pub(crate) fn eval_discretize(
        &self,
        discretize: &Discretize,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        if let Some(bin) = discretize.bins.iter().find(|bin| !bin.interval.is_well_formed()) {
            return Err(EvalError::invalid_model(format!(
                "bin '{}' of '{}' has a malformed interval",
                bin.label, discretize.field
            )));
        }

        let fallback = discretize.default_value.as_deref();
        let label = match self.resolve_field(&discretize.field, ctx)? {
            None => discretize.map_missing_to.as_deref().or(fallback),
            Some(value) => {
                let x = value.to_f64()?;
                discretize
                    .bins
                    .iter()
                    .find(|bin| !x.is_nan() && bin.interval.contains(x))
                    .map(|bin| bin.label.as_str())
                    .or(fallback)
            }
        };

        let data_type = discretize.data_type.unwrap_or(DataType::String);
        label.map(|label| typed_literal(label, data_type)).transpose()
    }
}
