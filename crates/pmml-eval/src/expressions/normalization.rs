//! Normalization expressions
//!
//! `NormContinuous` maps a number through a piecewise-linear function given by
//! breakpoints `(orig, norm)`. Inside the breakpoints the value is
//! interpolated; outside of them the outlier treatment decides:
//!
//! | treatment         | below first / above last breakpoint          |
//! |-------------------|----------------------------------------------|
//! | asIs              | extrapolate from the first / last segment    |
//! | asMissingValues   | missing                                      |
//! | asExtremeValues   | the first / last `norm`                      |
//!
//! `NormDiscrete` is an indicator: 1.0 when the field equals the value.

use crate::context::EvaluationContext;
use crate::engine::{matches_literal, PmmlEngine};
use crate::error::{EvalError, EvalResult};
use pmml_ast::{LinearNorm, NormContinuous, NormDiscrete, OutlierTreatment};
use pmml_types::{DoubleValue, Value};

impl PmmlEngine {
    pub(crate) fn eval_norm_continuous(
        &self,
        norm: &NormContinuous,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        check_breakpoints(norm)?;

        let Some(value) = self.resolve_field(&norm.field, ctx)? else {
            return Ok(norm.map_missing_to.map(Value::double));
        };
        Ok(normalize(norm, value.to_f64()?)?.map(Value::double))
    }

    pub(crate) fn eval_norm_discrete(
        &self,
        norm: &NormDiscrete,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        let Some(value) = self.resolve_field(&norm.field, ctx)? else {
            return Ok(norm.map_missing_to.map(Value::double));
        };
        let indicator = if matches_literal(&value, &norm.value)? { 1.0 } else { 0.0 };
        Ok(Some(Value::double(indicator)))
    }
}

/// At least two breakpoints with strictly ascending `orig`
fn check_breakpoints(norm: &NormContinuous) -> EvalResult<()> {
    if norm.norms.len() < 2 {
        return Err(EvalError::invalid_model(format!(
            "normalization of '{}' needs at least 2 breakpoints",
            norm.field
        )));
    }
    if norm.norms.windows(2).any(|pair| pair[0].orig >= pair[1].orig) {
        return Err(EvalError::invalid_model(format!(
            "breakpoints of '{}' are not in ascending order",
            norm.field
        )));
    }
    Ok(())
}

/// Segment of the piecewise-linear function that applies to `x` along `axis`
///
/// Returns `None` when `x` is outside of the breakpoints, together with the
/// end it fell off.
fn segment(
    norms: &[LinearNorm],
    x: f64,
    axis: fn(&LinearNorm) -> f64,
) -> Result<(LinearNorm, LinearNorm), Outside> {
    let (first, last) = (norms[0], norms[norms.len() - 1]);
    if x < axis(&first) {
        return Err(Outside::Below);
    }
    if x > axis(&last) {
        return Err(Outside::Above);
    }
    let pair = norms
        .windows(2)
        .find(|pair| x <= axis(&pair[1]))
        .unwrap_or(&norms[norms.len() - 2..]);
    Ok((pair[0], pair[1]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outside {
    Below,
    Above,
}

fn normalize(norm: &NormContinuous, x: f64) -> EvalResult<Option<f64>> {
    let norms = &norm.norms;
    let n = norms.len();

    let (left, right) = match segment(norms, x, |p| p.orig) {
        Ok(pair) => pair,
        Err(outside) => match norm.outliers {
            OutlierTreatment::AsMissingValues => return Ok(None),
            OutlierTreatment::AsExtremeValues => {
                let end = if outside == Outside::Below { norms[0] } else { norms[n - 1] };
                return Ok(Some(end.norm));
            }
            OutlierTreatment::AsIs if outside == Outside::Below => (norms[0], norms[1]),
            OutlierTreatment::AsIs => (norms[n - 2], norms[n - 1]),
        },
    };

    let mut acc = DoubleValue::new(x);
    acc.normalize(left.orig, left.norm, right.orig, right.norm)?;
    Ok(Some(acc.to_f64()))
}

/// Map a normalized value back to the original scale
///
/// Used by scorers whose targets are normalized. The `norm` values must be
/// strictly monotonic; outside of them the end segments are extrapolated.
pub fn denormalize(norm: &NormContinuous, y: f64) -> EvalResult<f64> {
    check_breakpoints(norm)?;

    let mut norms = norm.norms.clone();
    let ascending = norms.windows(2).all(|pair| pair[0].norm < pair[1].norm);
    let descending = norms.windows(2).all(|pair| pair[0].norm > pair[1].norm);
    if descending {
        norms.reverse();
    } else if !ascending {
        return Err(EvalError::invalid_model(format!(
            "normalization of '{}' cannot be inverted",
            norm.field
        )));
    }

    let n = norms.len();
    let (left, right) = match segment(&norms, y, |p| p.norm) {
        Ok(pair) => pair,
        Err(Outside::Below) => (norms[0], norms[1]),
        Err(Outside::Above) => (norms[n - 2], norms[n - 1]),
    };

    let mut acc = DoubleValue::new(y);
    acc.denormalize(left.orig, left.norm, right.orig, right.norm)?;
    Ok(acc.to_f64())
}
