//! Trigonometric and hyperbolic functions
//!
//! Implements: sin, cos, tan, asin, acos, atan, atan2, sinh, cosh, tanh.
//! Computed in double precision; a result outside of the real numbers is
//! invalid.

use super::{arg, Arity, FunctionRegistry, MissingArgs, Outcome};
use pmml_types::DoubleValue;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    for (name, f) in [
        ("sin", f64::sin as fn(f64) -> f64),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
    ] {
        registry.register(name, Arity::Exact(1), MissingArgs::Propagate, move |args| {
            let x = arg(args, 0)?.to_f64()?;
            Ok(evaluate(name, x, f))
        });
    }

    registry.register("atan2", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let y = arg(args, 0)?.to_f64()?;
        let x = arg(args, 1)?.to_f64()?;
        Ok(evaluate("atan2", y, |y| y.atan2(x)))
    });
}

fn evaluate(name: &'static str, x: f64, f: impl FnOnce(f64) -> f64) -> Outcome {
    match DoubleValue::new(x).apply(name, f) {
        Ok(acc) => Outcome::Value(acc.to_value()),
        Err(error) => {
            log::trace!("invalid {} result: {}", name, error);
            Outcome::Invalid(None)
        }
    }
}
