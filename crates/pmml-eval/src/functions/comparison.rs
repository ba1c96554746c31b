//! Comparison functions
//!
//! Implements: equal, notEqual, lessThan, lessOrEqual, greaterThan,
//! greaterOrEqual. Operands are coerced to their least restrictive common
//! type first; strings order lexicographically.

use super::{arg, Arity, FunctionRegistry, MissingArgs, Outcome};
use crate::error::EvalResult;
use pmml_types::Value;
use std::cmp::Ordering;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register("equal", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let equal = arg(args, 0)?.equals_value(arg(args, 1)?)?;
        Ok(Value::boolean(equal).into())
    });
    registry.register("notEqual", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let equal = arg(args, 0)?.equals_value(arg(args, 1)?)?;
        Ok(Value::boolean(!equal).into())
    });

    for (name, accepts) in [
        ("lessThan", Ordering::is_lt as fn(Ordering) -> bool),
        ("lessOrEqual", Ordering::is_le),
        ("greaterThan", Ordering::is_gt),
        ("greaterOrEqual", Ordering::is_ge),
    ] {
        registry.register(name, Arity::Exact(2), MissingArgs::Propagate, move |args| {
            compare(arg(args, 0)?, arg(args, 1)?, accepts)
        });
    }
}

fn compare(left: &Value, right: &Value, accepts: fn(Ordering) -> bool) -> EvalResult<Outcome> {
    let ordering = left.compare_natural(right)?;
    Ok(Value::boolean(accepts(ordering)).into())
}
