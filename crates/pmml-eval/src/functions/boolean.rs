//! Boolean and nullity functions
//!
//! Implements: and, or, not, isIn, isNotIn, isMissing, isNotMissing.
//! `if`, `isValid` and `isInvalid` need the unevaluated arguments and are
//! special forms of the engine.
//!
//! `and` and `or` follow Kleene logic over missing operands:
//!
//! | A       | B       | A and B | A or B  |
//! |---------|---------|---------|---------|
//! | true    | true    | true    | true    |
//! | true    | false   | false   | true    |
//! | true    | missing | missing | true    |
//! | false   | false   | false   | false   |
//! | false   | missing | false   | missing |
//! | missing | missing | missing | missing |

use super::{arg, Arity, FunctionRegistry, MissingArgs, Outcome};
use crate::error::EvalResult;
use pmml_types::Value;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register("and", Arity::AtLeast(2), MissingArgs::Accept, |args| {
        kleene(args, false)
    });
    registry.register("or", Arity::AtLeast(2), MissingArgs::Accept, |args| {
        kleene(args, true)
    });
    registry.register("not", Arity::Exact(1), MissingArgs::Propagate, |args| {
        Ok(Value::boolean(!arg(args, 0)?.to_bool()?).into())
    });

    registry.register("isIn", Arity::AtLeast(2), MissingArgs::Accept, |args| {
        membership(args, true)
    });
    registry.register("isNotIn", Arity::AtLeast(2), MissingArgs::Accept, |args| {
        membership(args, false)
    });

    registry.register("isMissing", Arity::Exact(1), MissingArgs::Accept, |args| {
        Ok(Value::boolean(args[0].is_none()).into())
    });
    registry.register("isNotMissing", Arity::Exact(1), MissingArgs::Accept, |args| {
        Ok(Value::boolean(args[0].is_some()).into())
    });
}

/// Kleene conjunction (`dominant = false`) or disjunction (`dominant = true`)
fn kleene(args: &[Option<Value>], dominant: bool) -> EvalResult<Outcome> {
    let mut unknown = false;
    for value in args {
        match value {
            Some(value) if value.to_bool()? == dominant => {
                return Ok(Value::boolean(dominant).into());
            }
            Some(_) => {}
            None => unknown = true,
        }
    }
    Ok(if unknown {
        Outcome::Missing
    } else {
        Value::boolean(!dominant).into()
    })
}

/// Membership of the first argument among the remaining present ones
fn membership(args: &[Option<Value>], expected: bool) -> EvalResult<Outcome> {
    let Some(needle) = &args[0] else {
        return Ok(Outcome::Missing);
    };

    let mut found = false;
    for candidate in args[1..].iter().flatten() {
        if needle.equals_value(candidate)? {
            found = true;
            break;
        }
    }
    Ok(Value::boolean(found == expected).into())
}

#[cfg(test)]
mod tests {
    use crate::functions::{standard_registry, Outcome};
    use pmml_types::Value;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn truth(value: Option<bool>) -> Option<Value> {
        value.map(Value::boolean)
    }

    fn outcome(value: Option<bool>) -> Outcome {
        value.map_or(Outcome::Missing, |b| Outcome::Value(Value::boolean(b)))
    }

    #[rstest]
    #[case(Some(true), Some(true), Some(true), Some(true))]
    #[case(Some(true), Some(false), Some(false), Some(true))]
    #[case(Some(true), None, None, Some(true))]
    #[case(Some(false), Some(true), Some(false), Some(true))]
    #[case(Some(false), Some(false), Some(false), Some(false))]
    #[case(Some(false), None, Some(false), None)]
    #[case(None, Some(true), None, Some(true))]
    #[case(None, Some(false), Some(false), None)]
    #[case(None, None, None, None)]
    fn test_kleene_truth_table(
        #[case] a: Option<bool>,
        #[case] b: Option<bool>,
        #[case] and: Option<bool>,
        #[case] or: Option<bool>,
    ) {
        let registry = standard_registry();
        let args = [truth(a), truth(b)];
        assert_eq!(registry.call("and", &args).unwrap(), outcome(and));
        assert_eq!(registry.call("or", &args).unwrap(), outcome(or));
    }

    #[test]
    fn test_membership() {
        let registry = standard_registry();
        let args = [Some(Value::integer(2)), Some(Value::double(2.0)), None];
        assert_eq!(registry.call("isIn", &args).unwrap(), outcome(Some(true)));
        assert_eq!(registry.call("isNotIn", &args).unwrap(), outcome(Some(false)));

        let missing = [None, Some(Value::integer(1))];
        assert_eq!(registry.call("isIn", &missing).unwrap(), Outcome::Missing);
    }

    #[test]
    fn test_nullity_never_missing() {
        let registry = standard_registry();
        assert_eq!(registry.call("isMissing", &[None]).unwrap(), outcome(Some(true)));
        assert_eq!(
            registry.call("isNotMissing", &[Some(Value::integer(0))]).unwrap(),
            outcome(Some(true))
        );
        assert_eq!(registry.call("not", &[None]).unwrap(), Outcome::Missing);
    }
}
