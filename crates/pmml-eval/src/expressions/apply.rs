//! Function application
//!
//! `Apply` evaluates its arguments and calls a built-in function from the
//! engine's registry or, failing that, a function defined by the model. The
//! result is then subject to the `Apply`'s own policies:
//!
//! - any argument missing and `map_missing_to` set: that literal, without a call
//! - missing result: `default_value`, else missing
//! - invalid result: decided by the invalid value treatment
//!
//! `if`, `isValid` and `isInvalid` are special forms: `if` evaluates only the
//! branch it takes, and the validity checks look at how a field was prepared
//! rather than at its value.

use crate::context::{EvaluationContext, Guard};
use crate::engine::{infer_literal, PmmlEngine};
use crate::error::{EvalError, EvalResult};
use crate::functions::Outcome;
use crate::key::FieldKey;
use crate::preparation::ValueStatus;
use pmml_ast::{Apply, DefineFunction, Expression, InvalidValueTreatment};
use pmml_diagnostics::PMML0303;
use pmml_types::Value;
use smallvec::SmallVec;
use std::sync::Arc;

impl PmmlEngine {
    pub(crate) fn eval_apply(
        &self,
        apply: &Apply,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        match apply.function.as_str() {
            "if" => return self.eval_if(apply, ctx),
            "isValid" | "isInvalid" => return self.eval_validity(apply, ctx),
            _ => {}
        }

        let mut args: SmallVec<[Option<Value>; 4]> = SmallVec::with_capacity(apply.args.len());
        for arg in &apply.args {
            args.push(self.eval(arg, ctx)?);
        }

        if args.iter().any(Option::is_none) {
            if let Some(text) = &apply.map_missing_to {
                return Ok(Some(infer_literal(text)));
            }
        }

        let outcome = if let Some(function) = self.registry().get(&apply.function) {
            function.call(&args)?
        } else {
            let index = Arc::clone(ctx.index());
            match index.function(&apply.function) {
                Some(function) => self.call_defined_function(function, &args, ctx)?.into(),
                None => return Err(EvalError::unsupported_function(&apply.function)),
            }
        };

        self.treat_outcome(apply, outcome, ctx)
    }

    fn treat_outcome(
        &self,
        apply: &Apply,
        outcome: Outcome,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        let default = || apply.default_value.as_deref().map(infer_literal);

        match outcome {
            Outcome::Value(value) => Ok(Some(value)),
            Outcome::Missing => Ok(default()),
            Outcome::Invalid(value) => match apply.invalid_value_treatment {
                InvalidValueTreatment::ReturnInvalid => {
                    Err(EvalError::invalid_result(&apply.function))
                }
                InvalidValueTreatment::AsIs => Ok(value),
                InvalidValueTreatment::AsMissing => {
                    ctx.warn(
                        PMML0303,
                        None,
                        format!("invalid result of '{}' treated as missing", apply.function),
                    );
                    Ok(default())
                }
            },
        }
    }

    /// Call a function defined by the model
    ///
    /// The body runs in a fresh scope that sees only the parameters. Present
    /// arguments are converted to the parameter types, and the result to the
    /// function's type.
    fn call_defined_function(
        &self,
        function: &DefineFunction,
        args: &[Option<Value>],
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        if args.len() != function.parameters.len() {
            return Err(EvalError::invalid_model(format!(
                "function '{}' takes {} arguments, got {}",
                function.name,
                function.parameters.len(),
                args.len()
            )));
        }

        ctx.guarded(Guard::Function, |ctx| {
            let mut scope = ctx.function_scope();
            let mut result = Ok(None);

            for (parameter, arg) in function.parameters.iter().zip(args) {
                let value = match (arg, parameter.data_type) {
                    (Some(value), Some(data_type)) => {
                        let op_type = parameter
                            .op_type
                            .unwrap_or_else(|| data_type.default_op_type());
                        Some(value.cast_to(data_type, op_type)?)
                    }
                    (arg, _) => arg.clone(),
                };
                if let Err(error) = scope.declare(FieldKey::name(&parameter.name), value) {
                    result = Err(error);
                    break;
                }
            }

            if result.is_ok() {
                result = self.eval(&function.expression, &mut scope);
            }
            ctx.absorb(scope);

            match result? {
                Some(value) => Ok(Some(value.cast_to(function.data_type, function.op_type())?)),
                None => Ok(None),
            }
        })
    }

    // =========================================================================
    // Special Forms
    // =========================================================================

    /// `if(condition, then[, else])`; a missing condition is a missing argument
    fn eval_if(&self, apply: &Apply, ctx: &mut EvaluationContext<'_>) -> EvalResult<Option<Value>> {
        if !(2..=3).contains(&apply.args.len()) {
            return Err(EvalError::invalid_model(format!(
                "function 'if' takes 2 to 3 arguments, got {}",
                apply.args.len()
            )));
        }

        let Some(condition) = self.eval(&apply.args[0], ctx)? else {
            return match &apply.map_missing_to {
                Some(text) => Ok(Some(infer_literal(text))),
                None => self.treat_outcome(apply, Outcome::Missing, ctx),
            };
        };

        let branch = if condition.to_bool()? {
            apply.args.get(1)
        } else {
            apply.args.get(2)
        };
        let value = match branch {
            Some(expr) => self.eval(expr, ctx)?,
            None => None,
        };
        self.treat_outcome(apply, value.into(), ctx)
    }

    /// `isValid(field)` / `isInvalid(field)`
    ///
    /// A field rejected by a return-invalid policy is invalid here rather than
    /// an error.
    fn eval_validity(
        &self,
        apply: &Apply,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        let [Expression::FieldRef(field_ref)] = apply.args.as_slice() else {
            return Err(EvalError::invalid_model(format!(
                "function '{}' takes a single field reference",
                apply.function
            )));
        };

        let value = match self.resolve_field(&field_ref.field, ctx) {
            Ok(value) => value,
            Err(EvalError::InvalidInput { field, .. }) if field == field_ref.field => None,
            Err(error) => return Err(error),
        };

        // Derived fields have no preparation status
        let status = ctx.field_status(&field_ref.field);
        let valid = match status {
            Some(status) => status == ValueStatus::Valid,
            None => value.is_some(),
        };
        let invalid = status == Some(ValueStatus::Invalid);

        let result = if apply.function == "isValid" { valid } else { invalid };
        Ok(Some(Value::boolean(result)))
    }
}

#[cfg(test)]
mod tests {
    use crate::arguments::Record;
    use crate::context::EvaluationContext;
    use crate::engine::PmmlEngine;
    use crate::error::EvalError;
    use crate::index::ModelIndex;
    use pmml_ast::{
        Apply, DefineFunction, Dictionary, Expression, FieldSpec, InvalidValueTreatment,
        ParameterField,
    };
    use pmml_diagnostics::PMML0303;
    use pmml_types::{DataType, Value};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn dictionary() -> Dictionary {
        Dictionary::new()
            .with_field(FieldSpec::new("x", DataType::Double))
            .with_field(
                FieldSpec::new("grade", DataType::String).with_valid_values(["A", "B"]),
            )
            .with_function(DefineFunction::new(
                "twice",
                vec![ParameterField::typed("v", DataType::Double)],
                DataType::Double,
                Expression::Apply(
                    Apply::new("*").with_args([Expression::field("v"), Expression::constant("2")]),
                ),
            ))
            .with_function(DefineFunction::new(
                "forever",
                vec![ParameterField::new("v")],
                DataType::Double,
                Expression::Apply(Apply::new("forever").with_arg(Expression::field("v"))),
            ))
            .with_function(DefineFunction::new(
                "peek",
                vec![ParameterField::new("v")],
                DataType::Double,
                Expression::field("x"),
            ))
    }

    fn eval(apply: Apply, record: &Record) -> (Result<Option<Value>, EvalError>, Vec<String>) {
        let index = ModelIndex::shared(&dictionary()).unwrap();
        let mut ctx = EvaluationContext::new(index, record);
        let result = PmmlEngine::new().evaluate_expression(&Expression::Apply(apply), &mut ctx);
        let warnings = ctx.warning_messages().map(str::to_string).collect();
        (result, warnings)
    }

    fn sum_with_x() -> Apply {
        Apply::new("+").with_args([Expression::field("x"), Expression::constant("1")])
    }

    #[test]
    fn test_builtin_call() {
        let record = Record::new().with("x", "2");
        assert_eq!(eval(sum_with_x(), &record).0.unwrap(), Some(Value::double(3.0)));
    }

    #[rstest]
    #[case(Some("-1"), None, Some(Value::integer(-1)))]
    #[case(None, Some("0"), Some(Value::integer(0)))]
    #[case(None, None, None)]
    fn test_missing_argument(
        #[case] map_missing_to: Option<&str>,
        #[case] default: Option<&str>,
        #[case] expected: Option<Value>,
    ) {
        let mut apply = sum_with_x();
        if let Some(text) = map_missing_to {
            apply = apply.with_map_missing_to(text);
        }
        if let Some(text) = default {
            apply = apply.with_default(text);
        }
        assert_eq!(eval(apply, &Record::new()).0.unwrap(), expected);
    }

    #[rstest]
    #[case(InvalidValueTreatment::ReturnInvalid, None)]
    #[case(InvalidValueTreatment::AsMissing, Some(Value::integer(0)))]
    #[case(InvalidValueTreatment::AsIs, None)]
    fn test_invalid_result(
        #[case] treatment: InvalidValueTreatment,
        #[case] expected: Option<Value>,
    ) {
        let apply = Apply::new("/")
            .with_args([Expression::constant("1"), Expression::constant("0")])
            .with_default("0")
            .with_invalid_treatment(treatment);
        let (result, warnings) = eval(apply, &Record::new());

        match treatment {
            InvalidValueTreatment::ReturnInvalid => {
                assert_eq!(result.unwrap_err(), EvalError::invalid_result("/"));
            }
            InvalidValueTreatment::AsMissing => {
                assert_eq!(result.unwrap(), expected);
                assert_eq!(warnings.len(), 1);
            }
            InvalidValueTreatment::AsIs => assert_eq!(result.unwrap(), expected),
        }
    }

    #[test]
    fn test_as_missing_warning_code() {
        let index = ModelIndex::shared(&dictionary()).unwrap();
        let record = Record::new();
        let mut ctx = EvaluationContext::new(index, &record);
        let apply = Apply::new("ln")
            .with_arg(Expression::constant("-1"))
            .with_invalid_treatment(InvalidValueTreatment::AsMissing);

        let value = PmmlEngine::new()
            .evaluate_expression(&Expression::Apply(apply), &mut ctx)
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(ctx.warnings()[0].code, PMML0303);
    }

    #[test]
    fn test_if_evaluates_only_the_taken_branch() {
        // The else branch calls an unknown function and would fail
        let apply = Apply::new("if").with_args([
            Expression::constant("1"),
            Expression::constant("yes"),
            Expression::Apply(Apply::new("noSuchFunction")),
        ]);
        assert_eq!(eval(apply, &Record::new()).0.unwrap(), Some(Value::string("yes")));
    }

    #[test]
    fn test_if_without_else() {
        let apply = Apply::new("if").with_args([Expression::constant("0"), Expression::constant("yes")]);
        assert_eq!(eval(apply, &Record::new()).0.unwrap(), None);
    }

    #[test]
    fn test_defined_function() {
        let apply = Apply::new("twice").with_arg(Expression::constant("4"));
        assert_eq!(eval(apply, &Record::new()).0.unwrap(), Some(Value::double(8.0)));
    }

    #[test]
    fn test_defined_function_cannot_see_model_fields() {
        let record = Record::new().with("x", "1");
        let apply = Apply::new("peek").with_arg(Expression::constant("4"));
        assert_eq!(eval(apply, &record).0.unwrap_err(), EvalError::missing_field("x"));
    }

    #[test]
    fn test_runaway_recursion_is_bounded() {
        let apply = Apply::new("forever").with_arg(Expression::constant("1"));
        let err = eval(apply, &Record::new()).0.unwrap_err();
        assert!(matches!(err, EvalError::RecursionLimitExceeded { .. }));
    }

    #[test]
    fn test_unknown_function() {
        let err = eval(Apply::new("nope"), &Record::new()).0.unwrap_err();
        assert_eq!(err, EvalError::unsupported_function("nope"));
    }

    #[rstest]
    #[case(Some("A"), true, false)]
    #[case(Some("Z"), false, true)]
    #[case(None, false, false)]
    fn test_validity(#[case] grade: Option<&str>, #[case] valid: bool, #[case] invalid: bool) {
        let record = match grade {
            Some(grade) => Record::new().with("grade", grade),
            None => Record::new(),
        };
        let is_valid = Apply::new("isValid").with_arg(Expression::field("grade"));
        let is_invalid = Apply::new("isInvalid").with_arg(Expression::field("grade"));

        assert_eq!(eval(is_valid, &record).0.unwrap(), Some(Value::boolean(valid)));
        assert_eq!(eval(is_invalid, &record).0.unwrap(), Some(Value::boolean(invalid)));
    }
}
