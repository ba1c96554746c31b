//! Expression Evaluation Tests
//!
//! End-to-end evaluation of expressions against a small model:
//! - Constants and field references
//! - Derived fields and their memoization
//! - Normalization, discretization and table lookups
//! - Built-in and user-defined function calls

use pmml_ast::{
    Apply, DefineFunction, DerivedField, Dictionary, Discretize, DiscretizeBin, Expression,
    FieldRef, FieldSpec, Interval, LinearNorm, MapValues, NormContinuous, NormDiscrete,
    OutlierTreatment, ParameterField,
};
use pmml_eval::{EvalError, EvaluationContext, ModelIndex, PmmlEngine, Record};
use pmml_types::{DataType, OpType, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn model() -> Arc<ModelIndex> {
    let dictionary = Dictionary::new()
        .with_field(FieldSpec::new("income", DataType::Double))
        .with_field(FieldSpec::new("age", DataType::Integer))
        .with_field(FieldSpec::new("region", DataType::String))
        .with_derived_field(DerivedField::new(
            "monthly",
            DataType::Double,
            Apply::new("/")
                .with_args([Expression::field("income"), Expression::constant("12")])
                .into(),
        ))
        .with_derived_field(DerivedField::new(
            "band",
            DataType::String,
            Expression::Discretize(
                Discretize::new(
                    "age",
                    vec![
                        DiscretizeBin::new("young", Interval::closed_open(0.0, 30.0)),
                        DiscretizeBin::new("adult", Interval::closed_open(30.0, 65.0)),
                    ],
                )
                .with_default("senior"),
            ),
        ))
        .with_function(DefineFunction::new(
            "scaled",
            vec![
                ParameterField::typed("x", DataType::Double),
                ParameterField::typed("factor", DataType::Double),
            ],
            DataType::Double,
            Apply::new("*")
                .with_args([Expression::field("x"), Expression::field("factor")])
                .into(),
        ));
    ModelIndex::shared(&dictionary).unwrap()
}

fn eval(expr: &Expression, record: &Record) -> Result<Option<Value>, EvalError> {
    let mut ctx = EvaluationContext::new(model(), record);
    PmmlEngine::new().evaluate_expression(expr, &mut ctx)
}

fn apply(function: &str, args: impl IntoIterator<Item = Expression>) -> Expression {
    Apply::new(function).with_args(args).into()
}

// ============================================================================
// Constants and References
// ============================================================================

#[rstest]
#[case("42", Value::integer(42))]
#[case("4.5", Value::float(4.5))]
#[case("1e40", Value::double(1e40))]
#[case("abc", Value::string("abc"))]
fn test_untyped_constant(#[case] text: &str, #[case] expected: Value) {
    let result = eval(&Expression::constant(text), &Record::new()).unwrap();
    assert_eq!(result, Some(expected));
}

#[test]
fn test_typed_constant_parse_error() {
    let expr = Expression::typed_constant("twelve", DataType::Integer);
    assert!(matches!(
        eval(&expr, &Record::new()),
        Err(EvalError::Parse { .. })
    ));
}

#[test]
fn test_field_ref_uses_declared_type() {
    let record = Record::new().with("income", "1200");
    let result = eval(&Expression::field("income"), &record).unwrap();
    assert_eq!(result, Some(Value::double(1200.0)));
}

#[test]
fn test_field_ref_map_missing_to_is_typed() {
    let expr = Expression::FieldRef(FieldRef::new("age").with_map_missing_to("18"));
    let result = eval(&expr, &Record::new()).unwrap();
    assert_eq!(result, Some(Value::integer(18)));
}

#[test]
fn test_undeclared_field_is_an_error() {
    let err = eval(&Expression::field("nowhere"), &Record::new()).unwrap_err();
    assert!(matches!(err, EvalError::MissingField { .. }));
}

// ============================================================================
// Derived Fields
// ============================================================================

#[test]
fn test_derived_field_is_cast_to_its_type() {
    let record = Record::new().with("income", "1200");
    let result = eval(&Expression::field("monthly"), &record).unwrap();
    assert_eq!(result, Some(Value::double(100.0)));
}

#[rstest]
#[case("12", "young")]
#[case("30", "adult")]
#[case("80", "senior")]
fn test_derived_discretization(#[case] age: &str, #[case] expected: &str) {
    let record = Record::new().with("age", age);
    let result = eval(&Expression::field("band"), &record).unwrap();
    assert_eq!(result, Some(Value::string(expected)));
}

#[test]
fn test_derived_field_over_missing_input_is_missing() {
    let result = eval(&Expression::field("monthly"), &Record::new()).unwrap();
    assert_eq!(result, None);
}

#[test]
fn test_field_is_prepared_once_per_record() {
    let record = Record::new().with("income", "1200");
    let mut ctx = EvaluationContext::new(model(), &record);
    let engine = PmmlEngine::new();

    let first = engine.evaluate_field("monthly", &mut ctx).unwrap();
    let second = engine.evaluate_field("monthly", &mut ctx).unwrap();
    assert_eq!(first, second);
    assert!(ctx.is_resolved(&"income".into()));
    assert!(ctx.is_resolved(&"monthly".into()));
}

// ============================================================================
// Transformations
// ============================================================================

fn norm() -> NormContinuous {
    NormContinuous::new(
        "income",
        vec![
            LinearNorm::new(0.0, 0.0),
            LinearNorm::new(1000.0, 0.5),
            LinearNorm::new(3000.0, 1.0),
        ],
    )
}

#[rstest]
#[case("500", Some(0.25))]
#[case("2000", Some(0.75))]
#[case("4000", Some(1.25))]
fn test_norm_continuous_interpolates(#[case] income: &str, #[case] expected: Option<f64>) {
    let record = Record::new().with("income", income);
    let result = eval(&Expression::NormContinuous(norm()), &record).unwrap();
    assert_eq!(result, expected.map(Value::double));
}

#[test]
fn test_norm_continuous_clamps_extreme_values() {
    let record = Record::new().with("income", "-10");
    let expr = Expression::NormContinuous(norm().with_outliers(OutlierTreatment::AsExtremeValues));
    assert_eq!(eval(&expr, &record).unwrap(), Some(Value::double(0.0)));
}

#[test]
fn test_norm_discrete_indicator() {
    let expr = Expression::NormDiscrete(NormDiscrete {
        field: "region".to_string(),
        value: "north".to_string(),
        map_missing_to: Some(-1.0),
    });
    let north = Record::new().with("region", "north");
    let south = Record::new().with("region", "south");

    assert_eq!(eval(&expr, &north).unwrap(), Some(Value::double(1.0)));
    assert_eq!(eval(&expr, &south).unwrap(), Some(Value::double(0.0)));
    assert_eq!(eval(&expr, &Record::new()).unwrap(), Some(Value::double(-1.0)));
}

#[test]
fn test_map_values_lookup_with_default() {
    let expr = Expression::MapValues(
        MapValues::new("code")
            .with_field_column("region", "name")
            .with_row([("name", "north"), ("code", "N")])
            .with_row([("name", "south"), ("code", "S")])
            .with_default("?"),
    );

    let south = Record::new().with("region", "south");
    let east = Record::new().with("region", "east");
    assert_eq!(eval(&expr, &south).unwrap(), Some(Value::string("S")));
    assert_eq!(eval(&expr, &east).unwrap(), Some(Value::string("?")));
}

// ============================================================================
// Function Calls
// ============================================================================

#[rstest]
#[case(apply("+", [Expression::constant("2"), Expression::constant("3")]), Some(Value::integer(5)))]
#[case(apply("/", [Expression::constant("1"), Expression::constant("4")]), Some(Value::double(0.25)))]
#[case(apply("max", [Expression::constant("2"), Expression::constant("7.5")]), Some(Value::float(7.5)))]
#[case(apply("+", [Expression::constant("1"), Expression::constant("1.5")]), Some(Value::float(2.5)))]
#[case(apply("uppercase", [Expression::constant("abc")]), Some(Value::string("ABC")))]
#[case(apply("+", [Expression::constant("2"), Expression::missing_constant()]), None)]
fn test_builtin_function(#[case] expr: Expression, #[case] expected: Option<Value>) {
    assert_eq!(eval(&expr, &Record::new()).unwrap(), expected);
}

#[test]
fn test_integer_arithmetic_promotes_against_double() {
    let record = Record::new().with("age", "40").with("income", "0.5");
    let expr = apply("*", [Expression::field("age"), Expression::field("income")]);
    let result = eval(&expr, &record).unwrap().unwrap();
    assert_eq!(result.data_type(), DataType::Double);
    assert_eq!(result.op_type(), OpType::Continuous);
    assert_eq!(result, Value::double(20.0));
}

#[test]
fn test_decimal_constant_keeps_double_field_precision() {
    let record = Record::new().with("income", "1200");
    let expr = apply("*", [Expression::field("income"), Expression::constant("0.5")]);
    assert_eq!(eval(&expr, &record).unwrap(), Some(Value::double(600.0)));
}

#[test]
fn test_division_by_zero_is_invalid_result() {
    let expr = apply("/", [Expression::constant("1"), Expression::constant("0")]);
    assert!(matches!(
        eval(&expr, &Record::new()),
        Err(EvalError::InvalidResult { .. })
    ));
}

#[test]
fn test_apply_map_missing_to() {
    let expr: Expression = Apply::new("+")
        .with_args([Expression::field("age"), Expression::constant("1")])
        .with_map_missing_to("0")
        .into();
    assert_eq!(eval(&expr, &Record::new()).unwrap(), Some(Value::integer(0)));
}

#[test]
fn test_user_defined_function() {
    let record = Record::new().with("income", "10");
    let expr = apply("scaled", [Expression::field("income"), Expression::constant("3")]);
    assert_eq!(eval(&expr, &record).unwrap(), Some(Value::double(30.0)));
}

#[test]
fn test_user_defined_function_arity_is_checked() {
    let expr = apply("scaled", [Expression::constant("3")]);
    assert!(matches!(
        eval(&expr, &Record::new()),
        Err(EvalError::InvalidModel { .. })
    ));
}

#[test]
fn test_unknown_function() {
    let expr = apply("frobnicate", [Expression::constant("1")]);
    assert!(matches!(
        eval(&expr, &Record::new()),
        Err(EvalError::UnsupportedFunction { .. })
    ));
}
