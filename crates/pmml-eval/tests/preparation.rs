//! Field Preparation Tests
//!
//! Treatment policies applied to raw inputs, including property checks that
//! preparing an already prepared value changes nothing.

use pmml_ast::{
    FieldSpec, Interval, InvalidValueTreatment, MissingValueTreatment, OutlierTreatment,
};
use pmml_eval::{
    prepare_field, prepare_field_with_status, PreparedField, Rejection, Treatment, ValueStatus,
};
use pmml_types::{DataType, OpType, RawValue, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn compile(spec: FieldSpec) -> PreparedField {
    PreparedField::compile(&spec).unwrap()
}

fn clamped() -> PreparedField {
    compile(
        FieldSpec::new("score", DataType::Double)
            .with_outliers(OutlierTreatment::AsExtremeValues, 0.0, 100.0),
    )
}

fn categories() -> PreparedField {
    compile(
        FieldSpec::new("grade", DataType::String)
            .with_valid_values(["A", "B"])
            .with_invalid_treatment(InvalidValueTreatment::AsMissing)
            .with_missing_treatment(MissingValueTreatment::AsValue)
            .with_missing_replacement("UNK"),
    )
}

fn prepare(raw: &str, field: &PreparedField) -> Result<Value, Rejection> {
    prepare_field(Some(&RawValue::from(raw)), field)
}

// ============================================================================
// Treatments
// ============================================================================

#[rstest]
#[case("150", 100.0)]
#[case("-3", 0.0)]
#[case("42.5", 42.5)]
fn test_extreme_values_are_clamped(#[case] raw: &str, #[case] expected: f64) {
    assert_eq!(prepare(raw, &clamped()), Ok(Value::double(expected)));
}

#[test]
fn test_outliers_as_missing() {
    let field = compile(
        FieldSpec::new("score", DataType::Double)
            .with_outliers(OutlierTreatment::AsMissingValues, 0.0, 100.0),
    );
    let preparation = prepare_field_with_status(Some(&RawValue::from("150")), &field);

    // An outlier is still a valid value; only its treatment makes it missing
    assert_eq!(preparation.status, ValueStatus::Valid);
    assert!(preparation.outcome.unwrap_err().is_missing());
}

#[test]
fn test_invalid_category_becomes_missing_replacement() {
    let preparation = prepare_field_with_status(Some(&RawValue::from("Z")), &categories());
    assert_eq!(preparation.status, ValueStatus::Invalid);
    assert_eq!(preparation.outcome, Ok(Value::string("UNK")));
}

#[test]
fn test_absent_category_becomes_missing_replacement() {
    let preparation = prepare_field_with_status(None, &categories());
    assert_eq!(preparation.status, ValueStatus::Missing);
    assert_eq!(preparation.outcome, Ok(Value::string("UNK")));
}

#[test]
fn test_declared_missing_literal() {
    let field = compile(FieldSpec::new("x", DataType::Integer).with_missing_values(["-999"]));
    let preparation = prepare_field_with_status(Some(&RawValue::from("-999")), &field);
    assert_eq!(preparation.status, ValueStatus::Missing);
}

#[test]
fn test_return_invalid_rejects_record() {
    let field = compile(
        FieldSpec::new("x", DataType::Double)
            .with_interval(Interval::closed(0.0, 1.0))
            .with_invalid_treatment(InvalidValueTreatment::ReturnInvalid),
    );
    let rejection = prepare("2", &field).unwrap_err();
    assert_eq!(rejection.status, ValueStatus::Invalid);
    assert_eq!(
        rejection.policy,
        Treatment::Invalid(InvalidValueTreatment::ReturnInvalid)
    );
    assert!(!rejection.is_missing());
}

#[test]
fn test_missing_return_invalid_is_not_plain_missing() {
    let field = compile(
        FieldSpec::new("x", DataType::Double)
            .with_missing_treatment(MissingValueTreatment::ReturnInvalid),
    );
    let rejection = prepare_field(None, &field).unwrap_err();
    assert_eq!(rejection.status, ValueStatus::Missing);
    assert!(!rejection.is_missing());
}

#[test]
fn test_invalid_as_is_keeps_unparseable_text() {
    let field = compile(FieldSpec::new("x", DataType::Integer));
    assert_eq!(prepare("many", &field), Ok(Value::string("many")));
}

#[test]
fn test_list_input_becomes_collection() {
    let field = compile(FieldSpec::new("xs", DataType::Integer));
    let raw = RawValue::List(vec![Some(RawValue::from("1")), None, Some(RawValue::from("3"))]);

    let value = prepare_field(Some(&raw), &field).unwrap();
    let collection = value.as_collection().unwrap();
    assert_eq!(collection.len(), 3);
    assert_eq!(collection.present().count(), 2);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_clamping_is_idempotent(x in -1.0e6f64..1.0e6) {
        let field = clamped();
        let once = prepare_field(Some(&RawValue::from(x)), &field).unwrap();
        let twice = prepare_field(Some(&RawValue::from(once.to_f64().unwrap())), &field).unwrap();
        prop_assert_eq!(&once, &twice);

        let y = once.to_f64().unwrap();
        prop_assert!((0.0..=100.0).contains(&y));
        prop_assert_eq!(once.op_type(), OpType::Continuous);
    }

    #[test]
    fn prop_category_preparation_is_idempotent(raw in "[A-Z]{1,2}") {
        let field = categories();
        let once = prepare(&raw, &field).unwrap();
        let text = once.as_str().unwrap().to_string();
        prop_assert!(text == "A" || text == "B" || text == "UNK");
        // The replacement itself is not a valid value, so it is replaced again
        prop_assert_eq!(prepare(&text, &field).unwrap(), once);
    }

    #[test]
    fn prop_integer_text_round_trips(i in any::<i32>()) {
        let field = compile(FieldSpec::new("n", DataType::Integer));
        let value = prepare(&i.to_string(), &field).unwrap();
        prop_assert_eq!(value, Value::integer(i64::from(i)));
    }
}
