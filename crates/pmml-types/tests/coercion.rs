//! Coercion tests for the PMML type system
//!
//! Tests the least-restrictive type rule, parsing of every data type, casting
//! between representations and the parse/format round-trip.

use chrono::{NaiveDate, NaiveTime};
use pmml_types::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

// ============================================================================
// Least Restrictive Type
// ============================================================================

const PRIORITY_CHAIN: [DataType; 4] = [
    DataType::String,
    DataType::Double,
    DataType::Float,
    DataType::Integer,
];

#[rstest]
#[case(DataType::Integer, DataType::Float, DataType::Float)]
#[case(DataType::Integer, DataType::Double, DataType::Double)]
#[case(DataType::Float, DataType::Double, DataType::Double)]
#[case(DataType::String, DataType::Integer, DataType::String)]
#[case(DataType::Boolean, DataType::Double, DataType::Double)]
#[case(DataType::Date, DataType::String, DataType::String)]
#[case(DataType::DateDaysSince1970, DataType::Integer, DataType::Integer)]
fn test_result_data_type(#[case] left: DataType, #[case] right: DataType, #[case] expected: DataType) {
    assert_eq!(result_data_type(left, right).unwrap(), expected);
    assert_eq!(result_data_type(right, left).unwrap(), expected);
}

#[test]
fn test_result_data_type_closure() {
    for left in DataType::ALL {
        for right in DataType::ALL {
            let forward = result_data_type(left, right);
            let backward = result_data_type(right, left);
            assert_eq!(forward.is_ok(), backward.is_ok(), "{left} vs {right}");

            if let Ok(result) = forward {
                assert_eq!(backward.unwrap(), result);
                if left != right {
                    assert!(PRIORITY_CHAIN.contains(&result), "{left} vs {right} -> {result}");
                }
            }
        }
    }
}

#[test]
fn test_incompatible_pairs() {
    assert!(result_data_type(DataType::Date, DataType::Time).is_err());
    assert!(result_data_type(DataType::Boolean, DataType::Date).is_err());
    assert!(
        result_data_type(DataType::DateTimeSecondsSince1960, DataType::DateTimeSecondsSince1980)
            .is_err()
    );
}

// ============================================================================
// Parsing
// ============================================================================

#[rstest]
#[case(DataType::Integer, "-12", Data::Integer(-12))]
#[case(DataType::Integer, "12.0", Data::Integer(12))]
#[case(DataType::Double, "1.5e2", Data::Double(150.0))]
#[case(DataType::Float, "0.1", Data::Float(0.1))]
#[case(DataType::Boolean, "False", Data::Boolean(false))]
#[case(DataType::String, " padded ", Data::String(" padded ".into()))]
#[case(DataType::Date, "2024-03-01", Data::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))]
#[case(DataType::Time, "08:15:30", Data::Time(NaiveTime::from_hms_opt(8, 15, 30).unwrap()))]
#[case(DataType::DateDaysSince1980, "1980-02-01", Data::DaysSince(Epoch::Y1980, 31))]
#[case(DataType::TimeSeconds, "1:00:00", Data::SecondsSinceMidnight(3600))]
fn test_parse(#[case] data_type: DataType, #[case] text: &str, #[case] expected: Data) {
    assert_eq!(parse(data_type, text).unwrap(), expected);
}

#[rstest]
#[case(DataType::Integer, "1.25")]
#[case(DataType::Double, "one")]
#[case(DataType::Boolean, "maybe")]
#[case(DataType::Date, "2024-13-01")]
#[case(DataType::Time, "25:00:00")]
#[case(DataType::DateDaysSince1960, "yesterday")]
fn test_parse_failure_is_parse_error(#[case] data_type: DataType, #[case] text: &str) {
    let err = parse(data_type, text).unwrap_err();
    assert!(err.is_parse_error(), "{err}");
}

// ============================================================================
// Casting
// ============================================================================

#[rstest]
#[case(DataType::Integer, Data::Double(2.0), Data::Integer(2))]
#[case(DataType::Integer, Data::Boolean(true), Data::Integer(1))]
#[case(DataType::Double, Data::Integer(-3), Data::Double(-3.0))]
#[case(DataType::String, Data::Integer(7), Data::String("7".into()))]
#[case(DataType::Boolean, Data::Double(0.0), Data::Boolean(false))]
#[case(DataType::DateDaysSince1960, Data::DaysSince(Epoch::Y1980, 0), Data::DaysSince(Epoch::Y1960, 7305))]
#[case(DataType::TimeSeconds, Data::Time(NaiveTime::from_hms_opt(0, 2, 0).unwrap()), Data::SecondsSinceMidnight(120))]
fn test_cast(#[case] data_type: DataType, #[case] data: Data, #[case] expected: Data) {
    assert_eq!(cast(data_type, &data).unwrap(), expected);
}

#[rstest]
#[case(DataType::Integer, Data::Double(0.5))]
#[case(DataType::Boolean, Data::Integer(3))]
#[case(DataType::Date, Data::Time(NaiveTime::MIN))]
#[case(DataType::Double, Data::String("1".into()))]
fn test_cast_failure_is_mismatch(#[case] data_type: DataType, #[case] data: Data) {
    let err = cast(data_type, &data).unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }), "{err}");
}

#[test]
fn test_epoch_cast_is_offset_not_reparse() {
    // day 0 of 1960 is day -3653 of 1970
    let value = Data::DaysSince(Epoch::Y1960, 0);
    assert_eq!(
        cast(DataType::DateDaysSince1970, &value).unwrap(),
        Data::DaysSince(Epoch::Y1970, -3653)
    );
}

// ============================================================================
// Round Trip Properties
// ============================================================================

fn data_strategy() -> impl Strategy<Value = Data> {
    let date = (1900i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
    let time = (0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000)
        .prop_map(|(h, m, s, micro)| NaiveTime::from_hms_micro_opt(h, m, s, micro).unwrap());
    let epoch = prop_oneof![Just(Epoch::Y1960), Just(Epoch::Y1970), Just(Epoch::Y1980)];

    prop_oneof![
        "[a-zA-Z0-9 ]{0,12}".prop_map(Data::String),
        any::<i64>().prop_map(Data::Integer),
        any::<f32>().prop_filter("NaN", |v| !v.is_nan()).prop_map(Data::Float),
        any::<f64>().prop_filter("NaN", |v| !v.is_nan()).prop_map(Data::Double),
        any::<bool>().prop_map(Data::Boolean),
        date.clone().prop_map(Data::Date),
        time.clone().prop_map(Data::Time),
        (date, time).prop_map(|(d, t)| Data::DateTime(d.and_time(t))),
        (epoch.clone(), -100_000i64..100_000).prop_map(|(e, v)| Data::DaysSince(e, v)),
        (-1_000_000i64..1_000_000).prop_map(Data::SecondsSinceMidnight),
        (epoch, -4_000_000_000i64..4_000_000_000).prop_map(|(e, v)| Data::SecondsSince(e, v)),
    ]
}

proptest! {
    #[test]
    fn prop_parse_format_round_trip(data in data_strategy()) {
        let data_type = data.data_type();
        let parsed = parse(data_type, &data.to_string()).unwrap();
        prop_assert_eq!(cast(data_type, &parsed).unwrap(), data);
    }

    #[test]
    fn prop_integer_widening_is_exact(v in -(1i64 << 53)..(1i64 << 53)) {
        let widened = cast(DataType::Double, &Data::Integer(v)).unwrap();
        prop_assert_eq!(cast(DataType::Integer, &widened).unwrap(), Data::Integer(v));
    }

    #[test]
    fn prop_epoch_conversion_is_reversible(days in -100_000i64..100_000) {
        for from in Epoch::ALL {
            for to in Epoch::ALL {
                let data = Data::DaysSince(from, days);
                let there = cast(DataType::days_since_epoch(to), &data).unwrap();
                let back = cast(DataType::days_since_epoch(from), &there).unwrap();
                prop_assert_eq!(back, data.clone());
            }
        }
    }
}
