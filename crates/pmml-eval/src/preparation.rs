//! Field value preparation
//!
//! Turns a raw input into the value a model sees, following the input field's
//! declared value space and treatment policies:
//!
//! 1. classify the input as valid, invalid or missing
//! 2. apply the outlier treatment to valid continuous values
//! 3. apply the missing value treatment to missing values
//! 4. apply the invalid value treatment to invalid values
//!
//! Classification and treatment outcomes are ordinary return values. A
//! [`Rejection`] is not necessarily an error: a missing value without a
//! replacement is rejected with its policy, and the context turns it into a
//! missing value. Only `returnInvalid` rejections abort the record.

use crate::index::PreparedField;
use pmml_ast::{InvalidValueTreatment, MissingValueTreatment, OutlierTreatment};
use pmml_types::{parse_or_cast, Collection, Data, OpType, RawValue, TypeError, Value};
use std::fmt;

/// Classification of an input value against its field's value space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueStatus {
    Valid,
    Invalid,
    Missing,
}

impl fmt::Display for ValueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// Policy that decided the fate of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Treatment {
    Missing(MissingValueTreatment),
    Invalid(InvalidValueTreatment),
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(treatment) => write!(f, "missing value treatment {}", treatment),
            Self::Invalid(treatment) => write!(f, "invalid value treatment {}", treatment),
        }
    }
}

/// Input that did not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub status: ValueStatus,
    pub policy: Treatment,
}

impl Rejection {
    fn missing(treatment: MissingValueTreatment) -> Self {
        Self {
            status: ValueStatus::Missing,
            policy: Treatment::Missing(treatment),
        }
    }

    fn invalid(treatment: InvalidValueTreatment) -> Self {
        Self {
            status: ValueStatus::Invalid,
            policy: Treatment::Invalid(treatment),
        }
    }

    /// Whether the rejection only means "no value"
    ///
    /// False for every `returnInvalid` rejection and for invalid values that
    /// could not be kept as they are.
    pub fn is_missing(&self) -> bool {
        self.status == ValueStatus::Missing
            && self.policy != Treatment::Missing(MissingValueTreatment::ReturnInvalid)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} value rejected by {}", self.status, self.policy)
    }
}

/// Outcome of preparing one input value
#[derive(Debug, Clone, PartialEq)]
pub struct Preparation {
    /// Classification before any treatment replaced the value
    pub status: ValueStatus,
    pub outcome: Result<Value, Rejection>,
}

/// Prepare a raw input for a field
pub fn prepare_field(raw: Option<&RawValue>, field: &PreparedField) -> Result<Value, Rejection> {
    prepare_field_with_status(raw, field).outcome
}

/// Prepare a raw input for a field, keeping its classification
///
/// A list input is prepared element by element into a collection; missing
/// elements stay missing, and the collection is invalid as soon as one
/// element is.
pub fn prepare_field_with_status(raw: Option<&RawValue>, field: &PreparedField) -> Preparation {
    match raw {
        Some(RawValue::List(items)) => prepare_list(items, field),
        raw => prepare_scalar(raw, field),
    }
}

fn prepare_list(items: &[Option<RawValue>], field: &PreparedField) -> Preparation {
    let mut status = ValueStatus::Valid;
    let mut elements = Vec::with_capacity(items.len());

    for item in items {
        let element = match item {
            Some(RawValue::List(_)) => Preparation {
                status: ValueStatus::Invalid,
                outcome: Err(Rejection::invalid(InvalidValueTreatment::ReturnInvalid)),
            },
            item => prepare_scalar(item.as_ref(), field),
        };
        if element.status == ValueStatus::Invalid {
            status = ValueStatus::Invalid;
        }
        match element.outcome {
            Ok(value) => elements.push(Some(value)),
            Err(rejection) if rejection.is_missing() => elements.push(None),
            Err(rejection) => {
                return Preparation {
                    status: element.status,
                    outcome: Err(rejection),
                };
            }
        }
    }

    Preparation {
        status,
        outcome: Ok(Value::Collection(Collection::new(
            field.data_type(),
            field.op_type(),
            elements,
        ))),
    }
}

/// Typed form of a scalar input, or the reason it has none
enum Parsed {
    Data(Data),
    /// Text outside of the field's grammar
    Unparseable(String),
    /// Typed data that cannot be converted to the field's type
    Mismatch,
}

fn prepare_scalar(raw: Option<&RawValue>, field: &PreparedField) -> Preparation {
    let Some(raw) = raw else {
        return treat_missing(ValueStatus::Missing, field);
    };

    let text = raw.as_text();
    let parsed = match parse_or_cast(field.data_type(), raw) {
        Ok(data) => Parsed::Data(data),
        Err(TypeError::Parse { text, .. }) => Parsed::Unparseable(text),
        Err(_) => Parsed::Mismatch,
    };
    let data = match &parsed {
        Parsed::Data(data) => Some(data),
        _ => None,
    };

    let status = if field.is_missing_literal(text, data) {
        ValueStatus::Missing
    } else if field.is_invalid_literal(text, data) {
        ValueStatus::Invalid
    } else {
        match data {
            None => ValueStatus::Invalid,
            Some(data) => classify(data, field),
        }
    };

    match (status, parsed) {
        (ValueStatus::Missing, _) => treat_missing(status, field),
        (ValueStatus::Invalid, parsed) => treat_invalid(parsed, field),
        (ValueStatus::Valid, Parsed::Data(data)) => treat_outlier(data, field),
        // Valid implies parsed data
        (ValueStatus::Valid, parsed) => treat_invalid(parsed, field),
    }
}

fn classify(data: &Data, field: &PreparedField) -> ValueStatus {
    if data.is_nan() {
        return ValueStatus::Invalid;
    }

    if !field.valid_values().is_empty() {
        return if field.valid_values().contains(data) {
            ValueStatus::Valid
        } else {
            ValueStatus::Invalid
        };
    }

    if !field.intervals().is_empty() {
        let contained = data
            .as_f64()
            .is_some_and(|x| field.intervals().iter().any(|interval| interval.contains(x)));
        return if contained {
            ValueStatus::Valid
        } else {
            ValueStatus::Invalid
        };
    }

    ValueStatus::Valid
}

fn treat_outlier(data: Data, field: &PreparedField) -> Preparation {
    let treatment = field.spec().outliers;
    let bounds = field
        .bounds()
        .filter(|_| treatment != OutlierTreatment::AsIs && field.op_type() == OpType::Continuous);

    let data = match (bounds, data.as_f64()) {
        (Some((low, high)), Some(x)) => {
            let below = low.as_f64().is_some_and(|low| x < low);
            let above = high.as_f64().is_some_and(|high| x > high);
            match treatment {
                OutlierTreatment::AsMissingValues if below || above => {
                    return treat_missing(ValueStatus::Missing, field);
                }
                OutlierTreatment::AsExtremeValues if below => low.clone(),
                OutlierTreatment::AsExtremeValues if above => high.clone(),
                _ => data,
            }
        }
        _ => data,
    };

    Preparation {
        status: ValueStatus::Valid,
        outcome: field.value(data).map_err(|_| Rejection::invalid(InvalidValueTreatment::AsIs)),
    }
}

fn treat_missing(status: ValueStatus, field: &PreparedField) -> Preparation {
    let treatment = field.spec().missing_value_treatment;
    let outcome = match (treatment, field.missing_replacement()) {
        (MissingValueTreatment::ReturnInvalid, _) => Err(Rejection::missing(treatment)),
        (_, Some(replacement)) => Ok(replacement.clone()),
        (_, None) => Err(Rejection::missing(treatment)),
    };
    Preparation { status, outcome }
}

fn treat_invalid(parsed: Parsed, field: &PreparedField) -> Preparation {
    let treatment = field.spec().invalid_value_treatment;
    let outcome = match treatment {
        InvalidValueTreatment::ReturnInvalid => Err(Rejection::invalid(treatment)),
        // The missing value treatment decides what replaces an invalid value
        InvalidValueTreatment::AsMissing => return treat_missing(ValueStatus::Invalid, field),
        InvalidValueTreatment::AsIs => match (field.invalid_replacement(), parsed) {
            (Some(replacement), _) => Ok(replacement.clone()),
            (None, Parsed::Data(data)) => field.value(data).map_err(|_| Rejection::invalid(treatment)),
            (None, Parsed::Unparseable(text)) => Ok(Value::string(text)),
            (None, Parsed::Mismatch) => Err(Rejection::invalid(treatment)),
        },
    };
    Preparation {
        status: ValueStatus::Invalid,
        outcome,
    }
}
