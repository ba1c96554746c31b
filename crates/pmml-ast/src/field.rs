//! Field specifications and treatment policies

use crate::Interval;
use pmml_types::{DataType, OpType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Treatment of valid continuous values outside of the declared bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlierTreatment {
    /// Pass the value through
    #[default]
    AsIs,
    /// Reclassify the value as missing
    AsMissingValues,
    /// Clamp the value to the nearest bound
    AsExtremeValues,
}

/// Treatment of missing input values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingValueTreatment {
    #[default]
    AsIs,
    AsMean,
    AsMode,
    AsMedian,
    AsValue,
    /// Reject the record
    ReturnInvalid,
}

/// Treatment of invalid input values and invalid function results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvalidValueTreatment {
    /// Reject the record
    ReturnInvalid,
    /// Keep the value, or substitute the invalid replacement
    #[default]
    AsIs,
    /// Reclassify as missing and apply the missing value treatment
    AsMissing,
}

impl fmt::Display for OutlierTreatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AsIs => write!(f, "asIs"),
            Self::AsMissingValues => write!(f, "asMissingValues"),
            Self::AsExtremeValues => write!(f, "asExtremeValues"),
        }
    }
}

impl fmt::Display for MissingValueTreatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AsIs => write!(f, "asIs"),
            Self::AsMean => write!(f, "asMean"),
            Self::AsMode => write!(f, "asMode"),
            Self::AsMedian => write!(f, "asMedian"),
            Self::AsValue => write!(f, "asValue"),
            Self::ReturnInvalid => write!(f, "returnInvalid"),
        }
    }
}

impl fmt::Display for InvalidValueTreatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnInvalid => write!(f, "returnInvalid"),
            Self::AsIs => write!(f, "asIs"),
            Self::AsMissing => write!(f, "asMissing"),
        }
    }
}

/// Declared value space and data quality policy of an input field
///
/// A field with no declared sets, intervals or treatments accepts every value
/// of its data type (except NaN) and passes it through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
    /// Overrides the data type's default operational type
    #[serde(default)]
    pub op_type: Option<OpType>,
    /// Valid literals; for an ordinal field their order is the category order
    #[serde(default)]
    pub valid_values: Vec<String>,
    #[serde(default)]
    pub invalid_values: Vec<String>,
    #[serde(default)]
    pub missing_values: Vec<String>,
    /// Valid ranges of a continuous field
    #[serde(default)]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub outliers: OutlierTreatment,
    #[serde(default)]
    pub low_value: Option<f64>,
    #[serde(default)]
    pub high_value: Option<f64>,
    #[serde(default)]
    pub missing_value_treatment: MissingValueTreatment,
    #[serde(default)]
    pub missing_value_replacement: Option<String>,
    #[serde(default)]
    pub invalid_value_treatment: InvalidValueTreatment,
    #[serde(default)]
    pub invalid_value_replacement: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            op_type: None,
            valid_values: Vec::new(),
            invalid_values: Vec::new(),
            missing_values: Vec::new(),
            intervals: Vec::new(),
            outliers: OutlierTreatment::AsIs,
            low_value: None,
            high_value: None,
            missing_value_treatment: MissingValueTreatment::AsIs,
            missing_value_replacement: None,
            invalid_value_treatment: InvalidValueTreatment::AsIs,
            invalid_value_replacement: None,
        }
    }

    /// Effective operational type
    pub fn op_type(&self) -> OpType {
        self.op_type
            .unwrap_or_else(|| self.data_type.default_op_type())
    }

    pub fn with_op_type(mut self, op_type: OpType) -> Self {
        self.op_type = Some(op_type);
        self
    }

    pub fn with_valid_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.valid_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_invalid_values<S: Into<String>>(
        mut self,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.invalid_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_missing_values<S: Into<String>>(
        mut self,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.missing_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.intervals.push(interval);
        self
    }

    /// Declare outlier bounds and their treatment
    pub fn with_outliers(mut self, treatment: OutlierTreatment, low: f64, high: f64) -> Self {
        self.outliers = treatment;
        self.low_value = Some(low);
        self.high_value = Some(high);
        self
    }

    pub fn with_missing_treatment(mut self, treatment: MissingValueTreatment) -> Self {
        self.missing_value_treatment = treatment;
        self
    }

    pub fn with_missing_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.missing_value_replacement = Some(replacement.into());
        self
    }

    pub fn with_invalid_treatment(mut self, treatment: InvalidValueTreatment) -> Self {
        self.invalid_value_treatment = treatment;
        self
    }

    pub fn with_invalid_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.invalid_value_replacement = Some(replacement.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_pass_through() {
        let spec = FieldSpec::new("age", DataType::Integer);
        assert_eq!(spec.op_type(), OpType::Continuous);
        assert_eq!(spec.outliers, OutlierTreatment::AsIs);
        assert_eq!(spec.missing_value_treatment, MissingValueTreatment::AsIs);
        assert_eq!(spec.invalid_value_treatment, InvalidValueTreatment::AsIs);
    }

    #[test]
    fn test_deserialize_minimal() {
        let spec: FieldSpec =
            serde_json::from_str(r#"{"name": "color", "data_type": "string"}"#).unwrap();
        assert_eq!(spec, FieldSpec::new("color", DataType::String));
    }

    #[test]
    fn test_treatment_names() {
        let treatment: InvalidValueTreatment = serde_json::from_str(r#""asMissing""#).unwrap();
        assert_eq!(treatment, InvalidValueTreatment::AsMissing);
        assert_eq!(MissingValueTreatment::ReturnInvalid.to_string(), "returnInvalid");
    }
}
