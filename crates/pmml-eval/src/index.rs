//! Compiled, read-only model metadata
//!
//! A [`ModelIndex`] is built once per [`Dictionary`] and shared by `Arc` with
//! every context, on any thread. Compilation parses each input field's literal
//! tables against its data type, so that preparing a value at evaluation time
//! never re-reads the declarations, and rejects declarations that could never
//! be honored.

use crate::error::{EvalError, EvalResult};
use pmml_ast::{
    DefineFunction, DerivedField, Dictionary, FieldSpec, Interval, MissingValueTreatment,
    OutlierTreatment,
};
use pmml_types::{cast, parse, Data, DataType, OpType, OrdinalOrder, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Input field with its literal tables parsed against the field's data type
#[derive(Debug, Clone)]
pub struct PreparedField {
    spec: FieldSpec,
    op_type: OpType,
    valid: Vec<Data>,
    missing: Vec<Data>,
    invalid: Vec<Data>,
    order: Option<OrdinalOrder>,
    low: Option<Data>,
    high: Option<Data>,
    missing_replacement: Option<Value>,
    invalid_replacement: Option<Value>,
}

impl PreparedField {
    /// Compile a field specification
    pub fn compile(spec: &FieldSpec) -> EvalResult<Self> {
        let data_type = spec.data_type;
        let op_type = spec.op_type();

        if !op_type.supports(data_type) {
            return Err(invalid_field(
                spec,
                format!("{} data cannot be {}", data_type, op_type),
            ));
        }

        let valid = spec
            .valid_values
            .iter()
            .map(|text| {
                parse(data_type, text).map_err(|_| {
                    invalid_field(spec, format!("valid value '{}' is not a {}", text, data_type))
                })
            })
            .collect::<EvalResult<Vec<_>>>()?;

        // Missing and invalid literals may be sentinels outside of the type,
        // e.g. "N/A" for a double field; those match by text only.
        let missing = spec
            .missing_values
            .iter()
            .filter_map(|text| parse(data_type, text).ok())
            .collect();
        let invalid = spec
            .invalid_values
            .iter()
            .filter_map(|text| parse(data_type, text).ok())
            .collect();

        for interval in &spec.intervals {
            if !interval.is_well_formed() {
                return Err(invalid_field(spec, format!("malformed interval {}", interval)));
            }
        }

        let order = (op_type == OpType::Ordinal && !valid.is_empty())
            .then(|| OrdinalOrder::new(valid.iter().cloned()));

        let bound = |value: Option<f64>, which: &str| -> EvalResult<Option<Data>> {
            value
                .map(|v| {
                    cast(data_type, &Data::Double(v)).map_err(|_| {
                        invalid_field(spec, format!("{} bound {} is not a {}", which, v, data_type))
                    })
                })
                .transpose()
        };
        let low = bound(spec.low_value, "low")?;
        let high = bound(spec.high_value, "high")?;
        if let (Some(low), Some(high)) = (spec.low_value, spec.high_value)
            && low > high
        {
            return Err(invalid_field(spec, format!("low bound {} exceeds high bound {}", low, high)));
        }
        if spec.outliers != OutlierTreatment::AsIs && (low.is_none() || high.is_none()) {
            return Err(invalid_field(
                spec,
                format!("outlier treatment {} needs both bounds", spec.outliers),
            ));
        }

        if spec.missing_value_treatment == MissingValueTreatment::ReturnInvalid
            && spec.missing_value_replacement.is_some()
        {
            return Err(invalid_field(
                spec,
                "a replacement value cannot be combined with returnInvalid missing treatment",
            ));
        }

        let mut prepared = Self {
            spec: spec.clone(),
            op_type,
            valid,
            missing,
            invalid,
            order,
            low,
            high,
            missing_replacement: None,
            invalid_replacement: None,
        };
        prepared.missing_replacement = spec
            .missing_value_replacement
            .as_deref()
            .map(|text| prepared.replacement(text))
            .transpose()?;
        prepared.invalid_replacement = spec
            .invalid_value_replacement
            .as_deref()
            .map(|text| prepared.replacement(text))
            .transpose()?;

        Ok(prepared)
    }

    fn replacement(&self, text: &str) -> EvalResult<Value> {
        parse(self.data_type(), text)
            .ok()
            .and_then(|data| self.value(data).ok())
            .ok_or_else(|| {
                invalid_field(
                    &self.spec,
                    format!("replacement '{}' is not a {}", text, self.data_type()),
                )
            })
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn data_type(&self) -> DataType {
        self.spec.data_type
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    pub fn valid_values(&self) -> &[Data] {
        &self.valid
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.spec.intervals
    }

    pub fn order(&self) -> Option<&OrdinalOrder> {
        self.order.as_ref()
    }

    /// Outlier bounds, present when both are declared
    pub fn bounds(&self) -> Option<(&Data, &Data)> {
        self.low.as_ref().zip(self.high.as_ref())
    }

    pub fn missing_replacement(&self) -> Option<&Value> {
        self.missing_replacement.as_ref()
    }

    pub fn invalid_replacement(&self) -> Option<&Value> {
        self.invalid_replacement.as_ref()
    }

    /// Whether raw text or typed data is a declared missing literal
    pub fn is_missing_literal(&self, text: Option<&str>, data: Option<&Data>) -> bool {
        matches_literal(&self.spec.missing_values, &self.missing, text, data)
    }

    /// Whether raw text or typed data is a declared invalid literal
    pub fn is_invalid_literal(&self, text: Option<&str>, data: Option<&Data>) -> bool {
        matches_literal(&self.spec.invalid_values, &self.invalid, text, data)
    }

    /// Wrap data of this field's type as a value of this field
    pub fn value(&self, data: Data) -> EvalResult<Value> {
        let value = Value::new(data, self.op_type)?;
        Ok(match &self.order {
            Some(order) => value.with_order(order.clone()),
            None => value,
        })
    }
}

fn matches_literal(texts: &[String], typed: &[Data], text: Option<&str>, data: Option<&Data>) -> bool {
    text.is_some_and(|text| texts.iter().any(|literal| literal == text))
        || data.is_some_and(|data| typed.contains(data))
}

fn invalid_field(spec: &FieldSpec, message: impl std::fmt::Display) -> EvalError {
    EvalError::invalid_model(format!("field '{}': {}", spec.name, message))
}

/// Every declaration of a model, indexed by name
#[derive(Debug, Clone, Default)]
pub struct ModelIndex {
    fields: IndexMap<String, PreparedField>,
    derived_fields: IndexMap<String, DerivedField>,
    functions: IndexMap<String, DefineFunction>,
}

impl ModelIndex {
    /// Index with no declarations
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a dictionary
    ///
    /// Input and derived fields share one namespace; functions have their own.
    pub fn compile(dictionary: &Dictionary) -> EvalResult<Self> {
        let mut index = Self::empty();

        for spec in &dictionary.fields {
            if index.fields.contains_key(&spec.name) {
                return Err(EvalError::duplicate_declaration(format!("field '{}'", spec.name)));
            }
            index
                .fields
                .insert(spec.name.clone(), PreparedField::compile(spec)?);
        }

        for derived in &dictionary.derived_fields {
            if index.fields.contains_key(&derived.name)
                || index.derived_fields.contains_key(&derived.name)
            {
                return Err(EvalError::duplicate_declaration(format!("field '{}'", derived.name)));
            }
            if !derived.op_type().supports(derived.data_type) {
                return Err(EvalError::invalid_model(format!(
                    "derived field '{}': {} data cannot be {}",
                    derived.name,
                    derived.data_type,
                    derived.op_type()
                )));
            }
            index
                .derived_fields
                .insert(derived.name.clone(), derived.clone());
        }

        for function in &dictionary.functions {
            if index.functions.contains_key(&function.name) {
                return Err(EvalError::duplicate_declaration(format!(
                    "function '{}'",
                    function.name
                )));
            }
            index
                .functions
                .insert(function.name.clone(), function.clone());
        }

        log::debug!(
            "compiled model index: {} input fields, {} derived fields, {} functions",
            index.fields.len(),
            index.derived_fields.len(),
            index.functions.len()
        );

        Ok(index)
    }

    /// Compile a dictionary into an index ready to be shared across threads
    pub fn shared(dictionary: &Dictionary) -> EvalResult<Arc<Self>> {
        Self::compile(dictionary).map(Arc::new)
    }

    pub fn field(&self, name: &str) -> Option<&PreparedField> {
        self.fields.get(name)
    }

    pub fn derived_field(&self, name: &str) -> Option<&DerivedField> {
        self.derived_fields.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&DefineFunction> {
        self.functions.get(name)
    }

    /// Data type and operational type of an input or derived field
    pub fn field_type(&self, name: &str) -> Option<(DataType, OpType)> {
        self.field(name)
            .map(|field| (field.data_type(), field.op_type()))
            .or_else(|| {
                self.derived_field(name)
                    .map(|field| (field.data_type, field.op_type()))
            })
    }

    pub fn fields(&self) -> impl Iterator<Item = &PreparedField> {
        self.fields.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmml_ast::Expression;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_parses_tables() {
        let spec = FieldSpec::new("grade", DataType::String)
            .with_op_type(OpType::Ordinal)
            .with_valid_values(["low", "mid", "high"]);
        let field = PreparedField::compile(&spec).unwrap();

        assert_eq!(field.order().map(|o| o.len()), Some(3));
        assert_eq!(field.valid_values()[2], Data::from("high"));
    }

    #[test]
    fn test_missing_literal_matches_by_text_or_value() {
        let spec = FieldSpec::new("x", DataType::Double).with_missing_values(["N/A", "-999"]);
        let field = PreparedField::compile(&spec).unwrap();

        assert!(field.is_missing_literal(Some("N/A"), None));
        assert!(field.is_missing_literal(Some("-999.0"), Some(&Data::Double(-999.0))));
        assert!(!field.is_missing_literal(Some("1"), Some(&Data::Double(1.0))));
    }

    #[test]
    fn test_return_invalid_with_replacement_is_rejected() {
        let spec = FieldSpec::new("x", DataType::Double)
            .with_missing_treatment(MissingValueTreatment::ReturnInvalid)
            .with_missing_replacement("0");
        let err = PreparedField::compile(&spec).unwrap_err();
        assert!(matches!(err, EvalError::InvalidModel { .. }));
    }

    #[test]
    fn test_uncastable_replacement_is_rejected() {
        let spec = FieldSpec::new("x", DataType::Integer).with_missing_replacement("abc");
        assert!(PreparedField::compile(&spec).is_err());
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let spec =
            FieldSpec::new("x", DataType::Double).with_outliers(OutlierTreatment::AsExtremeValues, 10.0, 0.0);
        assert!(PreparedField::compile(&spec).is_err());
    }

    #[test]
    fn test_continuous_string_is_rejected() {
        let spec = FieldSpec::new("x", DataType::String).with_op_type(OpType::Continuous);
        assert!(PreparedField::compile(&spec).is_err());
    }

    #[test]
    fn test_duplicate_names() {
        let dictionary = Dictionary::new()
            .with_field(FieldSpec::new("x", DataType::Double))
            .with_derived_field(DerivedField::new("x", DataType::Double, Expression::constant("1")));

        let err = ModelIndex::compile(&dictionary).unwrap_err();
        assert!(matches!(err, EvalError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_field_type() {
        let dictionary = Dictionary::new()
            .with_field(FieldSpec::new("x", DataType::Integer))
            .with_derived_field(DerivedField::new("y", DataType::String, Expression::constant("a")));
        let index = ModelIndex::compile(&dictionary).unwrap();

        assert_eq!(index.field_type("x"), Some((DataType::Integer, OpType::Continuous)));
        assert_eq!(index.field_type("y"), Some((DataType::String, OpType::Categorical)));
        assert_eq!(index.field_type("z"), None);
    }
}
