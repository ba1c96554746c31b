//! Typed values
//!
//! A [`Value`] pairs a [`Data`] payload with an operational type. The shape is
//! chosen by the operational type at construction time and decides which
//! comparisons are legal:
//!
//! | shape       | equality | ordering                                  |
//! |-------------|----------|-------------------------------------------|
//! | Continuous  | yes      | natural order of the payload              |
//! | Categorical | yes      | error                                     |
//! | Ordinal     | yes      | declared ordering, else natural order     |
//!
//! Absence is never a value: missing data is `None` at every API boundary.

use crate::{cast, parse, parse_or_cast, result_data_type};
use crate::{Data, DataType, OpType, RawValue, TypeError, TypeResult};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Declared order of an ordinal field's categories
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalOrder(Arc<[Data]>);

impl OrdinalOrder {
    pub fn new(values: impl IntoIterator<Item = Data>) -> Self {
        Self(values.into_iter().collect())
    }

    pub fn values(&self) -> &[Data] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rank of a payload within the ordering
    pub fn index_of(&self, data: &Data) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == data)
    }
}

/// Multi-valued payload of a single record's field
///
/// All elements share the collection's data type and operational type;
/// `None` elements are missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub data_type: DataType,
    pub op_type: OpType,
    pub elements: Vec<Option<Value>>,
}

impl Collection {
    pub fn new(data_type: DataType, op_type: OpType, elements: Vec<Option<Value>>) -> Self {
        Self {
            data_type,
            op_type,
            elements,
        }
    }

    /// Elements that are present
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.elements.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Continuous(Data),
    Categorical(Data),
    Ordinal(Data, Option<OrdinalOrder>),
    Collection(Collection),
}

impl Value {
    /// Create a scalar value with the given operational type
    pub fn new(data: Data, op_type: OpType) -> TypeResult<Self> {
        match op_type {
            OpType::Continuous => Self::continuous(data),
            OpType::Categorical => Ok(Self::Categorical(data)),
            OpType::Ordinal => Ok(Self::Ordinal(data, None)),
        }
    }

    /// Create a continuous value
    ///
    /// Strings and booleans have no continuous interpretation.
    pub fn continuous(data: Data) -> TypeResult<Self> {
        if OpType::Continuous.supports(data.data_type()) {
            Ok(Self::Continuous(data))
        } else {
            Err(TypeError::op_type(
                format!("{} data", data.data_type()),
                OpType::Continuous,
            ))
        }
    }

    pub fn double(value: f64) -> Self {
        Self::Continuous(Data::Double(value))
    }

    pub fn float(value: f32) -> Self {
        Self::Continuous(Data::Float(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::Continuous(Data::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Categorical(Data::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::Categorical(Data::Boolean(value))
    }

    /// Create a value of the given data type and operational type from raw input
    ///
    /// A list input produces a collection; each element is converted on its own.
    pub fn create(data_type: DataType, op_type: OpType, raw: &RawValue) -> TypeResult<Self> {
        match raw {
            RawValue::List(items) => {
                let elements = items
                    .iter()
                    .map(|item| match item {
                        Some(RawValue::List(_)) => {
                            Err(TypeError::mismatch(data_type.name(), "nested list"))
                        }
                        Some(item) => Self::create(data_type, op_type, item).map(Some),
                        None => Ok(None),
                    })
                    .collect::<TypeResult<Vec<_>>>()?;
                Ok(Self::Collection(Collection::new(data_type, op_type, elements)))
            }
            scalar => Self::new(parse_or_cast(data_type, scalar)?, op_type),
        }
    }

    /// Attach a declared ordering to an ordinal value
    pub fn with_order(self, order: OrdinalOrder) -> Self {
        match self {
            Self::Ordinal(data, _) => Self::Ordinal(data, Some(order)),
            other => other,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Continuous(data) | Self::Categorical(data) | Self::Ordinal(data, _) => {
                data.data_type()
            }
            Self::Collection(collection) => collection.data_type,
        }
    }

    pub fn op_type(&self) -> OpType {
        match self {
            Self::Continuous(_) => OpType::Continuous,
            Self::Categorical(_) => OpType::Categorical,
            Self::Ordinal(..) => OpType::Ordinal,
            Self::Collection(collection) => collection.op_type,
        }
    }

    /// Payload of a scalar value
    pub fn data(&self) -> Option<&Data> {
        match self {
            Self::Continuous(data) | Self::Categorical(data) | Self::Ordinal(data, _) => Some(data),
            Self::Collection(_) => None,
        }
    }

    pub fn order(&self) -> Option<&OrdinalOrder> {
        match self {
            Self::Ordinal(_, order) => order.as_ref(),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.data().and_then(Data::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.data().and_then(Data::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.data().and_then(Data::as_str)
    }

    /// Require a scalar payload
    pub fn scalar(&self) -> TypeResult<&Data> {
        self.data()
            .ok_or_else(|| TypeError::mismatch("scalar value", "collection"))
    }

    /// Require a numeric view of the payload
    pub fn to_f64(&self) -> TypeResult<f64> {
        let data = self.scalar()?;
        data.as_f64()
            .ok_or_else(|| TypeError::mismatch("number", format!("{} {}", data.data_type(), data)))
    }

    /// Require a boolean payload, casting numeric 0/1
    pub fn to_bool(&self) -> TypeResult<bool> {
        match cast(DataType::Boolean, self.scalar()?)? {
            Data::Boolean(b) => Ok(b),
            other => Err(TypeError::mismatch("boolean", other.to_string())),
        }
    }

    /// Convert to another data type and operational type
    ///
    /// An ordinal ordering survives only when the data type is unchanged.
    pub fn cast_to(&self, data_type: DataType, op_type: OpType) -> TypeResult<Self> {
        match self {
            Self::Collection(collection) => {
                let elements = collection
                    .elements
                    .iter()
                    .map(|element| element.as_ref().map(|v| v.cast_to(data_type, op_type)).transpose())
                    .collect::<TypeResult<Vec<_>>>()?;
                Ok(Self::Collection(Collection::new(data_type, op_type, elements)))
            }
            scalar => {
                let data = scalar.scalar()?;
                let value = Self::new(cast(data_type, data)?, op_type)?;
                match (scalar.order(), data.data_type() == data_type) {
                    (Some(order), true) => Ok(value.with_order(order.clone())),
                    _ => Ok(value),
                }
            }
        }
    }

    /// Parse a literal as a value of the same kind as `self`
    ///
    /// The literal takes this value's data type, operational type and ordering,
    /// so that the two can be compared.
    pub fn parse_literal(&self, text: &str) -> TypeResult<Self> {
        let data = parse(self.data_type(), text)?;
        let value = Self::new(data, self.op_type())?;
        Ok(match self.order() {
            Some(order) => value.with_order(order.clone()),
            None => value,
        })
    }

    /// Equality after coercion to the least restrictive common data type
    ///
    /// NaN is unequal to everything; epoch counts compare by offset.
    pub fn equals_value(&self, other: &Value) -> TypeResult<bool> {
        let (left, right) = coerce_pair(self.scalar()?, other.scalar()?)?;
        Ok(left == right)
    }

    /// Ordering after coercion to the least restrictive common data type
    pub fn compare_value(&self, other: &Value) -> TypeResult<Ordering> {
        if self.op_type() == OpType::Categorical || other.op_type() == OpType::Categorical {
            return Err(TypeError::op_type("ordering", OpType::Categorical));
        }

        if let Some(order) = self.order().or_else(|| other.order()) {
            return compare_ranked(order, self, other);
        }

        let (left, right) = coerce_pair(self.scalar()?, other.scalar()?)?;
        left.natural_cmp(&right)
            .ok_or_else(|| TypeError::unordered(&left, &right))
    }

    /// Ordering for values of any operational type
    ///
    /// Unlike [`compare_value`](Self::compare_value), categorical values are
    /// ordered by their natural order (strings lexicographically). A declared
    /// ordinal ordering still takes precedence.
    pub fn compare_natural(&self, other: &Value) -> TypeResult<Ordering> {
        if let Some(order) = self.order().or_else(|| other.order()) {
            return compare_ranked(order, self, other);
        }

        let (left, right) = coerce_pair(self.scalar()?, other.scalar()?)?;
        left.natural_cmp(&right)
            .ok_or_else(|| TypeError::unordered(&left, &right))
    }
}

fn coerce_pair(left: &Data, right: &Data) -> TypeResult<(Data, Data)> {
    let common = result_data_type(left.data_type(), right.data_type())?;
    Ok((cast(common, left)?, cast(common, right)?))
}

fn compare_ranked(order: &OrdinalOrder, left: &Value, right: &Value) -> TypeResult<Ordering> {
    let rank = |value: &Value| -> TypeResult<usize> {
        let data = value.scalar()?;
        let target = order
            .values()
            .first()
            .map(Data::data_type)
            .unwrap_or_else(|| data.data_type());
        cast(target, data)
            .ok()
            .and_then(|data| order.index_of(&data))
            .ok_or_else(|| TypeError::unordered(data, "declared ordering"))
    };
    Ok(rank(left)?.cmp(&rank(right)?))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous(data) | Self::Categorical(data) | Self::Ordinal(data, _) => {
                write!(f, "{}", data)
            }
            Self::Collection(collection) => {
                write!(f, "[")?;
                for (i, element) in collection.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match element {
                        Some(value) => write!(f, "{}", value)?,
                        None => write!(f, "null")?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Epoch;

    fn sizes() -> OrdinalOrder {
        OrdinalOrder::new(["small", "medium", "large"].map(Data::from))
    }

    #[test]
    fn test_continuous_rejects_strings() {
        let err = Value::continuous(Data::from("abc")).unwrap_err();
        assert!(matches!(err, TypeError::OpType { .. }));
        assert!(Value::new(Data::Boolean(true), OpType::Continuous).is_err());
        assert!(Value::new(Data::Boolean(true), OpType::Categorical).is_ok());
    }

    #[test]
    fn test_equality_uses_common_type() {
        assert!(Value::integer(1).equals_value(&Value::double(1.0)).unwrap());
        assert!(!Value::integer(1).equals_value(&Value::double(1.5)).unwrap());
        assert!(Value::string("1").equals_value(&Value::integer(1)).unwrap());
    }

    #[test]
    fn test_nan_is_never_equal() {
        let nan = Value::double(f64::NAN);
        assert!(!nan.equals_value(&nan).unwrap());
        assert!(matches!(
            nan.compare_value(&Value::double(0.0)),
            Err(TypeError::Unordered { .. })
        ));
    }

    #[test]
    fn test_epoch_equality_is_exact() {
        let a = Value::Ordinal(Data::DaysSince(Epoch::Y1960, 3653), None);
        let b = Value::Ordinal(Data::DaysSince(Epoch::Y1970, 0), None);
        assert!(matches!(a.equals_value(&b), Err(TypeError::Incompatible { .. })));

        let c = b.cast_to(DataType::DateDaysSince1960, OpType::Ordinal).unwrap();
        assert!(a.equals_value(&c).unwrap());
    }

    #[test]
    fn test_categorical_has_no_order() {
        let err = Value::string("a").compare_value(&Value::string("b")).unwrap_err();
        assert!(matches!(err, TypeError::OpType { .. }));
    }

    #[test]
    fn test_ordinal_declared_order() {
        let small = Value::Ordinal(Data::from("small"), Some(sizes()));
        let large = small.parse_literal("large").unwrap();
        assert_eq!(small.compare_value(&large).unwrap(), Ordering::Less);
        // natural order would say the opposite
        assert_eq!(Data::from("small").natural_cmp(&Data::from("large")), Some(Ordering::Greater));

        let unknown = small.parse_literal("huge").unwrap();
        assert!(small.compare_value(&unknown).is_err());
    }

    #[test]
    fn test_ordinal_natural_order() {
        let a = Value::Ordinal(Data::from("a"), None);
        let b = Value::Ordinal(Data::from("b"), None);
        assert_eq!(a.compare_value(&b).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_create_collection() {
        let raw = RawValue::List(vec![Some("1".into()), None, Some(RawValue::from(2.5))]);
        let value = Value::create(DataType::Double, OpType::Continuous, &raw).unwrap();
        let collection = value.as_collection().unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.present().count(), 2);
        assert!(value.equals_value(&Value::double(1.0)).is_err());
    }

    #[test]
    fn test_cast_keeps_order_for_same_type() {
        let small = Value::Ordinal(Data::from("small"), Some(sizes()));
        assert!(small.cast_to(DataType::String, OpType::Ordinal).unwrap().order().is_some());
        assert!(small.cast_to(DataType::String, OpType::Categorical).unwrap().order().is_none());
    }

    #[test]
    fn test_to_bool() {
        assert!(Value::integer(1).to_bool().unwrap());
        assert!(!Value::boolean(false).to_bool().unwrap());
        assert!(Value::integer(2).to_bool().is_err());
    }
}
