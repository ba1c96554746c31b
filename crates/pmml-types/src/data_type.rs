//! Data types and operational types
//!
//! `DataType` names the primitive representation of a value, `OpType` the
//! operations that are legal on it. The least-restrictive rule implemented by
//! [`result_data_type`] unifies two data types before a binary operation.

use crate::{Epoch, TypeError, TypeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primitive value representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "dateTime")]
    DateTime,
    #[serde(rename = "dateDaysSince[1960]")]
    DateDaysSince1960,
    #[serde(rename = "dateDaysSince[1970]")]
    DateDaysSince1970,
    #[serde(rename = "dateDaysSince[1980]")]
    DateDaysSince1980,
    #[serde(rename = "timeSeconds")]
    TimeSeconds,
    #[serde(rename = "dateTimeSecondsSince[1960]")]
    DateTimeSecondsSince1960,
    #[serde(rename = "dateTimeSecondsSince[1970]")]
    DateTimeSecondsSince1970,
    #[serde(rename = "dateTimeSecondsSince[1980]")]
    DateTimeSecondsSince1980,
}

/// Fallback order of the least-restrictive rule, most general first
const RESULT_PRIORITY: [DataType; 4] = [
    DataType::String,
    DataType::Double,
    DataType::Float,
    DataType::Integer,
];

impl DataType {
    /// All data types, in declaration order
    pub const ALL: [DataType; 15] = [
        DataType::String,
        DataType::Integer,
        DataType::Float,
        DataType::Double,
        DataType::Boolean,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
        DataType::DateDaysSince1960,
        DataType::DateDaysSince1970,
        DataType::DateDaysSince1980,
        DataType::TimeSeconds,
        DataType::DateTimeSecondsSince1960,
        DataType::DateTimeSecondsSince1970,
        DataType::DateTimeSecondsSince1980,
    ];

    /// PMML attribute spelling of this data type
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "dateTime",
            Self::DateDaysSince1960 => "dateDaysSince[1960]",
            Self::DateDaysSince1970 => "dateDaysSince[1970]",
            Self::DateDaysSince1980 => "dateDaysSince[1980]",
            Self::TimeSeconds => "timeSeconds",
            Self::DateTimeSecondsSince1960 => "dateTimeSecondsSince[1960]",
            Self::DateTimeSecondsSince1970 => "dateTimeSecondsSince[1970]",
            Self::DateTimeSecondsSince1980 => "dateTimeSecondsSince[1980]",
        }
    }

    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Double)
    }

    /// Check if this is a floating-point type
    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Check if this is a temporal type (calendar or count since epoch)
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date
                | Self::Time
                | Self::DateTime
                | Self::DateDaysSince1960
                | Self::DateDaysSince1970
                | Self::DateDaysSince1980
                | Self::TimeSeconds
                | Self::DateTimeSecondsSince1960
                | Self::DateTimeSecondsSince1970
                | Self::DateTimeSecondsSince1980
        )
    }

    /// Epoch of a "days since" type
    pub fn days_since(&self) -> Option<Epoch> {
        match self {
            Self::DateDaysSince1960 => Some(Epoch::Y1960),
            Self::DateDaysSince1970 => Some(Epoch::Y1970),
            Self::DateDaysSince1980 => Some(Epoch::Y1980),
            _ => None,
        }
    }

    /// Epoch of a "seconds since" type
    pub fn seconds_since(&self) -> Option<Epoch> {
        match self {
            Self::DateTimeSecondsSince1960 => Some(Epoch::Y1960),
            Self::DateTimeSecondsSince1970 => Some(Epoch::Y1970),
            Self::DateTimeSecondsSince1980 => Some(Epoch::Y1980),
            _ => None,
        }
    }

    /// The "days since" data type for an epoch
    pub fn days_since_epoch(epoch: Epoch) -> Self {
        match epoch {
            Epoch::Y1960 => Self::DateDaysSince1960,
            Epoch::Y1970 => Self::DateDaysSince1970,
            Epoch::Y1980 => Self::DateDaysSince1980,
        }
    }

    /// The "seconds since" data type for an epoch
    pub fn seconds_since_epoch(epoch: Epoch) -> Self {
        match epoch {
            Epoch::Y1960 => Self::DateTimeSecondsSince1960,
            Epoch::Y1970 => Self::DateTimeSecondsSince1970,
            Epoch::Y1980 => Self::DateTimeSecondsSince1980,
        }
    }

    /// Operational type implied by this data type when a field does not override it
    pub fn default_op_type(&self) -> OpType {
        match self {
            Self::Integer | Self::Float | Self::Double => OpType::Continuous,
            Self::String | Self::Boolean => OpType::Categorical,
            _ => OpType::Ordinal,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|data_type| data_type.name() == s)
            .ok_or_else(|| TypeError::mismatch("data type name", s))
    }
}

/// Operational type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Continuous,
    Categorical,
    Ordinal,
}

impl OpType {
    /// Whether values of this operational type support ordering comparisons
    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Continuous | Self::Ordinal)
    }

    /// Whether this operational type can carry values of the given data type
    ///
    /// Continuous values need a numeric or temporal representation; strings and
    /// booleans are only ever categorical or ordinal.
    pub fn supports(&self, data_type: DataType) -> bool {
        match self {
            Self::Continuous => data_type.is_numeric() || data_type.is_temporal(),
            Self::Categorical | Self::Ordinal => true,
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => write!(f, "continuous"),
            Self::Categorical => write!(f, "categorical"),
            Self::Ordinal => write!(f, "ordinal"),
        }
    }
}

/// Least-restrictive data type of two operands
///
/// Equal types unify to themselves. Otherwise the first of string, double,
/// float, integer that matches either side wins; any other pair (e.g. two
/// different epoch types) has no common type.
pub fn result_data_type(left: DataType, right: DataType) -> TypeResult<DataType> {
    if left == right {
        return Ok(left);
    }

    RESULT_PRIORITY
        .iter()
        .copied()
        .find(|candidate| *candidate == left || *candidate == right)
        .ok_or(TypeError::Incompatible { left, right })
}

/// Least-restrictive data type of a list of operands
pub fn common_data_type(types: &[DataType]) -> TypeResult<Option<DataType>> {
    let mut result: Option<DataType> = None;
    for data_type in types {
        result = Some(match result {
            None => *data_type,
            Some(current) => result_data_type(current, *data_type)?,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_data_type_same() {
        for data_type in DataType::ALL {
            assert_eq!(result_data_type(data_type, data_type).unwrap(), data_type);
        }
    }

    #[test]
    fn test_result_data_type_priority() {
        assert_eq!(
            result_data_type(DataType::Integer, DataType::Double).unwrap(),
            DataType::Double
        );
        assert_eq!(
            result_data_type(DataType::Float, DataType::Integer).unwrap(),
            DataType::Float
        );
        assert_eq!(
            result_data_type(DataType::Double, DataType::String).unwrap(),
            DataType::String
        );
        assert_eq!(
            result_data_type(DataType::Boolean, DataType::Integer).unwrap(),
            DataType::Integer
        );
    }

    #[test]
    fn test_result_data_type_incompatible() {
        let err = result_data_type(DataType::DateDaysSince1960, DataType::DateDaysSince1970)
            .unwrap_err();
        assert!(matches!(err, TypeError::Incompatible { .. }));
    }

    #[test]
    fn test_common_data_type() {
        assert_eq!(common_data_type(&[]).unwrap(), None);
        assert_eq!(
            common_data_type(&[DataType::Integer, DataType::Float, DataType::Integer]).unwrap(),
            Some(DataType::Float)
        );
    }

    #[test]
    fn test_default_op_type() {
        assert_eq!(DataType::Double.default_op_type(), OpType::Continuous);
        assert_eq!(DataType::Boolean.default_op_type(), OpType::Categorical);
        assert_eq!(DataType::Date.default_op_type(), OpType::Ordinal);
    }

    #[test]
    fn test_name_round_trip() {
        for data_type in DataType::ALL {
            assert_eq!(data_type.name().parse::<DataType>().unwrap(), data_type);
        }
        assert!("decimal".parse::<DataType>().is_err());
    }

    #[test]
    fn test_op_type_support() {
        assert!(!OpType::Continuous.supports(DataType::String));
        assert!(OpType::Continuous.supports(DataType::DateDaysSince1970));
        assert!(OpType::Categorical.supports(DataType::Double));
    }
}
