//! Identity of memoized context entries

use pmml_ast::{AggregateFunction, LagAggregate};
use std::fmt;

/// Key of a memoized value in an [`EvaluationContext`](crate::EvaluationContext)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Plain field name
    Name(String),
    /// Earlier value, or window reduction, of a field
    Lag(LagKey),
    /// Reduction of a collection-valued field
    Aggregate(AggregateKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LagKey {
    pub name: String,
    pub n: usize,
    pub block_indicators: Vec<String>,
    pub aggregate: LagAggregate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateKey {
    pub name: String,
    pub function: AggregateFunction,
    pub group_field: Option<String>,
}

impl FieldKey {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Name of the underlying field
    pub fn field_name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Lag(key) => &key.name,
            Self::Aggregate(key) => &key.name,
        }
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{}'", name),
            Self::Lag(key) => {
                write!(f, "lag('{}', {}", key.name, key.n)?;
                if key.aggregate != LagAggregate::None {
                    write!(f, ", {}", key.aggregate)?;
                }
                if !key.block_indicators.is_empty() {
                    write!(f, ", by {}", key.block_indicators.join("+"))?;
                }
                write!(f, ")")
            }
            Self::Aggregate(key) => {
                write!(f, "{}('{}'", key.function, key.name)?;
                if let Some(group) = &key.group_field {
                    write!(f, ", group '{}'", group)?;
                }
                write!(f, ")")
            }
        }
    }
}
