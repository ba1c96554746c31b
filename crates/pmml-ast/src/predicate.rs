//! Predicate elements

use serde::{Deserialize, Serialize};
use std::fmt;

/// All predicate kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Simple(SimplePredicate),
    SimpleSet(SimpleSetPredicate),
    Compound(CompoundPredicate),
    True,
    False,
}

impl Predicate {
    pub fn simple(field: impl Into<String>, operator: SimpleOperator, value: impl Into<String>) -> Self {
        Self::Simple(SimplePredicate {
            field: field.into(),
            operator,
            value: Some(value.into()),
        })
    }

    pub fn is_missing(field: impl Into<String>) -> Self {
        Self::Simple(SimplePredicate {
            field: field.into(),
            operator: SimpleOperator::IsMissing,
            value: None,
        })
    }

    pub fn is_not_missing(field: impl Into<String>) -> Self {
        Self::Simple(SimplePredicate {
            field: field.into(),
            operator: SimpleOperator::IsNotMissing,
            value: None,
        })
    }

    pub fn is_in<S: Into<String>>(field: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::SimpleSet(SimpleSetPredicate::new(field, SetOperator::IsIn, values))
    }

    pub fn is_not_in<S: Into<String>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::SimpleSet(SimpleSetPredicate::new(field, SetOperator::IsNotIn, values))
    }

    pub fn compound(operator: BooleanOperator, predicates: Vec<Predicate>) -> Self {
        Self::Compound(CompoundPredicate {
            operator,
            predicates,
        })
    }

    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::And, predicates)
    }

    pub fn or(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::Or, predicates)
    }

    pub fn xor(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::Xor, predicates)
    }

    pub fn surrogate(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::Surrogate, predicates)
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Operator of a [`SimplePredicate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimpleOperator {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterOrEqual,
    GreaterThan,
    IsMissing,
    IsNotMissing,
}

impl SimpleOperator {
    /// Whether the operator compares against a literal
    pub fn needs_value(&self) -> bool {
        !matches!(self, Self::IsMissing | Self::IsNotMissing)
    }

    /// Whether the operator needs an ordering rather than just equality
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::LessOrEqual | Self::GreaterOrEqual | Self::GreaterThan
        )
    }
}

impl fmt::Display for SimpleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::LessThan => "lessThan",
            Self::LessOrEqual => "lessOrEqual",
            Self::GreaterOrEqual => "greaterOrEqual",
            Self::GreaterThan => "greaterThan",
            Self::IsMissing => "isMissing",
            Self::IsNotMissing => "isNotMissing",
        };
        f.write_str(name)
    }
}

/// Comparison of a field against a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplePredicate {
    pub field: String,
    pub operator: SimpleOperator,
    /// Absent for `isMissing` / `isNotMissing`
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetOperator {
    IsIn,
    IsNotIn,
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsIn => write!(f, "isIn"),
            Self::IsNotIn => write!(f, "isNotIn"),
        }
    }
}

/// Membership of a field in a literal set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleSetPredicate {
    pub field: String,
    pub operator: SetOperator,
    pub values: Vec<String>,
}

impl SimpleSetPredicate {
    pub fn new<S: Into<String>>(
        field: impl Into<String>,
        operator: SetOperator,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanOperator {
    And,
    Or,
    Xor,
    /// First child that is not unknown
    Surrogate,
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Xor => write!(f, "xor"),
            Self::Surrogate => write!(f, "surrogate"),
        }
    }
}

/// Combination of two or more child predicates, left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundPredicate {
    pub operator: BooleanOperator,
    pub predicates: Vec<Predicate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_operators_take_no_value() {
        let Predicate::Simple(simple) = Predicate::is_missing("x") else {
            panic!("expected a simple predicate");
        };
        assert!(simple.value.is_none());
        assert!(!simple.operator.needs_value());
        assert!(SimpleOperator::GreaterThan.is_ordering());
        assert!(!SimpleOperator::NotEqual.is_ordering());
    }

    #[test]
    fn test_set_builder() {
        let Predicate::SimpleSet(set) = Predicate::is_in("color", ["red", "blue"]) else {
            panic!("expected a set predicate");
        };
        assert_eq!(set.operator, SetOperator::IsIn);
        assert_eq!(set.values, vec!["red".to_string(), "blue".to_string()]);
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(SimpleOperator::LessOrEqual.to_string(), "lessOrEqual");
        assert_eq!(BooleanOperator::Surrogate.to_string(), "surrogate");
    }
}
