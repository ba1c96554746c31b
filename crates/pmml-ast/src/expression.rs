//! Expression elements
//!
//! Each expression kind is a variant of [`Expression`] carrying its own
//! struct. Literals stay textual; the evaluator parses them against the data
//! type they meet at run time.

use crate::{InvalidValueTreatment, Interval, OutlierTreatment};
use indexmap::IndexMap;
use pmml_types::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All expression kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Constant(Constant),
    /// Reference to an input, derived or parameter field
    FieldRef(FieldRef),
    /// Piecewise-linear normalization
    NormContinuous(NormContinuous),
    /// Indicator of a category
    NormDiscrete(NormDiscrete),
    /// Binning of a continuous value
    Discretize(Discretize),
    /// Table lookup
    MapValues(MapValues),
    /// Built-in or user-defined function call
    Apply(Apply),
    /// Reduction of a collection-valued field
    Aggregate(Aggregate),
    /// Earlier value of a field
    Lag(Lag),
}

impl Expression {
    /// Constant with an inferred data type
    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(Constant {
            value: Some(value.into()),
            data_type: None,
        })
    }

    /// Constant with an explicit data type
    pub fn typed_constant(value: impl Into<String>, data_type: DataType) -> Self {
        Self::Constant(Constant {
            value: Some(value.into()),
            data_type: Some(data_type),
        })
    }

    /// Constant denoting a missing value
    pub fn missing_constant() -> Self {
        Self::Constant(Constant {
            value: None,
            data_type: None,
        })
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::FieldRef(FieldRef::new(name))
    }

    /// Kind name, as used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Constant(_) => "Constant",
            Self::FieldRef(_) => "FieldRef",
            Self::NormContinuous(_) => "NormContinuous",
            Self::NormDiscrete(_) => "NormDiscrete",
            Self::Discretize(_) => "Discretize",
            Self::MapValues(_) => "MapValues",
            Self::Apply(_) => "Apply",
            Self::Aggregate(_) => "Aggregate",
            Self::Lag(_) => "Lag",
        }
    }
}

impl From<Apply> for Expression {
    fn from(value: Apply) -> Self {
        Self::Apply(value)
    }
}

impl From<FieldRef> for Expression {
    fn from(value: FieldRef) -> Self {
        Self::FieldRef(value)
    }
}

/// Literal value; `None` is a missing constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub value: Option<String>,
    pub data_type: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    pub field: String,
    /// Literal substituted when the field is missing
    pub map_missing_to: Option<String>,
}

impl FieldRef {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            map_missing_to: None,
        }
    }

    pub fn with_map_missing_to(mut self, value: impl Into<String>) -> Self {
        self.map_missing_to = Some(value.into());
        self
    }
}

/// Breakpoint of a piecewise-linear normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearNorm {
    pub orig: f64,
    pub norm: f64,
}

impl LinearNorm {
    pub fn new(orig: f64, norm: f64) -> Self {
        Self { orig, norm }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormContinuous {
    pub field: String,
    /// At least two breakpoints, ordered by `orig`
    pub norms: Vec<LinearNorm>,
    /// Treatment of inputs outside of the first/last breakpoint
    pub outliers: OutlierTreatment,
    pub map_missing_to: Option<f64>,
}

impl NormContinuous {
    pub fn new(field: impl Into<String>, norms: Vec<LinearNorm>) -> Self {
        Self {
            field: field.into(),
            norms,
            outliers: OutlierTreatment::AsIs,
            map_missing_to: None,
        }
    }

    pub fn with_outliers(mut self, outliers: OutlierTreatment) -> Self {
        self.outliers = outliers;
        self
    }

    pub fn with_map_missing_to(mut self, value: f64) -> Self {
        self.map_missing_to = Some(value);
        self
    }
}

/// 1.0 when the field equals `value`, else 0.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormDiscrete {
    pub field: String,
    pub value: String,
    pub map_missing_to: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscretizeBin {
    pub label: String,
    pub interval: Interval,
}

impl DiscretizeBin {
    pub fn new(label: impl Into<String>, interval: Interval) -> Self {
        Self {
            label: label.into(),
            interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretize {
    pub field: String,
    pub bins: Vec<DiscretizeBin>,
    pub map_missing_to: Option<String>,
    /// Label used when no bin contains the value
    pub default_value: Option<String>,
    /// Data type of the labels; string when absent
    pub data_type: Option<DataType>,
}

impl Discretize {
    pub fn new(field: impl Into<String>, bins: Vec<DiscretizeBin>) -> Self {
        Self {
            field: field.into(),
            bins,
            map_missing_to: None,
            default_value: None,
            data_type: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_map_missing_to(mut self, value: impl Into<String>) -> Self {
        self.map_missing_to = Some(value.into());
        self
    }
}

/// Binds an input field to a column of the lookup table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldColumnPair {
    pub field: String,
    pub column: String,
}

/// Lookup table; each row maps column names to cell text
pub type InlineTable = Vec<IndexMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValues {
    pub output_column: String,
    pub field_columns: Vec<FieldColumnPair>,
    pub table: InlineTable,
    pub map_missing_to: Option<String>,
    pub default_value: Option<String>,
    /// Data type of the output column; string when absent
    pub data_type: Option<DataType>,
}

impl MapValues {
    pub fn new(output_column: impl Into<String>) -> Self {
        Self {
            output_column: output_column.into(),
            field_columns: Vec::new(),
            table: Vec::new(),
            map_missing_to: None,
            default_value: None,
            data_type: None,
        }
    }

    pub fn with_field_column(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.field_columns.push(FieldColumnPair {
            field: field.into(),
            column: column.into(),
        });
        self
    }

    /// Append a row given as (column, cell) pairs
    pub fn with_row<'a>(mut self, cells: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.table.push(
            cells
                .into_iter()
                .map(|(column, cell)| (column.to_string(), cell.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_map_missing_to(mut self, value: impl Into<String>) -> Self {
        self.map_missing_to = Some(value.into());
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apply {
    pub function: String,
    pub args: Vec<Expression>,
    /// Result when any argument is missing; the function is not called
    pub map_missing_to: Option<String>,
    /// Result when the function returns missing
    pub default_value: Option<String>,
    /// Treatment of an invalid function result
    pub invalid_value_treatment: InvalidValueTreatment,
}

impl Apply {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            map_missing_to: None,
            default_value: None,
            invalid_value_treatment: InvalidValueTreatment::ReturnInvalid,
        }
    }

    pub fn with_arg(mut self, arg: Expression) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = Expression>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn with_map_missing_to(mut self, value: impl Into<String>) -> Self {
        self.map_missing_to = Some(value.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_invalid_treatment(mut self, treatment: InvalidValueTreatment) -> Self {
        self.invalid_value_treatment = treatment;
        self
    }
}

/// Reduction applied by [`Aggregate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregateFunction {
    Count,
    Sum,
    Average,
    Min,
    Max,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Sum => write!(f, "sum"),
            Self::Average => write!(f, "average"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// Reduction over one record's collection-valued field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub field: String,
    pub function: AggregateFunction,
    /// Must name a scalar field; not used by the reduction
    pub group_field: Option<String>,
}

impl Aggregate {
    pub fn new(field: impl Into<String>, function: AggregateFunction) -> Self {
        Self {
            field: field.into(),
            function,
            group_field: None,
        }
    }

    pub fn with_group_field(mut self, field: impl Into<String>) -> Self {
        self.group_field = Some(field.into());
        self
    }
}

/// Reduction over the lagged window of a [`Lag`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LagAggregate {
    /// The single value `n` steps back
    #[default]
    None,
    Avg,
    Max,
    Median,
    Min,
    Product,
    Sum,
    Stddev,
}

impl fmt::Display for LagAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Median => "median",
            Self::Min => "min",
            Self::Product => "product",
            Self::Sum => "sum",
            Self::Stddev => "stddev",
        };
        f.write_str(name)
    }
}

/// Value of a field `n` records back, or a reduction over the last `n` records
///
/// The history itself is supplied by the caller; block indicator fields name
/// the fields whose values delimit one history from the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lag {
    pub field: String,
    pub n: usize,
    pub block_indicators: Vec<String>,
    pub aggregate: LagAggregate,
}

impl Lag {
    pub fn new(field: impl Into<String>, n: usize) -> Self {
        Self {
            field: field.into(),
            n,
            block_indicators: Vec::new(),
            aggregate: LagAggregate::None,
        }
    }

    pub fn with_block_indicator(mut self, field: impl Into<String>) -> Self {
        self.block_indicators.push(field.into());
        self
    }

    pub fn with_aggregate(mut self, aggregate: LagAggregate) -> Self {
        self.aggregate = aggregate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_builder() {
        let apply = Apply::new("+")
            .with_arg(Expression::field("a"))
            .with_arg(Expression::constant("1"))
            .with_map_missing_to("0");

        assert_eq!(apply.args.len(), 2);
        assert_eq!(apply.invalid_value_treatment, InvalidValueTreatment::ReturnInvalid);
        assert_eq!(Expression::from(apply).kind(), "Apply");
    }

    #[test]
    fn test_map_values_rows() {
        let map = MapValues::new("out")
            .with_field_column("color", "in")
            .with_row([("in", "red"), ("out", "warm")]);

        assert_eq!(map.table[0].get("out").map(String::as_str), Some("warm"));
    }

    #[test]
    fn test_serde_round_trip() {
        let expr = Expression::Lag(Lag::new("sales", 2).with_aggregate(LagAggregate::Avg));
        let json = serde_json::to_string(&expr).unwrap();
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
