//! Table lookups
//!
//! `MapValues` binds each input field to a column of an inline table and
//! returns the output column of the first row whose cells all equal the
//! inputs. Cells are read as the input's own type, so `"1"` matches an
//! integer 1 and a double 1.0 alike.

use crate::context::EvaluationContext;
use crate::engine::{matches_literal, typed_literal, PmmlEngine};
use crate::error::{EvalError, EvalResult};
use indexmap::IndexMap;
use pmml_ast::{FieldColumnPair, MapValues};
use pmml_types::{DataType, Value};
use smallvec::SmallVec;

impl PmmlEngine {
    pub(crate) fn eval_map_values(
        &self,
        map: &MapValues,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<Value>> {
        let data_type = map.data_type.unwrap_or(DataType::String);
        let output = |text: Option<&str>| -> EvalResult<Option<Value>> {
            text.map(|text| typed_literal(text, data_type)).transpose()
        };

        let mut inputs: SmallVec<[Value; 4]> = SmallVec::new();
        for pair in &map.field_columns {
            match self.resolve_field(&pair.field, ctx)? {
                Some(value) => inputs.push(value),
                None => {
                    return output(map.map_missing_to.as_deref().or(map.default_value.as_deref()));
                }
            }
        }

        for row in &map.table {
            if row_matches(row, &map.field_columns, &inputs)? {
                let cell = row.get(&map.output_column).ok_or_else(|| {
                    EvalError::invalid_model(format!(
                        "lookup table row has no output column '{}'",
                        map.output_column
                    ))
                })?;
                return output(Some(cell));
            }
        }

        output(map.default_value.as_deref())
    }
}

fn row_matches(
    row: &IndexMap<String, String>,
    pairs: &[FieldColumnPair],
    inputs: &[Value],
) -> EvalResult<bool> {
    for (pair, input) in pairs.iter().zip(inputs) {
        let Some(cell) = row.get(&pair.column) else {
            return Ok(false);
        };
        if !matches_literal(input, cell)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use crate::arguments::Record;
    use crate::context::EvaluationContext;
    use crate::engine::PmmlEngine;
    use crate::error::EvalError;
    use crate::index::ModelIndex;
    use pmml_ast::{Dictionary, Expression, FieldSpec, MapValues};
    use pmml_types::{DataType, Value};
    use pretty_assertions::assert_eq;

    fn lookup() -> MapValues {
        MapValues::new("rate")
            .with_field_column("region", "region")
            .with_field_column("tier", "tier")
            .with_row([("region", "north"), ("tier", "1"), ("rate", "0.5")])
            .with_row([("region", "south"), ("tier", "1"), ("rate", "0.75")])
            .with_data_type(DataType::Double)
            .with_default("1")
    }

    fn eval(map: MapValues, record: &Record) -> Result<Option<Value>, EvalError> {
        let dictionary = Dictionary::new()
            .with_field(FieldSpec::new("region", DataType::String))
            .with_field(FieldSpec::new("tier", DataType::Integer));
        let index = ModelIndex::shared(&dictionary).unwrap();
        let mut ctx = EvaluationContext::new(index, record);
        PmmlEngine::new().evaluate_expression(&Expression::MapValues(map), &mut ctx)
    }

    #[test]
    fn test_first_matching_row() {
        let record = Record::new().with("region", "south").with("tier", "1");
        assert_eq!(eval(lookup(), &record).unwrap(), Some(Value::double(0.75)));
    }

    #[test]
    fn test_no_match_takes_default() {
        let record = Record::new().with("region", "east").with("tier", "1");
        assert_eq!(eval(lookup(), &record).unwrap(), Some(Value::double(1.0)));
    }

    #[test]
    fn test_missing_input_takes_map_missing_to() {
        let record = Record::new().with("region", "north");
        let map = lookup().with_map_missing_to("0");
        assert_eq!(eval(map, &record).unwrap(), Some(Value::double(0.0)));
    }
}
