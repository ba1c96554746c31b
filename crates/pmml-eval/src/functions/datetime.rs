//! Date and time functions
//!
//! Implements: dateDaysSinceYear, dateSecondsSinceYear,
//! dateSecondsSinceMidnight. Every result is an integer count.

use super::{arg, Arity, FunctionRegistry, MissingArgs, Outcome};
use crate::error::{EvalError, EvalResult};
use chrono::{NaiveDate, NaiveTime};
use pmml_types::{cast, seconds_since_midnight, Data, DataType, Value};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register("dateDaysSinceYear", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let date = match cast(DataType::Date, arg(args, 0)?.scalar()?)? {
            Data::Date(date) => date,
            other => return Err(EvalError::type_mismatch("date", other.data_type().to_string())),
        };
        let Some(base) = january_first(arg(args, 1)?)? else {
            return Ok(Outcome::Invalid(None));
        };
        Ok(Value::integer((date - base).num_days()).into())
    });

    registry.register("dateSecondsSinceYear", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let date_time = match cast(DataType::DateTime, arg(args, 0)?.scalar()?)? {
            Data::DateTime(dt) => dt,
            other => {
                return Err(EvalError::type_mismatch("dateTime", other.data_type().to_string()));
            }
        };
        let Some(base) = january_first(arg(args, 1)?)? else {
            return Ok(Outcome::Invalid(None));
        };
        let elapsed = date_time - base.and_time(NaiveTime::MIN);
        Ok(Value::integer(elapsed.num_seconds()).into())
    });

    registry.register("dateSecondsSinceMidnight", Arity::Exact(1), MissingArgs::Propagate, |args| {
        let seconds = match arg(args, 0)?.scalar()? {
            // Already a count, which may run past one day
            Data::SecondsSinceMidnight(seconds) => *seconds,
            data => match cast(DataType::Time, data)? {
                Data::Time(time) => seconds_since_midnight(time),
                other => {
                    return Err(EvalError::type_mismatch("time", other.data_type().to_string()));
                }
            },
        };
        Ok(Value::integer(seconds).into())
    });
}

/// January 1st of the year given by `value`, if it is a representable year
fn january_first(value: &Value) -> EvalResult<Option<NaiveDate>> {
    let year = value.to_f64()?;
    if year.fract() != 0.0 || !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&year) {
        return Ok(None);
    }
    Ok(NaiveDate::from_ymd_opt(year as i32, 1, 1))
}
