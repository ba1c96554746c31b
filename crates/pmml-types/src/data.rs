//! Primitive data representations
//!
//! [`Data`] is the raw payload of a value, one variant per representation.
//! Text is turned into data by [`parse`], already-typed data is converted by
//! [`cast`], and [`parse_or_cast`] dispatches between the two for a raw input.

use crate::temporal::{
    date_from_days, date_time_from_seconds, days_since, format_elapsed_seconds, parse_date,
    parse_date_time, parse_elapsed_seconds, parse_time, seconds_since, seconds_since_midnight,
    time_from_seconds,
};
use crate::{DataType, Epoch, TypeError, TypeResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Raw payload of a scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Data {
    String(String),
    Integer(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Whole days since January 1st of the epoch year
    DaysSince(Epoch, i64),
    /// Seconds since midnight; may exceed one day
    SecondsSinceMidnight(i64),
    /// Whole seconds since January 1st (00:00:00) of the epoch year
    SecondsSince(Epoch, i64),
}

impl Data {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Integer(_) => DataType::Integer,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::Boolean(_) => DataType::Boolean,
            Self::Date(_) => DataType::Date,
            Self::Time(_) => DataType::Time,
            Self::DateTime(_) => DataType::DateTime,
            Self::DaysSince(epoch, _) => DataType::days_since_epoch(*epoch),
            Self::SecondsSinceMidnight(_) => DataType::TimeSeconds,
            Self::SecondsSince(epoch, _) => DataType::seconds_since_epoch(*epoch),
        }
    }

    /// Numeric view of the payload
    ///
    /// Numbers, booleans (as 0/1) and the count-since-epoch representations have
    /// one; strings and calendar values do not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::DaysSince(_, v) | Self::SecondsSinceMidnight(v) | Self::SecondsSince(_, v) => {
                Some(*v as f64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this is a floating-point NaN
    pub fn is_nan(&self) -> bool {
        match self {
            Self::Float(v) => v.is_nan(),
            Self::Double(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Natural order of two payloads of the same representation
    ///
    /// Returns `None` for different representations and for NaN operands.
    pub fn natural_cmp(&self, other: &Data) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::DaysSince(e1, a), Self::DaysSince(e2, b))
            | (Self::SecondsSince(e1, a), Self::SecondsSince(e2, b))
                if e1 == e2 =>
            {
                Some(a.cmp(b))
            }
            (Self::SecondsSinceMidnight(a), Self::SecondsSinceMidnight(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn format_real(f: &mut fmt::Formatter<'_>, value: f64, text: impl fmt::Display) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "INF" } else { "-INF" })
    } else {
        write!(f, "{}", text)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => format_real(f, f64::from(*v), v),
            Self::Double(v) => format_real(f, *v, v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::DaysSince(_, v) | Self::SecondsSince(_, v) => write!(f, "{}", v),
            Self::SecondsSinceMidnight(v) => f.write_str(&format_elapsed_seconds(*v)),
        }
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for Data {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Raw input as supplied by a caller, before preparation
///
/// Text is parsed, typed data is cast, and a list becomes a collection whose
/// `None` elements are missing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Data(Data),
    List(Vec<Option<RawValue>>),
}

impl RawValue {
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Text of a textual input, including string data
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Data(Data::String(text)) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Data(data) => write!(f, "{}", data),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Some(item) => write!(f, "{}", item)?,
                        None => write!(f, "null")?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Data> for RawValue {
    fn from(value: Data) -> Self {
        Self::Data(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Data(Data::Integer(value))
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Data(Data::Double(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Data(Data::Boolean(value))
    }
}

impl From<Vec<Option<RawValue>>> for RawValue {
    fn from(value: Vec<Option<RawValue>>) -> Self {
        Self::List(value)
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Some(v);
    }
    if let Ok(v) = text.parse::<f64>() {
        return whole_number(v);
    }
    match text {
        "true" => Some(1),
        "false" => Some(0),
        _ => None,
    }
}

/// An integer for a mathematically whole float, if it fits in `i64`
pub fn whole_number(v: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if v.is_finite() && v.fract() == 0.0 && (-LIMIT..LIMIT).contains(&v) {
        Some(v as i64)
    } else {
        None
    }
}

fn parse_double(text: &str) -> Option<f64> {
    match text.trim() {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

fn parse_float(text: &str) -> Option<f32> {
    match text.trim() {
        "INF" => Some(f32::INFINITY),
        "-INF" => Some(f32::NEG_INFINITY),
        "NaN" => Some(f32::NAN),
        other => other.parse().ok(),
    }
}

fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    match text.parse::<f64>().ok()? {
        v if v == 1.0 => Some(true),
        v if v == 0.0 => Some(false),
        _ => None,
    }
}

/// Parse text into the representation of a data type
pub fn parse(data_type: DataType, text: &str) -> TypeResult<Data> {
    let parsed = match data_type {
        DataType::String => Some(Data::String(text.to_string())),
        DataType::Integer => parse_integer(text).map(Data::Integer),
        DataType::Float => parse_float(text).map(Data::Float),
        DataType::Double => parse_double(text).map(Data::Double),
        DataType::Boolean => parse_boolean(text).map(Data::Boolean),
        DataType::Date => parse_date(text).map(Data::Date),
        DataType::Time => parse_time(text).map(Data::Time),
        DataType::DateTime => parse_date_time(text).map(Data::DateTime),
        DataType::DateDaysSince1960 | DataType::DateDaysSince1970 | DataType::DateDaysSince1980 => {
            data_type.days_since().and_then(|epoch| {
                text.trim()
                    .parse::<i64>()
                    .ok()
                    .or_else(|| parse_date(text).map(|date| days_since(epoch, date)))
                    .map(|days| Data::DaysSince(epoch, days))
            })
        }
        DataType::TimeSeconds => text
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| parse_elapsed_seconds(text))
            .map(Data::SecondsSinceMidnight),
        DataType::DateTimeSecondsSince1960
        | DataType::DateTimeSecondsSince1970
        | DataType::DateTimeSecondsSince1980 => data_type.seconds_since().and_then(|epoch| {
            text.trim()
                .parse::<i64>()
                .ok()
                .or_else(|| parse_date_time(text).map(|dt| seconds_since(epoch, dt)))
                .map(|seconds| Data::SecondsSince(epoch, seconds))
        }),
    };

    parsed.ok_or_else(|| TypeError::parse(data_type, text))
}

fn mismatch(data_type: DataType, data: &Data) -> TypeError {
    TypeError::mismatch(data_type.name(), format!("{} {}", data.data_type(), data))
}

/// Convert typed data to another representation
///
/// Numeric types widen freely. Narrowing succeeds only when no information is
/// lost: a double casts to float only if exactly representable, and a float
/// casts to integer only if it is a whole number. Epoch counts move between
/// epochs by a fixed offset.
pub fn cast(data_type: DataType, data: &Data) -> TypeResult<Data> {
    if data.data_type() == data_type {
        return Ok(data.clone());
    }

    let converted = match data_type {
        DataType::String => Some(Data::String(data.to_string())),
        DataType::Integer => match data {
            Data::Float(v) => whole_number(f64::from(*v)),
            Data::Double(v) => whole_number(*v),
            Data::Boolean(v) => Some(i64::from(*v)),
            Data::DaysSince(_, v) | Data::SecondsSince(_, v) | Data::SecondsSinceMidnight(v) => {
                Some(*v)
            }
            _ => None,
        }
        .map(Data::Integer),
        DataType::Float => match data {
            Data::Double(v) => {
                let narrowed = *v as f32;
                (f64::from(narrowed) == *v || v.is_nan()).then_some(narrowed)
            }
            other => other.as_f64().map(|v| v as f32),
        }
        .map(Data::Float),
        DataType::Double => data.as_f64().map(Data::Double),
        DataType::Boolean => match data.as_f64() {
            Some(v) if v == 1.0 => Some(Data::Boolean(true)),
            Some(v) if v == 0.0 => Some(Data::Boolean(false)),
            _ => None,
        },
        DataType::Date => match data {
            Data::DateTime(dt) => Some(dt.date()),
            Data::DaysSince(epoch, days) => date_from_days(*epoch, *days),
            Data::SecondsSince(epoch, seconds) => {
                date_time_from_seconds(*epoch, *seconds).map(|dt| dt.date())
            }
            _ => None,
        }
        .map(Data::Date),
        DataType::Time => match data {
            Data::DateTime(dt) => Some(dt.time()),
            Data::SecondsSinceMidnight(seconds) => time_from_seconds(*seconds),
            _ => None,
        }
        .map(Data::Time),
        DataType::DateTime => match data {
            Data::Date(date) => Some(date.and_time(NaiveTime::MIN)),
            Data::DaysSince(epoch, days) => {
                date_from_days(*epoch, *days).map(|date| date.and_time(NaiveTime::MIN))
            }
            Data::SecondsSince(epoch, seconds) => date_time_from_seconds(*epoch, *seconds),
            _ => None,
        }
        .map(Data::DateTime),
        DataType::DateDaysSince1960 | DataType::DateDaysSince1970 | DataType::DateDaysSince1980 => {
            data_type.days_since().and_then(|target| {
                match data {
                    Data::DaysSince(epoch, days) => Some(days + epoch.day_offset_to(target)),
                    Data::Date(date) => Some(days_since(target, *date)),
                    Data::DateTime(dt) => Some(days_since(target, dt.date())),
                    Data::Integer(days) => Some(*days),
                    _ => None,
                }
                .map(|days| Data::DaysSince(target, days))
            })
        }
        DataType::TimeSeconds => match data {
            Data::Time(time) => Some(seconds_since_midnight(*time)),
            Data::DateTime(dt) => Some(seconds_since_midnight(dt.time())),
            Data::Integer(seconds) => Some(*seconds),
            _ => None,
        }
        .map(Data::SecondsSinceMidnight),
        DataType::DateTimeSecondsSince1960
        | DataType::DateTimeSecondsSince1970
        | DataType::DateTimeSecondsSince1980 => data_type.seconds_since().and_then(|target| {
            match data {
                Data::SecondsSince(epoch, seconds) => Some(seconds + epoch.second_offset_to(target)),
                Data::DateTime(dt) => Some(seconds_since(target, *dt)),
                Data::Date(date) => Some(seconds_since(target, date.and_time(NaiveTime::MIN))),
                Data::Integer(seconds) => Some(*seconds),
                _ => None,
            }
            .map(|seconds| Data::SecondsSince(target, seconds))
        }),
    };

    converted.ok_or_else(|| mismatch(data_type, data))
}

/// Parse textual input, cast typed input
pub fn parse_or_cast(data_type: DataType, raw: &RawValue) -> TypeResult<Data> {
    match raw {
        RawValue::Text(text) | RawValue::Data(Data::String(text)) => parse(data_type, text),
        RawValue::Data(data) => cast(data_type, data),
        RawValue::List(_) => Err(TypeError::mismatch(data_type.name(), "list")),
    }
}
