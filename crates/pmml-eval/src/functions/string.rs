//! String functions
//!
//! Implements: uppercase, lowercase, trimBlanks, stringLength, substring,
//! concat, replace, matches, formatNumber, formatDatetime.
//!
//! Non-string operands are used through their canonical text form.

use super::{arg, present, Arity, FunctionRegistry, MissingArgs, Outcome};
use crate::error::{EvalError, EvalResult};
use chrono::format::{Item, StrftimeItems};
use pmml_types::{cast, whole_number, Data, DataType, Value};
use regex::Regex;
use std::fmt::Write;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register("uppercase", Arity::Exact(1), MissingArgs::Propagate, |args| {
        Ok(Value::string(text(arg(args, 0)?)?.to_uppercase()).into())
    });
    registry.register("lowercase", Arity::Exact(1), MissingArgs::Propagate, |args| {
        Ok(Value::string(text(arg(args, 0)?)?.to_lowercase()).into())
    });
    registry.register("trimBlanks", Arity::Exact(1), MissingArgs::Propagate, |args| {
        Ok(Value::string(text(arg(args, 0)?)?.trim()).into())
    });
    registry.register("stringLength", Arity::Exact(1), MissingArgs::Propagate, |args| {
        let length = text(arg(args, 0)?)?.chars().count();
        Ok(Value::integer(length as i64).into())
    });
    registry.register("substring", Arity::Exact(3), MissingArgs::Propagate, |args| {
        substring(arg(args, 0)?, arg(args, 1)?, arg(args, 2)?)
    });
    registry.register("concat", Arity::AtLeast(1), MissingArgs::Skip, |args| {
        let parts = present(args)?;
        if parts.is_empty() {
            return Ok(Outcome::Missing);
        }
        let mut joined = String::new();
        for part in parts {
            joined.push_str(&text(part)?);
        }
        Ok(Value::string(joined).into())
    });
    registry.register("replace", Arity::Exact(3), MissingArgs::Propagate, |args| {
        let input = text(arg(args, 0)?)?;
        let pattern = pattern(arg(args, 1)?)?;
        let replacement = text(arg(args, 2)?)?;
        Ok(Value::string(pattern.replace_all(&input, replacement.as_str())).into())
    });
    registry.register("matches", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let input = text(arg(args, 0)?)?;
        Ok(Value::boolean(pattern(arg(args, 1)?)?.is_match(&input)).into())
    });
    registry.register("formatNumber", Arity::Exact(2), MissingArgs::Propagate, |args| {
        format_number(arg(args, 0)?, &text(arg(args, 1)?)?)
    });
    registry.register("formatDatetime", Arity::Exact(2), MissingArgs::Propagate, |args| {
        format_datetime(arg(args, 0)?, &text(arg(args, 1)?)?)
    });
}

fn text(value: &Value) -> EvalResult<String> {
    Ok(match value.scalar()? {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn whole(value: &Value) -> EvalResult<Option<i64>> {
    Ok(whole_number(value.to_f64()?))
}

fn pattern(value: &Value) -> EvalResult<Regex> {
    let source = text(value)?;
    Regex::new(&source)
        .map_err(|e| EvalError::invalid_model(format!("invalid pattern '{}': {}", source, e)))
}

/// One-based substring; positions past the end are clamped
fn substring(input: &Value, start: &Value, length: &Value) -> EvalResult<Outcome> {
    let input = text(input)?;
    let (Some(start), Some(length)) = (whole(start)?, whole(length)?) else {
        return Ok(Outcome::Invalid(None));
    };
    if start < 1 || length < 0 {
        return Ok(Outcome::Invalid(None));
    }

    let result: String = input
        .chars()
        .skip((start - 1) as usize)
        .take(length as usize)
        .collect();
    Ok(Value::string(result).into())
}

// =========================================================================
// formatNumber
// =========================================================================

/// Largest width or precision a format directive may ask for
const MAX_FIELD: usize = 1024;

/// A single `%[flags][width][.precision]conversion` directive
#[derive(Debug, Default, PartialEq)]
struct Directive {
    left_align: bool,
    zero_pad: bool,
    plus_sign: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

/// printf-style formatting of a single number
///
/// Supports the `d`, `f`, `e`, `s` and `x` conversions with the `-`, `0` and
/// `+` flags. Literal text around the directive is kept; `%%` is a percent sign.
fn format_number(value: &Value, pattern: &str) -> EvalResult<Outcome> {
    let mut output = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            output.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            output.push('%');
            continue;
        }

        let mut directive = Directive::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => directive.left_align = true,
                '0' => directive.zero_pad = true,
                '+' => directive.plus_sign = true,
                _ => break,
            }
            chars.next();
        }
        directive.width = digits(&mut chars, pattern)?.unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            directive.precision = Some(digits(&mut chars, pattern)?.unwrap_or(0));
        }
        directive.conversion = chars
            .next()
            .ok_or_else(|| EvalError::invalid_model(format!("incomplete format '{}'", pattern)))?;

        match render(value, &directive)? {
            Some(rendered) => output.push_str(&rendered),
            None => return Ok(Outcome::Invalid(None)),
        }
    }

    Ok(Value::string(output).into())
}

/// Width or precision digits, at most `MAX_FIELD`
fn digits(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    pattern: &str,
) -> EvalResult<Option<usize>> {
    let mut number: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        let next = number
            .unwrap_or(0)
            .checked_mul(10)
            .and_then(|n| n.checked_add(d as usize))
            .filter(|n| *n <= MAX_FIELD)
            .ok_or_else(|| {
                EvalError::invalid_model(format!(
                    "field width in format '{}' exceeds {}",
                    pattern, MAX_FIELD
                ))
            })?;
        number = Some(next);
        chars.next();
    }
    Ok(number)
}

fn render(value: &Value, directive: &Directive) -> EvalResult<Option<String>> {
    let (body, numeric) = match directive.conversion {
        'd' => match whole(value)? {
            Some(i) => (i.to_string(), true),
            None => return Ok(None),
        },
        'x' => match whole(value)? {
            Some(i) => (format!("{:x}", i), true),
            None => return Ok(None),
        },
        'f' => {
            let x = value.to_f64()?;
            (format!("{:.*}", directive.precision.unwrap_or(6), x), true)
        }
        'e' => {
            let x = value.to_f64()?;
            (exponent(x, directive.precision.unwrap_or(6)), true)
        }
        's' => {
            let mut s = text(value)?;
            if let Some(precision) = directive.precision {
                s = s.chars().take(precision).collect();
            }
            (s, false)
        }
        other => {
            return Err(EvalError::unsupported_operator(
                format!("%{}", other),
                "formatNumber supports d, f, e, s and x",
            ));
        }
    };

    let (sign, digits) = match body.strip_prefix('-') {
        Some(rest) if numeric => ("-", rest.to_string()),
        _ if numeric && directive.plus_sign => ("+", body),
        _ => ("", body),
    };

    let len = sign.len() + digits.chars().count();
    let padding = directive.width.saturating_sub(len);
    Ok(Some(if directive.left_align {
        format!("{}{}{}", sign, digits, " ".repeat(padding))
    } else if directive.zero_pad && numeric {
        format!("{}{}{}", sign, "0".repeat(padding), digits)
    } else {
        format!("{}{}{}", " ".repeat(padding), sign, digits)
    }))
}

/// C-style scientific notation: a signed exponent of at least two digits
fn exponent(x: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, x);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, magnitude) = match exp.strip_prefix('-') {
                Some(magnitude) => ('-', magnitude),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, magnitude)
        }
        None => formatted,
    }
}

// =========================================================================
// formatDatetime
// =========================================================================

/// strftime-style formatting of a date, time or date-time
fn format_datetime(value: &Value, pattern: &str) -> EvalResult<Outcome> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(EvalError::invalid_model(format!(
            "invalid date format '{}'",
            pattern
        )));
    }

    let data = match value.scalar()? {
        Data::SecondsSince(..) => cast(DataType::DateTime, value.scalar()?)?,
        Data::DaysSince(..) => cast(DataType::Date, value.scalar()?)?,
        Data::SecondsSinceMidnight(..) => match cast(DataType::Time, value.scalar()?) {
            Ok(time) => time,
            Err(_) => return Ok(Outcome::Invalid(None)),
        },
        other => other.clone(),
    };

    let items = items.iter();
    let mut output = String::new();
    // Asking for fields the value does not carry is a formatting error
    let written = match data {
        Data::Date(date) => write!(output, "{}", date.format_with_items(items)),
        Data::Time(time) => write!(output, "{}", time.format_with_items(items)),
        Data::DateTime(dt) => write!(output, "{}", dt.format_with_items(items)),
        other => {
            return Err(EvalError::type_mismatch(
                "date, time or dateTime",
                other.data_type().to_string(),
            ));
        }
    };

    Ok(match written {
        Ok(()) => Value::string(output).into(),
        Err(_) => Outcome::Invalid(None),
    })
}
