//! Arithmetic functions
//!
//! Implements: + - * / modulo pow, abs exp expm1 ln ln1p log10 sqrt hypot,
//! floor ceil round rint threshold, and the reductions min max sum avg median
//! product.
//!
//! The result precision follows the least restrictive type of the operands:
//! integers stay integers (except for division and a few transcendental
//! functions), a float operand makes the computation single precision, and a
//! double operand makes it double precision. Results outside of the
//! function's domain (division by zero, overflow, NaN) are invalid, not
//! errors.

use super::{arg, present, Arity, FunctionRegistry, MissingArgs, Outcome};
use crate::error::{EvalError, EvalResult};
use pmml_types::{cast, common_data_type, Data, DataType, NumericResult, NumericValue, OpType};
use pmml_types::{whole_number, Real, Value};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    for (name, op) in [
        ("+", BinaryOp::Add),
        ("-", BinaryOp::Subtract),
        ("*", BinaryOp::Multiply),
        ("/", BinaryOp::Divide),
        ("modulo", BinaryOp::Modulo),
        ("pow", BinaryOp::Pow),
    ] {
        registry.register(name, Arity::Exact(2), MissingArgs::Propagate, move |args| {
            binary(op, arg(args, 0)?, arg(args, 1)?)
        });
    }

    for (name, op) in [
        ("abs", UnaryOp::Abs),
        ("exp", UnaryOp::Exp),
        ("expm1", UnaryOp::Expm1),
        ("ln", UnaryOp::Ln),
        ("ln1p", UnaryOp::Ln1p),
        ("log10", UnaryOp::Log10),
        ("sqrt", UnaryOp::Sqrt),
    ] {
        registry.register(name, Arity::Exact(1), MissingArgs::Propagate, move |args| {
            unary(op, arg(args, 0)?)
        });
    }

    for (name, op) in [
        ("floor", Rounding::Floor),
        ("ceil", Rounding::Ceil),
        ("round", Rounding::Round),
        ("rint", Rounding::Rint),
    ] {
        registry.register(name, Arity::Exact(1), MissingArgs::Propagate, move |args| {
            round_to_integer(op, arg(args, 0)?)
        });
    }

    registry.register("threshold", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let x = arg(args, 0)?.to_f64()?;
        let t = arg(args, 1)?.to_f64()?;
        Ok(Value::integer(i64::from(x > t)).into())
    });
    registry.register("hypot", Arity::Exact(2), MissingArgs::Propagate, |args| {
        let x = arg(args, 0)?.to_f64()?;
        let y = arg(args, 1)?.to_f64()?;
        Ok(real_outcome(NumericValue::new(x).apply("hypot", |x| x.hypot(y))))
    });

    registry.register("min", Arity::AtLeast(1), MissingArgs::Skip, |args| {
        minimum(&present(args)?)
    });
    registry.register("max", Arity::AtLeast(1), MissingArgs::Skip, |args| {
        maximum(&present(args)?)
    });
    registry.register("sum", Arity::AtLeast(1), MissingArgs::Skip, |args| {
        sum(&present(args)?)
    });
    registry.register("avg", Arity::AtLeast(1), MissingArgs::Skip, |args| {
        average(&present(args)?)
    });
    registry.register("median", Arity::AtLeast(1), MissingArgs::Skip, |args| {
        median(&present(args)?)
    });
    registry.register("product", Arity::AtLeast(1), MissingArgs::Skip, |args| {
        product(&present(args)?)
    });
}

// =========================================================================
// Precision
// =========================================================================

/// Representation an arithmetic computation runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Precision {
    Integer,
    Float,
    Double,
}

impl Precision {
    fn data_type(self) -> DataType {
        match self {
            Self::Integer => DataType::Integer,
            Self::Float => DataType::Float,
            Self::Double => DataType::Double,
        }
    }
}

/// Precision of a computation over the given operands
pub(crate) fn precision(values: &[&Value]) -> EvalResult<Precision> {
    let types = values
        .iter()
        .map(|value| value.scalar().map(Data::data_type))
        .collect::<Result<Vec<_>, _>>()?;

    match common_data_type(&types)? {
        None | Some(DataType::Double) => Ok(Precision::Double),
        Some(DataType::Float) => Ok(Precision::Float),
        Some(DataType::String) => Err(EvalError::type_mismatch("number", "string")),
        // Integers, booleans and epoch counts of a single kind
        Some(data_type) if data_type == DataType::Integer || integral(data_type) => {
            Ok(Precision::Integer)
        }
        Some(data_type) => Err(EvalError::type_mismatch("number", data_type.to_string())),
    }
}

fn integral(data_type: DataType) -> bool {
    data_type == DataType::Boolean
        || data_type == DataType::TimeSeconds
        || data_type.days_since().is_some()
        || data_type.seconds_since().is_some()
}

fn integer(value: &Value) -> EvalResult<i64> {
    match cast(DataType::Integer, value.scalar()?)? {
        Data::Integer(i) => Ok(i),
        other => Err(EvalError::type_mismatch("integer", other.to_string())),
    }
}

fn real<N: Real>(value: &Value) -> EvalResult<N> {
    Ok(N::from_f64(value.to_f64()?))
}

fn real_outcome<N: Real>(result: NumericResult<&mut NumericValue<N>>) -> Outcome {
    match result {
        Ok(acc) => Outcome::Value(acc.to_value()),
        Err(error) => {
            log::trace!("invalid numeric result: {}", error);
            Outcome::Invalid(None)
        }
    }
}

fn integer_outcome(result: Option<i64>) -> Outcome {
    result.map_or(Outcome::Invalid(None), |i| Outcome::Value(Value::integer(i)))
}

// =========================================================================
// Binary Arithmetic
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Pow,
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Outcome> {
    match precision(&[left, right])? {
        // Integer division and negative integer powers leave the integers
        Precision::Integer if op != BinaryOp::Divide => {
            let (a, b) = (integer(left)?, integer(right)?);
            if op == BinaryOp::Pow && b < 0 {
                return binary_real::<f64>(op, left, right);
            }
            Ok(integer_outcome(binary_integer(op, a, b)))
        }
        Precision::Float => binary_real::<f32>(op, left, right),
        _ => binary_real::<f64>(op, left, right),
    }
}

fn binary_integer(op: BinaryOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Divide => (b != 0).then(|| a / b),
        // Floored modulo: the result takes the sign of the divisor
        BinaryOp::Modulo => a.checked_rem(b).map(|r| {
            if r != 0 && (r < 0) != (b < 0) {
                r + b
            } else {
                r
            }
        }),
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
    }
}

fn binary_real<N: Real>(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Outcome> {
    let mut acc = NumericValue::<N>::new(real(left)?);
    let b: N = real(right)?;
    let result = match op {
        BinaryOp::Add => acc.add(b),
        BinaryOp::Subtract => acc.subtract(b),
        BinaryOp::Multiply => acc.multiply(b),
        BinaryOp::Divide => acc.divide(b),
        BinaryOp::Pow => acc.power(b),
        BinaryOp::Modulo if b == N::ZERO => return Ok(Outcome::Invalid(None)),
        BinaryOp::Modulo => acc.apply("modulo", |a| a - b * (a / b).floor()),
    };
    Ok(real_outcome(result))
}

// =========================================================================
// Unary Arithmetic
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Abs,
    Exp,
    Expm1,
    Ln,
    Ln1p,
    Log10,
    Sqrt,
}

fn unary(op: UnaryOp, value: &Value) -> EvalResult<Outcome> {
    match precision(&[value])? {
        Precision::Integer if op == UnaryOp::Abs => {
            Ok(integer_outcome(integer(value)?.checked_abs()))
        }
        Precision::Float => unary_real::<f32>(op, value),
        _ => unary_real::<f64>(op, value),
    }
}

fn unary_real<N: Real>(op: UnaryOp, value: &Value) -> EvalResult<Outcome> {
    let mut acc = NumericValue::<N>::new(real(value)?);
    let result = match op {
        UnaryOp::Abs => acc.abs(),
        UnaryOp::Exp => acc.exp(),
        UnaryOp::Expm1 => acc.apply("expm1", N::exp_m1),
        UnaryOp::Ln => acc.ln(),
        UnaryOp::Ln1p => acc.apply("ln1p", N::ln_1p),
        UnaryOp::Log10 => acc.apply("log10", N::log10),
        UnaryOp::Sqrt => acc.sqrt(),
    };
    Ok(real_outcome(result))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    Floor,
    Ceil,
    Round,
    Rint,
}

/// Round to a whole number, returned as an integer
fn round_to_integer(op: Rounding, value: &Value) -> EvalResult<Outcome> {
    let rounded = match precision(&[value])? {
        Precision::Integer => return Ok(Outcome::Value(Value::integer(integer(value)?))),
        Precision::Float => round_real::<f32>(op, value)?,
        Precision::Double => round_real::<f64>(op, value)?,
    };

    Ok(match rounded.and_then(whole_number) {
        Some(i) => Outcome::Value(Value::integer(i)),
        None => Outcome::Invalid(None),
    })
}

fn round_real<N: Real>(op: Rounding, value: &Value) -> EvalResult<Option<f64>> {
    let mut acc = NumericValue::<N>::new(real(value)?);
    let result = match op {
        Rounding::Floor => acc.floor(),
        Rounding::Ceil => acc.ceiling(),
        Rounding::Round => acc.round(),
        Rounding::Rint => acc.rint(),
    };
    Ok(result.ok().map(|acc| acc.to_f64()))
}

// =========================================================================
// Reductions
// =========================================================================

/// Smallest operand, in the operands' common precision
pub(crate) fn minimum(values: &[&Value]) -> EvalResult<Outcome> {
    extreme(values, std::cmp::Ordering::Less)
}

/// Largest operand, in the operands' common precision
pub(crate) fn maximum(values: &[&Value]) -> EvalResult<Outcome> {
    extreme(values, std::cmp::Ordering::Greater)
}

fn extreme(values: &[&Value], wanted: std::cmp::Ordering) -> EvalResult<Outcome> {
    let Some((first, rest)) = values.split_first() else {
        return Ok(Outcome::Missing);
    };
    let precision = precision(values)?;

    let mut best = *first;
    for value in rest {
        if value.compare_natural(best)? == wanted {
            best = value;
        }
    }
    Ok(Outcome::Value(
        best.cast_to(precision.data_type(), OpType::Continuous)?,
    ))
}

pub(crate) fn sum(values: &[&Value]) -> EvalResult<Outcome> {
    if values.is_empty() {
        return Ok(Outcome::Missing);
    }
    match precision(values)? {
        Precision::Integer => {
            let mut total: Option<i64> = Some(0);
            for value in values {
                let i = integer(value)?;
                total = total.and_then(|t| t.checked_add(i));
            }
            Ok(integer_outcome(total))
        }
        Precision::Float => fold_real::<f32>(values, 0.0, |acc, x| acc.add(x)),
        Precision::Double => fold_real::<f64>(values, 0.0, |acc, x| acc.add(x)),
    }
}

pub(crate) fn product(values: &[&Value]) -> EvalResult<Outcome> {
    if values.is_empty() {
        return Ok(Outcome::Missing);
    }
    match precision(values)? {
        Precision::Integer => {
            let mut total: Option<i64> = Some(1);
            for value in values {
                let i = integer(value)?;
                total = total.and_then(|t| t.checked_mul(i));
            }
            Ok(integer_outcome(total))
        }
        Precision::Float => fold_real::<f32>(values, 1.0, |acc, x| acc.multiply(x)),
        Precision::Double => fold_real::<f64>(values, 1.0, |acc, x| acc.multiply(x)),
    }
}

fn fold_real<N: Real>(
    values: &[&Value],
    start: N,
    step: impl Fn(&mut NumericValue<N>, N) -> NumericResult<&mut NumericValue<N>>,
) -> EvalResult<Outcome> {
    let mut acc = NumericValue::new(start);
    for value in values {
        if let Err(error) = step(&mut acc, real(value)?) {
            log::trace!("invalid numeric result: {}", error);
            return Ok(Outcome::Invalid(None));
        }
    }
    Ok(Outcome::Value(acc.to_value()))
}

/// Arithmetic mean; double precision unless every operand is a float
pub(crate) fn average(values: &[&Value]) -> EvalResult<Outcome> {
    if values.is_empty() {
        return Ok(Outcome::Missing);
    }
    match precision(values)? {
        Precision::Float => mean::<f32>(values),
        _ => mean::<f64>(values),
    }
}

fn mean<N: Real>(values: &[&Value]) -> EvalResult<Outcome> {
    let mut acc = NumericValue::<N>::new(N::ZERO);
    for value in values {
        if acc.add(real(value)?).is_err() {
            return Ok(Outcome::Invalid(None));
        }
    }
    Ok(real_outcome(acc.divide(N::from_f64(values.len() as f64))))
}

/// Middle operand, or the mean of the two middle operands
pub(crate) fn median(values: &[&Value]) -> EvalResult<Outcome> {
    if values.is_empty() {
        return Ok(Outcome::Missing);
    }
    let precision = precision(values)?;

    let mut numbers = values
        .iter()
        .map(|value| value.to_f64())
        .collect::<Result<Vec<_>, _>>()?;
    if numbers.iter().any(|x| x.is_nan()) {
        return Ok(Outcome::Invalid(None));
    }
    numbers.sort_by(f64::total_cmp);

    let mid = numbers.len() / 2;
    let median = if numbers.len() % 2 == 1 {
        numbers[mid]
    } else {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    };
    Ok(Outcome::Value(match precision {
        Precision::Float => Value::float(median as f32),
        _ => Value::double(median),
    }))
}

/// Sample standard deviation; needs at least two operands
pub(crate) fn sample_stddev(values: &[&Value]) -> EvalResult<Outcome> {
    if values.len() < 2 {
        return Ok(Outcome::Missing);
    }
    let numbers = values
        .iter()
        .map(|value| value.to_f64())
        .collect::<Result<Vec<_>, _>>()?;

    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    let variance = numbers.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);

    let mut acc = NumericValue::<f64>::new(variance);
    Ok(real_outcome(acc.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::standard_registry;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn call(name: &str, args: Vec<Value>) -> Outcome {
        let args: Vec<Option<Value>> = args.into_iter().map(Some).collect();
        standard_registry().call(name, &args).unwrap()
    }

    #[rstest]
    #[case("+", Value::integer(2), Value::integer(3), Value::integer(5))]
    #[case("-", Value::integer(2), Value::integer(3), Value::integer(-1))]
    #[case("*", Value::integer(4), Value::integer(3), Value::integer(12))]
    #[case("/", Value::integer(7), Value::integer(2), Value::double(3.5))]
    #[case("+", Value::integer(1), Value::double(0.5), Value::double(1.5))]
    #[case("+", Value::float(1.5), Value::integer(1), Value::float(2.5))]
    #[case("*", Value::float(0.5), Value::double(3.0), Value::double(1.5))]
    #[case("modulo", Value::integer(-7), Value::integer(3), Value::integer(2))]
    #[case("modulo", Value::double(7.5), Value::double(-2.0), Value::double(-0.5))]
    #[case("pow", Value::integer(2), Value::integer(10), Value::integer(1024))]
    #[case("pow", Value::integer(2), Value::integer(-1), Value::double(0.5))]
    fn test_binary(#[case] name: &str, #[case] a: Value, #[case] b: Value, #[case] expected: Value) {
        assert_eq!(call(name, vec![a, b]), Outcome::Value(expected));
    }

    #[rstest]
    #[case("/", Value::integer(1), Value::integer(0))]
    #[case("/", Value::double(1.0), Value::double(0.0))]
    #[case("modulo", Value::integer(1), Value::integer(0))]
    #[case("+", Value::integer(i64::MAX), Value::integer(1))]
    #[case("pow", Value::double(-8.0), Value::double(1.0 / 3.0))]
    fn test_invalid_results(#[case] name: &str, #[case] a: Value, #[case] b: Value) {
        assert_eq!(call(name, vec![a, b]), Outcome::Invalid(None));
    }

    #[test]
    fn test_string_operand_is_a_type_error() {
        let err = standard_registry()
            .call("+", &[Some(Value::string("a")), Some(Value::integer(1))])
            .unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[rstest]
    #[case("floor", Value::double(-1.5), Value::integer(-2))]
    #[case("ceil", Value::double(-1.5), Value::integer(-1))]
    #[case("round", Value::double(2.5), Value::integer(3))]
    #[case("round", Value::double(-2.5), Value::integer(-2))]
    #[case("rint", Value::double(2.5), Value::integer(2))]
    #[case("abs", Value::integer(-3), Value::integer(3))]
    #[case("abs", Value::float(-0.5), Value::float(0.5))]
    #[case("sqrt", Value::integer(16), Value::double(4.0))]
    fn test_unary(#[case] name: &str, #[case] arg: Value, #[case] expected: Value) {
        assert_eq!(call(name, vec![arg]), Outcome::Value(expected));
    }

    #[test]
    fn test_ln_domain() {
        assert_eq!(call("ln", vec![Value::double(0.0)]), Outcome::Invalid(None));
        assert_eq!(call("round", vec![Value::double(f64::INFINITY)]), Outcome::Invalid(None));
    }

    #[test]
    fn test_float_exp_matches_single_precision() {
        let Outcome::Value(value) = call("exp", vec![Value::float(1.0)]) else {
            panic!("expected a value");
        };
        assert_eq!(value, Value::float(std::f32::consts::E));
    }

    #[test]
    fn test_reductions() {
        let values = vec![Value::integer(3), Value::integer(1), Value::integer(2)];
        assert_eq!(call("min", values.clone()), Outcome::Value(Value::integer(1)));
        assert_eq!(call("max", values.clone()), Outcome::Value(Value::integer(3)));
        assert_eq!(call("sum", values.clone()), Outcome::Value(Value::integer(6)));
        assert_eq!(call("product", values.clone()), Outcome::Value(Value::integer(6)));
        assert_eq!(call("avg", values.clone()), Outcome::Value(Value::double(2.0)));
        assert_eq!(call("median", values), Outcome::Value(Value::double(2.0)));
    }

    #[test]
    fn test_mixed_min_widens() {
        assert_eq!(
            call("min", vec![Value::integer(1), Value::double(2.5)]),
            Outcome::Value(Value::double(1.0))
        );
    }

    #[test]
    fn test_even_median() {
        assert_eq!(
            call(
                "median",
                vec![Value::integer(4), Value::integer(1), Value::integer(3), Value::integer(2)]
            ),
            Outcome::Value(Value::double(2.5))
        );
    }

    #[test]
    fn test_sample_stddev() {
        let values = [Value::double(2.0), Value::double(4.0), Value::double(4.0), Value::double(6.0)];
        let refs: Vec<&Value> = values.iter().collect();
        let Outcome::Value(value) = sample_stddev(&refs).unwrap() else {
            panic!("expected a value");
        };
        assert!((value.as_f64().unwrap() - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_stddev(&refs[..1]).unwrap(), Outcome::Missing);
    }
}
