//! Error function and normal distribution functions
//!
//! Implements: erf, normalCDF, normalPDF, normalIDF, stdNormalCDF,
//! stdNormalPDF, stdNormalIDF.
//!
//! A non-positive standard deviation or a probability outside of (0, 1)
//! makes the result invalid.

use super::arithmetic::{precision, Precision};
use super::{arg, Arity, FunctionRegistry, MissingArgs, Outcome};
use crate::error::EvalResult;
use pmml_types::{NumericValue, Real, Value};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Density {
    Cdf,
    Pdf,
    Idf,
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register("erf", Arity::Exact(1), MissingArgs::Propagate, |args| {
        let value = arg(args, 0)?;
        match precision(&[value])? {
            Precision::Float => erf::<f32>(value),
            _ => erf::<f64>(value),
        }
    });

    for (name, density) in [
        ("normalCDF", Density::Cdf),
        ("normalPDF", Density::Pdf),
        ("normalIDF", Density::Idf),
    ] {
        registry.register(name, Arity::Exact(3), MissingArgs::Propagate, move |args| {
            let x = arg(args, 0)?.to_f64()?;
            let mu = arg(args, 1)?.to_f64()?;
            let sigma = arg(args, 2)?.to_f64()?;
            Ok(normal(density, x, mu, sigma))
        });
    }

    for (name, density) in [
        ("stdNormalCDF", Density::Cdf),
        ("stdNormalPDF", Density::Pdf),
        ("stdNormalIDF", Density::Idf),
    ] {
        registry.register(name, Arity::Exact(1), MissingArgs::Propagate, move |args| {
            Ok(normal(density, arg(args, 0)?.to_f64()?, 0.0, 1.0))
        });
    }
}

fn erf<N: Real>(value: &Value) -> EvalResult<Outcome> {
    let mut acc = NumericValue::<N>::new(N::from_f64(value.to_f64()?));
    Ok(match acc.apply("erf", N::erf) {
        Ok(acc) => Outcome::Value(acc.to_value()),
        Err(_) => Outcome::Invalid(None),
    })
}

fn normal(density: Density, x: f64, mu: f64, sigma: f64) -> Outcome {
    let distribution = match Normal::new(mu, sigma) {
        Ok(distribution) => distribution,
        Err(error) => {
            log::trace!("invalid normal distribution: {}", error);
            return Outcome::Invalid(None);
        }
    };

    let result = match density {
        Density::Cdf => distribution.cdf(x),
        Density::Pdf => distribution.pdf(x),
        // inverse_cdf panics outside of [0, 1] and is infinite at its ends
        Density::Idf if x > 0.0 && x < 1.0 => distribution.inverse_cdf(x),
        Density::Idf => return Outcome::Invalid(None),
    };

    if result.is_nan() {
        Outcome::Invalid(None)
    } else {
        Outcome::Value(Value::double(result))
    }
}
