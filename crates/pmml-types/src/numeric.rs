//! Numeric accumulator
//!
//! [`NumericValue`] is a mutable number used by model scorers to build up a
//! result step by step (dot products, link functions, activation functions,
//! normalization). Every operation mutates in place and returns the
//! accumulator for chaining, or a [`NumericError`] for the edge cases that would
//! otherwise silently produce NaN: division by zero, a negative base raised to
//! a fractional power, and NaN operands.
//!
//! The accumulator is generic over [`Real`], implemented for `f64` and `f32`.
//! Single precision results must match an independent single precision
//! computation, so `f32` exponentiation goes through `f64::powf` with the
//! single precision value of Euler's number as its base.

use crate::{Data, NumericError, NumericResult, Value};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Floating-point representation of an accumulator
pub trait Real:
    Copy
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    const ZERO: Self;
    const ONE: Self;
    const HALF: Self;
    const TWO: Self;
    /// Euler's number at this precision
    const E: Self;
    const PI: Self;
    const LN_2: Self;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    fn into_data(self) -> Data;

    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn powf(self, exponent: Self) -> Self;
    fn powi(self, exponent: i32) -> Self;
    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
    fn fract(self) -> Self;
    fn round_ties_even(self) -> Self;
    fn tanh(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn atan(self) -> Self;
    fn erf(self) -> Self;
    fn exp_m1(self) -> Self;
    fn ln_1p(self) -> Self;
    fn log10(self) -> Self;
    fn is_nan(self) -> bool;
}

impl Real for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const HALF: Self = 0.5;
    const TWO: Self = 2.0;
    const E: Self = std::f64::consts::E;
    const PI: Self = std::f64::consts::PI;
    const LN_2: Self = std::f64::consts::LN_2;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn into_data(self) -> Data {
        Data::Double(self)
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    fn powi(self, exponent: i32) -> Self {
        f64::powi(self, exponent)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn floor(self) -> Self {
        f64::floor(self)
    }

    fn ceil(self) -> Self {
        f64::ceil(self)
    }

    fn fract(self) -> Self {
        f64::fract(self)
    }

    fn round_ties_even(self) -> Self {
        f64::round_ties_even(self)
    }

    fn tanh(self) -> Self {
        f64::tanh(self)
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }

    fn atan(self) -> Self {
        f64::atan(self)
    }

    fn erf(self) -> Self {
        libm::erf(self)
    }

    fn exp_m1(self) -> Self {
        f64::exp_m1(self)
    }

    fn ln_1p(self) -> Self {
        f64::ln_1p(self)
    }

    fn log10(self) -> Self {
        f64::log10(self)
    }

    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
}

impl Real for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const HALF: Self = 0.5;
    const TWO: Self = 2.0;
    const E: Self = std::f32::consts::E;
    const PI: Self = std::f32::consts::PI;
    const LN_2: Self = std::f32::consts::LN_2;

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn into_data(self) -> Data {
        Data::Float(self)
    }

    fn exp(self) -> Self {
        f64::from(Self::E).powf(f64::from(self)) as f32
    }

    fn ln(self) -> Self {
        f32::ln(self)
    }

    fn powf(self, exponent: Self) -> Self {
        f64::from(self).powf(f64::from(exponent)) as f32
    }

    fn powi(self, exponent: i32) -> Self {
        f64::from(self).powi(exponent) as f32
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }

    fn floor(self) -> Self {
        f32::floor(self)
    }

    fn ceil(self) -> Self {
        f32::ceil(self)
    }

    fn fract(self) -> Self {
        f32::fract(self)
    }

    fn round_ties_even(self) -> Self {
        f32::round_ties_even(self)
    }

    fn tanh(self) -> Self {
        f32::tanh(self)
    }

    fn sin(self) -> Self {
        f32::sin(self)
    }

    fn cos(self) -> Self {
        f32::cos(self)
    }

    fn atan(self) -> Self {
        f32::atan(self)
    }

    fn erf(self) -> Self {
        libm::erff(self)
    }

    fn exp_m1(self) -> Self {
        libm::expm1f(self)
    }

    fn ln_1p(self) -> Self {
        libm::log1pf(self)
    }

    fn log10(self) -> Self {
        libm::log10f(self)
    }

    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

/// Mutable numeric accumulator
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct NumericValue<N: Real> {
    value: N,
}

pub type DoubleValue = NumericValue<f64>;
pub type FloatValue = NumericValue<f32>;

impl<N: Real> NumericValue<N> {
    pub fn new(value: N) -> Self {
        Self { value }
    }

    pub fn from_f64(value: f64) -> Self {
        Self::new(N::from_f64(value))
    }

    pub fn value(&self) -> N {
        self.value
    }

    pub fn to_f64(&self) -> f64 {
        self.value.to_f64()
    }

    /// Continuous value holding the current number
    pub fn to_value(&self) -> Value {
        Value::Continuous(self.value.into_data())
    }

    fn set(&mut self, value: N, operation: &'static str) -> NumericResult<&mut Self> {
        if value.is_nan() {
            return Err(NumericError::NotANumber { operation });
        }
        self.value = value;
        Ok(self)
    }

    /// Apply an arbitrary unary function, rejecting a NaN result
    pub fn apply(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(N) -> N,
    ) -> NumericResult<&mut Self> {
        let value = f(self.value);
        self.set(value, operation)
    }

    pub fn add(&mut self, value: N) -> NumericResult<&mut Self> {
        self.set(self.value + value, "add")
    }

    /// value += coefficient * factor
    pub fn add_product(&mut self, coefficient: N, factor: N) -> NumericResult<&mut Self> {
        self.set(self.value + coefficient * factor, "add_product")
    }

    /// value += coefficient * factor^exponent
    pub fn add_power_product(
        &mut self,
        coefficient: N,
        factor: N,
        exponent: i32,
    ) -> NumericResult<&mut Self> {
        if factor == N::ZERO && exponent < 0 {
            return Err(NumericError::DivisionByZero {
                operation: "add_power_product",
            });
        }
        self.set(
            self.value + coefficient * factor.powi(exponent),
            "add_power_product",
        )
    }

    pub fn subtract(&mut self, value: N) -> NumericResult<&mut Self> {
        self.set(self.value - value, "subtract")
    }

    pub fn multiply(&mut self, value: N) -> NumericResult<&mut Self> {
        self.set(self.value * value, "multiply")
    }

    pub fn divide(&mut self, value: N) -> NumericResult<&mut Self> {
        if value == N::ZERO {
            return Err(NumericError::DivisionByZero {
                operation: "divide",
            });
        }
        self.set(self.value / value, "divide")
    }

    /// value = expected - value
    pub fn residual(&mut self, expected: N) -> NumericResult<&mut Self> {
        self.set(expected - self.value, "residual")
    }

    pub fn square(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value * self.value, "square")
    }

    pub fn power(&mut self, exponent: N) -> NumericResult<&mut Self> {
        if self.value < N::ZERO && exponent.fract() != N::ZERO {
            return Err(NumericError::Domain { operation: "power" });
        }
        if self.value == N::ZERO && exponent < N::ZERO {
            return Err(NumericError::DivisionByZero { operation: "power" });
        }
        self.set(self.value.powf(exponent), "power")
    }

    pub fn reciprocal(&mut self) -> NumericResult<&mut Self> {
        if self.value == N::ZERO {
            return Err(NumericError::DivisionByZero {
                operation: "reciprocal",
            });
        }
        self.set(N::ONE / self.value, "reciprocal")
    }

    /// Clamp into [low, high]
    pub fn restrict(&mut self, low: N, high: N) -> NumericResult<&mut Self> {
        if low > high {
            return Err(NumericError::Domain {
                operation: "restrict",
            });
        }
        let value = if self.value < low {
            low
        } else if self.value > high {
            high
        } else {
            self.value
        };
        self.set(value, "restrict")
    }

    /// 1 if value > threshold, else 0
    pub fn threshold(&mut self, threshold: N) -> NumericResult<&mut Self> {
        let value = if self.value > threshold { N::ONE } else { N::ZERO };
        self.set(value, "threshold")
    }

    pub fn relu(&mut self) -> NumericResult<&mut Self> {
        let value = if self.value > N::ZERO { self.value } else { N::ZERO };
        self.set(value, "relu")
    }

    pub fn abs(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.abs(), "abs")
    }

    pub fn floor(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.floor(), "floor")
    }

    pub fn ceiling(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.ceil(), "ceiling")
    }

    /// Round half up: 2.5 becomes 3, -2.5 becomes -2
    pub fn round(&mut self) -> NumericResult<&mut Self> {
        self.set((self.value + N::HALF).floor(), "round")
    }

    /// Round half to even: 2.5 becomes 2, 3.5 becomes 4
    pub fn rint(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.round_ties_even(), "rint")
    }

    pub fn exp(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.exp(), "exp")
    }

    pub fn ln(&mut self) -> NumericResult<&mut Self> {
        if self.value <= N::ZERO {
            return Err(NumericError::Domain { operation: "ln" });
        }
        self.set(self.value.ln(), "ln")
    }

    pub fn sqrt(&mut self) -> NumericResult<&mut Self> {
        if self.value < N::ZERO {
            return Err(NumericError::Domain { operation: "sqrt" });
        }
        self.set(self.value.sqrt(), "sqrt")
    }

    pub fn sin(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.sin(), "sin")
    }

    pub fn cos(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.cos(), "cos")
    }

    pub fn atan(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.atan(), "atan")
    }

    pub fn tanh(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value.tanh(), "tanh")
    }

    /// 1 / (1 + e^-x)
    pub fn logistic(&mut self) -> NumericResult<&mut Self> {
        self.set(N::ONE / (N::ONE + (-self.value).exp()), "logistic")
    }

    /// Standard normal CDF
    pub fn probit(&mut self) -> NumericResult<&mut Self> {
        let sqrt_2 = N::TWO.sqrt();
        self.set(N::HALF * (N::ONE + (self.value / sqrt_2).erf()), "probit")
    }

    /// 1 - e^(-e^x)
    pub fn inverse_cloglog(&mut self) -> NumericResult<&mut Self> {
        self.set(N::ONE - (-self.value.exp()).exp(), "inverse_cloglog")
    }

    /// e^(-e^-x)
    pub fn inverse_loglog(&mut self) -> NumericResult<&mut Self> {
        self.set((-(-self.value).exp()).exp(), "inverse_loglog")
    }

    /// 1 - e^x
    pub fn inverse_logc(&mut self) -> NumericResult<&mut Self> {
        self.set(N::ONE - self.value.exp(), "inverse_logc")
    }

    /// 0.5 + atan(x) / pi
    pub fn inverse_cauchit(&mut self) -> NumericResult<&mut Self> {
        self.set(N::HALF + self.value.atan() / N::PI, "inverse_cauchit")
    }

    /// 1 / (k * (e^-x - 1))
    pub fn inverse_negbin(&mut self, k: N) -> NumericResult<&mut Self> {
        let denominator = k * ((-self.value).exp() - N::ONE);
        if denominator == N::ZERO {
            return Err(NumericError::DivisionByZero {
                operation: "inverse_negbin",
            });
        }
        self.set(N::ONE / denominator, "inverse_negbin")
    }

    /// 1 / (1 + (1 + k*x)^(-1/k)), or logistic when k is 0
    pub fn inverse_oddspower(&mut self, k: N) -> NumericResult<&mut Self> {
        if k == N::ZERO {
            return self.logistic();
        }
        let base = N::ONE + k * self.value;
        let exponent = -(N::ONE / k);
        if base < N::ZERO && exponent.fract() != N::ZERO {
            return Err(NumericError::Domain {
                operation: "inverse_oddspower",
            });
        }
        self.set(N::ONE / (N::ONE + base.powf(exponent)), "inverse_oddspower")
    }

    /// x^(1/k), or e^x when k is 0
    pub fn inverse_power(&mut self, k: N) -> NumericResult<&mut Self> {
        if k == N::ZERO {
            return self.exp();
        }
        self.power(N::ONE / k)
    }

    /// x / (1 + |x|)
    pub fn elliott(&mut self) -> NumericResult<&mut Self> {
        self.set(self.value / (N::ONE + self.value.abs()), "elliott")
    }

    /// e^(-x^2)
    pub fn gauss(&mut self) -> NumericResult<&mut Self> {
        self.set((-(self.value * self.value)).exp(), "gauss")
    }

    /// e^(-ln(2) * x^2 / s^2)
    pub fn gaussian_similarity(&mut self, s: N) -> NumericResult<&mut Self> {
        if s == N::ZERO {
            return Err(NumericError::DivisionByZero {
                operation: "gaussian_similarity",
            });
        }
        let z = self.value * self.value / (s * s);
        self.set((-(N::LN_2 * z)).exp(), "gaussian_similarity")
    }

    /// Map from the original to the normalized scale of the segment
    /// `(left_orig, left_norm)`..`(right_orig, right_norm)`
    pub fn normalize(
        &mut self,
        left_orig: N,
        left_norm: N,
        right_orig: N,
        right_norm: N,
    ) -> NumericResult<&mut Self> {
        if right_orig == left_orig {
            return Err(NumericError::DivisionByZero {
                operation: "normalize",
            });
        }
        let value = left_norm
            + (self.value - left_orig) * (right_norm - left_norm) / (right_orig - left_orig);
        self.set(value, "normalize")
    }

    /// Inverse of [`normalize`](Self::normalize)
    pub fn denormalize(
        &mut self,
        left_orig: N,
        left_norm: N,
        right_orig: N,
        right_norm: N,
    ) -> NumericResult<&mut Self> {
        if right_norm == left_norm {
            return Err(NumericError::DivisionByZero {
                operation: "denormalize",
            });
        }
        let value = left_orig
            + (self.value - left_norm) * (right_orig - left_orig) / (right_norm - left_norm);
        self.set(value, "denormalize")
    }
}

impl<N: Real> fmt::Display for NumericValue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
