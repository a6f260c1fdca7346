//! Exact numeric literals.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

/// Largest decimal exponent a literal may carry and still be kept exact
const MAX_DECIMAL_EXPONENT: i64 = 4096;

/// An exact rational constant together with its nearest `f64`.
///
/// Numeric literals are stored this way so that symbolic simplification
/// combines them without rounding: `0.1 + 0.2 - 0.3` is exactly zero and
/// `9007199254740993` keeps its last digit.
#[derive(Debug, Clone, PartialEq)]
pub struct Rational {
    exact: BigRational,
    value: f64,
}

impl Rational {
    pub fn new(exact: BigRational) -> Self {
        let value = exact.to_f64().unwrap_or(f64::NAN);
        Self { exact, value }
    }

    pub fn integer(n: i64) -> Self {
        Self::new(BigRational::from_integer(BigInt::from(n)))
    }

    /// `numer / denom`, or `None` for a zero denominator
    pub fn fraction(numer: i64, denom: i64) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        Some(Self::new(BigRational::new(
            BigInt::from(numer),
            BigInt::from(denom),
        )))
    }

    /// Parse an unsigned decimal literal (`12`, `0.25`, `.5`, `1e-3`) exactly.
    ///
    /// Returns `None` for malformed text or an exponent too large to expand.
    pub fn from_decimal(text: &str) -> Option<Self> {
        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(pos) => (&text[..pos], text[pos + 1..].parse::<i64>().ok()?),
            None => (text, 0),
        };
        let (whole, fraction) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        let digits = format!("{}{}", whole, fraction);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let scale = exponent.checked_sub(i64::try_from(fraction.len()).ok()?)?;
        if scale.abs() > MAX_DECIMAL_EXPONENT {
            return None;
        }
        let numer: BigInt = digits.parse().ok()?;
        let power = BigInt::from(10).pow(u32::try_from(scale.unsigned_abs()).ok()?);
        let exact = if scale >= 0 {
            BigRational::from_integer(numer * power)
        } else {
            BigRational::new(numer, power)
        };
        Some(Self::new(exact))
    }

    pub fn exact(&self) -> &BigRational {
        &self.exact
    }

    /// Nearest `f64`, used for evaluation
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_negative(&self) -> bool {
        self.exact.is_negative()
    }

    /// True when the value prints as a fraction rather than a decimal
    pub(crate) fn is_fraction(&self) -> bool {
        self.decimal().is_none()
    }

    /// Exact decimal text, when the denominator only has factors 2 and 5
    fn decimal(&self) -> Option<String> {
        if self.exact.is_integer() {
            return Some(self.exact.numer().to_string());
        }

        let mut rest = self.exact.denom().clone();
        let (two, five) = (BigInt::from(2), BigInt::from(5));
        let (mut twos, mut fives) = (0u32, 0u32);
        while (&rest % &two).is_zero() {
            rest /= &two;
            twos += 1;
        }
        while (&rest % &five).is_zero() {
            rest /= &five;
            fives += 1;
        }
        if !rest.is_one() {
            return None;
        }

        let places = twos.max(fives);
        let scaled = (self.exact.numer() * BigInt::from(10).pow(places)) / self.exact.denom();
        let mut digits = scaled.abs().to_string();
        let places = places as usize;
        if digits.len() <= places {
            digits = format!("{}{}", "0".repeat(places + 1 - digits.len()), digits);
        }
        let point = digits.len() - places;
        let sign = if scaled.is_negative() { "-" } else { "" };
        Some(format!("{}{}.{}", sign, &digits[..point], &digits[point..]))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decimal() {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}/{}", self.exact.numer(), self.exact.denom()),
        }
    }
}
