//! Numeric model: arbitrary-precision decimals.
//!
//! Every amount in a scenario is an exact decimal magnitude, held as an
//! unscaled `BigInt` and a decimal scale (`unscaled × 10^-scale`). No
//! `f64` anywhere in the path from token to ledger, and no literal is ever
//! rounded. The written form of a literal (`1.5e18`, `25%`) is remembered
//! as a [`Notation`] so that rendering gives back what the author typed,
//! but equality and ordering only ever look at the magnitude.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::NumericError;

/// Exponent assumed by the scaled form when it is written as `2e`.
pub const DEFAULT_EXPONENT: i32 = 18;

/// Largest exponent accepted in a scaled literal, either sign.
pub const MAX_EXPONENT: i32 = 4096;

/// Largest scale a magnitude may reach, and its digit count in `parse`.
const MAX_DIGITS: u32 = 8192;

/// Bit length of the unscaled value; about `MAX_DIGITS` decimal digits.
const MAX_BITS: u64 = 27_300;

/// Fractional digits kept by division beyond the operands' own scale.
/// The quotient is truncated toward zero past that point.
pub const DIV_EXTRA_DIGITS: u32 = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Plain,
    /// `m e k`: magnitude is `m × 10^k`.
    Scaled { exponent: i32 },
    /// `p%`: magnitude is `p / 100`.
    Percent,
}

/// Exact decimal `unscaled × 10^-scale`, kept normalized: no trailing
/// zero digits in `unscaled` while `scale > 0`, and zero has scale 0.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Magnitude {
    unscaled: BigInt,
    scale: u32,
}

impl Magnitude {
    fn zero() -> Self {
        Magnitude {
            unscaled: BigInt::zero(),
            scale: 0,
        }
    }

    fn new(unscaled: BigInt, scale: u32) -> Self {
        let mut m = Magnitude { unscaled, scale };
        let ten = BigInt::from(10u8);
        while m.scale > 0 && (&m.unscaled % &ten).is_zero() {
            m.unscaled /= &ten;
            m.scale -= 1;
        }
        if m.unscaled.is_zero() {
            m.scale = 0;
        }
        m
    }

    fn is_zero(&self) -> bool {
        self.unscaled.is_zero()
    }

    /// `unscaled` rewritten at a larger `scale`.
    fn rescaled(&self, scale: u32) -> BigInt {
        &self.unscaled * pow10(scale - self.scale)
    }

    /// `self × 10^k`. Always exact.
    fn shift(&self, k: i64) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        let scale = i64::from(self.scale) - k;
        if scale >= 0 {
            // `k` is bounded by MAX_EXPONENT and the scale by MAX_DIGITS.
            Magnitude::new(self.unscaled.clone(), scale as u32)
        } else {
            Magnitude::new(&self.unscaled * pow10(scale.unsigned_abs() as u32), 0)
        }
    }

    fn within_limits(&self) -> bool {
        self.scale <= MAX_DIGITS && self.unscaled.bits() <= MAX_BITS
    }
}

impl Ord for Magnitude {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        self.rescaled(scale).cmp(&other.rescaled(scale))
    }
}

impl PartialOrd for Magnitude {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.abs().to_string();
        let sign = if self.unscaled.is_negative() { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int, frac)
    }
}

fn pow10(k: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u8), k as usize)
}

#[derive(Debug, Clone)]
pub struct Number {
    magnitude: Magnitude,
    notation: Notation,
}

impl Number {
    fn plain(magnitude: Magnitude) -> Self {
        Number {
            magnitude,
            notation: Notation::Plain,
        }
    }

    fn checked(
        magnitude: Magnitude,
        notation: Notation,
        what: impl FnOnce() -> String,
    ) -> Result<Number, NumericError> {
        if !magnitude.within_limits() {
            return Err(NumericError::Overflow { message: what() });
        }
        Ok(Number {
            magnitude,
            notation,
        })
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.magnitude.unscaled.is_negative()
    }

    /// Integer value, when the magnitude has no fractional part.
    pub fn to_integer(&self) -> Option<BigInt> {
        (self.magnitude.scale == 0).then(|| self.magnitude.unscaled.clone())
    }

    /// Parse a numeric literal.
    ///
    /// Accepted forms:
    /// - plain integers and decimals of any length: `12`, `-4.50`
    /// - scaled: `1.5e18`, `2e-3`, and `3e` meaning `3e18`
    /// - percent: `25%`, `0.5%`
    pub fn parse(token: &str) -> Result<Number, NumericError> {
        let invalid = || NumericError::Invalid {
            token: token.to_string(),
        };
        let overflow = || format!("`{}` is outside the supported range", token);

        if let Some(body) = token.strip_suffix('%') {
            let p = parse_decimal(body).ok_or_else(invalid)?;
            return Number::checked(p.shift(-2), Notation::Percent, overflow);
        }

        if let Some(idx) = token.find(['e', 'E']) {
            let (mantissa, rest) = token.split_at(idx);
            let exponent_text = &rest[1..];
            let m = parse_decimal(mantissa).ok_or_else(invalid)?;
            let exponent = if exponent_text.is_empty() {
                DEFAULT_EXPONENT
            } else {
                exponent_text.parse::<i32>().map_err(|_| invalid())?
            };
            if exponent.unsigned_abs() > MAX_EXPONENT.unsigned_abs() {
                return Err(NumericError::Overflow { message: overflow() });
            }
            return Number::checked(
                m.shift(i64::from(exponent)),
                Notation::Scaled { exponent },
                overflow,
            );
        }

        let magnitude = parse_decimal(token).ok_or_else(invalid)?;
        Number::checked(magnitude, Notation::Plain, overflow)
    }

    /// `n × 10^18`, remembered in scaled notation.
    pub fn exp(n: Number) -> Result<Number, NumericError> {
        Number::checked(
            n.magnitude.shift(i64::from(DEFAULT_EXPONENT)),
            Notation::Scaled {
                exponent: DEFAULT_EXPONENT,
            },
            || format!("{} × 10^{}", n, DEFAULT_EXPONENT),
        )
    }

    /// Canonical text. Re-parsing it gives an equal number in the same
    /// notation.
    pub fn render(&self) -> String {
        match self.notation {
            Notation::Plain => self.magnitude.to_string(),
            Notation::Scaled { exponent } => format!(
                "{}e{}",
                self.magnitude.shift(-i64::from(exponent)),
                exponent
            ),
            Notation::Percent => format!("{}%", self.magnitude.shift(2)),
        }
    }

    /// The magnitude as a plain decimal string, e.g. `1500000000000000000`.
    pub fn to_plain_string(&self) -> String {
        self.magnitude.to_string()
    }

    /// Wire form: the plain magnitude as a JSON string, so that no
    /// precision is lost in a JSON number.
    pub fn to_ledger(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_plain_string())
    }

    // ──────────────────────────────────────────────
    // Checked arithmetic
    // ──────────────────────────────────────────────

    /// Both operands' unscaled values at their common scale.
    fn aligned(&self, other: &Number) -> (BigInt, BigInt, u32) {
        let scale = self.magnitude.scale.max(other.magnitude.scale);
        (
            self.magnitude.rescaled(scale),
            other.magnitude.rescaled(scale),
            scale,
        )
    }

    pub fn checked_add(&self, other: &Number) -> Result<Number, NumericError> {
        let (a, b, scale) = self.aligned(other);
        Number::checked(Magnitude::new(a + b, scale), Notation::Plain, || {
            format!("{} + {}", self, other)
        })
    }

    pub fn checked_sub(&self, other: &Number) -> Result<Number, NumericError> {
        let (a, b, scale) = self.aligned(other);
        Number::checked(Magnitude::new(a - b, scale), Notation::Plain, || {
            format!("{} - {}", self, other)
        })
    }

    pub fn checked_mul(&self, other: &Number) -> Result<Number, NumericError> {
        let unscaled = &self.magnitude.unscaled * &other.magnitude.unscaled;
        let scale = self.magnitude.scale + other.magnitude.scale;
        Number::checked(Magnitude::new(unscaled, scale), Notation::Plain, || {
            format!("{} * {}", self, other)
        })
    }

    /// Exact when the quotient terminates within [`DIV_EXTRA_DIGITS`]
    /// fractional digits beyond the operands' scale; truncated toward zero
    /// otherwise.
    pub fn checked_div(&self, other: &Number) -> Result<Number, NumericError> {
        if other.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        let (a, b) = (&self.magnitude, &other.magnitude);
        let scale = a.scale.max(b.scale) + DIV_EXTRA_DIGITS;
        // a/b = (ua / 10^sa) / (ub / 10^sb); scale the numerator so the
        // integer quotient carries `scale` fractional digits.
        let numerator = &a.unscaled * pow10(scale + b.scale - a.scale);
        let quotient = numerator / &b.unscaled;
        Number::checked(Magnitude::new(quotient, scale), Notation::Plain, || {
            format!("{} / {}", self, other)
        })
    }
}

/// `[-]digits[.digits]` with at least one digit, as an exact magnitude.
fn parse_decimal(s: &str) -> Option<Magnitude> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int, frac) = match body.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (body, ""),
    };
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if (int.is_empty() && frac.is_empty()) || !all_digits(int) || !all_digits(frac) {
        return None;
    }
    if frac.len() > MAX_DIGITS as usize || int.len() > MAX_DIGITS as usize {
        return None;
    }
    let digits = format!("{}{}", int, frac);
    let mut unscaled = BigInt::from_str(&digits).ok()?;
    if negative {
        unscaled = -unscaled;
    }
    Some(Magnitude::new(unscaled, frac.len() as u32))
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.magnitude == other.magnitude
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.magnitude.cmp(&other.magnitude)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::plain(Magnitude::new(BigInt::from(n), 0))
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::from(i64::from(n))
    }
}

impl From<BigInt> for Number {
    fn from(n: BigInt) -> Self {
        Number::plain(Magnitude::new(n, 0))
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::plain(Magnitude::zero())
    }
}

impl FromStr for Number {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Number::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Number {
        Number::parse(s).unwrap()
    }

    const UINT256_MAX: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639935";

    #[test]
    fn plain_integers_and_decimals() {
        assert_eq!(n("42").to_plain_string(), "42");
        assert_eq!(n("-4.50").to_plain_string(), "-4.5");
        assert_eq!(n("-4.50").render(), "-4.5");
        assert_eq!(n("0.007").render(), "0.007");
        assert_eq!(n("0").notation(), Notation::Plain);
        assert_eq!(n("-0.0"), Number::default());
    }

    #[test]
    fn scaled_literal_keeps_exact_magnitude() {
        let x = n("1.5e18");
        assert_eq!(x.to_plain_string(), "1500000000000000000");
        assert_eq!(x.notation(), Notation::Scaled { exponent: 18 });
        assert_eq!(x.render(), "1.5e18");
    }

    #[test]
    fn scaled_literal_with_omitted_exponent_means_18() {
        let x = n("3e");
        assert_eq!(x.to_plain_string(), "3000000000000000000");
        assert_eq!(x.render(), "3e18");
    }

    #[test]
    fn negative_exponent() {
        let x = n("2e-3");
        assert_eq!(x.to_plain_string(), "0.002");
        assert_eq!(x.render(), "2e-3");
        assert_eq!(n("1e-40").to_plain_string(), format!("0.{}1", "0".repeat(39)));
    }

    #[test]
    fn percent_literal() {
        let x = n("25%");
        assert_eq!(x.to_plain_string(), "0.25");
        assert_eq!(x.render(), "25%");
        assert_eq!(x, n("0.25"));
    }

    #[test]
    fn equality_ignores_notation() {
        assert_eq!(n("1000000000000000000"), n("1e18"));
        assert!(n("1e18") > n("999"));
        assert!(n("-1.5") < n("-1.25"));
    }

    #[test]
    fn magnitudes_beyond_28_digits() {
        let x = n("1e36");
        assert_eq!(x.to_plain_string(), format!("1{}", "0".repeat(36)));
        assert_eq!(x.render(), "1e36");
        assert_eq!(n("6e36"), n(&format!("6{}", "0".repeat(36))));

        let max = n(UINT256_MAX);
        assert_eq!(max.to_plain_string(), UINT256_MAX);
        assert_eq!(max.to_ledger(), serde_json::json!(UINT256_MAX));
        assert!(max > n("1e77"));
        let one_more = max.checked_add(&Number::from(1)).unwrap();
        assert_eq!(
            one_more,
            Number::from(num_traits::pow(BigInt::from(2u8), 256))
        );
    }

    #[test]
    fn long_fractions_are_not_rounded() {
        let x = n("1.00000000000000000000000000001");
        assert_ne!(x, Number::from(1));
        assert!(x > Number::from(1));
        assert_eq!(x.render(), "1.00000000000000000000000000001");
    }

    #[test]
    fn rejects_non_numbers() {
        for bad in ["", "abc", "0x12", "e5", "1.2.3", "%", "1_000", "1ex", "-", "."] {
            assert!(
                matches!(Number::parse(bad), Err(NumericError::Invalid { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn exponent_out_of_range_is_overflow() {
        for bad in ["1e5000", "1e-5000", "0e-2147483648", "1e2147483647"] {
            assert!(
                matches!(Number::parse(bad), Err(NumericError::Overflow { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn zero_with_large_exponent_is_zero() {
        let z = n("0e1000");
        assert!(z.is_zero());
        assert_eq!(z.render(), "0e1000");
        assert_eq!(n("0e-4096").render(), "0e-4096");
    }

    #[test]
    fn ledger_encoding_is_plain_string() {
        assert_eq!(n("1.50e2").to_ledger(), serde_json::json!("150"));
        assert_eq!(n("-2.5%").to_ledger(), serde_json::json!("-0.025"));
    }

    #[test]
    fn checked_arithmetic() {
        let a = Number::from(7);
        let b = Number::from(2);
        assert_eq!(a.checked_add(&b).unwrap(), Number::from(9));
        assert_eq!(a.checked_sub(&b).unwrap(), Number::from(5));
        assert_eq!(a.checked_mul(&b).unwrap(), Number::from(14));
        assert_eq!(a.checked_div(&b).unwrap().to_plain_string(), "3.5");
        assert_eq!(
            n("0.1").checked_add(&n("0.2")).unwrap().to_plain_string(),
            "0.3"
        );
        assert_eq!(
            a.checked_div(&Number::from(0)),
            Err(NumericError::DivisionByZero)
        );
    }

    #[test]
    fn division_truncates_past_extra_digits() {
        let third = Number::from(1).checked_div(&Number::from(3)).unwrap();
        assert_eq!(
            third.to_plain_string(),
            format!("0.{}", "3".repeat(DIV_EXTRA_DIGITS as usize))
        );
        let neg = Number::from(-2).checked_div(&Number::from(3)).unwrap();
        assert!(neg.to_plain_string().ends_with('6'));
        assert_eq!(n("1e36").checked_div(&n("1e18")).unwrap(), n("1e18"));
    }

    #[test]
    fn magnitude_size_is_bounded() {
        let huge = n("1e4096");
        assert!(matches!(
            huge.checked_mul(&huge).and_then(|h| h.checked_mul(&h)),
            Err(NumericError::Overflow { .. })
        ));
    }

    #[test]
    fn exp_renders_scaled() {
        let x = Number::exp(n("1.5")).unwrap();
        assert_eq!(x, n("1500000000000000000"));
        assert_eq!(x.render(), "1.5e18");
        assert_eq!(Number::exp(n("1e18")).unwrap(), n("1e36"));
    }

    #[test]
    fn integers_convert_back() {
        assert_eq!(n("1.5e3").to_integer(), Some(BigInt::from(1500)));
        assert_eq!(n("1.5").to_integer(), None);
    }
}
