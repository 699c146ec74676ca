use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,
    #[error("invalid quantity {0:?}")]
    Invalid(String),
}

/// A Kubernetes resource quantity such as `500m`, `256Mi` or `1.5e3`.
///
/// The value is held exactly as `mantissa * 10^exp10 * 2^pow2`, so scaling to
/// millicores or bytes never goes through floating point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    text: String,
    negative: bool,
    mantissa: u128,
    exp10: i32,
    pow2: u32,
}

// u128 holds any 38-digit decimal
const MAX_SIGNIFICANT_DIGITS: usize = 38;

impl Quantity {
    /// The quantity in thousandths of its base unit, rounded up when not exact.
    /// For CPU this is millicores.
    pub fn milli_value(&self) -> i64 {
        self.scaled_value(-3)
    }

    /// The quantity in its base unit, rounded up when not exact.
    /// For memory this is bytes.
    pub fn value(&self) -> i64 {
        self.scaled_value(0)
    }

    pub fn is_negative(&self) -> bool {
        self.negative && self.mantissa != 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Value in units of `10^scale`, rounded away from zero and saturated to
    /// the i64 range.
    fn scaled_value(&self, scale: i32) -> i64 {
        let magnitude = self
            .scaled_magnitude(scale)
            .and_then(|m| i64::try_from(m).ok())
            .unwrap_or(i64::MAX);
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// `None` on overflow.
    fn scaled_magnitude(&self, scale: i32) -> Option<u128> {
        if self.mantissa == 0 {
            return Some(0);
        }
        let num = self.mantissa.checked_mul(1u128 << self.pow2)?;
        let exp = i64::from(self.exp10) - i64::from(scale);
        if exp >= 0 {
            let factor = 10u128.checked_pow(u32::try_from(exp).ok()?)?;
            num.checked_mul(factor)
        } else {
            let shift = u32::try_from(-exp).unwrap_or(u32::MAX);
            match 10u128.checked_pow(shift) {
                Some(divisor) => Some(num.div_ceil(divisor)),
                // Divisor exceeds any mantissa; the non-zero remainder rounds up.
                None => Some(1),
            }
        }
    }
}

fn suffix_scale(suffix: &str) -> Option<(i32, u32)> {
    let scale = match suffix {
        "" => (0, 0),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        "Ki" => (0, 10),
        "Mi" => (0, 20),
        "Gi" => (0, 30),
        "Ti" => (0, 40),
        "Pi" => (0, 50),
        "Ei" => (0, 60),
        s if s.starts_with(['e', 'E']) => (s[1..].parse::<i32>().ok()?, 0),
        _ => return None,
    };
    Some(scale)
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let q = s.trim();
        if q.is_empty() {
            return Err(QuantityError::Empty);
        }
        let invalid = || QuantityError::Invalid(q.to_string());

        let (negative, rest) = if let Some(stripped) = q.strip_prefix('-') {
            (true, stripped)
        } else {
            (false, q.strip_prefix('+').unwrap_or(q))
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(invalid());
        }

        let (suffix_exp10, pow2) = suffix_scale(suffix).ok_or_else(invalid)?;

        let digits = format!("{}{}", int_part, frac_part);
        let significant = digits.trim_start_matches('0');
        // Digits past u128 precision are dropped, rounding the kept ones up.
        let (kept, dropped) = significant.split_at(significant.len().min(MAX_SIGNIFICANT_DIGITS));
        let mut mantissa = if kept.is_empty() {
            0
        } else {
            kept.parse::<u128>().map_err(|_| invalid())?
        };
        if dropped.bytes().any(|b| b != b'0') {
            mantissa += 1;
        }
        let frac_len = i32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let dropped_len = i32::try_from(dropped.len()).map_err(|_| invalid())?;
        let exp10 = suffix_exp10
            .checked_sub(frac_len)
            .and_then(|e| e.checked_add(dropped_len))
            .ok_or_else(invalid)?;

        Ok(Quantity {
            text: q.to_string(),
            negative,
            mantissa,
            exp10,
            pow2,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

struct QuantityVisitor;

impl<'de> serde::de::Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quantity string or number")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Quantity, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Quantity, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Quantity, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Quantity, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("invalid quantity {}", v)));
        }
        self.visit_str(&v.to_string())
    }
}

/// Accepts both `"500m"` and bare JSON numbers such as `2` or `0.5`.
impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("negative duration {0:?}")]
    Negative(String),
    #[error("invalid duration {0:?}")]
    Invalid(String),
}

// Fraction digits beyond nanosecond precision of an hour are dropped.
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// Parses a sampling window as reported by the metrics API, e.g. `30s`,
/// `1m0.5s` or `10.04s`. A bare `0` is an instantaneous sample.
pub fn parse_window(s: &str) -> Result<Duration, DurationError> {
    let d = s.trim();
    if d.is_empty() {
        return Err(DurationError::Empty);
    }
    if d.starts_with('-') {
        return Err(DurationError::Negative(d.to_string()));
    }
    let invalid = || DurationError::Invalid(d.to_string());

    let mut rest = d.strip_prefix('+').unwrap_or(d);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(invalid());
        }
        let per_unit = unit_nanos(unit).ok_or_else(invalid)?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(per_unit).ok_or_else(invalid)?;

        let frac_part = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
        if !frac_part.is_empty() {
            let frac: u128 = frac_part.parse().map_err(|_| invalid())?;
            let scale = 10u128.pow(frac_part.len() as u32);
            nanos = nanos
                .checked_add(frac * per_unit / scale)
                .ok_or_else(invalid)?;
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = tail;
    }

    let total = u64::try_from(total).map_err(|_| invalid())?;
    Ok(Duration::from_nanos(total))
}

pub(crate) fn deserialize_window<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_window(&text).map_err(serde::de::Error::custom)
}
