//! Purpose: Exact base-10 number produced by the `DecimalExact` float target.
//! Exports: `ExactDecimal`, `MAX_PRECISION`, `MAX_SCALE`.
//! Role: Materializes JSON numerals without binary rounding.
//! Invariants: Values are normalized (no trailing fractional zeros), so derived equality is numeric.
//! Invariants: A literal that cannot be held exactly fails with `Overflow`; nothing is truncated.

use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

pub const MAX_PRECISION: u32 = 24;
pub const MAX_SCALE: u32 = 24;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct ExactDecimal {
    mantissa: i128,
    scale: u32,
}

impl ExactDecimal {
    pub const ZERO: ExactDecimal = ExactDecimal {
        mantissa: 0,
        scale: 0,
    };

    /// Builds `mantissa * 10^-scale`, normalizing trailing zeros away.
    pub fn from_parts(mantissa: i128, scale: u32) -> Result<Self, Error> {
        let mut mantissa = mantissa;
        let mut scale = scale;
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        if mantissa == 0 {
            return Ok(Self::ZERO);
        }
        if scale > MAX_SCALE || digit_count(mantissa.unsigned_abs()) > MAX_PRECISION {
            return Err(overflow(&format!("{mantissa}e-{scale}")));
        }
        Ok(Self { mantissa, scale })
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        let literal = split_literal(text).ok_or_else(|| {
            Error::new(ErrorKind::Mismatch).with_message(format!("invalid numeric literal `{text}`"))
        })?;

        let digits = literal.digits.trim_start_matches('0');
        let significant = digits.trim_end_matches('0');
        if significant.is_empty() {
            return Ok(Self::ZERO);
        }
        let stripped = (digits.len() - significant.len()) as i64;

        // value = significant * 10^exponent
        let exponent = match literal.exponent {
            Some(exp) => exp
                .checked_sub(literal.fraction_len as i64)
                .and_then(|exp| exp.checked_add(stripped)),
            None => Some(stripped - literal.fraction_len as i64),
        }
        .ok_or_else(|| overflow(text))?;

        let whole_digits = significant.len() as i64 + exponent.max(0);
        if whole_digits > MAX_PRECISION as i64 || -exponent > MAX_SCALE as i64 {
            return Err(overflow(text));
        }

        let mut mantissa: i128 = 0;
        for byte in significant.bytes() {
            mantissa = mantissa * 10 + i128::from(byte - b'0');
        }
        for _ in 0..exponent.max(0) {
            mantissa *= 10;
        }
        if literal.negative {
            mantissa = -mantissa;
        }
        Ok(Self {
            mantissa,
            scale: (-exponent).max(0) as u32,
        })
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Nearest binary64 value; rounding is accepted here.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl FromStr for ExactDecimal {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for ExactDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mantissa < 0 {
            f.write_str("-")?;
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() <= scale {
            write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
        } else {
            let (whole, fraction) = digits.split_at(digits.len() - scale);
            write!(f, "{whole}.{fraction}")
        }
    }
}

struct Literal {
    negative: bool,
    digits: String,
    fraction_len: usize,
    exponent: Option<i64>,
}

fn split_literal(text: &str) -> Option<Literal> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (mantissa, ""),
    };
    if whole.is_empty() || !is_digits(whole) || !(fraction.is_empty() || is_digits(fraction)) {
        return None;
    }
    if mantissa.ends_with('.') {
        return None;
    }

    let exponent = match exponent {
        Some(exp) => {
            let unsigned = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if unsigned.is_empty() || !is_digits(unsigned) {
                return None;
            }
            // Exponents too long for i64 saturate; they overflow later unless the value is zero.
            Some(exp.parse::<i64>().unwrap_or(if exp.starts_with('-') {
                i64::MIN / 2
            } else {
                i64::MAX / 2
            }))
        }
        None => None,
    };

    Some(Literal {
        negative,
        digits: format!("{whole}{fraction}"),
        fraction_len: fraction.len(),
        exponent,
    })
}

fn is_digits(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

fn digit_count(mut value: u128) -> u32 {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}

fn overflow(text: &str) -> Error {
    Error::new(ErrorKind::Overflow)
        .with_message(format!(
            "numeric literal `{text}` is not exactly representable as a decimal \
             ({MAX_PRECISION} digits, scale {MAX_SCALE})"
        ))
        .with_type("ExactDecimal")
        .with_hint("Use the binary64 float target to accept rounded values.")
}
