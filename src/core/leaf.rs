//! Purpose: Render and parse leaf values (dates, floating literals, numbers) under a `FormatPolicy`.
//! Exports: `FloatValue`, `render_date`, `parse_date`, `is_tagged_date`, `parse_float_literal`,
//! `number_from_f64`, `number_from_decimal`.
//! Role: The only place policy switches turn into text; the engine routes every leaf through here.
//! Invariants: `Binary64` never fails on range; out-of-range literals saturate to the largest finite value.
//! Invariants: `DecimalExact` fails with `Overflow` instead of rounding.
//! Invariants: Dates are read in either representation; the policy picks the written one.

use std::str::FromStr;

use serde_json::Number;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::core::decimal::ExactDecimal;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{DateRepresentation, FloatParseTarget};

const TAG_OPEN: &str = "/Date(";
const TAG_CLOSE: &str = ")/";
const NANOS_PER_MILLI: i128 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FloatValue {
    Binary64(f64),
    Decimal(ExactDecimal),
}

pub fn render_date(instant: OffsetDateTime, representation: DateRepresentation) -> Result<String, Error> {
    match representation {
        DateRepresentation::Iso8601 => instant.format(&Rfc3339).map_err(|err| {
            Error::new(ErrorKind::Overflow)
                .with_message("instant cannot be rendered as RFC 3339")
                .with_type("OffsetDateTime")
                .with_source(err)
        }),
        DateRepresentation::EpochMillisTagged => {
            let millis = instant.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI);
            let offset = instant.offset();
            if offset.is_utc() {
                return Ok(format!("{TAG_OPEN}{millis}{TAG_CLOSE}"));
            }
            let sign = if offset.is_negative() { '-' } else { '+' };
            Ok(format!(
                "{TAG_OPEN}{millis}{sign}{:02}{:02}{TAG_CLOSE}",
                offset.whole_hours().unsigned_abs(),
                offset.minutes_past_hour().unsigned_abs()
            ))
        }
    }
}

pub fn is_tagged_date(text: &str) -> bool {
    text.starts_with(TAG_OPEN) && text.ends_with(TAG_CLOSE) && text.len() > TAG_OPEN.len() + TAG_CLOSE.len()
}

pub fn parse_date(text: &str) -> Result<OffsetDateTime, Error> {
    if is_tagged_date(text) {
        return parse_tagged(text);
    }
    OffsetDateTime::parse(text, &Rfc3339).map_err(|err| {
        Error::new(ErrorKind::Mismatch)
            .with_message(format!("`{text}` is not an RFC 3339 date"))
            .with_type("OffsetDateTime")
            .with_source(err)
    })
}

fn parse_tagged(text: &str) -> Result<OffsetDateTime, Error> {
    let malformed = || {
        Error::new(ErrorKind::Mismatch)
            .with_message(format!("`{text}` is not a tagged epoch date"))
            .with_type("OffsetDateTime")
    };
    let inner = &text[TAG_OPEN.len()..text.len() - TAG_CLOSE.len()];

    // A sign after the first character starts the offset suffix.
    let split = inner
        .char_indices()
        .skip(1)
        .find(|(_, ch)| *ch == '+' || *ch == '-')
        .map(|(idx, _)| idx);
    let (millis_text, offset_text) = match split {
        Some(idx) => (&inner[..idx], Some(&inner[idx..])),
        None => (inner, None),
    };

    let millis: i64 = millis_text.parse().map_err(|_| malformed())?;
    let utc = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
        .map_err(|err| {
            Error::new(ErrorKind::Overflow)
                .with_message(format!("`{text}` is outside the supported date range"))
                .with_type("OffsetDateTime")
                .with_source(err)
        })?;

    let Some(offset_text) = offset_text else {
        return Ok(utc);
    };
    let digits = &offset_text[1..];
    if digits.len() != 4 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(malformed());
    }
    let hours: i8 = digits[..2].parse().map_err(|_| malformed())?;
    let minutes: i8 = digits[2..].parse().map_err(|_| malformed())?;
    let (hours, minutes) = if offset_text.starts_with('-') {
        (-hours, -minutes)
    } else {
        (hours, minutes)
    };
    let offset = UtcOffset::from_hms(hours, minutes, 0).map_err(|err| malformed().with_source(err))?;
    utc.checked_to_offset(offset).ok_or_else(|| {
        Error::new(ErrorKind::Overflow)
            .with_message(format!("`{text}` is outside the supported date range"))
            .with_type("OffsetDateTime")
    })
}

/// Materializes a numeral under the session's float target.
pub fn parse_float_literal(text: &str, target: FloatParseTarget) -> Result<FloatValue, Error> {
    match target {
        FloatParseTarget::Binary64 => {
            let float = f64::from_str(text).map_err(|err| {
                Error::new(ErrorKind::Mismatch)
                    .with_message(format!("invalid numeric literal `{text}`"))
                    .with_source(err)
            })?;
            if float.is_infinite() {
                return Ok(FloatValue::Binary64(f64::MAX.copysign(float)));
            }
            Ok(FloatValue::Binary64(float))
        }
        FloatParseTarget::DecimalExact => ExactDecimal::parse(text).map(FloatValue::Decimal),
    }
}

pub fn number_from_f64(value: f64) -> Result<Number, Error> {
    Number::from_f64(value).ok_or_else(|| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("non-finite float {value} cannot be written as JSON"))
            .with_type("f64")
    })
}

pub fn number_from_decimal(value: &ExactDecimal) -> Result<Number, Error> {
    Number::from_str(&value.to_string()).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("decimal text rejected by the number writer")
            .with_type("ExactDecimal")
            .with_source(err)
    })
}
