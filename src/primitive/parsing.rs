//! Lexical forms of primitive values.
//!
//! Two inputs are supported: URL literals (`'text'`, `42`, `2024-01-31`,
//! `duration'PT1H'`) as they appear in inline parameters and key predicates,
//! and JSON values as they appear in action bodies.

use super::{Primitive, PrimitiveType};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

const MILLIS_PER_DAY: i64 = 86_400_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_MINUTE: i64 = 60_000;

/// A value could not be read as the requested primitive type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{text}' is not a valid {expected} value")]
pub struct LiteralError {
    pub expected: PrimitiveType,
    pub text: String,
}

impl LiteralError {
    fn new(expected: PrimitiveType, text: impl Into<String>) -> Self {
        Self {
            expected,
            text: text.into(),
        }
    }
}

pub(super) fn parse_literal(ty: PrimitiveType, text: &str) -> Result<Primitive, LiteralError> {
    let text = text.trim();
    if text == "null" {
        return Ok(Primitive::Null(ty));
    }

    let fail = || LiteralError::new(ty, text);
    let value = match ty {
        PrimitiveType::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                Primitive::Boolean(true)
            } else if text.eq_ignore_ascii_case("false") {
                Primitive::Boolean(false)
            } else {
                return Err(fail());
            }
        }
        PrimitiveType::Byte
        | PrimitiveType::SByte
        | PrimitiveType::Int16
        | PrimitiveType::Int32
        | PrimitiveType::Int64 => {
            if !is_integer_text(text) {
                return Err(fail());
            }
            let value: i64 = text.parse().map_err(|_| fail())?;
            narrow_integer(ty, value).ok_or_else(fail)?
        }
        PrimitiveType::Single | PrimitiveType::Double => {
            let value = parse_float(text).ok_or_else(fail)?;
            if ty == PrimitiveType::Single {
                Primitive::Single(value as f32)
            } else {
                Primitive::Double(value)
            }
        }
        PrimitiveType::Decimal => {
            if !is_decimal_text(text) {
                return Err(fail());
            }
            Primitive::Decimal(BigDecimal::from_str(text).map_err(|_| fail())?)
        }
        PrimitiveType::String => Primitive::String(unquote(text).ok_or_else(fail)?),
        PrimitiveType::Binary => {
            let inner = strip_prefixed_quotes(text, "binary").ok_or_else(fail)?;
            Primitive::Binary(decode_base64(inner).ok_or_else(fail)?)
        }
        PrimitiveType::Duration => {
            let inner = strip_prefixed_quotes(text, "duration").unwrap_or(text);
            Primitive::Duration(parse_duration(inner).ok_or_else(fail)?)
        }
        _ => parse_textual(ty, text).ok_or_else(fail)?,
    };

    Ok(value)
}

pub(super) fn from_json(ty: PrimitiveType, value: &Value) -> Result<Primitive, LiteralError> {
    let fail = || LiteralError::new(ty, value.to_string());

    if value.is_null() {
        return Ok(Primitive::Null(ty));
    }

    let primitive = match ty {
        PrimitiveType::Boolean => Primitive::Boolean(value.as_bool().ok_or_else(fail)?),
        PrimitiveType::Byte
        | PrimitiveType::SByte
        | PrimitiveType::Int16
        | PrimitiveType::Int32
        | PrimitiveType::Int64 => {
            let number = match value {
                Value::Number(number) => number.as_i64(),
                // IEEE754Compatible clients send 64-bit integers as strings
                Value::String(text) if is_integer_text(text) => text.parse().ok(),
                _ => None,
            };
            narrow_integer(ty, number.ok_or_else(fail)?).ok_or_else(fail)?
        }
        PrimitiveType::Single | PrimitiveType::Double => {
            let number = match value {
                Value::Number(number) => number.as_f64(),
                Value::String(text) => parse_float(text),
                _ => None,
            }
            .ok_or_else(fail)?;
            if ty == PrimitiveType::Single {
                Primitive::Single(number as f32)
            } else {
                Primitive::Double(number)
            }
        }
        PrimitiveType::Decimal => {
            let text = match value {
                Value::Number(number) => number.to_string(),
                Value::String(text) if is_decimal_text(text) => text.clone(),
                _ => return Err(fail()),
            };
            Primitive::Decimal(BigDecimal::from_str(&text).map_err(|_| fail())?)
        }
        PrimitiveType::String => Primitive::String(value.as_str().ok_or_else(fail)?.to_string()),
        PrimitiveType::Binary => {
            Primitive::Binary(decode_base64(value.as_str().ok_or_else(fail)?).ok_or_else(fail)?)
        }
        PrimitiveType::Duration => {
            Primitive::Duration(parse_duration(value.as_str().ok_or_else(fail)?).ok_or_else(fail)?)
        }
        _ => parse_textual(ty, value.as_str().ok_or_else(fail)?).ok_or_else(fail)?,
    };

    Ok(primitive)
}

pub(super) fn to_json(primitive: &Primitive) -> Value {
    match primitive {
        Primitive::Null(_) => Value::Null,
        Primitive::Boolean(value) => Value::Bool(*value),
        Primitive::Byte(value) => Value::from(*value),
        Primitive::SByte(value) => Value::from(*value),
        Primitive::Int16(value) => Value::from(*value),
        Primitive::Int32(value) => Value::from(*value),
        Primitive::Int64(value) => Value::from(*value),
        Primitive::Single(value) => float_to_json(f64::from(*value)),
        Primitive::Double(value) => float_to_json(*value),
        Primitive::Decimal(value) => {
            let text = value.to_string();
            serde_json::from_str::<Value>(&text)
                .ok()
                .filter(Value::is_number)
                .unwrap_or(Value::String(text))
        }
        Primitive::String(value) => Value::String(value.clone()),
        Primitive::Guid(value) => Value::String(value.hyphenated().to_string()),
        Primitive::Date(value) => Value::String(value.format("%Y-%m-%d").to_string()),
        Primitive::DateTimeOffset(value) => Value::String(value.to_rfc3339()),
        Primitive::TimeOfDay(value) => Value::String(value.format("%H:%M:%S%.f").to_string()),
        Primitive::Duration(value) => Value::String(format_duration(value)),
        Primitive::Binary(value) => Value::String(STANDARD.encode(value)),
    }
}

pub(super) fn to_literal(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Null(_) => "null".to_string(),
        Primitive::String(value) => format!("'{}'", value.replace('\'', "''")),
        Primitive::Duration(value) => format!("duration'{}'", format_duration(value)),
        Primitive::Binary(value) => format!("binary'{}'", URL_SAFE_NO_PAD.encode(value)),
        Primitive::Single(value) => float_literal(f64::from(*value)),
        Primitive::Double(value) => float_literal(*value),
        other => match to_json(other) {
            Value::String(text) => text,
            json => json.to_string(),
        },
    }
}

/// Types whose URL literal and JSON string forms are identical
fn parse_textual(ty: PrimitiveType, text: &str) -> Option<Primitive> {
    match ty {
        PrimitiveType::Guid if text.len() == 36 => Uuid::parse_str(text).ok().map(Primitive::Guid),
        PrimitiveType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(Primitive::Date),
        PrimitiveType::DateTimeOffset => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(Primitive::DateTimeOffset),
        PrimitiveType::TimeOfDay => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .ok()
            .map(Primitive::TimeOfDay),
        _ => None,
    }
}

fn narrow_integer(ty: PrimitiveType, value: i64) -> Option<Primitive> {
    let primitive = match ty {
        PrimitiveType::Byte => Primitive::Byte(u8::try_from(value).ok()?),
        PrimitiveType::SByte => Primitive::SByte(i8::try_from(value).ok()?),
        PrimitiveType::Int16 => Primitive::Int16(i16::try_from(value).ok()?),
        PrimitiveType::Int32 => Primitive::Int32(i32::try_from(value).ok()?),
        PrimitiveType::Int64 => Primitive::Int64(value),
        _ => return None,
    };
    Some(primitive)
}

fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal_text(text: &str) -> bool {
    let body = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    !body.is_empty()
        && body.bytes().any(|b| b.is_ascii_digit())
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'-' | b'+'))
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        // Rust accepts "inf" and "nan" spellings that OData does not
        _ if is_decimal_text(text) => text.parse().ok(),
        _ => None,
    }
}

fn float_to_json(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(float_literal(value)))
}

fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let literal = if value.is_sign_positive() { "INF" } else { "-INF" };
        literal.to_string()
    } else {
        value.to_string()
    }
}

/// `'it''s'` -> `it's`; an unescaped quote inside the literal is rejected
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.next_if_eq(&'\'').is_none() {
                return None;
            }
        }
        result.push(c);
    }
    Some(result)
}

fn strip_prefixed_quotes<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    text[prefix.len()..].strip_prefix('\'')?.strip_suffix('\'')
}

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text)
        .or_else(|_| URL_SAFE.decode(text))
        .or_else(|_| STANDARD.decode(text))
        .ok()
}

/// ISO 8601 day-time duration: `[-]P[nD][T[nH][nM][n[.n]S]]`
fn parse_duration(text: &str) -> Option<TimeDelta> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    let (days, time) = match rest.split_once('T') {
        Some((days, time)) => (days, Some(time)),
        None => (rest, None),
    };
    if days.is_empty() && time.is_none() {
        return None;
    }

    let mut millis: i64 = 0;
    if !days.is_empty() {
        let count: i64 = days.strip_suffix('D')?.parse().ok()?;
        millis = count.checked_mul(MILLIS_PER_DAY)?;
    }

    if let Some(time) = time {
        let mut number = String::new();
        let mut components = 0;
        for c in time.chars() {
            let unit = match c {
                '0'..='9' | '.' => {
                    number.push(c);
                    continue;
                }
                'H' => MILLIS_PER_HOUR,
                'M' => MILLIS_PER_MINUTE,
                'S' => 1_000,
                _ => return None,
            };
            let amount: f64 = number.parse().ok()?;
            millis = millis.checked_add((amount * unit as f64).round() as i64)?;
            number.clear();
            components += 1;
        }
        if components == 0 || !number.is_empty() {
            return None;
        }
    }

    Some(TimeDelta::milliseconds(if negative { -millis } else { millis }))
}

fn format_duration(value: &TimeDelta) -> String {
    let total = value.num_milliseconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();

    let days = total / MILLIS_PER_DAY;
    let hours = total % MILLIS_PER_DAY / MILLIS_PER_HOUR;
    let minutes = total % MILLIS_PER_HOUR / MILLIS_PER_MINUTE;
    let seconds = total % MILLIS_PER_MINUTE / 1_000;
    let millis = total % 1_000;

    let fraction = if millis == 0 {
        String::new()
    } else {
        format!(".{millis:03}").trim_end_matches('0').to_string()
    };
    format!("{sign}P{days}DT{hours}H{minutes}M{seconds}{fraction}S")
}
