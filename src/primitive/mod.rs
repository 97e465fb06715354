//! Edm primitive types and values.
//!
//! [`Primitive`] is the typed scalar that flows through the pipe chain: it is
//! what primitive arguments are generated as, what primitive-returning
//! operations are coerced into, and what property segments yield.
//!
//! [`NativeValue`] is the untyped counterpart ("generic value" arguments).
//! A callable that declares a native parameter receives the raw value rather
//! than an Edm wrapper.

mod parsing;

pub use parsing::LiteralError;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// The Edm primitive types understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Guid,
    Date,
    DateTimeOffset,
    TimeOfDay,
    Duration,
    Binary,
}

impl PrimitiveType {
    /// Qualified Edm name, e.g. `Edm.Int32`
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Boolean => "Edm.Boolean",
            Self::Byte => "Edm.Byte",
            Self::SByte => "Edm.SByte",
            Self::Int16 => "Edm.Int16",
            Self::Int32 => "Edm.Int32",
            Self::Int64 => "Edm.Int64",
            Self::Single => "Edm.Single",
            Self::Double => "Edm.Double",
            Self::Decimal => "Edm.Decimal",
            Self::String => "Edm.String",
            Self::Guid => "Edm.Guid",
            Self::Date => "Edm.Date",
            Self::DateTimeOffset => "Edm.DateTimeOffset",
            Self::TimeOfDay => "Edm.TimeOfDay",
            Self::Duration => "Edm.Duration",
            Self::Binary => "Edm.Binary",
        }
    }

    /// Look up a type by its qualified or unqualified Edm name
    pub fn from_identifier(name: &str) -> Option<Self> {
        let name = name.strip_prefix("Edm.").unwrap_or(name);
        let ty = match name {
            "Boolean" => Self::Boolean,
            "Byte" => Self::Byte,
            "SByte" => Self::SByte,
            "Int16" => Self::Int16,
            "Int32" => Self::Int32,
            "Int64" => Self::Int64,
            "Single" => Self::Single,
            "Double" => Self::Double,
            "Decimal" => Self::Decimal,
            "String" => Self::String,
            "Guid" => Self::Guid,
            "Date" => Self::Date,
            "DateTimeOffset" => Self::DateTimeOffset,
            "TimeOfDay" => Self::TimeOfDay,
            "Duration" => Self::Duration,
            "Binary" => Self::Binary,
            _ => return None,
        };
        Some(ty)
    }

    /// Typed null of this type
    pub fn null(self) -> Primitive {
        Primitive::Null(self)
    }

    /// Parse a URL literal (inline parameter, key predicate, parameter alias)
    pub fn parse_literal(self, text: &str) -> Result<Primitive, LiteralError> {
        parsing::parse_literal(self, text)
    }

    /// Convert a JSON value (request body) into this type
    pub fn from_json(self, value: &Value) -> Result<Primitive, LiteralError> {
        parsing::from_json(self, value)
    }

    /// Wrap a raw native value as this type.
    ///
    /// Used when a callable returns a native value for an operation whose
    /// declared return type is an Edm primitive.
    pub fn instance(self, value: &NativeValue) -> Result<Primitive, LiteralError> {
        self.from_json(&value.to_json())
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A typed Edm value, or a typed null.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null(PrimitiveType),
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    Guid(Uuid),
    Date(NaiveDate),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeOfDay(NaiveTime),
    Duration(TimeDelta),
    Binary(Vec<u8>),
}

impl Primitive {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Null(ty) => *ty,
            Self::Boolean(_) => PrimitiveType::Boolean,
            Self::Byte(_) => PrimitiveType::Byte,
            Self::SByte(_) => PrimitiveType::SByte,
            Self::Int16(_) => PrimitiveType::Int16,
            Self::Int32(_) => PrimitiveType::Int32,
            Self::Int64(_) => PrimitiveType::Int64,
            Self::Single(_) => PrimitiveType::Single,
            Self::Double(_) => PrimitiveType::Double,
            Self::Decimal(_) => PrimitiveType::Decimal,
            Self::String(_) => PrimitiveType::String,
            Self::Guid(_) => PrimitiveType::Guid,
            Self::Date(_) => PrimitiveType::Date,
            Self::DateTimeOffset(_) => PrimitiveType::DateTimeOffset,
            Self::TimeOfDay(_) => PrimitiveType::TimeOfDay,
            Self::Duration(_) => PrimitiveType::Duration,
            Self::Binary(_) => PrimitiveType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer view of any of the integral types
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(value) => Some(i64::from(*value)),
            Self::SByte(value) => Some(i64::from(*value)),
            Self::Int16(value) => Some(i64::from(*value)),
            Self::Int32(value) => Some(i64::from(*value)),
            Self::Int64(value) => Some(*value),
            _ => None,
        }
    }

    /// Floating point view of any numeric type
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Single(value) => Some(f64::from(*value)),
            Self::Double(value) => Some(*value),
            Self::Decimal(value) => value.to_string().parse().ok(),
            _ => self.as_i64().map(|value| value as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// JSON representation used in request and response bodies
    pub fn to_json(&self) -> Value {
        parsing::to_json(self)
    }

    /// Unwrap into a native value; nulls become `None`
    pub fn into_native(self) -> Option<NativeValue> {
        let native = match self {
            Self::Null(_) => return None,
            Self::Boolean(value) => NativeValue::Bool(value),
            Self::Byte(value) => NativeValue::Int(i64::from(value)),
            Self::SByte(value) => NativeValue::Int(i64::from(value)),
            Self::Int16(value) => NativeValue::Int(i64::from(value)),
            Self::Int32(value) => NativeValue::Int(i64::from(value)),
            Self::Int64(value) => NativeValue::Int(value),
            Self::Single(value) => NativeValue::Float(f64::from(value)),
            Self::Double(value) => NativeValue::Float(value),
            Self::Decimal(value) => NativeValue::Float(value.to_string().parse().ok()?),
            Self::String(value) => NativeValue::String(value),
            other => match other.to_json() {
                Value::String(text) => NativeValue::String(text),
                json => NativeValue::String(json.to_string()),
            },
        };
        Some(native)
    }
}

/// Renders the URL literal form, e.g. `'O''Neil'`, `duration'P1D'`
impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&parsing::to_literal(self))
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i16> for Primitive {
    fn from(value: i16) -> Self {
        Self::Int16(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Uuid> for Primitive {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl From<NaiveDate> for Primitive {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Declared type of a generic (non-Edm) value parameter or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Bool,
    Int,
    Float,
    String,
}

impl NativeType {
    /// The Edm type a native value is lexed and reported as
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Bool => PrimitiveType::Boolean,
            Self::Int => PrimitiveType::Int64,
            Self::Float => PrimitiveType::Double,
            Self::String => PrimitiveType::String,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        }
    }
}

/// An untyped value handed to or returned from a callable.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl NativeValue {
    pub fn native_type(&self) -> NativeType {
        match self {
            Self::Bool(_) => NativeType::Bool,
            Self::Int(_) => NativeType::Int,
            Self::Float(_) => NativeType::Float,
            Self::String(_) => NativeType::String,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::from(*value),
            Self::Float(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(value.to_string())),
            Self::String(value) => Value::String(value.clone()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}
