// used for date-time and time-interval values
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
// used for decimal numbers
use bigdecimal::BigDecimal;
// used for globally-unique identifiers
use uuid::Uuid;
// tags are named in configuration files
use serde::{Deserialize, Serialize};

// used to print out readable forms of a value
use std::fmt;
// used to indicate that values need to be hashable
use std::hash::{Hash, Hasher};
// used when parsing text into a value
use std::str::FromStr;

use crate::error::{Result, TabulaError};

/// Internal identifier for a data type, distinct from the names a
/// [`crate::registry::TypeRegistry`] knows it by.
#[derive(Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Unknown or unspecified type, values are kept as text.
    #[default]
    Any,
    #[serde(alias = "varchar")]
    Text,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Boolean,
    VarBinary,
    Guid,
    DateTime,
    TimeSpan,
}

impl TypeTag {
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Any => "any",
            TypeTag::Text => "text",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::Float32 => "float32",
            TypeTag::Float64 => "float64",
            TypeTag::Decimal => "decimal",
            TypeTag::Boolean => "boolean",
            TypeTag::VarBinary => "varbinary",
            TypeTag::Guid => "guid",
            TypeTag::DateTime => "datetime",
            TypeTag::TimeSpan => "timespan",
        }
    }
}
impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An opaque field value. `Null` is what a missing field reads as.
///
/// Equality and hashing are total: floating point values compare by bit
/// pattern so that every value can take part in an index key.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(BigDecimal),
    Boolean(bool),
    VarBinary(Vec<u8>),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    TimeSpan(TimeDelta),
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Any,
            Value::Text(_) => TypeTag::Text,
            Value::Int32(_) => TypeTag::Int32,
            Value::Int64(_) => TypeTag::Int64,
            Value::Float32(_) => TypeTag::Float32,
            Value::Float64(_) => TypeTag::Float64,
            Value::Decimal(_) => TypeTag::Decimal,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::VarBinary(_) => TypeTag::VarBinary,
            Value::Guid(_) => TypeTag::Guid,
            Value::DateTime(_) => TypeTag::DateTime,
            Value::TimeSpan(_) => TypeTag::TimeSpan,
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
    /// Parse text into a value of the given type.
    ///
    /// `Any` and `Text` keep the text verbatim. Every other type trims
    /// surrounding whitespace first.
    pub fn parse(tag: TypeTag, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        let parsed = match tag {
            TypeTag::Any | TypeTag::Text => Some(Value::Text(text.to_string())),
            TypeTag::Int32 => trimmed.parse::<i32>().ok().map(Value::Int32),
            TypeTag::Int64 => trimmed.parse::<i64>().ok().map(Value::Int64),
            TypeTag::Float32 => trimmed.parse::<f32>().ok().map(Value::Float32),
            TypeTag::Float64 => trimmed.parse::<f64>().ok().map(Value::Float64),
            TypeTag::Decimal => BigDecimal::from_str(trimmed).ok().map(Value::Decimal),
            TypeTag::Boolean => parse_boolean(trimmed).map(Value::Boolean),
            TypeTag::VarBinary => parse_hex(trimmed).map(Value::VarBinary),
            TypeTag::Guid => Uuid::parse_str(trimmed).ok().map(Value::Guid),
            TypeTag::DateTime => parse_datetime(trimmed).map(Value::DateTime),
            TypeTag::TimeSpan => parse_time_span(trimmed).map(Value::TimeSpan),
        };
        parsed.ok_or_else(|| TabulaError::Conversion {
            tag,
            text: text.to_string(),
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::VarBinary(a), Value::VarBinary(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            Value::Null => (),
            Value::Text(s) => s.hash(state),
            Value::Int32(i) => i.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float32(x) => x.to_bits().hash(state),
            Value::Float64(x) => x.to_bits().hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::VarBinary(bytes) => bytes.hash(state),
            Value::Guid(g) => g.hash(state),
            Value::DateTime(d) => d.hash(state),
            Value::TimeSpan(t) => t.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float32(x) => write!(f, "{}", x),
            Value::Float64(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::VarBinary(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Guid(g) => write!(f, "{}", g),
            Value::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::TimeSpan(t) => write_time_span(f, t),
        }
    }
}

// ------------- Data Types --------------
/// A Rust type that can be stored in a [`Value`].
pub trait DataType: Sized {
    // static stuff which needs to be implemented downstream
    const TAG: TypeTag;
    const DATA_TYPE: &'static str;
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
}

macro_rules! data_type {
    ($rust:ty, $variant:ident, $name:literal) => {
        impl DataType for $rust {
            const TAG: TypeTag = TypeTag::$variant;
            const DATA_TYPE: &'static str = $name;
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
        impl From<$rust> for Value {
            fn from(v: $rust) -> Value {
                Value::$variant(v)
            }
        }
    };
}

data_type!(String, Text, "String");
data_type!(i32, Int32, "i32");
data_type!(i64, Int64, "i64");
data_type!(f32, Float32, "f32");
data_type!(f64, Float64, "f64");
data_type!(BigDecimal, Decimal, "BigDecimal");
data_type!(bool, Boolean, "bool");
data_type!(Vec<u8>, VarBinary, "Vec<u8>");
data_type!(Uuid, Guid, "Uuid");
data_type!(NaiveDateTime, DateTime, "NaiveDateTime");
data_type!(TimeDelta, TimeSpan, "TimeDelta");

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}
impl<T: DataType> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        v.map(DataType::into_value).unwrap_or(Value::Null)
    }
}

// ------------- Text parsing --------------
fn parse_boolean(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_hex(s: &str) -> Option<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() % 2 != 0 || !digits.is_ascii() {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

// [-][d.]hh:mm[:ss[.fraction]], or a bare number of days
fn parse_time_span(s: &str) -> Option<TimeDelta> {
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (days, clock) = match (s.find('.'), s.find(':')) {
        (Some(dot), Some(colon)) if dot < colon => (s[..dot].parse::<i64>().ok()?, &s[dot + 1..]),
        (_, Some(_)) => (0, s),
        (_, None) => (s.parse::<i64>().ok()?, ""),
    };
    let mut span = TimeDelta::try_days(days)?;
    if !clock.is_empty() {
        let parts: Vec<&str> = clock.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return None;
        }
        let hours = parts[0].parse::<i64>().ok()?;
        let minutes = parts[1].parse::<i64>().ok()?;
        let (seconds, nanos) = match parts.get(2) {
            Some(seconds) => parse_seconds(seconds)?,
            None => (0, 0),
        };
        if !(0..24).contains(&hours) || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
            return None;
        }
        span = span
            .checked_add(&TimeDelta::try_hours(hours)?)?
            .checked_add(&TimeDelta::try_minutes(minutes)?)?
            .checked_add(&TimeDelta::try_seconds(seconds)?)?
            .checked_add(&TimeDelta::nanoseconds(nanos))?;
    }
    Some(if negative { -span } else { span })
}

fn parse_seconds(s: &str) -> Option<(i64, i64)> {
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    let seconds = whole.parse::<i64>().ok()?;
    if fraction.is_empty() {
        return Some((seconds, 0));
    }
    if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nanos = format!("{:0<9}", fraction).parse::<i64>().ok()?;
    Some((seconds, nanos))
}

fn write_time_span(f: &mut fmt::Formatter, span: &TimeDelta) -> fmt::Result {
    let sign = if *span < TimeDelta::zero() { "-" } else { "" };
    let span = span.abs();
    let total = span.num_seconds();
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;
    write!(f, "{}", sign)?;
    if days > 0 {
        write!(f, "{}.", days)?;
    }
    write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)?;
    let nanos = span.subsec_nanos();
    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        write!(f, ".{}", fraction.trim_end_matches('0'))?;
    }
    Ok(())
}
