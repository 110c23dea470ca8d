//! The typed value cell shared by markup nodes, attributes and data entries.
//!
//! A [`Value`] holds at most one value of one of seven kinds. It can be read
//! back under *any* kind: the getters convert leniently and never fail, they
//! only return `None` when the cell is empty.
//!
//! ## Reading across kinds
//!
//! ```rust
//! use doctree::{Value, ValueKind};
//!
//! let value = Value::from(" 42 ");
//! assert_eq!(value.kind(), ValueKind::Text);
//! assert_eq!(value.int32(), Some(42));
//! assert_eq!(value.float64(), Some(42.0));
//! assert_eq!(value.boolean(), Some(true));
//!
//! let value = Value::from(2.5f64);
//! assert_eq!(value.int32(), Some(3));
//! assert_eq!(value.text().as_deref(), Some("2.5"));
//!
//! assert_eq!(Value::Empty.int32(), None);
//! ```
//!
//! ## Writing
//!
//! Setters replace the whole cell, kind and value together:
//!
//! ```rust
//! use doctree::{Value, ValueKind};
//!
//! let mut value = Value::from("hello");
//! value.set_int64(7);
//! assert_eq!(value.kind(), ValueKind::Int64);
//!
//! value.set(None::<i32>);
//! assert!(value.is_empty());
//! ```

use crate::convert::{
    decimal_to_f64, decimal_to_i64, f64_to_decimal, float_to_i64, format_decimal,
    format_float, format_timestamp, from_oa_date, parse_bool, parse_int, parse_timestamp,
    to_oa_date, zero_timestamp,
};
use crate::options::NumberFormat;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single typed value, or nothing.
///
/// # Examples
///
/// ```rust
/// use doctree::Value;
/// use rust_decimal::Decimal;
///
/// let price = Value::Decimal(Decimal::new(314, 2));
/// assert_eq!(price.text().as_deref(), Some("3.1400"));
/// assert_eq!(price.int64(), Some(3));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Int32(i32),
    Int64(i64),
    Bool(bool),
    Float64(f64),
    Decimal(Decimal),
    Timestamp(NaiveDateTime),
}

/// The kind tag of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Empty,
    Text,
    Int32,
    Int64,
    Bool,
    Float64,
    Decimal,
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Empty => "empty",
            ValueKind::Text => "text",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Bool => "bool",
            ValueKind::Float64 => "float64",
            ValueKind::Decimal => "decimal",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Text(_) => ValueKind::Text,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Bool(_) => ValueKind::Bool,
            Value::Float64(_) => ValueKind::Float64,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Borrows the stored string when the cell holds text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical text rendering.
    ///
    /// Integers print their digits, floats use the shortest round-trip form
    /// (scientific outside `1E-05..1E+15`), decimals always carry four
    /// fractional digits and timestamps use `YYYY-MM-DDThh:mm:ss`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::Value;
    ///
    /// assert_eq!(Value::from(true).text().as_deref(), Some("true"));
    /// assert_eq!(Value::from(1e20).text().as_deref(), Some("1E+20"));
    /// assert_eq!(Value::Empty.text(), None);
    /// ```
    #[must_use]
    pub fn text(&self) -> Option<String> {
        Some(match self {
            Value::Empty => return None,
            Value::Text(s) => s.clone(),
            Value::Int32(n) => n.to_string(),
            Value::Int64(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Float64(f) => format_float(*f),
            Value::Decimal(d) => format_decimal(*d),
            Value::Timestamp(ts) => format_timestamp(*ts),
        })
    }

    /// Reads the cell as a 32-bit integer.
    ///
    /// Fractional kinds round half away from zero; wider values wrap.
    #[must_use]
    pub fn int32(&self) -> Option<i32> {
        Some(match self {
            Value::Empty => return None,
            Value::Text(s) => parse_int(s),
            Value::Int32(n) => *n,
            Value::Int64(n) => *n as i32,
            _ => self.int64()? as i32,
        })
    }

    /// Reads the cell as a 64-bit integer.
    #[must_use]
    pub fn int64(&self) -> Option<i64> {
        Some(match self {
            Value::Empty => return None,
            Value::Text(s) => parse_int(s),
            Value::Int32(n) => i64::from(*n),
            Value::Int64(n) => *n,
            Value::Bool(b) => i64::from(*b),
            Value::Float64(f) => float_to_i64(*f),
            Value::Decimal(d) => decimal_to_i64(*d),
            Value::Timestamp(ts) => to_oa_date(*ts) as i64,
        })
    }

    /// Reads the cell as a boolean.
    ///
    /// Numbers are true when positive. Text is true when it reads `true` in
    /// any case or is a run of digits with a positive value.
    #[must_use]
    pub fn boolean(&self) -> Option<bool> {
        Some(match self {
            Value::Empty => return None,
            Value::Text(s) => parse_bool(s),
            Value::Int32(n) => *n > 0,
            Value::Int64(n) => *n > 0,
            Value::Bool(b) => *b,
            Value::Float64(f) => *f > 0.0,
            Value::Decimal(d) => d.is_sign_positive() && !d.is_zero(),
            Value::Timestamp(ts) => to_oa_date(*ts) > 0.0,
        })
    }

    /// Reads the cell as a float, with `.` as the decimal separator of text.
    #[must_use]
    pub fn float64(&self) -> Option<f64> {
        self.float64_with(&NumberFormat::default())
    }

    /// Reads the cell as a float, reading text with the given separator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::{NumberFormat, Value};
    ///
    /// let comma = NumberFormat::new().with_decimal_separator(',');
    /// assert_eq!(Value::from("2,5").float64_with(&comma), Some(2.5));
    /// assert_eq!(Value::from("abc").float64(), Some(0.0));
    /// ```
    #[must_use]
    pub fn float64_with(&self, format: &NumberFormat) -> Option<f64> {
        Some(match self {
            Value::Empty => return None,
            Value::Text(s) => format.normalize(s).trim().parse::<f64>().unwrap_or(0.0),
            Value::Int32(n) => f64::from(*n),
            Value::Int64(n) => *n as f64,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Float64(f) => *f,
            Value::Decimal(d) => decimal_to_f64(*d),
            Value::Timestamp(ts) => to_oa_date(*ts),
        })
    }

    /// Reads the cell as a fixed-point decimal, with `.` as the text separator.
    #[must_use]
    pub fn decimal(&self) -> Option<Decimal> {
        self.decimal_with(&NumberFormat::default())
    }

    /// Reads the cell as a fixed-point decimal, reading text with the given separator.
    #[must_use]
    pub fn decimal_with(&self, format: &NumberFormat) -> Option<Decimal> {
        Some(match self {
            Value::Empty => return None,
            Value::Text(s) => {
                let normalized = format.normalize(s);
                let trimmed = normalized.trim();
                Decimal::from_str(trimmed)
                    .or_else(|_| Decimal::from_scientific(trimmed))
                    .unwrap_or(Decimal::ZERO)
            }
            Value::Int32(n) => Decimal::from(*n),
            Value::Int64(n) => Decimal::from(*n),
            Value::Bool(b) => Decimal::from(u8::from(*b)),
            Value::Float64(f) => f64_to_decimal(*f),
            Value::Decimal(d) => *d,
            Value::Timestamp(ts) => f64_to_decimal(to_oa_date(*ts)),
        })
    }

    /// Reads the cell as a timestamp.
    ///
    /// Numbers are read as OA-dates; malformed text and out-of-range numbers
    /// give `0001-01-01T00:00:00`.
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let oa = match self {
            Value::Empty => return None,
            Value::Timestamp(ts) => return Some(*ts),
            Value::Text(s) => return Some(parse_timestamp(s).unwrap_or_else(zero_timestamp)),
            Value::Int32(n) => f64::from(*n),
            Value::Int64(n) => *n as f64,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Float64(f) => *f,
            Value::Decimal(d) => decimal_to_f64(*d),
        };
        Some(from_oa_date(oa).unwrap_or_else(zero_timestamp))
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        *self = Value::Text(text.into());
    }

    pub fn set_int32(&mut self, value: i32) {
        *self = Value::Int32(value);
    }

    pub fn set_int64(&mut self, value: i64) {
        *self = Value::Int64(value);
    }

    pub fn set_bool(&mut self, value: bool) {
        *self = Value::Bool(value);
    }

    pub fn set_float64(&mut self, value: f64) {
        *self = Value::Float64(value);
    }

    pub fn set_decimal(&mut self, value: Decimal) {
        *self = Value::Decimal(value);
    }

    pub fn set_timestamp(&mut self, value: NaiveDateTime) {
        *self = Value::Timestamp(value);
    }

    /// Replaces the cell with anything convertible; `None` empties it.
    pub fn set(&mut self, value: impl Into<Value>) {
        *self = value.into();
    }

    pub fn clear(&mut self) {
        *self = Value::Empty;
    }

    /// Compares this cell with `needle` after reading it under the needle's kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use doctree::Value;
    ///
    /// assert!(Value::from("17").matches(&Value::from(17)));
    /// assert!(Value::from(17).matches(&Value::from("17")));
    /// assert!(!Value::from(17).matches(&Value::from(18i64)));
    /// ```
    #[must_use]
    pub fn matches(&self, needle: &Value) -> bool {
        match needle {
            Value::Empty => self.is_empty(),
            Value::Text(s) => self.text().as_deref() == Some(s.as_str()),
            Value::Int32(n) => self.int32() == Some(*n),
            Value::Int64(n) => self.int64() == Some(*n),
            Value::Bool(b) => self.boolean() == Some(*b),
            Value::Float64(f) => self.float64() == Some(*f),
            Value::Decimal(d) => self.decimal() == Some(*d),
            Value::Timestamp(ts) => self.timestamp() == Some(*ts),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Empty => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Int32(n) => serializer.serialize_i32(*n),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Float64(f) => serializer.serialize_f64(*f),
            Value::Decimal(d) => serializer.serialize_f64(decimal_to_f64(*d)),
            Value::Timestamp(ts) => serializer.serialize_str(&format_timestamp(*ts)),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a scalar value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(match i32::try_from(value) {
                    Ok(small) => Value::Int32(small),
                    Err(_) => Value::Int64(value),
                })
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                match i64::try_from(value) {
                    Ok(signed) => self.visit_i64(signed),
                    Err(_) => Ok(Value::Float64(value as f64)),
                }
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::Float64(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::Text(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::Text(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Empty)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Empty)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, _seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                Err(de::Error::custom("a value cell cannot hold a sequence"))
            }

            fn visit_map<A>(self, _map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                Err(de::Error::custom("a value cell cannot hold a map"))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Int32(i32::from(value))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int32(i32::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Int32(i32::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int32(i32::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int64(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float64(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_reads_none_everywhere() {
        let value = Value::Empty;
        assert_eq!(value.text(), None);
        assert_eq!(value.int32(), None);
        assert_eq!(value.int64(), None);
        assert_eq!(value.boolean(), None);
        assert_eq!(value.float64(), None);
        assert_eq!(value.decimal(), None);
        assert_eq!(value.timestamp(), None);
    }

    #[test]
    fn test_text_to_numbers() {
        assert_eq!(Value::from(" -12 ").int32(), Some(-12));
        assert_eq!(Value::from("12.5").int32(), Some(0));
        assert_eq!(Value::from("9000000000").int64(), Some(9_000_000_000));
        assert_eq!(Value::from("1.25").decimal(), Some(Decimal::new(125, 2)));
        assert_eq!(Value::from("junk").decimal(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_float_rounding_to_int() {
        assert_eq!(Value::from(2.5).int32(), Some(3));
        assert_eq!(Value::from(-2.5).int32(), Some(-3));
        assert_eq!(Value::Decimal(Decimal::new(-15, 1)).int64(), Some(-2));
        assert_eq!(Value::from(i64::from(i32::MAX) + 1).int32(), Some(i32::MIN));
    }

    #[test]
    fn test_boolean_rules() {
        assert_eq!(Value::from("True").boolean(), Some(true));
        assert_eq!(Value::from("0").boolean(), Some(false));
        assert_eq!(Value::from(-1).boolean(), Some(false));
        assert_eq!(Value::Decimal(Decimal::new(1, 4)).boolean(), Some(true));
        assert_eq!(Value::from(ts(1899, 12, 30, 0)).boolean(), Some(false));
        assert_eq!(Value::from(ts(2000, 1, 1, 0)).boolean(), Some(true));
    }

    #[test]
    fn test_timestamp_conversions() {
        let stamp = ts(2024, 5, 17, 8);
        assert_eq!(
            Value::from(stamp).text().as_deref(),
            Some("2024-05-17T08:00:00")
        );
        assert_eq!(Value::from("2024-05-17T08:00:00").timestamp(), Some(stamp));
        assert_eq!(Value::from("yesterday").timestamp(), Some(zero_timestamp()));
        assert_eq!(Value::from(1.5).timestamp(), Some(ts(1899, 12, 31, 12)));
        assert_eq!(Value::from(true).timestamp(), Some(ts(1899, 12, 31, 0)));
        assert_eq!(Value::from(1e9).timestamp(), Some(zero_timestamp()));
        assert_eq!(Value::from(ts(1899, 12, 31, 12)).int32(), Some(1));
    }

    #[test]
    fn test_matches_coerces_to_needle() {
        assert!(Value::from("3.5").matches(&Value::from(3.5)));
        assert!(Value::from(1).matches(&Value::from(true)));
        assert!(Value::Empty.matches(&Value::Empty));
        assert!(!Value::Empty.matches(&Value::from("")));
    }

    #[test]
    fn test_set_replaces_kind() {
        let mut value = Value::from("x");
        value.set_decimal(Decimal::new(5, 0));
        assert_eq!(value.kind(), ValueKind::Decimal);
        value.set(Some("y"));
        assert_eq!(value.as_str(), Some("y"));
        value.set(None::<f64>);
        assert!(value.is_empty());
    }

    #[test]
    fn test_serde_bridge() {
        let json = serde_json::to_string(&Value::Decimal(Decimal::new(25, 1))).unwrap();
        assert_eq!(json, "2.5");
        let json = serde_json::to_string(&Value::from(ts(2020, 1, 2, 3))).unwrap();
        assert_eq!(json, "\"2020-01-02T03:00:00\"");

        let value: Value = serde_json::from_str("7").unwrap();
        assert_eq!(value, Value::Int32(7));
        let value: Value = serde_json::from_str("7000000000").unwrap();
        assert_eq!(value, Value::Int64(7_000_000_000));
        let value: Value = serde_json::from_str("null").unwrap();
        assert_eq!(value, Value::Empty);
        assert!(serde_json::from_str::<Value>("[1]").is_err());
    }

    #[test]
    fn test_deserialize_unsigned_beyond_i64() {
        let value: Value = serde_json::from_str("9223372036854775807").unwrap();
        assert_eq!(value, Value::Int64(i64::MAX));
        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(value, Value::Float64(u64::MAX as f64));
    }
}
