//! Tagged placeholder values

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::definition::PlaceholderType;

/// Largest number of fractional digits a [`Decimal`] may carry
const MAX_SCALE: usize = 28;

/// A concrete value bound to a placeholder
///
/// Enum placeholders carry their selected option as [`Value::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Integer(i64),
    /// JSON has no literal for NaN or infinity; those are written as strings
    Float(#[serde(with = "float_repr")] f64),
    Decimal(Decimal),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
    Color(String),
    ImagePath(String),
    RichText(String),
    Json(serde_json::Value),
    List(Vec<Value>),
}

impl Value {
    /// Human-readable name of the runtime kind, used in validation messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "date/time",
            Value::Color(_) => "color",
            Value::ImagePath(_) => "image path",
            Value::RichText(_) => "rich text",
            Value::Json(_) => "json",
            Value::List(_) => "list",
        }
    }

    /// Whether this is one of the numeric kinds
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_) | Value::Decimal(_))
    }

    /// Numeric value as `f64`, for bound checks
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => Some(d.to_f64()),
            _ => None,
        }
    }

    /// Borrow the string payload of the string-like kinds
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s)
            | Value::Color(s)
            | Value::ImagePath(s)
            | Value::RichText(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Read a raw string as a value of the given placeholder type
    ///
    /// Used for values that arrive untyped, e.g. from the command line.
    pub fn parse_typed(ty: PlaceholderType, raw: &str) -> Result<Value, ValueParseError> {
        let err = |reason: String| ValueParseError {
            raw: raw.to_string(),
            expected: ty,
            reason,
        };

        match ty {
            PlaceholderType::Text | PlaceholderType::Enum => Ok(Value::Text(raw.to_string())),
            PlaceholderType::RichText => Ok(Value::RichText(raw.to_string())),
            PlaceholderType::Color => Ok(Value::Color(raw.trim().to_string())),
            PlaceholderType::ImagePath => Ok(Value::ImagePath(raw.to_string())),
            PlaceholderType::Number => {
                let trimmed = raw.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Value::Integer(i));
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                    Ok(_) => Err(err("number is not finite".to_string())),
                    Err(e) => Err(err(e.to_string())),
                }
            }
            PlaceholderType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Value::Boolean(true)),
                "false" | "no" | "off" | "0" => Ok(Value::Boolean(false)),
                other => Err(err(format!("'{}' is not a boolean", other))),
            },
            PlaceholderType::DateTime => parse_datetime(raw.trim())
                .map(Value::DateTime)
                .ok_or_else(|| err("expected RFC 3339 or 'YYYY-MM-DD HH:MM[:SS]'".to_string())),
            PlaceholderType::JsonObject => serde_json::from_str(raw)
                .map(Value::Json)
                .map_err(|e| err(e.to_string())),
            PlaceholderType::List => {
                let trimmed = raw.trim();
                if trimmed.starts_with('[') {
                    let json: serde_json::Value =
                        serde_json::from_str(trimmed).map_err(|e| err(e.to_string()))?;
                    Ok(Value::from_json(&json))
                } else if trimmed.is_empty() {
                    Ok(Value::List(Vec::new()))
                } else {
                    Ok(Value::List(
                        trimmed
                            .split(',')
                            .map(|item| Value::Text(item.trim().to_string()))
                            .collect(),
                    ))
                }
            }
        }
    }

    /// Read a JSON value as a value of the given placeholder type
    ///
    /// `null` reads as an absent value.
    pub fn from_json_typed(
        ty: PlaceholderType,
        json: &serde_json::Value,
    ) -> Result<Option<Value>, ValueParseError> {
        use serde_json::Value as Json;

        let value = match (ty, json) {
            (_, Json::Null) => return Ok(None),
            (_, Json::String(s)) => Value::parse_typed(ty, s)?,
            (PlaceholderType::JsonObject, other) => Value::Json(other.clone()),
            (PlaceholderType::RichText, other) => Value::RichText(other.to_string()),
            (PlaceholderType::Text | PlaceholderType::Enum, Json::Number(n)) => {
                Value::Text(n.to_string())
            }
            (PlaceholderType::Text | PlaceholderType::Enum, Json::Bool(b)) => {
                Value::Text(b.to_string())
            }
            (_, other) => Value::from_json(other),
        };
        Ok(Some(value))
    }

    /// Convert a JSON value into the closest untyped value
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Bool(b) => Value::Boolean(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            Json::Null | Json::Object(_) => Value::Json(json.clone()),
        }
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt.fixed_offset())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Error reading an untyped value as a placeholder type
#[derive(Debug, Error)]
#[error("cannot read '{raw}' as {expected}: {reason}")]
pub struct ValueParseError {
    pub raw: String,
    pub expected: PlaceholderType,
    pub reason: String,
}

/// Fixed-point decimal number: `units * 10^-scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Decimal {
    units: i128,
    scale: u32,
}

/// Error parsing a decimal literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal '{0}'")]
pub struct ParseDecimalError(String);

impl Decimal {
    pub fn new(units: i128, scale: u32) -> Self {
        Self { units, scale }
    }

    pub fn units(&self) -> i128 {
        self.units
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn to_f64(&self) -> f64 {
        self.units as f64 / 10f64.powi(self.scale as i32)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int, frac) = body.split_once('.').unwrap_or((body, ""));

        if int.is_empty() && frac.is_empty() {
            return Err(err());
        }
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(int) || !all_digits(frac) || frac.len() > MAX_SCALE {
            return Err(err());
        }

        let magnitude: i128 = format!("{}{}", int, frac).parse().map_err(|_| err())?;
        Ok(Self {
            units: if negative { -magnitude } else { magnitude },
            scale: frac.len() as u32,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let digits = self.units.unsigned_abs().to_string();
        if self.scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let scale = self.scale as usize;
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int, frac)
    }
}

impl TryFrom<String> for Decimal {
    type Error = ParseDecimalError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Decimal> for String {
    fn from(d: Decimal) -> Self {
        d.to_string()
    }
}

mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => s
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid float '{}'", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_parse_and_display() {
        let d: Decimal = "12.50".parse().unwrap();
        assert_eq!(d, Decimal::new(1250, 2));
        assert_eq!(d.to_string(), "12.50");
        assert_eq!(Decimal::new(-5, 3).to_string(), "-0.005");
        assert_eq!(Decimal::new(42, 0).to_string(), "42");
        assert_eq!(".5".parse::<Decimal>().unwrap().to_string(), "0.5");
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        assert!("".parse::<Decimal>().is_err());
        assert!(".".parse::<Decimal>().is_err());
        assert!("1e5".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_parse_typed_number() {
        assert_eq!(
            Value::parse_typed(PlaceholderType::Number, "42").unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            Value::parse_typed(PlaceholderType::Number, " 2.5 ").unwrap(),
            Value::Float(2.5)
        );
        assert!(Value::parse_typed(PlaceholderType::Number, "many").is_err());
        assert!(Value::parse_typed(PlaceholderType::Number, "inf").is_err());
    }

    #[test]
    fn test_parse_typed_boolean_and_datetime() {
        assert_eq!(
            Value::parse_typed(PlaceholderType::Boolean, "Yes").unwrap(),
            Value::Boolean(true)
        );
        let dt = Value::parse_typed(PlaceholderType::DateTime, "2024-05-01 09:30").unwrap();
        match dt {
            Value::DateTime(dt) => assert_eq!(dt.to_rfc3339(), "2024-05-01T09:30:00+00:00"),
            other => panic!("expected date/time, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_typed_list() {
        assert_eq!(
            Value::parse_typed(PlaceholderType::List, "Bob, Carol").unwrap(),
            Value::List(vec![Value::from("Bob"), Value::from("Carol")])
        );
        assert_eq!(
            Value::parse_typed(PlaceholderType::List, "[1, true]").unwrap(),
            Value::List(vec![Value::Integer(1), Value::Boolean(true)])
        );
    }

    #[test]
    fn test_from_json_typed_null_is_absent() {
        let value = Value::from_json_typed(PlaceholderType::Text, &serde_json::Value::Null);
        assert!(matches!(value, Ok(None)));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Value::Decimal(Decimal::new(1999, 2))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "decimal", "value": "19.99"}));
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::Decimal(Decimal::new(1999, 2)));
    }

    #[test]
    fn test_non_finite_floats_survive_json() {
        for f in [f64::INFINITY, f64::NEG_INFINITY] {
            let json = serde_json::to_string(&Value::Float(f)).unwrap();
            assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), Value::Float(f));
        }

        let json = serde_json::to_value(Value::Float(f64::NAN)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "float", "value": "NaN"}));
        let back: Value = serde_json::from_value(json).unwrap();
        assert!(matches!(back, Value::Float(f) if f.is_nan()));

        let plain: Value = serde_json::from_str(r#"{"kind":"float","value":1.5}"#).unwrap();
        assert_eq!(plain, Value::Float(1.5));
        assert!(serde_json::from_str::<Value>(r#"{"kind":"float","value":"abc"}"#).is_err());
    }
}
