//! Template parameters and entity binding
//!
//! NLU output is loose JSON: codes may arrive lower-cased, flight numbers as
//! `"UA123"`, limits as strings. [`Template::bind`](super::Template::bind)
//! turns [`Entities`] into typed [`Params`] or a [`ParamError`].

use crate::graph::PropertyValue;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Bound parameters, passed out-of-band with a statement
pub type Params = IndexMap<String, PropertyValue>;

/// Parameter names recognized by the templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Origin,
    Destination,
    FlightNumber,
    Code,
    Limit,
}

impl Param {
    pub fn as_str(&self) -> &'static str {
        match self {
            Param::Origin => "origin",
            Param::Destination => "destination",
            Param::FlightNumber => "flight_number",
            Param::Code => "code",
            Param::Limit => "limit",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter binding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("missing required parameter '{param}' for intent '{intent}'")]
    Missing { intent: &'static str, param: Param },

    #[error("invalid value {value} for parameter '{param}': {reason}")]
    Invalid {
        param: Param,
        value: String,
        reason: &'static str,
    },
}

pub type ParamResult<T> = Result<T, ParamError>;

/// Values used when an optional parameter is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindDefaults {
    pub limit: i64,
}

impl Default for BindDefaults {
    fn default() -> Self {
        Self { limit: 5 }
    }
}

/// Entities extracted from a question
///
/// Values are kept as raw JSON so that whatever the extractor emitted can be
/// coerced (or rejected) at bind time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<serde_json::Value>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(origin: &str, destination: &str) -> Self {
        Self::new().with_origin(origin).with_destination(destination)
    }

    pub fn flight(number: i64) -> Self {
        Self {
            flight_number: Some(number.into()),
            ..Self::default()
        }
    }

    pub fn airport(code: &str) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn get(&self, param: Param) -> Option<&serde_json::Value> {
        let value = match param {
            Param::Origin => self.origin.as_ref(),
            Param::Destination => self.destination.as_ref(),
            Param::FlightNumber => self.flight_number.as_ref(),
            Param::Code => self.code.as_ref(),
            Param::Limit => self.limit.as_ref(),
        };
        value.filter(|v| !is_blank(v))
    }

    /// Station code value, normalized, if present
    pub fn station(&self, param: Param) -> Option<String> {
        self.get(param).and_then(value_text).map(|s| s.trim().to_ascii_uppercase())
    }

    /// True when no field carries a usable value
    pub fn is_empty(&self) -> bool {
        [
            Param::Origin,
            Param::Destination,
            Param::FlightNumber,
            Param::Code,
            Param::Limit,
        ]
        .iter()
        .all(|p| self.get(*p).is_none())
    }
}

/// Null, empty and the literal strings "null"/"none" all count as absent
fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none")
        }
        _ => false,
    }
}

fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").unwrap())
}

/// Leading two-character carrier code, which may itself hold a digit (`B6`, `9E`)
fn carrier_prefix() -> &'static Regex {
    static CARRIER: OnceLock<Regex> = OnceLock::new();
    CARRIER.get_or_init(|| Regex::new(r"^\s*(?:[A-Za-z][A-Za-z0-9]|[0-9][A-Za-z])\s*(\d.*)$").unwrap())
}

fn flight_digits(text: &str) -> Option<i64> {
    let rest = carrier_prefix()
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());
    digits().find_iter(rest).last()?.as_str().parse().ok()
}

pub(crate) fn bind_station(param: Param, value: &serde_json::Value) -> ParamResult<PropertyValue> {
    match value {
        serde_json::Value::String(s) => Ok(PropertyValue::String(s.trim().to_ascii_uppercase())),
        other => Err(ParamError::Invalid {
            param,
            value: other.to_string(),
            reason: "expected an airport code",
        }),
    }
}

pub(crate) fn bind_flight_number(value: &serde_json::Value) -> ParamResult<PropertyValue> {
    let invalid = |reason| ParamError::Invalid {
        param: Param::FlightNumber,
        value: value.to_string(),
        reason,
    };
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(PropertyValue::Integer(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Ok(PropertyValue::Integer(f as i64)),
                    _ => Err(invalid("expected a whole flight number")),
                }
            }
        }
        // "2411", "UA 2411" and "flight 2411" all resolve to 2411
        serde_json::Value::String(s) => flight_digits(s)
            .map(PropertyValue::Integer)
            .ok_or_else(|| invalid("no digits in flight number")),
        _ => Err(invalid("expected a flight number")),
    }
}

pub(crate) fn bind_limit(value: Option<&serde_json::Value>, default: i64) -> ParamResult<PropertyValue> {
    let Some(value) = value else {
        return Ok(PropertyValue::Integer(default));
    };
    let invalid = |reason| ParamError::Invalid {
        param: Param::Limit,
        value: value.to_string(),
        reason,
    };
    let limit = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| invalid("expected a whole number"))?,
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid("expected a whole number"))?,
        _ => return Err(invalid("expected a whole number")),
    };
    if limit < 1 {
        return Err(invalid("limit must be at least 1"));
    }
    Ok(PropertyValue::Integer(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values_are_absent() {
        let entities: Entities = serde_json::from_value(json!({
            "origin": "null",
            "destination": "",
            "flight_number": null,
            "code": "lax"
        }))
        .unwrap();
        assert!(entities.get(Param::Origin).is_none());
        assert!(entities.get(Param::Destination).is_none());
        assert!(entities.get(Param::FlightNumber).is_none());
        assert_eq!(entities.station(Param::Code).as_deref(), Some("LAX"));
        assert!(!entities.is_empty());
        assert!(Entities::new().is_empty());
    }

    #[test]
    fn test_flight_number_coercion() {
        assert_eq!(bind_flight_number(&json!(2411)).unwrap(), PropertyValue::Integer(2411));
        assert_eq!(bind_flight_number(&json!("UA123")).unwrap(), PropertyValue::Integer(123));
        assert_eq!(bind_flight_number(&json!(" 924 ")).unwrap(), PropertyValue::Integer(924));
        assert_eq!(bind_flight_number(&json!(88.0)).unwrap(), PropertyValue::Integer(88));
        assert!(bind_flight_number(&json!("UA")).is_err());
        assert!(bind_flight_number(&json!(1.5)).is_err());
        assert!(bind_flight_number(&json!(true)).is_err());
    }

    #[test]
    fn test_flight_number_with_digit_in_carrier_code() {
        assert_eq!(bind_flight_number(&json!("B6 123")).unwrap(), PropertyValue::Integer(123));
        assert_eq!(bind_flight_number(&json!("9E 4012")).unwrap(), PropertyValue::Integer(4012));
        assert_eq!(bind_flight_number(&json!("B6123")).unwrap(), PropertyValue::Integer(123));
        assert_eq!(bind_flight_number(&json!("flight 9E 4012")).unwrap(), PropertyValue::Integer(4012));
        assert_eq!(bind_flight_number(&json!("2411")).unwrap(), PropertyValue::Integer(2411));
    }

    #[test]
    fn test_limit_binding() {
        assert_eq!(bind_limit(None, 5).unwrap(), PropertyValue::Integer(5));
        assert_eq!(bind_limit(Some(&json!("3")), 5).unwrap(), PropertyValue::Integer(3));
        assert!(matches!(
            bind_limit(Some(&json!(0)), 5),
            Err(ParamError::Invalid { param: Param::Limit, .. })
        ));
    }

    #[test]
    fn test_station_binding() {
        assert_eq!(
            bind_station(Param::Origin, &json!(" ord ")).unwrap(),
            PropertyValue::String("ORD".into())
        );
        assert!(bind_station(Param::Origin, &json!(12)).is_err());
    }
}
