//! Canonical field value representation shared by records, the evaluator and
//! the statistics layer.
//!
//! Coercions intentionally follow loose, script-style conversion rules:
//! missing or malformed numbers become `0`, and "falsy" values read as the
//! empty string when compared as text.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::query::date;

/// Typed value read from a record field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    /// Field is absent or explicitly empty.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value; integers are carried as `f64`.
    Number(f64),
    /// UTF-8 text. Date fields stored as ISO strings also arrive here.
    String(String),
    /// Calendar date already parsed by the record.
    #[serde(with = "date::iso")]
    Date(Date),
    /// Collection of text items.
    List(Vec<String>),
}

impl Value {
    /// Returns `true` when the value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric coercion where anything non-numeric becomes `0`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(v) => finite_or_zero(*v),
            Value::String(v) => parse_number(v),
            Value::Date(v) => date::epoch_millis(*v) as f64,
            Value::List(items) => match items.as_slice() {
                [] => 0.0,
                [single] => parse_number(single),
                _ => 0.0,
            },
        }
    }

    /// Truthiness: `false`, `0`, `NaN`, the empty string and null are false;
    /// dates and lists (even empty ones) are true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => *v,
            Value::Number(v) => *v != 0.0 && !v.is_nan(),
            Value::String(v) => !v.is_empty(),
            Value::Date(_) | Value::List(_) => true,
        }
    }

    /// Text form used by string comparisons: falsy values read as `""`.
    pub fn to_text(&self) -> String {
        if self.truthy() {
            self.to_string()
        } else {
            String::new()
        }
    }

    /// Borrows the items of a list value; every other value reads as empty.
    pub fn as_list(&self) -> &[String] {
        match self {
            Value::List(items) => items,
            _ => &[],
        }
    }

    /// Borrows the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Date(v) => f.write_str(&date::format_iso(*v)),
            Value::List(items) => f.write_str(&items.join(",")),
        }
    }
}

pub(crate) fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn number_coercion_defaults_to_zero() {
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::from("abc").to_number(), 0.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert_eq!(Value::from(" 42 ").to_number(), 42.0);
        assert_eq!(Value::from(true).to_number(), 1.0);
        assert_eq!(Value::Number(f64::NAN).to_number(), 0.0);
        assert_eq!(Value::List(vec!["7".into()]).to_number(), 7.0);
        assert_eq!(Value::List(vec!["7".into(), "8".into()]).to_number(), 0.0);
    }

    #[test]
    fn falsy_values_read_as_empty_text() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Bool(false).to_text(), "");
        assert_eq!(Value::Number(0.0).to_text(), "");
        assert_eq!(Value::Number(250.0).to_text(), "250");
        assert_eq!(Value::from("Smith").to_text(), "Smith");
        assert_eq!(Value::Date(date!(2024 - 03 - 05)).to_text(), "2024-03-05");
    }

    #[test]
    fn lists_are_truthy_even_when_empty() {
        assert!(Value::List(Vec::new()).truthy());
        assert!(Value::List(Vec::new()).as_list().is_empty());
        assert!(Value::from("x").as_list().is_empty());
    }

    #[test]
    fn tagged_json_shape() {
        let json = serde_json::to_string(&Value::Date(date!(2024 - 01 - 02))).unwrap();
        assert_eq!(json, r#"{"t":"Date","v":"2024-01-02"}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Date(date!(2024 - 01 - 02)));
    }
}
