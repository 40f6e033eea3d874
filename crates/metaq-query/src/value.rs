use std::fmt;

use bson::Bson;
use serde::{Deserialize, Serialize};

use crate::error::CriterionError;

/// A scalar literal compared against a column or a meta value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl TryFrom<&Bson> for Value {
    type Error = CriterionError;

    fn try_from(value: &Bson) -> Result<Self, Self::Error> {
        match value {
            Bson::String(s) => Ok(Value::String(s.clone())),
            Bson::Int32(n) => Ok(Value::Int(*n as i64)),
            Bson::Int64(n) => Ok(Value::Int(*n)),
            Bson::Double(n) => Ok(Value::Float(*n)),
            Bson::Boolean(b) => Ok(Value::Bool(*b)),
            Bson::Null => Ok(Value::Null),
            other => Err(CriterionError::Malformed(format!(
                "unsupported value type: {:?}",
                other.element_type()
            ))),
        }
    }
}
