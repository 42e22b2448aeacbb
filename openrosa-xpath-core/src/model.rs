// OpenRosa XPath Data Model
//
// This module defines the tagged values that flow through extension functions
// and the date overlay.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a tagged value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    Date,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// A tagged value understood by the extension engine
///
/// Dates are wall-clock calendar values in the local calendar; they carry no
/// zone offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value
    Boolean(bool),

    /// IEEE-754 double
    Number(f64),

    /// String value
    String(String),

    /// Calendar date (with time of day)
    Date(NaiveDateTime),
}

impl Value {
    /// Returns the kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Date(_) => ValueKind::Date,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::coerce::value_to_string(self))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }
}

/// An already-evaluated argument handed over by the host
///
/// The host passes either a single tagged value or the values of a node-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    /// A single tagged value
    Value(Value),

    /// A sequence of tagged values (a reduced node-set)
    Sequence(Vec<Value>),
}

impl Argument {
    /// Returns the single value, if this argument is not a sequence
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value),
            Argument::Sequence(_) => None,
        }
    }

    /// Returns the values of this argument, treating a single value as a
    /// one-element sequence
    pub fn values(&self) -> &[Value] {
        match self {
            Argument::Value(value) => std::slice::from_ref(value),
            Argument::Sequence(items) => items,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Argument::Sequence(_))
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Argument::Value(Value::Boolean(value))
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Argument::Value(Value::Number(value))
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Value(Value::from(value))
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Value(Value::String(value))
    }
}

impl From<NaiveDateTime> for Argument {
    fn from(value: NaiveDateTime) -> Self {
        Argument::Value(Value::Date(value))
    }
}

impl From<Vec<Value>> for Argument {
    fn from(items: Vec<Value>) -> Self {
        Argument::Sequence(items)
    }
}
