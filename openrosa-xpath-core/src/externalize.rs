// OpenRosa XPath Result Externalization
//
// Conversion of engine values into the host's outward result shape, and the
// type hook the host uses to recognise dates among its operands.

use crate::coerce::value_to_string;
use crate::date::epoch_millis;
use crate::errors::XPathExtError;
use crate::model::{Argument, Value, ValueKind};
use serde::{Deserialize, Serialize};

/// Result kinds of the host's result protocol; it has no date kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Boolean,
    Number,
    String,
}

/// An engine value in the host's result shape
///
/// Only the fields relevant to `result_type` are populated, except for dates,
/// which carry both epoch milliseconds and their `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResult {
    pub result_type: ResultType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

impl ExternalResult {
    /// Converts the result to a JSON value
    pub fn to_json(&self) -> Result<serde_json::Value, XPathExtError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Converts an engine value into the host's result shape
pub fn to_external_result(value: &Value) -> ExternalResult {
    let empty = ExternalResult {
        result_type: ResultType::String,
        boolean_value: None,
        number_value: None,
        string_value: None,
    };

    match value {
        Value::Boolean(b) => ExternalResult {
            result_type: ResultType::Boolean,
            boolean_value: Some(*b),
            ..empty
        },
        Value::Number(n) => ExternalResult {
            result_type: ResultType::Number,
            number_value: Some(*n),
            ..empty
        },
        Value::String(_) => ExternalResult {
            string_value: Some(value_to_string(value)),
            ..empty
        },
        Value::Date(date) => ExternalResult {
            number_value: Some(epoch_millis(date) as f64),
            string_value: Some(date.format("%Y-%m-%d").to_string()),
            ..empty
        },
    }
}

/// Reports the engine-only kind of an operand, if it has one
///
/// Returns `Some(ValueKind::Date)` for a single date value and `None` for
/// everything the host already understands natively. The host uses this to
/// decide whether a binary operation must go through
/// [`handle_infix`](crate::infix::handle_infix).
pub fn type_of(arg: &Argument) -> Option<ValueKind> {
    arg.as_value()
        .filter(|value| value.is_date())
        .map(Value::kind)
}
