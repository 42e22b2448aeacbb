// OpenRosa XPath Date Overlay
//
// Binary-operator interception for operands the host does not know how to
// treat as dates. The host calls `handle_infix` when `type_of` reports a date
// on either side, and either takes the handled value as final or continues
// with its own operator semantics on the normalized operands.

use crate::coerce::{to_integer, to_string};
use crate::date::{epoch_millis, parse_date, shift_days};
use crate::errors::XPathExtError;
use crate::externalize::type_of;
use crate::model::{Argument, Value, ValueKind};
use crate::parser::BinaryOperator;
use chrono::NaiveDateTime;

/// Result of offering a binary operation to the date overlay
#[derive(Debug, Clone, PartialEq)]
pub enum InfixOutcome {
    /// The overlay produced the final value
    Handled(Value),

    /// The host should apply its own semantics to these operands
    NotHandled { lhs: Argument, rhs: Argument },
}

/// Applies the date overlay to `lhs op rhs`
///
/// - Comparisons convert string and sequence operands to dates. If either
///   side is then not a date, `!=` is true and every other comparison false;
///   otherwise both sides continue as epoch milliseconds.
/// - `+` and `-` shift the single date operand by the other operand rounded to
///   whole days (negated for `-`). Two dates are a
///   [`XPathExtError::DateArithmetic`] error.
/// - Other operators continue natively; for `*`, `div` and `mod` dates become
///   epoch milliseconds.
///
/// Operands without a date pass through untouched.
pub fn handle_infix(
    op: BinaryOperator,
    lhs: Argument,
    rhs: Argument,
) -> Result<InfixOutcome, XPathExtError> {
    let lhs_is_date = type_of(&lhs) == Some(ValueKind::Date);
    let rhs_is_date = type_of(&rhs) == Some(ValueKind::Date);
    if !lhs_is_date && !rhs_is_date {
        return Ok(InfixOutcome::NotHandled { lhs, rhs });
    }

    if op.is_comparison() {
        return Ok(match (comparable_date(&lhs), comparable_date(&rhs)) {
            (Some(left), Some(right)) => InfixOutcome::NotHandled {
                lhs: millis_operand(&left),
                rhs: millis_operand(&right),
            },
            _ => InfixOutcome::Handled(Value::Boolean(op == BinaryOperator::NotEquals)),
        });
    }

    match op {
        BinaryOperator::Addition | BinaryOperator::Subtraction => {
            let (date, offset) = match (&lhs, &rhs) {
                (Argument::Value(Value::Date(_)), Argument::Value(Value::Date(_))) => {
                    return Err(XPathExtError::DateArithmetic(format!(
                        "cannot apply '{}' to two dates",
                        op
                    )));
                }
                (Argument::Value(Value::Date(date)), other)
                | (other, Argument::Value(Value::Date(date))) => (date, other),
                _ => unreachable!("one operand is a date"),
            };

            let mut days = to_integer(offset);
            if op == BinaryOperator::Subtraction {
                days = -days;
            }

            shifted(date, days, offset).map(InfixOutcome::Handled)
        }
        _ if op.is_arithmetic() => Ok(InfixOutcome::NotHandled {
            lhs: numeric_operand(lhs),
            rhs: numeric_operand(rhs),
        }),
        _ => Ok(InfixOutcome::NotHandled { lhs, rhs }),
    }
}

/// A comparison operand as a date: dates as-is, strings and sequences parsed,
/// anything else not a date
fn comparable_date(arg: &Argument) -> Option<NaiveDateTime> {
    match arg {
        Argument::Value(Value::Date(date)) => Some(*date),
        Argument::Value(Value::String(_)) | Argument::Sequence(_) => parse_date(arg),
        Argument::Value(_) => None,
    }
}

fn millis_operand(date: &NaiveDateTime) -> Argument {
    Argument::Value(Value::Number(epoch_millis(date) as f64))
}

fn numeric_operand(arg: Argument) -> Argument {
    match arg {
        Argument::Value(Value::Date(date)) => millis_operand(&date),
        other => other,
    }
}

fn shifted(date: &NaiveDateTime, days: f64, offset: &Argument) -> Result<Value, XPathExtError> {
    if !days.is_finite() {
        return Err(XPathExtError::InvalidDate(format!(
            "cannot shift a date by '{}' days",
            to_string(offset)
        )));
    }

    shift_days(date, days as i64)
        .map(Value::Date)
        .ok_or_else(|| XPathExtError::InvalidDate(format!("{} days from {} is out of range", days, date)))
}
