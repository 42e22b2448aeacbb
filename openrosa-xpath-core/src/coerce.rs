// OpenRosa XPath Coercions
//
// The four conversions every extension function and the date overlay go
// through. They never fail: bad input degrades to NaN, an empty string or
// false, matching the host's own string/number coercion rules.

use crate::model::{Argument, Value};
use chrono::{NaiveDateTime, Timelike};

/// Converts an argument to a boolean
///
/// Booleans pass through; everything else is stringified and is true when
/// non-empty. Numbers therefore do not use numeric truthiness: `0` is true.
pub fn to_boolean(arg: &Argument) -> bool {
    match arg {
        Argument::Value(Value::Boolean(b)) => *b,
        _ => !to_string(arg).is_empty(),
    }
}

/// Converts an argument to an integer-valued float (round half away from zero)
pub fn to_integer(arg: &Argument) -> f64 {
    round_half_away(to_float(arg))
}

/// Converts an argument to a float
///
/// Numbers pass through; anything else parses the leading numeric prefix of
/// its string form, yielding NaN when there is none.
pub fn to_float(arg: &Argument) -> f64 {
    match arg {
        Argument::Value(Value::Number(n)) => *n,
        _ => parse_float_prefix(&to_string(arg)),
    }
}

/// Converts an argument to a string
///
/// A sequence yields the string form of its first element, or `""` when empty.
pub fn to_string(arg: &Argument) -> String {
    match arg {
        Argument::Value(value) => value_to_string(value),
        Argument::Sequence(items) => items.first().map(value_to_string).unwrap_or_default(),
    }
}

/// String form of a single tagged value
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => s.clone(),
        Value::Date(d) => date_to_string(d),
    }
}

/// Formats a number the way the host prints numbers
///
/// Integral values print without a fraction, very large and very small
/// magnitudes switch to exponent notation with an explicit exponent sign.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }

    format!("{}", n)
}

/// String form of a date: `YYYY-MM-DD` at midnight, otherwise with time and milliseconds
pub fn date_to_string(date: &NaiveDateTime) -> String {
    if date.time().num_seconds_from_midnight() == 0 && date.time().nanosecond() == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

/// Rounds half-way cases away from zero (`-1.5 -> -2`, `2.5 -> 3`)
pub fn round_half_away(n: f64) -> f64 {
    n.round()
}

/// Parses the longest numeric prefix of a string, after leading whitespace
///
/// Accepts an optional sign, digits with an optional fraction, an optional
/// exponent and `Infinity`. Returns NaN when no digits are found.
pub fn parse_float_prefix(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    if end < len && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return f64::NAN;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Parses the leading base-10 integer of a string, truncating any fraction
///
/// Returns NaN when no digits are found.
pub fn parse_int_prefix(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return f64::NAN;
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_to_boolean_uses_string_truthiness() {
        assert!(to_boolean(&Argument::from(true)));
        assert!(!to_boolean(&Argument::from(false)));
        assert!(to_boolean(&Argument::from(0.0)));
        assert!(to_boolean(&Argument::from("false")));
        assert!(!to_boolean(&Argument::from("")));
        assert!(!to_boolean(&Argument::Sequence(vec![])));
    }

    #[test]
    fn test_to_float_reads_numeric_prefix() {
        assert_eq!(to_float(&Argument::from(" 12.5kg")), 12.5);
        assert_eq!(to_float(&Argument::from("-3e2x")), -300.0);
        assert_eq!(to_float(&Argument::from(".5")), 0.5);
        assert_eq!(to_float(&Argument::from("7.")), 7.0);
        assert_eq!(to_float(&Argument::from("1e")), 1.0);
        assert!(to_float(&Argument::from("abc")).is_nan());
        assert!(to_float(&Argument::from(true)).is_nan());
        assert!(to_float(&Argument::from("-")).is_nan());
        assert_eq!(to_float(&Argument::from("-Infinity")), f64::NEG_INFINITY);
    }

    #[test]
    fn test_to_integer_rounds_half_away_from_zero() {
        assert_eq!(to_integer(&Argument::from("2.5")), 3.0);
        assert_eq!(to_integer(&Argument::from(-1.5)), -2.0);
        assert_eq!(to_integer(&Argument::from(1.49)), 1.0);
        assert!(to_integer(&Argument::from("x")).is_nan());
    }

    #[test]
    fn test_to_string_of_sequence_takes_first_element() {
        let seq = Argument::Sequence(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(to_string(&seq), "a");
        assert_eq!(to_string(&Argument::Sequence(vec![])), "");
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(23.78), "23.78");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(123456.0), "123456");
    }

    #[test]
    fn test_date_to_string() {
        let midnight = NaiveDate::from_ymd_opt(2015, 10, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(date_to_string(&midnight), "2015-10-01");

        let afternoon = NaiveDate::from_ymd_opt(2015, 10, 1)
            .unwrap()
            .and_hms_milli_opt(14, 5, 9, 20)
            .unwrap();
        assert_eq!(date_to_string(&afternoon), "2015-10-01T14:05:09.020");
    }

    #[test]
    fn test_parse_int_prefix_truncates() {
        assert_eq!(parse_int_prefix("12.9"), 12.0);
        assert_eq!(parse_int_prefix("  -7abc"), -7.0);
        assert_eq!(parse_int_prefix("1e5"), 1.0);
        assert!(parse_int_prefix("abc").is_nan());
    }
}
