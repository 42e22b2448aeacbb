// OpenRosa XPath Date Handling
//
// Parsing of values into calendar dates and the epoch-day arithmetic used by
// the date functions and the infix overlay.

use crate::coerce::{parse_int_prefix, to_string};
use crate::model::{Argument, Value};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Sentinel string returned by `date()` when a value is not a date
pub const INVALID_DATE: &str = "Invalid Date";

static RAW_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("BUG: invalid RAW_NUMBER regex literal")
});

static DATE_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:T\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .expect("BUG: invalid DATE_STRING regex literal")
});

/// Midnight on day 0 of the epoch
pub fn epoch() -> NaiveDateTime {
    // The default naive date-time is 1970-01-01T00:00:00
    NaiveDateTime::default()
}

/// Converts an argument to a date following the `date()` rules
///
/// Dates are copied. A bare (optionally signed, optionally fractional) integer
/// is a day offset from the epoch with its fraction truncated. An ISO calendar
/// date, optionally followed by a time and zone, yields that calendar day at
/// midnight; the time and zone are ignored. Anything else is not a date.
pub fn parse_date(arg: &Argument) -> Option<NaiveDateTime> {
    if let Argument::Value(Value::Date(date)) = arg {
        return Some(*date);
    }

    let text = to_string(arg);
    if RAW_NUMBER.is_match(&text) {
        let days = parse_int_prefix(&text);
        if !days.is_finite() {
            return None;
        }
        return from_day_offset(days as i64);
    }

    let caps = DATE_STRING.captures(&text)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

/// The date `days` days after the epoch, at midnight
pub fn from_day_offset(days: i64) -> Option<NaiveDateTime> {
    epoch().checked_add_signed(Duration::try_days(days)?)
}

/// Whole days between the epoch and the calendar day of `date`
pub fn day_offset(date: &NaiveDateTime) -> i64 {
    (date.date() - epoch().date()).num_days()
}

/// Milliseconds since the epoch, in the local wall-clock calendar
pub fn epoch_millis(date: &NaiveDateTime) -> i64 {
    date.and_utc().timestamp_millis()
}

/// Moves a date by whole days, keeping its time of day
pub fn shift_days(date: &NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// Parses a date string the way the host's native date parser does, returning
/// epoch milliseconds
///
/// A bare `YYYY-MM-DD` is taken at UTC midnight, RFC 3339 date-times are
/// converted to UTC, and zone-less date-times are read as wall-clock time.
pub fn parse_host_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|d| epoch_millis(&d));
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|d| epoch_millis(&d))
}

/// Calendar months between two dates, minus one when the day of month of the
/// later date has not yet reached that of the earlier one
pub fn months_between(from: &NaiveDateTime, to: &NaiveDateTime) -> i64 {
    use chrono::Datelike;

    let years = i64::from(to.year() - from.year());
    let months = i64::from(to.month()) - i64::from(from.month());
    let adjustment = if to.day() >= from.day() { 0 } else { -1 };
    years * 12 + months + adjustment
}
