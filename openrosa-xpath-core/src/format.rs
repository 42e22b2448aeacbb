// OpenRosa XPath Date Formatter
//
// A single-pass interpreter for the `%`-escape date format language used by
// `format-date()`. Day and month names come from an injected locale resolver.

use crate::date::epoch_millis;
use crate::errors::XPathExtError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SHORT_DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const SHORT_MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Resolves display names for the date formatter
///
/// Keys are `date.dayofweek.<1-7>` (1 is Sunday) and `date.month.<1-12>`.
pub trait LocaleResolver {
    fn resolve(&self, key: &str) -> String;
}

impl<F> LocaleResolver for F
where
    F: Fn(&str) -> String,
{
    fn resolve(&self, key: &str) -> String {
        self(key)
    }
}

/// Short English day and month names; unknown keys resolve to themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLocale;

impl LocaleResolver for EnglishLocale {
    fn resolve(&self, key: &str) -> String {
        let lookup = |prefix: &str, names: &[&str]| {
            key.strip_prefix(prefix)
                .and_then(|index| index.parse::<usize>().ok())
                .and_then(|index| index.checked_sub(1))
                .and_then(|index| names.get(index))
                .map(|name| name.to_string())
        };

        lookup("date.dayofweek.", &SHORT_DAY_NAMES[..])
            .or_else(|| lookup("date.month.", &SHORT_MONTH_NAMES[..]))
            .unwrap_or_else(|| key.to_string())
    }
}

/// A table of translated names, typically loaded from JSON
///
/// Keys missing from the table fall back to [`EnglishLocale`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocaleTable {
    #[serde(flatten)]
    names: HashMap<String, String>,
}

impl LocaleTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a table from a JSON object of `key -> name`
    pub fn from_json(json: &str) -> Result<Self, XPathExtError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Adds or replaces a name
    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.names.insert(key.into(), name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl LocaleResolver for LocaleTable {
    fn resolve(&self, key: &str) -> String {
        match self.names.get(key) {
            Some(name) => name.clone(),
            None => EnglishLocale.resolve(key),
        }
    }
}

/// Formats a date according to a `%`-escape format string
///
/// Literal characters are copied through. Recognised escapes:
///
/// | escape | output |
/// |---|---|
/// | `%%` | literal `%` |
/// | `%Y` / `%y` | 4-digit / 2-digit year |
/// | `%m` / `%n` | zero-padded / bare month |
/// | `%b` | short month name |
/// | `%d` / `%e` | zero-padded / bare day of month |
/// | `%H` / `%h` | zero-padded / bare hour (24h) |
/// | `%M` / `%S` | zero-padded minute / second |
/// | `%3` | zero-padded milliseconds |
/// | `%a` | short weekday name |
///
/// A trailing `%` or any other escape is a [`XPathExtError::FormatError`].
pub fn format_date(
    date: &NaiveDateTime,
    format: &str,
    locale: &dyn LocaleResolver,
) -> Result<String, XPathExtError> {
    let mut output = String::with_capacity(format.len() + 8);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            output.push(c);
            continue;
        }

        let escape = chars.next().ok_or_else(|| XPathExtError::FormatError {
            format: format.to_string(),
            message: "'%' at end of format string".to_string(),
        })?;

        match escape {
            '%' => output.push('%'),
            'Y' => output.push_str(&format!("{:04}", date.year())),
            'y' => output.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            'm' => output.push_str(&format!("{:02}", date.month())),
            'n' => output.push_str(&date.month().to_string()),
            'b' => output.push_str(&locale.resolve(&format!("date.month.{}", date.month()))),
            'd' => output.push_str(&format!("{:02}", date.day())),
            'e' => output.push_str(&date.day().to_string()),
            'H' => output.push_str(&format!("{:02}", date.hour())),
            'h' => output.push_str(&date.hour().to_string()),
            'M' => output.push_str(&format!("{:02}", date.minute())),
            'S' => output.push_str(&format!("{:02}", date.second())),
            '3' => output.push_str(&format!("{:03}", epoch_millis(date).rem_euclid(1000))),
            'a' => output.push_str(&locale.resolve(&format!(
                "date.dayofweek.{}",
                date.weekday().num_days_from_sunday() + 1
            ))),
            other => {
                return Err(XPathExtError::FormatError {
                    format: format.to_string(),
                    message: format!("unrecognised escape '%{}'", other),
                });
            }
        }
    }

    Ok(output)
}
