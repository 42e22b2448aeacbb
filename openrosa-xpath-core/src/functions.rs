// OpenRosa XPath Extension Functions
//
// The fixed table of OpenRosa functions layered over the host's XPath 1.0
// core library. Every function takes already-evaluated arguments and returns
// exactly one tagged value; conversions go through `crate::coerce`.

use crate::coerce::{
    parse_int_prefix, round_half_away, to_boolean, to_float, to_integer, to_string,
    value_to_string,
};
use crate::date::{
    epoch_millis, months_between, parse_date, parse_host_millis, INVALID_DATE, MILLIS_PER_DAY,
};
use crate::errors::XPathExtError;
use crate::format::{format_date, LocaleResolver};
use crate::model::{Argument, Value};
use chrono::Local;
use rand::Rng;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "trace")]
use log::trace;

/// Signature shared by every extension function
pub type ExtensionFn = fn(&CallContext<'_>, &[Argument]) -> Result<Value, XPathExtError>;

/// Per-call dependencies handed to extension functions
pub struct CallContext<'a> {
    pub locale: &'a dyn LocaleResolver,
}

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }

    pub fn describe(self) -> String {
        match self {
            Arity::Exact(n) => n.to_string(),
            Arity::Range(min, max) => format!("{} to {}", min, max),
            Arity::AtLeast(min) => format!("at least {}", min),
        }
    }
}

/// A named entry of the function table
#[derive(Clone, Copy)]
pub struct ExtensionFunction {
    pub name: &'static str,
    /// The canonical name whose implementation this entry runs
    pub implementation_of: &'static str,
    pub arity: Arity,
    implementation: ExtensionFn,
}

impl fmt::Debug for ExtensionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionFunction")
            .field("name", &self.name)
            .field("implementation_of", &self.implementation_of)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl ExtensionFunction {
    /// Checks the argument count and runs the function
    pub fn call(&self, context: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
        if !self.arity.accepts(args.len()) {
            return Err(XPathExtError::ArityError {
                function: self.name.to_string(),
                expected: self.arity.describe(),
                actual: args.len(),
            });
        }
        (self.implementation)(context, args)
    }

    /// Whether two entries share one implementation (aliases do)
    pub fn same_implementation(&self, other: &ExtensionFunction) -> bool {
        self.implementation_of == other.implementation_of
    }

    pub fn is_alias(&self) -> bool {
        self.name != self.implementation_of
    }
}

/// Immutable name -> function mapping, built once by [`build_function_table`]
#[derive(Debug, Clone)]
pub struct FunctionTable {
    functions: HashMap<&'static str, ExtensionFunction>,
}

impl FunctionTable {
    pub fn get(&self, name: &str) -> Option<&ExtensionFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// All function names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Looks up and calls a function
    pub fn call(
        &self,
        name: &str,
        context: &CallContext<'_>,
        args: &[Argument],
    ) -> Result<Value, XPathExtError> {
        let function = self
            .get(name)
            .ok_or_else(|| XPathExtError::UnknownFunction(name.to_string()))?;

        #[cfg(feature = "trace")]
        trace!("calling extension '{}' with {} argument(s)", name, args.len());

        function.call(context, args)
    }
}

/// Builds the OpenRosa function table
///
/// Aliases (`date-time`, `decimal-date-time`, `format-date-time`, `today`)
/// are copies of the entry they alias under a second name.
pub fn build_function_table() -> FunctionTable {
    let entries: [(&'static str, Arity, ExtensionFn); 23] = [
        ("boolean-from-string", Arity::Exact(1), boolean_from_string),
        ("coalesce", Arity::Exact(2), coalesce),
        ("count-selected", Arity::Exact(1), count_selected),
        ("date", Arity::Exact(1), date),
        ("decimal-date", Arity::Exact(1), decimal_date),
        ("difference-in-months", Arity::Exact(2), difference_in_months),
        ("false", Arity::Exact(0), false_),
        ("format-date", Arity::Exact(2), format_date_function),
        ("if", Arity::Exact(3), if_),
        ("int", Arity::Exact(1), int),
        ("join", Arity::AtLeast(1), join),
        ("max", Arity::AtLeast(1), max),
        ("min", Arity::AtLeast(1), min),
        ("not", Arity::Exact(1), not),
        ("now", Arity::Exact(0), now),
        ("pow", Arity::Exact(2), pow),
        ("random", Arity::Exact(0), random),
        ("regex", Arity::Exact(2), regex),
        ("round", Arity::Range(1, 2), round),
        ("selected", Arity::Exact(2), selected),
        ("substr", Arity::Range(2, 3), substr),
        ("true", Arity::Exact(0), true_),
        ("uuid", Arity::Exact(0), uuid),
    ];

    let aliases: [(&'static str, &'static str); 4] = [
        ("date-time", "date"),
        ("decimal-date-time", "decimal-date"),
        ("format-date-time", "format-date"),
        ("today", "now"),
    ];

    let mut functions: HashMap<&'static str, ExtensionFunction> = entries
        .into_iter()
        .map(|(name, arity, implementation)| {
            (
                name,
                ExtensionFunction {
                    name,
                    implementation_of: name,
                    arity,
                    implementation,
                },
            )
        })
        .collect();

    for (alias, canonical) in aliases {
        if let Some(&function) = functions.get(canonical) {
            functions.insert(
                alias,
                ExtensionFunction {
                    name: alias,
                    ..function
                },
            );
        }
    }

    FunctionTable { functions }
}

fn boolean_from_string(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let s = to_string(&args[0]);
    Ok(Value::Boolean(s == "1" || s == "true"))
}

fn coalesce(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let first = to_string(&args[0]);
    if first.is_empty() {
        Ok(Value::String(to_string(&args[1])))
    } else {
        Ok(Value::String(first))
    }
}

fn count_selected(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let count = to_string(&args[0]).split_whitespace().count();
    Ok(Value::Number(count as f64))
}

fn date(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(match parse_date(&args[0]) {
        Some(date) => Value::Date(date),
        None => Value::String(INVALID_DATE.to_string()),
    })
}

fn decimal_date(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let millis = match &args[0] {
        Argument::Value(Value::Date(date)) => Some(epoch_millis(date)),
        other => parse_host_millis(&to_string(other)),
    };
    Ok(Value::Number(
        millis.map_or(f64::NAN, |ms| ms as f64 / MILLIS_PER_DAY),
    ))
}

fn difference_in_months(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(match (parse_date(&args[0]), parse_date(&args[1])) {
        (Some(from), Some(to)) => Value::Number(months_between(&from, &to) as f64),
        _ => Value::String(String::new()),
    })
}

fn format_date_function(
    context: &CallContext<'_>,
    args: &[Argument],
) -> Result<Value, XPathExtError> {
    let Some(date) = parse_date(&args[0]) else {
        return Ok(Value::String(String::new()));
    };
    let formatted = format_date(&date, &to_string(&args[1]), context.locale)?;
    Ok(Value::String(formatted))
}

fn if_(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let chosen = if to_boolean(&args[0]) { &args[1] } else { &args[2] };
    Ok(Value::String(to_string(chosen)))
}

fn int(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let s = to_string(&args[0]);
    // Negative exponents mean a magnitude below one
    if s.find("e-").is_some_and(|index| index > 0) {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(parse_int_prefix(&s)))
}

fn join(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let delimiter = to_string(&args[0]);
    let parts: Vec<String> = match &args[1..] {
        [items] if items.is_sequence() => items.values().iter().map(value_to_string).collect(),
        rest => rest.iter().map(to_string).collect(),
    };
    Ok(Value::String(parts.join(&delimiter)))
}

/// Numeric values of every argument, with sequences flattened
fn numbers(args: &[Argument]) -> Vec<f64> {
    args.iter()
        .flat_map(|arg| arg.values())
        .map(|value| to_float(&Argument::Value(value.clone())))
        .collect()
}

fn extreme(args: &[Argument], pick: fn(f64, f64) -> f64) -> Value {
    let values = numbers(args);
    if values.is_empty() || values.iter().any(|n| n.is_nan()) {
        return Value::Number(f64::NAN);
    }
    Value::Number(values.into_iter().reduce(pick).unwrap_or(f64::NAN))
}

fn max(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(extreme(args, f64::max))
}

fn min(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(extreme(args, f64::min))
}

/// Negates the raw value's own truthiness instead of going through
/// `to_boolean`: zero, NaN and the empty string are falsy, dates and
/// sequences are truthy.
fn not(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let truthy = match &args[0] {
        Argument::Value(Value::Boolean(b)) => *b,
        Argument::Value(Value::Number(n)) => *n != 0.0 && !n.is_nan(),
        Argument::Value(Value::String(s)) => !s.is_empty(),
        Argument::Value(Value::Date(_)) | Argument::Sequence(_) => true,
    };
    Ok(Value::Boolean(!truthy))
}

fn now(_: &CallContext<'_>, _: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(Value::Date(Local::now().naive_local()))
}

/// `x^y` with the host's NaN rules: a NaN exponent is NaN even for `1^y`
fn pow(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let (base, exponent) = (to_float(&args[0]), to_float(&args[1]));
    if exponent.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(base.powf(exponent)))
}

fn random(_: &CallContext<'_>, _: &[Argument]) -> Result<Value, XPathExtError> {
    let mut rng = rand::rng();
    Ok(Value::Number(rng.random::<f64>()))
}

fn regex(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let pattern = to_string(&args[1]);
    let compiled =
        Regex::new(&pattern).map_err(|e| XPathExtError::InvalidPattern(format!("{}: {}", pattern, e)))?;
    Ok(Value::Boolean(compiled.is_match(&to_string(&args[0]))))
}

fn round(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let number = to_float(&args[0]);
    let digits = args.get(1).map(to_integer).unwrap_or(0.0);

    let rounded = if digits > 0.0 {
        let scale = 10f64.powf(digits);
        round_half_away(number * scale) / scale
    } else if digits < 0.0 {
        let scale = 10f64.powf(-digits);
        round_half_away(number / scale) * scale
    } else {
        round_half_away(number)
    };

    Ok(Value::Number(rounded))
}

fn selected(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let haystack = to_string(&args[0]);
    let needle = to_string(&args[1]);
    let needle = needle.trim();
    Ok(Value::Boolean(
        haystack.split_whitespace().any(|token| token == needle),
    ))
}

/// Resolves a slice index against a length: negative counts from the end,
/// NaN is zero, and the result is clamped to `0..=len`
fn slice_index(index: f64, len: usize) -> usize {
    if index.is_nan() {
        return 0;
    }
    let len_f = len as f64;
    let index = index.trunc();
    if index < 0.0 {
        (len_f + index).max(0.0) as usize
    } else {
        index.min(len_f) as usize
    }
}

fn substr(_: &CallContext<'_>, args: &[Argument]) -> Result<Value, XPathExtError> {
    let units: Vec<u16> = to_string(&args[0]).encode_utf16().collect();
    let start = slice_index(to_integer(&args[1]), units.len());
    let end = match args.get(2) {
        Some(end) => slice_index(to_integer(end), units.len()),
        None => units.len(),
    };

    if start >= end {
        return Ok(Value::String(String::new()));
    }
    Ok(Value::String(String::from_utf16_lossy(&units[start..end])))
}

fn true_(_: &CallContext<'_>, _: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(Value::Boolean(true))
}

fn false_(_: &CallContext<'_>, _: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(Value::Boolean(false))
}

fn uuid(_: &CallContext<'_>, _: &[Argument]) -> Result<Value, XPathExtError> {
    Ok(Value::String(Uuid::new_v4().to_string()))
}
