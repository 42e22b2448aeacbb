// OpenRosa XPath Extension Engine
//
// Bundles the immutable function table with the locale resolver used by the
// date formatter. One engine can serve any number of evaluations.

use crate::errors::XPathExtError;
use crate::evaluator::{evaluate_expression_with_visitor, AstVisitor, NoopVisitor};
use crate::format::{EnglishLocale, LocaleResolver};
use crate::functions::{build_function_table, CallContext, FunctionTable};
use crate::infix::{handle_infix, InfixOutcome};
use crate::model::{Argument, Value};
use crate::parser::BinaryOperator;

/// The OpenRosa extension engine
pub struct Extensions {
    functions: FunctionTable,
    locale: Box<dyn LocaleResolver + Send + Sync>,
}

impl Default for Extensions {
    fn default() -> Self {
        Self::new()
    }
}

impl Extensions {
    /// Creates an engine with English month and weekday names
    pub fn new() -> Self {
        Self::with_locale(EnglishLocale)
    }

    /// Creates an engine that resolves `%a` and `%b` names through `locale`
    pub fn with_locale<L>(locale: L) -> Self
    where
        L: LocaleResolver + Send + Sync + 'static,
    {
        Self {
            functions: build_function_table(),
            locale: Box::new(locale),
        }
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn locale(&self) -> &dyn LocaleResolver {
        self.locale.as_ref()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// Invokes an extension function with already-evaluated arguments
    pub fn call(&self, name: &str, args: &[Argument]) -> Result<Value, XPathExtError> {
        let context = CallContext {
            locale: self.locale(),
        };
        self.functions.call(name, &context, args)
    }

    /// Offers a binary operation to the date overlay
    pub fn handle_infix(
        &self,
        op: BinaryOperator,
        lhs: Argument,
        rhs: Argument,
    ) -> Result<InfixOutcome, XPathExtError> {
        handle_infix(op, lhs, rhs)
    }

    /// Evaluates an expression with the reference host
    pub fn evaluate(&self, expression: &str) -> Result<Value, XPathExtError> {
        self.evaluate_with_visitor(expression, &NoopVisitor::new())
    }

    /// Evaluates an expression with the reference host and a custom visitor
    pub fn evaluate_with_visitor(
        &self,
        expression: &str,
        visitor: &dyn AstVisitor,
    ) -> Result<Value, XPathExtError> {
        evaluate_expression_with_visitor(expression, self, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::from_day_offset;

    #[test]
    fn test_custom_locale_is_used_by_format_date() {
        let engine = Extensions::with_locale(|key: &str| match key {
            "date.month.1" => "janv.".to_string(),
            other => other.to_string(),
        });
        let date = Argument::from(from_day_offset(0).unwrap());
        let result = engine
            .call("format-date", &[date, Argument::from("%b %Y")])
            .unwrap();
        assert_eq!(result, Value::from("janv. 1970"));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extensions>();
    }
}
