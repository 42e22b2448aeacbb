// OpenRosa XPath Core Implementation
//
// This crate provides the OpenRosa extension layer for XPath 1.0 hosts: the
// extension function table, the date overlay for binary operators and the
// result externalization hooks, plus a small reference host that evaluates
// expressions end to end.

pub mod coerce;
pub mod date;
pub mod errors;
pub mod evaluator;
pub mod extensions;
pub mod externalize;
pub mod format;
pub mod functions;
pub mod infix;
pub mod lexer;
pub mod model;
pub mod parser;

// Re-export the host integration surface
pub use errors::XPathExtError;
pub use evaluator::{AstVisitor, LoggingVisitor, NoopVisitor};
pub use extensions::Extensions;
pub use externalize::{to_external_result, type_of, ExternalResult, ResultType};
pub use format::{EnglishLocale, LocaleResolver, LocaleTable};
pub use infix::{handle_infix, InfixOutcome};
pub use model::{Argument, Value, ValueKind};

/// Evaluates an expression with the default English engine
///
/// The result is returned in the host's externalized JSON shape, for example
/// `{"resultType": "number", "numberValue": 3.0}`.
pub fn evaluate(expression: &str) -> Result<serde_json::Value, XPathExtError> {
    evaluate_with_visitor(expression, &NoopVisitor::new())
}

/// Evaluates an expression with the default English engine and a custom visitor
pub fn evaluate_with_visitor(
    expression: &str,
    visitor: &dyn AstVisitor,
) -> Result<serde_json::Value, XPathExtError> {
    let engine = Extensions::new();
    let value = engine.evaluate_with_visitor(expression, visitor)?;
    to_external_result(&value).to_json()
}
