// OpenRosa XPath Reference Host Evaluator
//
// A small XPath 1.0 evaluator over literals, function calls and operators.
// Function calls resolve against the extension table first and the XPath core
// library second; binary operations with a date operand go through the date
// overlay before the native XPath semantics apply.

use crate::coerce::value_to_string;
use crate::date::epoch_millis;
use crate::errors::XPathExtError;
use crate::extensions::Extensions;
use crate::externalize::type_of;
use crate::functions::Arity;
use crate::infix::InfixOutcome;
use crate::lexer::tokenize;
use crate::model::{Argument, Value};
use crate::parser::{parse, AstNode, BinaryOperator, UnaryOperator};
use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(feature = "trace")]
use log::{debug, trace};

/// XPath 1.0 `Number` production, surrounding whitespace allowed
static XPATH_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-?([0-9]+(\.[0-9]*)?|\.[0-9]+)\s*$")
        .expect("BUG: invalid XPath number regex literal")
});

/// Context for expression evaluation
pub struct EvaluationContext<'a> {
    /// The extension engine serving function calls and the date overlay
    pub extensions: &'a Extensions,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(extensions: &'a Extensions) -> Self {
        Self { extensions }
    }
}

/// Trait for visiting AST nodes during evaluation
pub trait AstVisitor {
    /// Called before evaluating an AST node
    fn before_evaluate(&self, node: &AstNode, context: &EvaluationContext<'_>);

    /// Called after evaluating an AST node
    fn after_evaluate(
        &self,
        node: &AstNode,
        context: &EvaluationContext<'_>,
        result: &Result<Value, XPathExtError>,
    );
}

/// A visitor that logs AST evaluation steps
pub struct LoggingVisitor {
    depth: std::cell::Cell<usize>,
}

impl Default for LoggingVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingVisitor {
    /// Creates a new logging visitor
    pub fn new() -> Self {
        Self {
            depth: std::cell::Cell::new(0),
        }
    }

    /// Nesting depth of the node currently being evaluated
    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

impl AstVisitor for LoggingVisitor {
    fn before_evaluate(&self, _node: &AstNode, _context: &EvaluationContext<'_>) {
        #[cfg(feature = "trace")]
        trace!("{}Evaluating: {:?}", "  ".repeat(self.depth()), _node);
        self.depth.set(self.depth.get() + 1);
    }

    fn after_evaluate(
        &self,
        _node: &AstNode,
        _context: &EvaluationContext<'_>,
        _result: &Result<Value, XPathExtError>,
    ) {
        self.depth.set(self.depth.get().saturating_sub(1));
        #[cfg(feature = "trace")]
        {
            let indent = "  ".repeat(self.depth());
            match _result {
                Ok(value) => trace!("{}Result for {:?}: {:?}", indent, _node, value),
                Err(err) => debug!("{}Error evaluating {:?}: {:?}", indent, _node, err),
            }
        }
    }
}

/// A no-op visitor that does nothing
pub struct NoopVisitor;

impl Default for NoopVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopVisitor {
    /// Creates a new no-op visitor
    pub fn new() -> Self {
        Self
    }
}

impl AstVisitor for NoopVisitor {
    fn before_evaluate(&self, _node: &AstNode, _context: &EvaluationContext<'_>) {}

    fn after_evaluate(
        &self,
        _node: &AstNode,
        _context: &EvaluationContext<'_>,
        _result: &Result<Value, XPathExtError>,
    ) {
    }
}

/// Evaluates an expression AST
pub fn evaluate_ast(node: &AstNode, context: &EvaluationContext<'_>) -> Result<Value, XPathExtError> {
    evaluate_ast_with_visitor(node, context, &NoopVisitor::new())
}

/// Evaluates an expression AST with a custom visitor
pub fn evaluate_ast_with_visitor(
    node: &AstNode,
    context: &EvaluationContext<'_>,
    visitor: &dyn AstVisitor,
) -> Result<Value, XPathExtError> {
    visitor.before_evaluate(node, context);
    let result = evaluate_node(node, context, visitor);
    visitor.after_evaluate(node, context, &result);
    result
}

fn evaluate_node(
    node: &AstNode,
    context: &EvaluationContext<'_>,
    visitor: &dyn AstVisitor,
) -> Result<Value, XPathExtError> {
    match node {
        AstNode::StringLiteral(s) => Ok(Value::String(s.clone())),
        AstNode::NumberLiteral(n) => Ok(Value::Number(*n)),
        AstNode::FunctionCall { name, arguments } => {
            let args = arguments
                .iter()
                .map(|arg| evaluate_ast_with_visitor(arg, context, visitor).map(Argument::Value))
                .collect::<Result<Vec<_>, _>>()?;
            call_function(name, &args, context)
        }
        AstNode::UnaryOp {
            op: UnaryOperator::Negate,
            operand,
        } => {
            let value = evaluate_ast_with_visitor(operand, context, visitor)?;
            Ok(Value::Number(-xpath_number(&value)))
        }
        AstNode::BinaryOp { op, left, right } => {
            evaluate_binary_op(*op, left, right, context, visitor)
        }
    }
}

fn call_function(
    name: &str,
    args: &[Argument],
    context: &EvaluationContext<'_>,
) -> Result<Value, XPathExtError> {
    if context.extensions.has_function(name) {
        return context.extensions.call(name, args);
    }

    let (arity, implementation) =
        native_function(name).ok_or_else(|| XPathExtError::UnknownFunction(name.to_string()))?;
    if !arity.accepts(args.len()) {
        return Err(XPathExtError::ArityError {
            function: name.to_string(),
            expected: arity.describe(),
            actual: args.len(),
        });
    }

    #[cfg(feature = "trace")]
    trace!("calling native '{}' with {} argument(s)", name, args.len());

    let values: Vec<Value> = args.iter().map(first_value).collect();
    Ok(implementation(&values))
}

fn evaluate_binary_op(
    op: BinaryOperator,
    left: &AstNode,
    right: &AstNode,
    context: &EvaluationContext<'_>,
    visitor: &dyn AstVisitor,
) -> Result<Value, XPathExtError> {
    let lhs = evaluate_ast_with_visitor(left, context, visitor)?;

    // and/or short-circuit on the left operand
    match op {
        BinaryOperator::And if !xpath_boolean(&lhs) => return Ok(Value::Boolean(false)),
        BinaryOperator::Or if xpath_boolean(&lhs) => return Ok(Value::Boolean(true)),
        _ => {}
    }

    let rhs = evaluate_ast_with_visitor(right, context, visitor)?;
    let (lhs, rhs) = (Argument::Value(lhs), Argument::Value(rhs));

    let (lhs, rhs) = if type_of(&lhs).is_some() || type_of(&rhs).is_some() {
        match context.extensions.handle_infix(op, lhs, rhs)? {
            InfixOutcome::Handled(value) => return Ok(value),
            InfixOutcome::NotHandled { lhs, rhs } => (lhs, rhs),
        }
    } else {
        (lhs, rhs)
    };

    Ok(native_binary_op(op, &first_value(&lhs), &first_value(&rhs)))
}

/// XPath 1.0 operator semantics over single values
fn native_binary_op(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOperator::And => Value::Boolean(xpath_boolean(lhs) && xpath_boolean(rhs)),
        BinaryOperator::Or => Value::Boolean(xpath_boolean(lhs) || xpath_boolean(rhs)),
        BinaryOperator::Equals => Value::Boolean(xpath_equals(lhs, rhs)),
        BinaryOperator::NotEquals => Value::Boolean(!xpath_equals(lhs, rhs)),
        BinaryOperator::LessThan => Value::Boolean(xpath_number(lhs) < xpath_number(rhs)),
        BinaryOperator::LessOrEqual => Value::Boolean(xpath_number(lhs) <= xpath_number(rhs)),
        BinaryOperator::GreaterThan => Value::Boolean(xpath_number(lhs) > xpath_number(rhs)),
        BinaryOperator::GreaterOrEqual => Value::Boolean(xpath_number(lhs) >= xpath_number(rhs)),
        BinaryOperator::Addition => Value::Number(xpath_number(lhs) + xpath_number(rhs)),
        BinaryOperator::Subtraction => Value::Number(xpath_number(lhs) - xpath_number(rhs)),
        BinaryOperator::Multiplication => Value::Number(xpath_number(lhs) * xpath_number(rhs)),
        BinaryOperator::Division => Value::Number(xpath_number(lhs) / xpath_number(rhs)),
        BinaryOperator::Modulo => Value::Number(xpath_number(lhs) % xpath_number(rhs)),
    }
}

/// Equality compares as booleans if either side is boolean, else as numbers
/// if either side is a number, else as strings
fn xpath_equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => xpath_boolean(lhs) == xpath_boolean(rhs),
        (Value::Number(_), _) | (_, Value::Number(_)) => xpath_number(lhs) == xpath_number(rhs),
        _ => xpath_string(lhs) == xpath_string(rhs),
    }
}

/// The single value the host sees for an operand; sequences contribute
/// their first item
fn first_value(arg: &Argument) -> Value {
    match arg {
        Argument::Value(value) => value.clone(),
        Argument::Sequence(items) => items
            .first()
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
    }
}

/// XPath `boolean()`: numeric truthiness for numbers, non-empty for strings
pub fn xpath_boolean(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Date(_) => true,
    }
}

/// XPath `number()`: strict parse of strings, dates as epoch milliseconds
pub fn xpath_number(value: &Value) -> f64 {
    match value {
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::String(s) if XPATH_NUMBER.is_match(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::String(_) => f64::NAN,
        Value::Date(date) => epoch_millis(date) as f64,
    }
}

/// XPath `string()`
pub fn xpath_string(value: &Value) -> String {
    value_to_string(value)
}

type NativeFn = fn(&[Value]) -> Value;

/// The XPath 1.0 core functions the reference host provides itself
fn native_function(name: &str) -> Option<(Arity, NativeFn)> {
    let entry: (Arity, NativeFn) = match name {
        "string" => (Arity::Exact(1), |args| Value::String(xpath_string(&args[0]))),
        "number" => (Arity::Exact(1), |args| Value::Number(xpath_number(&args[0]))),
        "boolean" => (Arity::Exact(1), |args| Value::Boolean(xpath_boolean(&args[0]))),
        "concat" => (Arity::AtLeast(2), |args| {
            Value::String(args.iter().map(xpath_string).collect())
        }),
        "string-length" => (Arity::Exact(1), |args| {
            Value::Number(xpath_string(&args[0]).chars().count() as f64)
        }),
        "floor" => (Arity::Exact(1), |args| Value::Number(xpath_number(&args[0]).floor())),
        "ceiling" => (Arity::Exact(1), |args| Value::Number(xpath_number(&args[0]).ceil())),
        "contains" => (Arity::Exact(2), |args| {
            Value::Boolean(xpath_string(&args[0]).contains(&xpath_string(&args[1])))
        }),
        "starts-with" => (Arity::Exact(2), |args| {
            Value::Boolean(xpath_string(&args[0]).starts_with(&xpath_string(&args[1])))
        }),
        "normalize-space" => (Arity::Exact(1), |args| {
            let text = xpath_string(&args[0]);
            Value::String(text.split_whitespace().collect::<Vec<_>>().join(" "))
        }),
        _ => return None,
    };
    Some(entry)
}

/// Evaluates an expression string
pub fn evaluate_expression(expression: &str, extensions: &Extensions) -> Result<Value, XPathExtError> {
    evaluate_expression_with_visitor(expression, extensions, &NoopVisitor::new())
}

/// Evaluates an expression string with a custom visitor
pub fn evaluate_expression_with_visitor(
    expression: &str,
    extensions: &Extensions,
    visitor: &dyn AstVisitor,
) -> Result<Value, XPathExtError> {
    #[cfg(feature = "trace")]
    debug!("Evaluating OpenRosa XPath expression: {}", expression);

    let context = EvaluationContext::new(extensions);

    #[cfg(feature = "trace")]
    trace!("Tokenizing expression");
    let tokens = tokenize(expression)?;

    #[cfg(feature = "trace")]
    trace!("Parsing tokens into AST");
    let ast = parse(&tokens)?;

    let result = evaluate_ast_with_visitor(&ast, &context, visitor);

    #[cfg(feature = "trace")]
    match &result {
        Ok(value) => debug!("Expression evaluation result: {:?}", value),
        Err(err) => debug!("Expression evaluation error: {:?}", err),
    }

    result
}

/// Checks that an expression parses, without evaluating it
pub fn validate_expression(expression: &str) -> Result<AstNode, XPathExtError> {
    let tokens = tokenize(expression)?;
    parse(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xpath_number_is_strict() {
        assert_eq!(xpath_number(&Value::from(" 12.5 ")), 12.5);
        assert_eq!(xpath_number(&Value::from(".5")), 0.5);
        assert!(xpath_number(&Value::from("12px")).is_nan());
        assert!(xpath_number(&Value::from("")).is_nan());
        assert_eq!(xpath_number(&Value::from(true)), 1.0);
    }

    #[test]
    fn test_xpath_equals_prefers_booleans_then_numbers() {
        assert!(xpath_equals(&Value::from(true), &Value::from("x")));
        assert!(xpath_equals(&Value::from(1.0), &Value::from("1.0")));
        assert!(!xpath_equals(&Value::from("1"), &Value::from("1.0")));
    }

    #[test]
    fn test_native_functions_are_resolved_after_extensions() {
        assert!(native_function("concat").is_some());
        assert!(native_function("format-date").is_none());
    }
}
