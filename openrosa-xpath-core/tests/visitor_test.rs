use openrosa_xpath_core::errors::XPathExtError;
use openrosa_xpath_core::evaluator::{
    evaluate_expression_with_visitor, AstVisitor, EvaluationContext, LoggingVisitor, NoopVisitor,
};
use openrosa_xpath_core::parser::AstNode;
use openrosa_xpath_core::{Extensions, Value};
use std::cell::RefCell;
use std::rc::Rc;

// A test visitor that counts the number of nodes visited
struct CountingVisitor {
    before_count: Rc<RefCell<usize>>,
    after_count: Rc<RefCell<usize>>,
    node_types: Rc<RefCell<Vec<String>>>,
    errors: Rc<RefCell<usize>>,
}

impl CountingVisitor {
    fn new() -> Self {
        Self {
            before_count: Rc::new(RefCell::new(0)),
            after_count: Rc::new(RefCell::new(0)),
            node_types: Rc::new(RefCell::new(Vec::new())),
            errors: Rc::new(RefCell::new(0)),
        }
    }

    fn before_count(&self) -> usize {
        *self.before_count.borrow()
    }

    fn after_count(&self) -> usize {
        *self.after_count.borrow()
    }

    fn node_types(&self) -> Vec<String> {
        self.node_types.borrow().clone()
    }

    fn errors(&self) -> usize {
        *self.errors.borrow()
    }
}

impl AstVisitor for CountingVisitor {
    fn before_evaluate(&self, node: &AstNode, _context: &EvaluationContext<'_>) {
        *self.before_count.borrow_mut() += 1;

        let node_type = match node {
            AstNode::StringLiteral(_) => "StringLiteral",
            AstNode::NumberLiteral(_) => "NumberLiteral",
            AstNode::FunctionCall { .. } => "FunctionCall",
            AstNode::BinaryOp { .. } => "BinaryOp",
            AstNode::UnaryOp { .. } => "UnaryOp",
        };

        self.node_types.borrow_mut().push(node_type.to_string());
    }

    fn after_evaluate(
        &self,
        _node: &AstNode,
        _context: &EvaluationContext<'_>,
        result: &Result<Value, XPathExtError>,
    ) {
        *self.after_count.borrow_mut() += 1;
        if result.is_err() {
            *self.errors.borrow_mut() += 1;
        }
    }
}

#[test]
fn test_visitor_counts_nodes() {
    let engine = Extensions::new();
    let visitor = CountingVisitor::new();

    let result = evaluate_expression_with_visitor("date('2015-01-01') + 1", &engine, &visitor);
    assert!(result.is_ok());

    // BinaryOp, FunctionCall, StringLiteral, NumberLiteral
    assert_eq!(visitor.before_count(), 4);
    assert_eq!(visitor.before_count(), visitor.after_count());
    assert_eq!(
        visitor.node_types(),
        vec!["BinaryOp", "FunctionCall", "StringLiteral", "NumberLiteral"]
    );
}

#[test]
fn test_visitor_skips_short_circuited_operands() {
    let engine = Extensions::new();
    let visitor = CountingVisitor::new();

    let result = evaluate_expression_with_visitor("false() and uuid()", &engine, &visitor);
    assert_eq!(result.unwrap(), Value::Boolean(false));
    assert_eq!(visitor.before_count(), 2);
    assert!(!visitor.node_types().contains(&"StringLiteral".to_string()));
}

#[test]
fn test_visitor_sees_errors() {
    let engine = Extensions::new();
    let visitor = CountingVisitor::new();

    let result = evaluate_expression_with_visitor("-(date(1) + date(2))", &engine, &visitor);
    assert!(result.is_err());
    assert_eq!(visitor.before_count(), visitor.after_count());
    // The failing BinaryOp and the UnaryOp wrapping it
    assert_eq!(visitor.errors(), 2);
    assert!(visitor.node_types().contains(&"UnaryOp".to_string()));
}

#[test]
fn test_noop_and_logging_visitors_do_not_change_results() {
    let engine = Extensions::new();
    let expression = "format-date(date('2015-10-01') + 3, '%a %e %b')";

    let plain = evaluate_expression_with_visitor(expression, &engine, &NoopVisitor::new());
    let logged = evaluate_expression_with_visitor(expression, &engine, &LoggingVisitor::new());
    let counted = engine.evaluate_with_visitor(expression, &CountingVisitor::new());

    assert_eq!(plain.unwrap(), Value::from("Sun 4 Oct"));
    assert_eq!(logged.unwrap(), Value::from("Sun 4 Oct"));
    assert_eq!(counted.unwrap(), Value::from("Sun 4 Oct"));
}

#[test]
fn test_logging_visitor_depth_returns_to_zero() {
    let engine = Extensions::new();
    let visitor = LoggingVisitor::new();
    assert_eq!(visitor.depth(), 0);

    let result = evaluate_expression_with_visitor("1 + (2 * 3)", &engine, &visitor);
    assert_eq!(result.unwrap(), Value::from(7.0));
    assert_eq!(visitor.depth(), 0);

    let failed = evaluate_expression_with_visitor("-(date(1) + date(2))", &engine, &visitor);
    assert!(failed.is_err());
    assert_eq!(visitor.depth(), 0);
}
