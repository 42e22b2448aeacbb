// OpenRosa XPath Parser
//
// This module implements a recursive-descent parser for the expression subset
// understood by the reference host. Precedence follows XPath 1.0.

use crate::errors::XPathExtError;
use crate::lexer::{Token, TokenType};
use std::fmt;

/// AST node types for host expressions
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // Literals
    StringLiteral(String),
    NumberLiteral(f64),

    // Function calls
    FunctionCall {
        name: String,
        arguments: Vec<AstNode>,
    },

    // Operators
    BinaryOp {
        op: BinaryOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<AstNode>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    And,
    Or,
}

impl BinaryOperator {
    /// The operator as written in an expression
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Addition => "+",
            BinaryOperator::Subtraction => "-",
            BinaryOperator::Multiplication => "*",
            BinaryOperator::Division => "div",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }

    /// Equality and relational operators
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::LessThan
                | BinaryOperator::LessOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterOrEqual
        )
    }

    /// `+ - * div mod`
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Addition
                | BinaryOperator::Subtraction
                | BinaryOperator::Multiplication
                | BinaryOperator::Division
                | BinaryOperator::Modulo
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

/// Parser for host expressions
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses a complete expression; trailing tokens are an error
    pub fn parse(&mut self) -> Result<AstNode, XPathExtError> {
        let expr = self.expression()?;
        if !self.is_at_end() {
            return Err(XPathExtError::ParserError(format!(
                "Unexpected token '{}' at line {}, column {}",
                self.peek().lexeme,
                self.peek().line,
                self.peek().column
            )));
        }
        Ok(expr)
    }

    /// Checks if we've reached the end of the token stream
    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.peek().token_type == TokenType::EOF
    }

    /// Returns the current token without advancing
    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    /// Returns the previous token
    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Advances to the next token and returns the current one
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Checks if the current token matches the given type
    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().token_type == token_type
        }
    }

    /// Consumes the current token if it matches the given type
    fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it matches the given type, otherwise fails
    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, XPathExtError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(XPathExtError::ParserError(format!(
                "{} at line {}, column {}",
                message,
                self.peek().line,
                self.peek().column
            )))
        }
    }

    /// Builds a left-associative chain of binary operators
    fn binary_chain(
        &mut self,
        operators: &[(TokenType, BinaryOperator)],
        operand: fn(&mut Self) -> Result<AstNode, XPathExtError>,
    ) -> Result<AstNode, XPathExtError> {
        let mut expr = operand(self)?;

        loop {
            let Some(&(_, op)) = operators
                .iter()
                .find(|(token_type, _)| self.check(*token_type))
            else {
                break;
            };
            self.advance();
            let right = operand(self)?;
            expr = AstNode::BinaryOp {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Parses an expression
    fn expression(&mut self) -> Result<AstNode, XPathExtError> {
        self.logical_or()
    }

    /// Parses a logical OR expression
    fn logical_or(&mut self) -> Result<AstNode, XPathExtError> {
        self.binary_chain(&[(TokenType::Or, BinaryOperator::Or)], Self::logical_and)
    }

    /// Parses a logical AND expression
    fn logical_and(&mut self) -> Result<AstNode, XPathExtError> {
        self.binary_chain(&[(TokenType::And, BinaryOperator::And)], Self::equality)
    }

    /// Parses an equality expression
    fn equality(&mut self) -> Result<AstNode, XPathExtError> {
        self.binary_chain(
            &[
                (TokenType::Equal, BinaryOperator::Equals),
                (TokenType::NotEqual, BinaryOperator::NotEquals),
            ],
            Self::comparison,
        )
    }

    /// Parses a relational expression
    fn comparison(&mut self) -> Result<AstNode, XPathExtError> {
        self.binary_chain(
            &[
                (TokenType::LessThan, BinaryOperator::LessThan),
                (TokenType::LessOrEqual, BinaryOperator::LessOrEqual),
                (TokenType::GreaterThan, BinaryOperator::GreaterThan),
                (TokenType::GreaterOrEqual, BinaryOperator::GreaterOrEqual),
            ],
            Self::term,
        )
    }

    /// Parses a term expression (addition, subtraction)
    fn term(&mut self) -> Result<AstNode, XPathExtError> {
        self.binary_chain(
            &[
                (TokenType::Plus, BinaryOperator::Addition),
                (TokenType::Minus, BinaryOperator::Subtraction),
            ],
            Self::factor,
        )
    }

    /// Parses a factor expression (multiplication, div, mod)
    fn factor(&mut self) -> Result<AstNode, XPathExtError> {
        self.binary_chain(
            &[
                (TokenType::Multiply, BinaryOperator::Multiplication),
                (TokenType::Div, BinaryOperator::Division),
                (TokenType::Mod, BinaryOperator::Modulo),
            ],
            Self::unary,
        )
    }

    /// Parses a unary expression
    fn unary(&mut self) -> Result<AstNode, XPathExtError> {
        if self.match_token(TokenType::Minus) {
            let operand = self.unary()?;
            Ok(AstNode::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            })
        } else {
            self.primary()
        }
    }

    /// Parses a primary expression
    fn primary(&mut self) -> Result<AstNode, XPathExtError> {
        if self.match_token(TokenType::Name) {
            let name = self.previous().lexeme.clone();

            if !self.match_token(TokenType::LeftParen) {
                return Err(XPathExtError::ParserError(format!(
                    "Location paths are not supported: '{}'",
                    name
                )));
            }

            let mut arguments = Vec::new();
            if !self.check(TokenType::RightParen) {
                loop {
                    arguments.push(self.expression()?);
                    if !self.match_token(TokenType::Comma) {
                        break;
                    }
                }
            }

            self.consume(TokenType::RightParen, "Expected ')' after function arguments")?;

            Ok(AstNode::FunctionCall { name, arguments })
        } else if self.match_token(TokenType::StringLiteral) {
            Ok(AstNode::StringLiteral(self.previous().lexeme.clone()))
        } else if self.match_token(TokenType::NumberLiteral) {
            let lexeme = &self.previous().lexeme;
            let value = lexeme.parse::<f64>().map_err(|e| {
                XPathExtError::ParserError(format!("Invalid number '{}': {}", lexeme, e))
            })?;
            Ok(AstNode::NumberLiteral(value))
        } else if self.match_token(TokenType::LeftParen) {
            let expr = self.expression()?;
            self.consume(TokenType::RightParen, "Expected ')' after expression")?;
            Ok(expr)
        } else {
            let token = self.peek();
            let found = if token.token_type == TokenType::EOF {
                "end of expression".to_string()
            } else {
                format!("'{}'", token.lexeme)
            };
            Err(XPathExtError::ParserError(format!(
                "Expected expression, got {} at line {}, column {}",
                found, token.line, token.column
            )))
        }
    }
}

/// Parses a host expression from tokens
pub fn parse(tokens: &[Token]) -> Result<AstNode, XPathExtError> {
    if tokens.is_empty() {
        return Err(XPathExtError::ParserError("Empty token stream".to_string()));
    }
    let mut parser = Parser::new(tokens);
    parser.parse()
}
