// OpenRosa XPath Lexer
//
// This module implements the lexical analysis for the expression subset the
// reference host understands: literals, function calls and operators.

use crate::errors::XPathExtError;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Token types for host expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    Name,
    StringLiteral,
    NumberLiteral,

    // Operators
    Equal,          // =
    NotEqual,       // !=
    LessThan,       // <
    LessOrEqual,    // <=
    GreaterThan,    // >
    GreaterOrEqual, // >=
    Plus,           // +
    Minus,          // -
    Multiply,       // *

    // Delimiters
    LeftParen,  // (
    RightParen, // )
    Comma,      // ,

    // Operator names
    And, // and
    Or,  // or
    Div, // div
    Mod, // mod

    // End of input
    EOF,
}

impl TokenType {
    /// Whether a token of this type can end an operand
    ///
    /// After such a token, `and`, `or`, `div`, `mod` and `*` are operators;
    /// elsewhere those words are ordinary names.
    fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenType::Name
                | TokenType::StringLiteral
                | TokenType::NumberLiteral
                | TokenType::RightParen
        )
    }
}

/// A token in a host expression
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

/// Lexer for host expressions
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
    line: usize,
    column: usize,
    operator_names: HashMap<&'static str, TokenType>,
    previous: Option<TokenType>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        let mut operator_names = HashMap::new();
        operator_names.insert("and", TokenType::And);
        operator_names.insert("or", TokenType::Or);
        operator_names.insert("div", TokenType::Div);
        operator_names.insert("mod", TokenType::Mod);

        Lexer {
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            column: 1,
            operator_names,
            previous: None,
        }
    }

    /// Advances the lexer by one character
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += 1;
            self.column += 1;

            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            }
        }
        c
    }

    /// Peeks at the next character without advancing
    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Skips whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn follows_operand(&self) -> bool {
        self.previous.is_some_and(TokenType::ends_operand)
    }

    /// Tokenizes a name or operator name
    fn name(&mut self, start: (usize, usize, usize)) -> Token {
        let (position, line, column) = start;
        let mut name = String::new();

        while let Some(&c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = match self.operator_names.get(name.as_str()) {
            Some(operator) if self.follows_operand() => *operator,
            _ => TokenType::Name,
        };

        Token {
            token_type,
            lexeme: name,
            position,
            line,
            column,
        }
    }

    /// Tokenizes a number literal (`12`, `12.5`, `.5`)
    fn number(&mut self, start: (usize, usize, usize)) -> Token {
        let (position, line, column) = start;
        let mut number = String::new();
        let mut has_decimal = false;

        while let Some(&c) = self.peek() {
            if c.is_ascii_digit() {
                number.push(c);
                self.advance();
            } else if c == '.' && !has_decimal {
                has_decimal = true;
                number.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token {
            token_type: TokenType::NumberLiteral,
            lexeme: number,
            position,
            line,
            column,
        }
    }

    /// Tokenizes a string literal delimited by `'` or `"`
    ///
    /// There are no escape sequences; a string simply cannot contain its own
    /// delimiter.
    fn string(&mut self, start: (usize, usize, usize)) -> Result<Token, XPathExtError> {
        let (position, line, column) = start;
        let quote = self.advance();
        let mut string = String::new();

        while let Some(c) = self.advance() {
            if Some(c) == quote {
                return Ok(Token {
                    token_type: TokenType::StringLiteral,
                    lexeme: string,
                    position,
                    line,
                    column,
                });
            }
            string.push(c);
        }

        Err(XPathExtError::LexerError(format!(
            "Unterminated string literal starting at line {}, column {}",
            line, column
        )))
    }

    /// Consumes a single-character token
    fn single(&mut self, token_type: TokenType, start: (usize, usize, usize)) -> Token {
        let (position, line, column) = start;
        let lexeme = self.advance().map(String::from).unwrap_or_default();
        Token {
            token_type,
            lexeme,
            position,
            line,
            column,
        }
    }

    /// Consumes a one- or two-character token, choosing `long` when the
    /// second character is `=`
    fn maybe_equals(
        &mut self,
        short: TokenType,
        long: TokenType,
        start: (usize, usize, usize),
    ) -> Token {
        let mut token = self.single(short, start);
        if let Some(&'=') = self.peek() {
            self.advance();
            token.token_type = long;
            token.lexeme.push('=');
        }
        token
    }

    /// Scans the next token
    pub fn scan_token(&mut self) -> Result<Token, XPathExtError> {
        self.skip_whitespace();
        let start = (self.position, self.line, self.column);

        let Some(&c) = self.peek() else {
            return Ok(Token {
                token_type: TokenType::EOF,
                lexeme: String::new(),
                position: self.position,
                line: self.line,
                column: self.column,
            });
        };

        let token = match c {
            '(' => self.single(TokenType::LeftParen, start),
            ')' => self.single(TokenType::RightParen, start),
            ',' => self.single(TokenType::Comma, start),
            '+' => self.single(TokenType::Plus, start),
            '-' => self.single(TokenType::Minus, start),
            '*' if self.follows_operand() => self.single(TokenType::Multiply, start),
            '=' => self.single(TokenType::Equal, start),
            '<' => self.maybe_equals(TokenType::LessThan, TokenType::LessOrEqual, start),
            '>' => self.maybe_equals(TokenType::GreaterThan, TokenType::GreaterOrEqual, start),
            '!' => {
                let token = self.maybe_equals(TokenType::NotEqual, TokenType::NotEqual, start);
                if token.lexeme != "!=" {
                    return Err(XPathExtError::LexerError(format!(
                        "Expected '=' after '!' at line {}, column {}",
                        start.1, start.2
                    )));
                }
                token
            }
            '\'' | '"' => self.string(start)?,
            c if c.is_ascii_digit() || c == '.' => self.number(start),
            c if c.is_alphabetic() || c == '_' => self.name(start),
            other => {
                return Err(XPathExtError::LexerError(format!(
                    "Unexpected character '{}' at line {}, column {}",
                    other, start.1, start.2
                )));
            }
        };

        self.previous = Some(token.token_type);
        Ok(token)
    }
}

/// Tokenizes a host expression, ending with an EOF token
pub fn tokenize(input: &str) -> Result<Vec<Token>, XPathExtError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.scan_token()?;
        let is_eof = token.token_type == TokenType::EOF;
        tokens.push(token);

        if is_eof {
            break;
        }
    }

    Ok(tokens)
}
