// OpenRosa XPath Error Types
//
// This module defines the error types used throughout the extension engine.

use thiserror::Error;

/// Errors that can occur while parsing expressions or running extension functions
#[derive(Error, Debug)]
pub enum XPathExtError {
    /// Error during lexical analysis
    #[error("Lexer error: {0}")]
    LexerError(String),

    /// Error during parsing
    #[error("Parser error: {0}")]
    ParserError(String),

    /// Neither the extension table nor the host knows the function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments for a function
    #[error("'{function}' expects {expected} argument(s), got {actual}")]
    ArityError {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Unknown or truncated escape in a date format string
    #[error("Invalid date format '{format}': {message}")]
    FormatError { format: String, message: String },

    /// A date value could not be built
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Arithmetic between two dates
    #[error("Unsupported date arithmetic: {0}")]
    DateArithmetic(String),

    /// Regular expression failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
