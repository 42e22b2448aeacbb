// OpenRosa XPath Lexer Tests
//
// This file contains tests for the reference host lexer.

use openrosa_xpath_core::lexer::{tokenize, TokenType};

fn types(input: &str) -> Vec<TokenType> {
    tokenize(input)
        .unwrap()
        .into_iter()
        .map(|token| token.token_type)
        .collect()
}

#[test]
fn test_empty_input() {
    let tokens = tokenize("").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token_type, TokenType::EOF);
}

#[test]
fn test_whitespace() {
    let tokens = tokenize("   \t\n  ").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token_type, TokenType::EOF);
}

#[test]
fn test_hyphenated_function_names() {
    let tokens = tokenize("format-date-time(decimal-date('x'))").unwrap();
    assert_eq!(tokens[0].token_type, TokenType::Name);
    assert_eq!(tokens[0].lexeme, "format-date-time");
    assert_eq!(tokens[2].token_type, TokenType::Name);
    assert_eq!(tokens[2].lexeme, "decimal-date");
}

#[test]
fn test_string_literals() {
    let tokens = tokenize("'single' \"double\" 'it\"s'").unwrap();
    assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
    assert_eq!(tokens[0].lexeme, "single");
    assert_eq!(tokens[1].lexeme, "double");
    assert_eq!(tokens[2].lexeme, "it\"s");
}

#[test]
fn test_unterminated_string() {
    assert!(tokenize("'open").is_err());
}

#[test]
fn test_number_literals() {
    let tokens = tokenize("12 3.25 .5").unwrap();
    let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(lexemes, vec!["12", "3.25", ".5", ""]);
    assert!(tokens[..3]
        .iter()
        .all(|t| t.token_type == TokenType::NumberLiteral));
}

#[test]
fn test_comparison_operators() {
    assert_eq!(
        types("1 = 2 != 3 < 4 <= 5 > 6 >= 7"),
        vec![
            TokenType::NumberLiteral,
            TokenType::Equal,
            TokenType::NumberLiteral,
            TokenType::NotEqual,
            TokenType::NumberLiteral,
            TokenType::LessThan,
            TokenType::NumberLiteral,
            TokenType::LessOrEqual,
            TokenType::NumberLiteral,
            TokenType::GreaterThan,
            TokenType::NumberLiteral,
            TokenType::GreaterOrEqual,
            TokenType::NumberLiteral,
            TokenType::EOF,
        ]
    );
}

#[test]
fn test_operator_names_after_operands() {
    assert_eq!(
        types("1 div 2 mod 3"),
        vec![
            TokenType::NumberLiteral,
            TokenType::Div,
            TokenType::NumberLiteral,
            TokenType::Mod,
            TokenType::NumberLiteral,
            TokenType::EOF,
        ]
    );
    assert_eq!(
        types("true() and false() or true()")[3],
        TokenType::And
    );
}

#[test]
fn test_operator_names_in_operand_position_are_names() {
    let tokens = tokenize("and(1)").unwrap();
    assert_eq!(tokens[0].token_type, TokenType::Name);
    assert_eq!(tokens[0].lexeme, "and");
}

#[test]
fn test_star_requires_preceding_operand() {
    assert_eq!(types("2 * 3")[1], TokenType::Multiply);
    assert!(tokenize("* 3").is_err());
}

#[test]
fn test_lone_bang_is_an_error() {
    assert!(tokenize("1 ! 2").is_err());
}

#[test]
fn test_token_positions() {
    let tokens = tokenize("a(\n 'x')").unwrap();
    assert_eq!(tokens[2].line, 2);
    assert_eq!(tokens[2].column, 2);
    assert_eq!(tokens[2].position, 4);
}
