use openrosa_xpath_core::evaluator::validate_expression as parse_expression;
use openrosa_xpath_core::{to_external_result, Extensions, LocaleTable};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Define a macro to provide `println!(..)`-style syntax for console logging.
macro_rules! console_log {
    ( $( $t:tt )* ) => {
        web_sys::console::log_1(&format!( $( $t )* ).into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ValidationResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn to_json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize result: {}"}}"#, e))
}

fn error_response(message: String) -> String {
    to_json_string(&ErrorResponse { error: message })
}

/// Initialize panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}

fn evaluate_with(engine: &Extensions, expression: &str) -> String {
    match engine.evaluate(expression) {
        Ok(value) => match to_external_result(&value).to_json() {
            Ok(json) => to_json_string(&json),
            Err(e) => error_response(e.to_string()),
        },
        Err(e) => {
            console_log!("OpenRosa XPath evaluation error: {}", e);
            error_response(format!("OpenRosa XPath evaluation error: {}", e))
        }
    }
}

/// Evaluate an OpenRosa XPath expression
///
/// # Returns
/// The externalized result as a JSON string, or `{"error": ...}`
#[wasm_bindgen]
pub fn evaluate_expression(expression: &str) -> String {
    evaluate_with(&Extensions::new(), expression)
}

/// Evaluate an expression with translated month and weekday names
///
/// # Arguments
/// * `expression` - The expression to evaluate
/// * `locale_json` - A JSON object such as `{"date.month.1": "janv."}`
#[wasm_bindgen]
pub fn evaluate_expression_with_locale(expression: &str, locale_json: &str) -> String {
    match LocaleTable::from_json(locale_json) {
        Ok(table) => evaluate_with(&Extensions::with_locale(table), expression),
        Err(e) => error_response(format!("Invalid locale JSON: {}", e)),
    }
}

/// Validate expression syntax
///
/// # Returns
/// A JSON string indicating whether the expression is valid
#[wasm_bindgen]
pub fn validate_expression(expression: &str) -> String {
    let response = match parse_expression(expression) {
        Ok(_) => ValidationResponse {
            valid: true,
            error: None,
        },
        Err(e) => ValidationResponse {
            valid: false,
            error: Some(e.to_string()),
        },
    };
    to_json_string(&response)
}

/// Names of all extension functions, sorted
#[wasm_bindgen]
pub fn list_functions() -> js_sys::Array {
    Extensions::new()
        .functions()
        .names()
        .into_iter()
        .map(JsValue::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_evaluate_date_expression() {
        let result = evaluate_expression("date('1970-01-02')");
        assert!(result.contains(r#""stringValue":"1970-01-02""#));
        assert!(result.contains(r#""numberValue":86400000.0"#));
    }

    #[wasm_bindgen_test]
    fn test_evaluate_with_locale() {
        let result = evaluate_expression_with_locale(
            "format-date('2015-10-01', '%b')",
            r#"{"date.month.10": "oct."}"#,
        );
        assert!(result.contains("oct."));
    }

    #[wasm_bindgen_test]
    fn test_evaluation_error() {
        let result = evaluate_expression("pow(1)");
        assert!(result.contains(r#""error""#));
    }

    #[wasm_bindgen_test]
    fn test_validate_expression() {
        assert!(validate_expression("today()").contains(r#""valid":true"#));
        assert!(validate_expression("today(").contains(r#""valid":false"#));
    }

    #[wasm_bindgen_test]
    fn test_list_functions() {
        assert_eq!(list_functions().length(), 27);
    }
}
