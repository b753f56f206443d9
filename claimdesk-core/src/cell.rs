//! Cell text conversion
//!
//! Inputs on the page are plain text. These helpers turn a stored JSON value
//! into the text an input shows, and turn edited text back into a value that
//! keeps the previous value's type where the text allows it.

use serde_json::{Number, Value};

/// Text shown in an input for a stored value.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested values are rare in these tables; show them as compact JSON
        other => other.to_string(),
    }
}

/// Value to store after the user typed `text` over `previous`.
///
/// No validation happens here: text that does not fit the previous type is
/// stored as a string and the remote schema decides.
pub fn coerce_input(previous: Option<&Value>, text: &str) -> Value {
    match previous {
        Some(Value::Null) if text.is_empty() => Value::Null,
        Some(Value::Number(_)) => parse_number(text)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_owned())),
        Some(Value::Bool(_)) => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_owned()),
        },
        _ => Value::String(text.to_owned()),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}
