//! Lenient decoding of JSON request fields.
//!
//! Input types deserialize every field as a raw [`Value`] and convert it here.
//! A value of the wrong JSON type becomes a field error instead of failing the
//! whole body, so clients get `{"score": ["A valid integer is required."]}`
//! rather than a parse error. Numeric strings are accepted for integers and
//! numbers are accepted for text.

use serde_json::Value;

use crate::error::ValidationErrors;

pub const MSG_NOT_A_STRING: &str = "Not a valid string.";
pub const MSG_NOT_AN_INTEGER: &str = "A valid integer is required.";
pub const MSG_INVALID_VALUE: &str = "Invalid value.";

pub fn text(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => {
            errors.add(field, MSG_NOT_A_STRING);
            None
        }
    }
}

/// Integers may arrive as JSON numbers without a fractional part or as
/// strings such as `"7"` or `"7.0"`.
pub fn integer(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> Option<i32> {
    let parsed = match value? {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0)
                .map(|float| float as i64)
        }),
        Value::String(text) => parse_integer(&text),
        _ => None,
    };
    match parsed.and_then(|number| i32::try_from(number).ok()) {
        Some(number) => Some(number),
        None => {
            errors.add(field, MSG_NOT_AN_INTEGER);
            None
        }
    }
}

/// A list of slugs. Anything but an array of strings or numbers is rejected.
pub fn slug_list(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Value>,
) -> Option<Vec<String>> {
    let items = match value? {
        Value::Array(items) => items,
        other => {
            errors.add(
                field,
                format!(
                    "Expected a list of items but got type \"{}\".",
                    type_name(&other)
                ),
            );
            return None;
        }
    };

    let mut slugs = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(slug) => slugs.push(slug),
            Value::Number(number) => slugs.push(number.to_string()),
            _ => {
                errors.add(field, MSG_INVALID_VALUE);
                return None;
            }
        }
    }
    Some(slugs)
}

fn parse_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let whole = match trimmed.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        Some(_) => return None,
        None => trimmed,
    };
    whole.parse().ok()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
