//! snake_case <-> camelCase conversion for wire payloads.
//!
//! The admin API speaks snake_case JSON; everything inside this crate uses
//! camelCase field names (serde `rename_all = "camelCase"`). Key transforms
//! recurse through objects and arrays and leave scalars and `null` untouched.

use serde_json::{Map, Value};

/// Split an identifier into lowercase words.
///
/// Separators are any non-alphanumeric characters; a word also ends at a
/// lower->upper transition (`userEmail`) and before the last capital of an
/// acronym run that precedes a lowercase letter (`HTTPStatus`).
fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `num_pages` -> `numPages`, `lms_user_created` -> `lmsUserCreated`.
pub fn camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in split_words(input).iter().enumerate() {
        if i == 0 {
            out.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `numPages` -> `num_pages`, `HTTPStatus` -> `http_status`.
pub fn snake_case(input: &str) -> String {
    split_words(input).join("_")
}

/// Rewrite every object key in `value` with `modify`.
pub fn transform_keys<F>(value: Value, modify: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                out.insert(modify(&key), transform_keys(inner, modify));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| transform_keys(item, modify))
                .collect(),
        ),
        other => other,
    }
}

/// Wire format -> internal field names.
pub fn camelize_keys(value: Value) -> Value {
    transform_keys(value, &camel_case)
}

/// Internal field names -> wire format.
pub fn snakify_keys(value: Value) -> Value {
    transform_keys(value, &snake_case)
}
