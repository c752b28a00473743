//! Chart specification vocabulary and tolerant parsing.
//!
//! A specification is any JSON value. Two conventions are reserved: fields whose
//! name ends in [`SOURCE_SUFFIX`] name a dataset column, and objects under
//! [`ENCODE_KEY`] map visual attributes to column names.

use log::warn;
use serde_json::{json, Value};

/// Suffix marking a source-reference field (`xSrc` resolves into `x`). Matched
/// without regard to ASCII case so `xsrc` works as well.
pub const SOURCE_SUFFIX: &str = "Src";

/// Key of an object mapping visual attributes to column display names.
pub const ENCODE_KEY: &str = "encode";

/// Sentinel text meaning "no configuration yet".
pub const EMPTY_SPEC: &str = "{}";

/// Returns the unsuffixed sibling name when `key` is a source reference.
pub fn strip_source_suffix(key: &str) -> Option<&str> {
    let split = key.len().checked_sub(SOURCE_SUFFIX.len())?;
    if split == 0 || !key.is_char_boundary(split) {
        return None;
    }
    let (base, suffix) = key.split_at(split);
    suffix.eq_ignore_ascii_case(SOURCE_SUFFIX).then_some(base)
}

/// True when the text carries a configuration worth walking.
pub fn is_configured(text: Option<&str>) -> bool {
    matches!(text, Some(t) if !t.is_empty() && t != EMPTY_SPEC)
}

/// The shape handed downstream when nothing usable could be parsed.
pub fn empty_chart() -> Value {
    json!({ "options": {}, "series": [] })
}

/// Parse specification text, tolerating comments and trailing commas.
///
/// Empty text yields `{}`; malformed text is logged and replaced with
/// `{"options": {}, "series": []}` so callers always get a usable tree.
pub fn safe_parse(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    match serde_json::from_str(&relax(text)) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse chart specification: {}", e);
            empty_chart()
        }
    }
}

/// Strip `//` and `/* */` comments and trailing commas outside of string literals.
pub fn relax(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            output.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        output.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                output.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        output.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                output.push(' ');
            }
            ',' => {
                // Drop the comma when only whitespace separates it from a closer
                let trailing = output.len();
                output.push(',');
                let mut lookahead = chars.clone();
                while let Some(next) = lookahead.peek() {
                    if next.is_whitespace() {
                        lookahead.next();
                    } else {
                        break;
                    }
                }
                if matches!(lookahead.peek(), Some('}') | Some(']')) {
                    output.truncate(trailing);
                }
            }
            _ => output.push(c),
        }
    }

    output
}

/// Columns a specification declares through `dataset.dimensions` (plain names or
/// `{ "name": ... }` objects), falling back to the header row of `dataset.source`.
pub fn chart_columns(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chart = safe_parse(text);
    let Some(dataset) = chart.get("dataset") else {
        return Vec::new();
    };

    if let Some(dimensions) = dataset.get("dimensions").and_then(Value::as_array) {
        return dimensions
            .iter()
            .filter_map(|d| match d {
                Value::String(name) => Some(name.clone()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect();
    }

    dataset
        .get("source")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(Value::as_array)
        .map(|header| {
            header
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
