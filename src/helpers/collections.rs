//! Array, statistics and dataset helpers.

use super::HelperError;
use crate::data::Table;
use super::value::Value;
use std::cmp::Ordering;

fn items<'a>(helper: &'static str, value: &'a Value) -> Result<&'a [Value], HelperError> {
    value.as_array().ok_or(HelperError::NotArray { helper, found: value.type_name() })
}

/// `["a","b"]` text with every item stringified and quoted.
fn quoted_list<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    let inner: Vec<String> = values.map(|v| format!("\"{}\"", v.to_js_string())).collect();
    format!("[{}]", inner.join(","))
}

pub fn json_array(value: &Value) -> Result<Value, HelperError> {
    Ok(Value::String(quoted_list(items("jsonArray", value)?.iter())))
}

pub fn map(array: &Value, key: &Value) -> Result<Value, HelperError> {
    let key = key.to_js_string();
    Ok(Value::Array(items("map", array)?.iter().map(|o| o.get(&key)).collect()))
}

fn is_comparable(value: &Value) -> bool {
    !value.is_nullish() && value.js_cmp(value).is_some()
}

fn extreme(helper: &'static str, array: &Value, wanted: Ordering) -> Result<Value, HelperError> {
    let mut best: Option<&Value> = None;
    for value in items(helper, array)? {
        if !is_comparable(value) {
            continue;
        }
        best = match best {
            Some(current) if current.js_cmp(value) != Some(wanted.reverse()) => Some(current),
            _ => Some(value),
        };
    }
    Ok(best.cloned().unwrap_or_default())
}

/// Smallest non-missing value; `undefined` when there is none.
pub fn min(array: &Value) -> Result<Value, HelperError> {
    extreme("min", array, Ordering::Less)
}

pub fn max(array: &Value) -> Result<Value, HelperError> {
    extreme("max", array, Ordering::Greater)
}

fn numeric(helper: &'static str, array: &Value) -> Result<Vec<f64>, HelperError> {
    Ok(items(helper, array)?
        .iter()
        .filter(|v| !v.is_nullish())
        .map(Value::to_number)
        .filter(|n| !n.is_nan())
        .collect())
}

pub fn mean(array: &Value) -> Result<Value, HelperError> {
    let values = numeric("mean", array)?;
    if values.is_empty() {
        return Ok(Value::Undefined);
    }
    Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
}

pub fn median(array: &Value) -> Result<Value, HelperError> {
    let mut values = numeric("median", array)?;
    if values.is_empty() {
        return Ok(Value::Undefined);
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let position = (values.len() - 1) as f64 * 0.5;
    let lower = position.floor() as usize;
    let low = values[lower];
    let high = values.get(lower + 1).copied().unwrap_or(low);
    Ok(Value::Number(low + (high - low) * (position - lower as f64)))
}

pub fn sums(array: &Value) -> Result<Value, HelperError> {
    Ok(Value::Number(numeric("sums", array)?.iter().sum()))
}

/// Keep items comparing to `value` under `op` (`>`, `>=`, `<`, `<=`; anything else is `===`).
pub fn filter(array: &Value, value: &Value, op: &str) -> Result<Value, HelperError> {
    let keep = |item: &Value| {
        let order = item.js_cmp(value);
        match op {
            ">" => order == Some(Ordering::Greater),
            ">=" => matches!(order, Some(Ordering::Greater | Ordering::Equal)),
            "<" => order == Some(Ordering::Less),
            "<=" => matches!(order, Some(Ordering::Less | Ordering::Equal)),
            _ => item.strict_eq(value),
        }
    };
    Ok(Value::Array(items("filter", array)?.iter().filter(|v| keep(v)).cloned().collect()))
}

fn column_values(table: &Table, name: &str) -> Vec<Value> {
    table.column(name).iter().map(Value::from).collect()
}

fn not_found(names: &str) -> Value {
    Value::String(format!("Column \"{}\" not found", names))
}

/// Values of column `name` as quoted-list text.
pub fn column(table: &Table, name: &str) -> Value {
    if table.find_column(name).is_none() {
        return not_found(name);
    }
    Value::String(quoted_list(column_values(table, name).iter()))
}

/// Distinct values of column `name` in first-seen order.
pub fn distinct(table: &Table, name: &str) -> Value {
    if table.find_column(name).is_none() {
        return not_found(name);
    }
    let mut seen: Vec<Value> = Vec::new();
    for value in column_values(table, name) {
        if !seen.iter().any(|s| s.strict_eq(&value)) {
            seen.push(value);
        }
    }
    Value::String(quoted_list(seen.iter()))
}

/// Row-wise tuples of the named columns as nested quoted-list text.
pub fn select(table: &Table, names: &[String]) -> Value {
    let missing: Vec<&str> = names
        .iter()
        .filter(|n| table.find_column(n).is_none())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return not_found(&missing.join(","));
    }
    let rows: Vec<String> = table
        .rows()
        .iter()
        .map(|row| {
            let tuple: Vec<Value> = names
                .iter()
                .map(|n| row.get(n).map(Value::from).unwrap_or_default())
                .collect();
            quoted_list(tuple.iter())
        })
        .collect();
    Value::String(format!("[{}]", rows.join(",")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbers(items: &[f64]) -> Value {
        Value::Array(items.iter().map(|n| Value::Number(*n)).collect())
    }

    fn table() -> Table {
        Table::from_json(&json!([
            { "Region": "North", "Sales": 10 },
            { "Region": "South", "Sales": 20 },
            { "Region": "North", "Sales": 5 }
        ]))
        .unwrap()
    }

    #[test]
    fn test_min_max_skip_missing() {
        let values = Value::Array(vec![Value::Null, Value::Number(3.0), Value::Number(-1.0), Value::Undefined]);
        assert_eq!(min(&values).unwrap(), Value::Number(-1.0));
        assert_eq!(max(&values).unwrap(), Value::Number(3.0));
        assert_eq!(min(&Value::Array(vec![])).unwrap(), Value::Undefined);
        let words = Value::Array(vec![Value::str("pear"), Value::str("apple")]);
        assert_eq!(min(&words).unwrap(), Value::str("apple"));
    }

    #[test]
    fn test_mean_median_sums() {
        let values = numbers(&[1.0, 2.0, 3.0, 10.0]);
        assert_eq!(mean(&values).unwrap(), Value::Number(4.0));
        assert_eq!(median(&values).unwrap(), Value::Number(2.5));
        assert_eq!(sums(&values).unwrap(), Value::Number(16.0));
        assert_eq!(sums(&Value::Array(vec![])).unwrap(), Value::Number(0.0));
        assert_eq!(mean(&Value::Array(vec![Value::Null])).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_filter_operators() {
        let values = numbers(&[1.0, 2.0, 3.0]);
        assert_eq!(filter(&values, &Value::Number(2.0), ">").unwrap(), numbers(&[3.0]));
        assert_eq!(filter(&values, &Value::Number(2.0), "<=").unwrap(), numbers(&[1.0, 2.0]));
        assert_eq!(filter(&values, &Value::Number(2.0), "==").unwrap(), numbers(&[2.0]));
        assert_eq!(filter(&values, &Value::str("2"), "==").unwrap(), numbers(&[]));
    }

    #[test]
    fn test_map_and_json_array() {
        let rows = Value::from_json(&json!([{ "a": 1 }, { "a": 2 }, {}]));
        assert_eq!(
            map(&rows, &Value::str("a")).unwrap(),
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Undefined])
        );
        assert_eq!(
            json_array(&Value::Array(vec![Value::str("a"), Value::Number(1.0)])).unwrap(),
            Value::str(r#"["a","1"]"#)
        );
        assert!(map(&Value::Number(1.0), &Value::str("a")).is_err());
    }

    #[test]
    fn test_dataset_helpers() {
        let table = table();
        assert_eq!(column(&table, "Sales"), Value::str(r#"["10","20","5"]"#));
        assert_eq!(distinct(&table, "Region"), Value::str(r#"["North","South"]"#));
        assert_eq!(column(&table, "Profit"), Value::str(r#"Column "Profit" not found"#));
        assert_eq!(
            select(&table, &["Region".to_string(), "Sales".to_string()]),
            Value::str(r#"[["North","10"],["South","20"],["North","5"]]"#)
        );
        assert_eq!(
            select(&table, &["A".to_string(), "Sales".to_string(), "B".to_string()]),
            Value::str(r#"Column "A,B" not found"#)
        );
    }
}
