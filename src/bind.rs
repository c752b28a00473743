// Data binding: realize source references into column vectors

use crate::data::{Primitive, Table};
use crate::spec::{empty_chart, strip_source_suffix};
use crate::walk::{walk, Key, Visit};
use log::{debug, warn};
use serde_json::{json, Value};

/// Replace every source reference in `spec` with the column it names.
///
/// For each field like `xSrc: "Region"` the sibling `x` receives the values of
/// column `Region` in row order. A reference that is not a column name binds a
/// vector of nulls; reporting it is left to validation.
pub fn bind(spec: &mut Value, table: &Table) {
    if !spec.is_object() {
        warn!("Chart specification is not an object; binding an empty chart");
        *spec = empty_chart();
    }
    if let Value::Object(chart) = spec {
        chart.entry("options").or_insert_with(|| json!({}));
        chart.entry("series").or_insert_with(|| json!([]));
    }

    walk(Key::Root, spec, "", &mut |visit, _| {
        let Visit::Member { key, parent } = visit else {
            return;
        };
        let Some(target) = strip_source_suffix(key) else {
            return;
        };
        let column = match parent.get(key) {
            Some(Value::String(name)) => name.clone(),
            _ => String::new(),
        };
        debug!("Binding column '{}' into '{}'", column, target);
        parent.insert(target.to_string(), column_vector(table, &column));
    });
}

/// Column values as JSON, one entry per row.
pub fn column_vector(table: &Table, name: &str) -> Value {
    Value::Array(table.column(name).iter().map(Primitive::to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Table {
        Table::from_json(&json!([
            { "Region": "A", "Sales": 1 },
            { "Region": "B", "Sales": null }
        ]))
        .unwrap()
    }

    #[test]
    fn test_bind_sets_unsuffixed_sibling() {
        let mut spec = json!({ "xSrc": "Region" });
        bind(&mut spec, &regions());
        assert_eq!(spec["x"], json!(["A", "B"]));
        assert_eq!(spec["xSrc"], json!("Region"));
        assert_eq!(spec["options"], json!({}));
        assert_eq!(spec["series"], json!([]));
    }

    #[test]
    fn test_bind_nested_series() {
        let mut spec = json!({
            "options": { "xaxis": { "categoriesSrc": "Region" } },
            "series": [{ "name": "Sales", "dataSrc": "Sales" }]
        });
        bind(&mut spec, &regions());
        assert_eq!(spec["options"]["xaxis"]["categories"], json!(["A", "B"]));
        assert_eq!(spec["series"][0]["data"], json!([1, null]));
    }

    #[test]
    fn test_unknown_column_binds_nulls() {
        let mut spec = json!({ "series": [{ "dataSrc": "Missing" }] });
        bind(&mut spec, &regions());
        assert_eq!(spec["series"][0]["data"], json!([null, null]));
    }

    #[test]
    fn test_binding_twice_is_stable() {
        let table = regions();
        let mut spec = json!({ "series": [{ "dataSrc": "Sales" }] });
        bind(&mut spec, &table);
        let once = spec.clone();
        bind(&mut spec, &table);
        assert_eq!(spec, once);
    }

    #[test]
    fn test_non_object_spec_becomes_empty_chart() {
        let mut spec = json!(42);
        bind(&mut spec, &regions());
        assert_eq!(spec, json!({ "options": {}, "series": [] }));
    }
}
