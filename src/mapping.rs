// Column-reference validation and remapping for raw specifications

use crate::data::{Column, Dataset};
use crate::spec::{is_configured, safe_parse, strip_source_suffix, ENCODE_KEY};
use crate::walk::{walk, Key, Visit};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};

/// Path prefix under which mapping lookups are keyed.
pub const MAPPING_ROOT: &str = "options";

/// A reference whose column is absent from the dataset.
///
/// `reference` is the encode attribute name, or the path-qualified key of a
/// source field (`options.options.xaxis.categoriesSrc`). Serializes as a
/// single-entry object `{ reference: column }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub reference: String,
    pub column: String,
}

impl UnresolvedReference {
    pub fn new(reference: impl Into<String>, column: impl Into<String>) -> Self {
        Self { reference: reference.into(), column: column.into() }
    }
}

impl Serialize for UnresolvedReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.reference, &self.column)?;
        map.end()
    }
}

/// User-supplied replacement names, keyed like [`UnresolvedReference::reference`].
pub type Mapping = IndexMap<String, String>;

fn column_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// List every encode attribute and source field whose column is not in `columns`.
///
/// Matching is exact display-name equality. Returns nothing for an unconfigured
/// specification (`"{}"` or empty).
pub fn verify(text: &str, columns: &[Column]) -> Vec<UnresolvedReference> {
    let mut unresolved = Vec::new();
    if !is_configured(Some(text)) {
        return unresolved;
    }
    let known = |name: &Value| {
        name.as_str()
            .map(|n| columns.iter().any(|c| c.display_name == n))
            .unwrap_or(false)
    };

    let mut chart = safe_parse(text);
    walk(Key::Root, &mut chart, MAPPING_ROOT, &mut |visit, path| {
        let Visit::Member { key, parent } = visit else {
            return;
        };
        let Some(value) = parent.get(key) else {
            return;
        };
        if key == ENCODE_KEY {
            if let Value::Object(encode) = value {
                for (attribute, target) in encode {
                    if !known(target) {
                        unresolved.push(UnresolvedReference::new(attribute, column_name(target)));
                    }
                }
            }
        }
        if strip_source_suffix(key).is_some() && !known(value) {
            unresolved.push(UnresolvedReference::new(
                format!("{}.{}", path, key),
                column_name(value),
            ));
        }
    });
    unresolved
}

/// Rewrite references according to `mapping` and attach the dataset's dimensions.
///
/// Encode attributes take `mapping[attribute]`. A source field at `path.key`
/// takes `mapping["path.key"]`, and its unsuffixed sibling receives that
/// dimension's values from `dataset.source`. Entries the mapping does not
/// mention are left as they are.
pub fn apply(text: &str, mapping: &Mapping, dataset: &Dataset) -> String {
    let mut chart = safe_parse(text);

    if is_configured(Some(text)) {
        walk(Key::Root, &mut chart, MAPPING_ROOT, &mut |visit, path| {
            let Visit::Member { key, parent } = visit else {
                return;
            };
            if key == ENCODE_KEY {
                if let Some(Value::Object(encode)) = parent.get_mut(key) {
                    for (attribute, target) in encode.iter_mut() {
                        if let Some(column) = mapping.get(attribute) {
                            *target = Value::String(column.clone());
                        }
                    }
                }
            }
            if let Some(base) = strip_source_suffix(key) {
                if let Some(column) = mapping.get(&format!("{}.{}", path, key)) {
                    parent.insert(base.to_string(), Value::Array(dataset.vector(column)));
                    parent.insert(key.to_string(), Value::String(column.clone()));
                }
            }
        });
    }

    if let Value::Object(obj) = &mut chart {
        obj.insert("dataset".to_string(), json!({ "dimensions": dataset.dimensions }));
    }

    chart.to_string()
}
