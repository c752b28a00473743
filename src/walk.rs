//! Generic traversal over a specification tree.
//!
//! Every consumer (binding, validation, remapping) walks the tree the same way
//! and keys its lookups by the path strings produced here, so the path format
//! is part of the user-visible mapping contract:
//!
//! - entering an object member `k` extends the path with `.k`;
//! - entering element `i` of an array held under `k` extends it with `[i].k`
//!   (the array's own key is reattached after the index).
//!
//! Nodes are visited before their children. A visitor may rewrite the entry it
//! is handed; the walker re-reads the child after the visit, and members added
//! to an object during its traversal are not visited.

use serde_json::{Map, Value};
use std::borrow::Cow;

/// Name under which a node was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Root,
    Name(&'a str),
    Index(usize),
}

impl Key<'_> {
    pub fn as_str(&self) -> Option<Cow<'_, str>> {
        match self {
            Key::Root => None,
            Key::Name(name) => Some(Cow::Borrowed(name)),
            Key::Index(i) => Some(Cow::Owned(i.to_string())),
        }
    }
}

/// One visited entry together with the container that owns it.
pub enum Visit<'a> {
    /// Member `key` of an object.
    Member { key: &'a str, parent: &'a mut Map<String, Value> },
    /// Element `index` of an array.
    Element { index: usize, parent: &'a mut Vec<Value> },
    /// A scalar reached directly (no owning container is exposed).
    Leaf { key: Key<'a>, value: &'a Value },
}

impl Visit<'_> {
    pub fn key(&self) -> Key<'_> {
        match self {
            Visit::Member { key, .. } => Key::Name(key),
            Visit::Element { index, .. } => Key::Index(*index),
            Visit::Leaf { key, .. } => *key,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Visit::Member { key, parent } => parent.get(*key),
            Visit::Element { index, parent } => parent.get(*index),
            Visit::Leaf { value, .. } => Some(value),
        }
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Walk `node`, calling `visit` with each entry and the path of its container.
pub fn walk<F>(key: Key<'_>, node: &mut Value, path: &str, visit: &mut F)
where
    F: FnMut(Visit<'_>, &str),
{
    match node {
        Value::Object(map) => walk_object(map, path, visit),
        Value::Array(items) => walk_indices(items, path, visit),
        scalar => visit(Visit::Leaf { key, value: scalar }, path),
    }
}

fn walk_object<F>(map: &mut Map<String, Value>, path: &str, visit: &mut F)
where
    F: FnMut(Visit<'_>, &str),
{
    let keys: Vec<String> = map.keys().cloned().collect();
    for k in keys {
        if let Some(Value::Array(items)) = map.get_mut(&k) {
            walk_array(&k, items, path, visit);
            continue;
        }
        if !map.contains_key(&k) {
            continue;
        }
        visit(Visit::Member { key: &k, parent: &mut *map }, path);
        if let Some(child) = map.get_mut(&k) {
            if is_composite(child) {
                walk(Key::Name(&k), child, &format!("{}.{}", path, k), visit);
            }
        }
    }
}

/// Elements of an array held under `name`.
fn walk_array<F>(name: &str, items: &mut Vec<Value>, path: &str, visit: &mut F)
where
    F: FnMut(Visit<'_>, &str),
{
    let mut index = 0;
    while index < items.len() {
        visit(Visit::Element { index, parent: &mut *items }, path);
        if let Some(element) = items.get_mut(index) {
            walk(Key::Index(index), element, &format!("{}[{}].{}", path, index, name), visit);
        }
        index += 1;
    }
}

/// An array reached as a node itself: its indices play the role of member names.
fn walk_indices<F>(items: &mut Vec<Value>, path: &str, visit: &mut F)
where
    F: FnMut(Visit<'_>, &str),
{
    let mut index = 0;
    while index < items.len() {
        let nested = matches!(items.get(index), Some(Value::Array(_)));
        if nested {
            if let Some(Value::Array(inner)) = items.get_mut(index) {
                walk_array(&index.to_string(), inner, path, visit);
            }
        } else {
            visit(Visit::Element { index, parent: &mut *items }, path);
            if let Some(child) = items.get_mut(index) {
                if is_composite(child) {
                    walk(Key::Index(index), child, &format!("{}.{}", path, index), visit);
                }
            }
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect(tree: &mut Value, prefix: &str) -> Vec<(String, String, Option<Value>)> {
        let mut seen = Vec::new();
        walk(Key::Root, tree, prefix, &mut |visit, path| {
            let key = visit.key().as_str().map(|k| k.into_owned()).unwrap_or_default();
            let kind = match &visit {
                Visit::Member { .. } => "member",
                Visit::Element { .. } => "element",
                Visit::Leaf { .. } => "leaf",
            };
            seen.push((format!("{}:{}", kind, key), path.to_string(), visit.value().cloned()));
        });
        seen
    }

    #[test]
    fn test_paths_reattach_array_key() {
        let mut tree = json!({ "a": { "b": [{ "c": 1 }] } });
        let seen = collect(&mut tree, "x");
        let paths: Vec<(&str, &str)> =
            seen.iter().map(|(k, p, _)| (k.as_str(), p.as_str())).collect();
        assert_eq!(
            paths,
            vec![
                ("member:a", "x"),
                ("element:0", "x.a"),
                ("member:c", "x.a[0].b"),
            ]
        );
    }

    #[test]
    fn test_scalar_array_elements_are_also_visited_as_leaves() {
        let mut tree = json!({ "v": [7] });
        let seen = collect(&mut tree, "p");
        let keys: Vec<(&str, &str)> =
            seen.iter().map(|(k, p, _)| (k.as_str(), p.as_str())).collect();
        assert_eq!(keys, vec![("element:0", "p"), ("leaf:0", "p[0].v")]);
    }

    #[test]
    fn test_root_scalar_is_a_leaf() {
        let mut tree = json!(3);
        let seen = collect(&mut tree, "");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "leaf:");
        assert_eq!(seen[0].2, Some(json!(3)));
    }

    #[test]
    fn test_visit_before_recurse_sees_rewrites() {
        let mut tree = json!({ "outer": { "inner": 1 } });
        let mut inner_values = Vec::new();
        walk(Key::Root, &mut tree, "", &mut |visit, _| {
            if let Visit::Member { key, parent } = visit {
                if key == "outer" {
                    parent.insert("outer".to_string(), json!({ "inner": 2 }));
                } else if key == "inner" {
                    inner_values.push(parent[key].clone());
                }
            }
        });
        assert_eq!(inner_values, vec![json!(2)]);
    }

    #[test]
    fn test_members_added_during_walk_are_not_visited() {
        let mut tree = json!({ "a": 1 });
        let mut count = 0;
        walk(Key::Root, &mut tree, "", &mut |visit, _| {
            count += 1;
            if let Visit::Member { parent, .. } = visit {
                parent.insert("b".to_string(), json!(2));
            }
        });
        assert_eq!(count, 1);
        assert_eq!(tree, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn test_nested_arrays_use_index_as_key() {
        let mut tree = json!({ "m": [[{ "z": true }]] });
        let seen = collect(&mut tree, "r");
        let paths: Vec<(&str, &str)> =
            seen.iter().map(|(k, p, _)| (k.as_str(), p.as_str())).collect();
        assert_eq!(
            paths,
            vec![
                ("element:0", "r"),
                ("element:0", "r[0].m"),
                ("member:z", "r[0].m.0"),
            ]
        );
    }
}
