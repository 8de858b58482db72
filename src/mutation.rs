//! Copy-on-write edits of value trees
//!
//! Every operation returns a new tree. Containers along the edited path are
//! copied, everything else stays shared with the input.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::path::{Path, PathSegment};
use crate::value::{Fields, Value};

/// What removing an array element does to the array
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayRemoval {
    /// Splice the element out, shifting later elements down
    #[default]
    Delete,
    /// Keep the slot and mark it unset
    SetToUndefined,
}

/// A single edit of a value tree
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    Update { path: Path, value: Value },
    Remove { path: Path, removal: ArrayRemoval },
}

impl Edit {
    pub fn update(path: Path, value: impl Into<Value>) -> Self {
        Edit::Update {
            path,
            value: value.into(),
        }
    }

    pub fn remove(path: Path, removal: ArrayRemoval) -> Self {
        Edit::Remove { path, removal }
    }

    pub fn path(&self) -> &Path {
        match self {
            Edit::Update { path, .. } | Edit::Remove { path, .. } => path,
        }
    }
}

/// Apply `edit` to `tree`
pub fn apply(tree: &Value, edit: &Edit) -> Value {
    match edit {
        Edit::Update { path, value } => update(tree, path, value.clone()),
        Edit::Remove { path, removal } => remove(tree, path, *removal),
    }
}

/// Set the node at `path` to `value`
///
/// Missing intermediate containers are created: an object for a key segment,
/// an array for an index segment. Writing past the end of an array pads the
/// gap with unset slots. A container of the wrong shape on the path is
/// replaced.
pub fn update(tree: &Value, path: &Path, value: Value) -> Value {
    set_in(tree.clone(), path.segments(), value)
}

fn set_in(node: Value, segments: &[PathSegment], value: Value) -> Value {
    let Some((segment, rest)) = segments.split_first() else {
        return value;
    };

    match segment {
        PathSegment::Key(key) => {
            let mut fields = match node {
                Value::Object(fields) => fields,
                _ => Arc::new(Fields::new()),
            };
            let map = Arc::make_mut(&mut fields);
            let child = map.remove(key).unwrap_or_default();
            map.insert(key.clone(), set_in(child, rest, value));
            Value::Object(fields)
        }
        PathSegment::Index(idx) => {
            let mut items = match node {
                Value::Array(items) => items,
                _ => Arc::new(Vec::new()),
            };
            let vec = Arc::make_mut(&mut items);
            if vec.len() <= *idx {
                vec.resize(idx + 1, Value::Undefined);
            }
            let child = std::mem::take(&mut vec[*idx]);
            vec[*idx] = set_in(child, rest, value);
            Value::Array(items)
        }
    }
}

/// Remove the node at `path`
///
/// Object fields are deleted. Array elements are spliced out or set unset
/// depending on `removal`. Removing something that is not there returns the
/// tree unchanged. The root cannot be removed.
pub fn remove(tree: &Value, path: &Path, removal: ArrayRemoval) -> Value {
    match path.segments().split_last() {
        Some((last, parents)) => remove_in(tree.clone(), parents, last, removal),
        None => tree.clone(),
    }
}

fn remove_in(
    node: Value,
    parents: &[PathSegment],
    last: &PathSegment,
    removal: ArrayRemoval,
) -> Value {
    let Some((segment, rest)) = parents.split_first() else {
        return remove_child(node, last, removal);
    };

    match (node, segment) {
        (Value::Object(mut fields), PathSegment::Key(key)) => {
            if !fields.contains_key(key) {
                return Value::Object(fields);
            }
            let map = Arc::make_mut(&mut fields);
            let child = map.remove(key).unwrap_or_default();
            map.insert(key.clone(), remove_in(child, rest, last, removal));
            Value::Object(fields)
        }
        (Value::Array(mut items), PathSegment::Index(idx)) => {
            if *idx >= items.len() {
                return Value::Array(items);
            }
            let vec = Arc::make_mut(&mut items);
            let child = std::mem::take(&mut vec[*idx]);
            vec[*idx] = remove_in(child, rest, last, removal);
            Value::Array(items)
        }
        (other, _) => other,
    }
}

fn remove_child(node: Value, last: &PathSegment, removal: ArrayRemoval) -> Value {
    match (node, last) {
        (Value::Object(mut fields), PathSegment::Key(key)) => {
            if fields.contains_key(key) {
                Arc::make_mut(&mut fields).remove(key);
            }
            Value::Object(fields)
        }
        (Value::Array(mut items), PathSegment::Index(idx)) => {
            if *idx < items.len() {
                let vec = Arc::make_mut(&mut items);
                match removal {
                    ArrayRemoval::Delete => {
                        vec.remove(*idx);
                    }
                    ArrayRemoval::SetToUndefined => vec[*idx] = Value::Undefined,
                }
            }
            Value::Array(items)
        }
        (other, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    fn tree() -> Value {
        Value::from(json!({
            "name": "Ada",
            "people": [{"name": "a"}, {"name": "b"}, {"name": "c"}],
            "address": {"city": "Paris", "zip": "75001"}
        }))
    }

    fn shares(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
            (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    #[test]
    fn test_update_leaves_input_untouched() {
        let before = tree();
        let after = update(&before, &path!["address", "city"], Value::from("Lyon"));

        assert_eq!(before.lookup(&path!["address", "city"]), &Value::from("Paris"));
        assert_eq!(after.lookup(&path!["address", "city"]), &Value::from("Lyon"));
        assert!(shares(before.field("people"), after.field("people")));
        assert!(!shares(before.field("address"), after.field("address")));
    }

    #[test]
    fn test_update_creates_containers() {
        let after = update(&Value::object(), &path!["a", 2usize, "b"], Value::from(1));
        assert_eq!(after.to_json(), json!({"a": [null, null, {"b": 1}]}));
        assert!(after.lookup(&path!["a", 0usize]).is_undefined());
    }

    #[test]
    fn test_update_replaces_wrong_shape() {
        let after = update(&Value::from("scalar"), &path!["x"], Value::from(true));
        assert_eq!(after.to_json(), json!({"x": true}));
    }

    #[test]
    fn test_update_root() {
        let after = update(&tree(), &Path::root(), Value::from(5));
        assert_eq!(after, Value::from(5));
    }

    #[test]
    fn test_remove_field() {
        let after = remove(&tree(), &path!["address", "zip"], ArrayRemoval::Delete);
        assert_eq!(after.field("address").to_json(), json!({"city": "Paris"}));
    }

    #[test]
    fn test_remove_array_element_delete_shifts() {
        let after = remove(&tree(), &path!["people", 1usize], ArrayRemoval::Delete);
        assert_eq!(after.field("people").to_json(), json!([{"name": "a"}, {"name": "c"}]));
    }

    #[test]
    fn test_remove_array_element_keeps_slot() {
        let after = remove(&tree(), &path!["people", 1usize], ArrayRemoval::SetToUndefined);
        let people = after.field("people").as_array().unwrap();
        assert_eq!(people.len(), 3);
        assert!(people[1].is_undefined());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let before = tree();
        for path in [path!["nope"], path!["nope", "deeper"], path!["people", 9usize]] {
            let after = remove(&before, &path, ArrayRemoval::Delete);
            assert_eq!(after, before);
            assert!(shares(&after, &before));
        }
    }

    #[test]
    fn test_apply_dispatches() {
        let edit = Edit::update(path!["name"], "Grace");
        assert_eq!(edit.path(), &path!["name"]);
        let after = apply(&tree(), &edit);
        assert_eq!(after.field("name"), &Value::from("Grace"));

        let after = apply(&after, &Edit::remove(path!["name"], ArrayRemoval::Delete));
        assert!(after.field("name").is_undefined());
    }
}
