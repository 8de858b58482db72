//! Overlay documents in JSON
//!
//! The document mirrors the schema. Leaf and array nodes hold their settings
//! directly; object nodes hold one entry per field plus an optional `ui`
//! entry with the object's own settings:
//!
//! ```json
//! {
//!   "ui": { "title": "Checkout" },
//!   "name": { "label": "Full name", "autoFocus": true },
//!   "people": { "minTitle": "Add someone", "element": { "age": { "placeholder": "years" } } },
//!   "~ui": { "label": "Theme" }
//! }
//! ```
//!
//! A leading `~` is stripped from a key and the rest always names a field,
//! so `~ui` addresses a field called `ui` and `~~x` a field called `~x`.

use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use super::{Component, Condition, UiNode};
use crate::error::{FormError, Result};
use crate::path::Path;
use crate::schema::introspect::unwrap_at;
use crate::schema::{ArraySchema, NodeKind, ObjectSchema, Schema};

/// Key holding an object node's own settings
pub const NODE_SETTINGS_KEY: &str = "ui";

/// Build an overlay tree from `doc`, guided by `schema`
///
/// Entries for fields the schema does not declare and unknown setting keys are
/// skipped with a warning. Settings of the wrong type are an error.
pub fn load_overlay<V>(schema: &Schema, doc: &JsonValue) -> Result<UiNode<V>> {
    load_node(schema, doc, &Path::root())
}

fn load_node<V>(schema: &Schema, doc: &JsonValue, path: &Path) -> Result<UiNode<V>> {
    let JsonValue::Object(map) = doc else {
        return Err(FormError::invalid_overlay(
            path,
            format!("expected an object, found {}", json_type(doc)),
        ));
    };

    match unwrap_at(schema, path)?.kind {
        NodeKind::Object(obj) => load_object(obj, map, path),
        NodeKind::Array(arr) => load_array(arr, map, path),
        _ => {
            let mut node = UiNode::new();
            for (key, value) in map {
                if !apply_setting(&mut node, key, value, path)? {
                    warn!(path = %path, key = %key, "Unknown overlay setting ignored");
                }
            }
            Ok(node)
        }
    }
}

fn load_object<V>(obj: &ObjectSchema, map: &Map<String, JsonValue>, path: &Path) -> Result<UiNode<V>> {
    let mut node = UiNode::new();

    for (key, value) in map {
        if key == NODE_SETTINGS_KEY {
            if obj.field(NODE_SETTINGS_KEY).is_some() {
                warn!(
                    path = %path,
                    "'ui' holds the object's own settings; use '~ui' for the field named 'ui'"
                );
            }
            let JsonValue::Object(settings) = value else {
                return Err(FormError::invalid_overlay(
                    path,
                    format!("'ui' must be an object, found {}", json_type(value)),
                ));
            };
            for (setting, setting_value) in settings {
                if !apply_setting(&mut node, setting, setting_value, path)? {
                    warn!(path = %path, key = %setting, "Unknown overlay setting ignored");
                }
            }
            continue;
        }

        let name = key.strip_prefix('~').unwrap_or(key);
        let field_path = path.push_key(name);
        match obj.field(name) {
            Some(field_schema) => {
                let child = load_node(field_schema, value, &field_path)?;
                node.fields.insert(name.to_string(), child);
            }
            None => warn!(path = %field_path, "Overlay entry for undeclared field ignored"),
        }
    }

    Ok(node)
}

fn load_array<V>(arr: &ArraySchema, map: &Map<String, JsonValue>, path: &Path) -> Result<UiNode<V>> {
    let mut node = UiNode::new();

    for (key, value) in map {
        if key == "element" {
            let element = load_node(&arr.element, value, &path.push_index(0))?;
            node.element = Some(Box::new(element));
        } else if !apply_setting(&mut node, key, value, path)? {
            warn!(path = %path, key = %key, "Unknown overlay setting ignored");
        }
    }

    Ok(node)
}

/// Apply one node setting; `false` when `key` is not a setting
fn apply_setting<V>(node: &mut UiNode<V>, key: &str, value: &JsonValue, path: &Path) -> Result<bool> {
    match key {
        "label" => node.label = Some(expect_string(key, value, path)?),
        "title" => node.title = Some(expect_string(key, value, path)?),
        "description" => node.description = Some(expect_string(key, value, path)?),
        "placeholder" => node.placeholder = Some(expect_string(key, value, path)?),
        "minTitle" => node.min_title = Some(expect_string(key, value, path)?),
        "maxTitle" => node.max_title = Some(expect_string(key, value, path)?),
        "component" => {
            node.component = Some(Component::Named(expect_string(key, value, path)?));
        }
        "autoFocus" => {
            node.auto_focus = value.as_bool().ok_or_else(|| {
                FormError::invalid_overlay(path, format!("'autoFocus' must be a boolean, found {}", json_type(value)))
            })?;
        }
        "cond" => {
            let cond: Condition = serde_json::from_value(value.clone())
                .map_err(|e| FormError::invalid_overlay(path, format!("invalid 'cond': {}", e)))?;
            node.cond = Some(cond);
        }
        "optionLabels" => {
            let JsonValue::Object(labels) = value else {
                return Err(FormError::invalid_overlay(
                    path,
                    format!("'optionLabels' must be an object, found {}", json_type(value)),
                ));
            };
            for (option, label) in labels {
                let label = expect_string(option, label, path)?;
                node.option_labels.insert(option.clone(), label);
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn expect_string(key: &str, value: &JsonValue, path: &Path) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        FormError::invalid_overlay(path, format!("'{}' must be a string, found {}", key, json_type(value)))
    })
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array, boolean, enumeration, number, object, string};
    use crate::value::Value;
    use serde_json::json;

    fn schema() -> Schema {
        object([
            ("name", string()),
            ("payment", enumeration(["card", "paypal"])),
            ("card", string().optional()),
            ("people", array(object([("age", number())])).min(1)),
            ("ui", boolean()),
        ])
    }

    #[test]
    fn test_load_nested_document() {
        let ui: UiNode<()> = load_overlay(
            &schema(),
            &json!({
                "ui": {"title": "Checkout"},
                "name": {"label": "Full name", "autoFocus": true},
                "payment": {"optionLabels": {"card": "Credit card"}},
                "card": {"cond": {"equals": {"path": "payment", "value": "card"}}},
                "people": {"minTitle": "Add someone", "element": {"age": {"placeholder": "years"}}}
            }),
        )
        .unwrap();

        assert_eq!(ui.title.as_deref(), Some("Checkout"));
        assert!(ui.child("name").unwrap().auto_focus);
        assert_eq!(
            ui.child("payment").unwrap().option_labels.get("card").map(String::as_str),
            Some("Credit card")
        );
        let cond = ui.child("card").unwrap().cond.as_ref().unwrap();
        assert!(cond.evaluate(&Value::from(json!({"payment": "card"}))));
        let people = ui.child("people").unwrap();
        assert_eq!(people.min_title.as_deref(), Some("Add someone"));
        assert_eq!(
            people.element_node().unwrap().child("age").unwrap().placeholder.as_deref(),
            Some("years")
        );
    }

    #[test]
    fn test_tilde_escapes_field_names() {
        let ui: UiNode<()> = load_overlay(
            &schema(),
            &json!({"ui": {"title": "Form"}, "~ui": {"label": "Dark mode"}, "~name": {"label": "Name"}}),
        )
        .unwrap();

        assert_eq!(ui.title.as_deref(), Some("Form"));
        assert_eq!(ui.child("ui").unwrap().label.as_deref(), Some("Dark mode"));
        assert_eq!(ui.child("name").unwrap().label.as_deref(), Some("Name"));
    }

    #[test]
    fn test_unknown_entries_are_skipped() {
        let ui: UiNode<()> = load_overlay(
            &schema(),
            &json!({"nope": {"label": "x"}, "name": {"colour": "red"}}),
        )
        .unwrap();
        assert!(ui.child("nope").is_none());
        assert!(ui.child("name").unwrap().label.is_none());
    }

    #[test]
    fn test_wrong_setting_types_fail() {
        let err = load_overlay::<()>(&schema(), &json!({"name": {"label": 3}})).unwrap_err();
        assert!(matches!(err, FormError::InvalidOverlay { ref path, .. } if path == "name"));

        let err = load_overlay::<()>(&schema(), &json!({"people": {"element": {"age": []}}})).unwrap_err();
        assert!(matches!(err, FormError::InvalidOverlay { ref path, .. } if path == "people[0].age"));

        let err = load_overlay::<()>(&schema(), &json!({"card": {"cond": {"bogus": 1}}})).unwrap_err();
        assert!(matches!(err, FormError::InvalidOverlay { .. }));
    }

    #[test]
    fn test_component_is_named() {
        let ui: UiNode<()> = load_overlay(&schema(), &json!({"name": {"component": "textarea"}})).unwrap();
        assert!(matches!(
            ui.child("name").unwrap().component,
            Some(Component::Named(ref name)) if name == "textarea"
        ));
    }
}
