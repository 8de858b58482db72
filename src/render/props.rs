//! Renderer inputs
//!
//! Every renderer receives a props struct describing one node plus the
//! handlers it should wire to its controls. Handlers do not touch any state:
//! they translate control input into a [`FormEvent`] for the session to
//! dispatch.

use chrono::NaiveDate;
use serde::Serialize;

use crate::mutation::{ArrayRemoval, Edit};
use crate::path::Path;
use crate::schema::parse::coerce_date;
use crate::session::FormEvent;
use crate::value::Value;

/// Leaf node kinds with a single input control
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    String,
    Number,
    Boolean,
    Date,
    Enum,
}

/// Leaf kind with the constraints a control may want to mirror
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
        email: bool,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
        integer: bool,
    },
    Boolean,
    Date {
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
    Enum {
        options: Vec<EnumOption>,
    },
}

impl FieldKind {
    pub fn leaf_kind(&self) -> LeafKind {
        match self {
            FieldKind::String { .. } => LeafKind::String,
            FieldKind::Number { .. } => LeafKind::Number,
            FieldKind::Boolean => LeafKind::Boolean,
            FieldKind::Date { .. } => LeafKind::Date,
            FieldKind::Enum { .. } => LeafKind::Enum,
        }
    }
}

/// One selectable enum value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumOption {
    pub value: String,
    pub label: String,
}

/// Props for a leaf field
#[derive(Clone, Debug)]
pub struct FieldProps {
    pub kind: FieldKind,
    pub path: Path,
    pub label: String,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub value: Value,
    /// First validation message at this path
    pub error: Option<String>,
    pub required: bool,
    pub auto_focus: bool,
    pub on_change: ChangeHandler,
}

/// Props for a nested (non-root) object
#[derive(Debug)]
pub struct ObjectProps<V> {
    pub path: Path,
    pub title: String,
    pub description: Option<String>,
    pub error: Option<String>,
    pub required: bool,
    /// Rendered visible fields, in declaration order
    pub children: Vec<V>,
}

/// One rendered array element
#[derive(Debug)]
pub struct ArrayItem<V> {
    pub index: usize,
    pub path: Path,
    pub view: V,
    pub on_remove: ArrayRemoveHandler,
}

/// Props for an array of non-enum elements
#[derive(Debug)]
pub struct ArrayProps<V> {
    pub path: Path,
    pub title: String,
    pub description: Option<String>,
    pub error: Option<String>,
    pub required: bool,
    /// Visible elements; hidden ones are skipped but keep their indices
    pub items: Vec<ArrayItem<V>>,
    /// False once the exact or maximum length is reached
    pub can_add: bool,
    /// False at the exact or minimum length
    pub can_remove: bool,
    pub min_title: Option<String>,
    pub max_title: Option<String>,
    pub on_add: ArrayAddHandler,
}

/// Props for an array of enum values, shown as a set of choices
#[derive(Clone, Debug)]
pub struct MultiChoiceProps {
    pub path: Path,
    pub label: String,
    pub description: Option<String>,
    pub error: Option<String>,
    pub required: bool,
    pub options: Vec<EnumOption>,
    pub selected: Vec<String>,
    pub on_change: MultiChoiceHandler,
}

impl MultiChoiceProps {
    pub fn is_selected(&self, option: &str) -> bool {
        self.selected.iter().any(|s| s == option)
    }
}

/// Turns control input for one leaf into edits
///
/// Clearing a field unsets it rather than storing an empty value: an empty
/// string, a non-numeric or NaN number and an unparseable date all produce a
/// removal. Booleans always update.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeHandler {
    path: Path,
    kind: LeafKind,
}

impl ChangeHandler {
    pub fn new(path: Path, kind: LeafKind) -> Self {
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> LeafKind {
        self.kind
    }

    /// Raw text from an input control
    pub fn on_input(&self, text: &str) -> FormEvent {
        let value = match self.kind {
            LeafKind::String | LeafKind::Enum => Value::String(text.to_string()),
            LeafKind::Number => text
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .unwrap_or(Value::Undefined),
            LeafKind::Boolean => Value::Bool(matches!(text.trim(), "true" | "on" | "1")),
            LeafKind::Date => Value::String(text.trim().to_string()),
        };
        self.on_value(value)
    }

    /// Typed value from a control
    pub fn on_value(&self, value: Value) -> FormEvent {
        let normalized = match self.kind {
            LeafKind::String => match value {
                Value::String(s) if !s.is_empty() => Some(Value::String(s)),
                _ => None,
            },
            LeafKind::Number => match value {
                Value::Number(n) if !n.is_nan() => Some(Value::Number(n)),
                _ => None,
            },
            LeafKind::Date => coerce_date(&value).map(Value::Date),
            LeafKind::Boolean => Some(Value::Bool(value.is_truthy())),
            // The "no selection" entry maps to unset
            LeafKind::Enum => Some(match value {
                Value::String(s) if s.is_empty() => Value::Undefined,
                other => other,
            }),
        };

        match normalized {
            Some(value) => Edit::update(self.path.clone(), value).into(),
            None => Edit::remove(self.path.clone(), ArrayRemoval::SetToUndefined).into(),
        }
    }
}

/// Turns checkbox toggles of a multi-choice array into edits
#[derive(Clone, Debug, PartialEq)]
pub struct MultiChoiceHandler {
    path: Path,
    options: Vec<String>,
    selected: Vec<String>,
}

impl MultiChoiceHandler {
    pub fn new(path: Path, options: Vec<String>, selected: Vec<String>) -> Self {
        Self {
            path,
            options,
            selected,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the selection with `option` checked or unchecked
    ///
    /// The written array follows option order, whatever order the current
    /// value holds.
    pub fn toggle(&self, option: &str, checked: bool) -> FormEvent {
        let next: Vec<Value> = self
            .options
            .iter()
            .filter(|o| {
                if o.as_str() == option {
                    checked
                } else {
                    self.selected.contains(o)
                }
            })
            .map(|o| Value::String(o.clone()))
            .collect();
        Edit::update(self.path.clone(), next).into()
    }
}

/// Appends one default element to an array
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayAddHandler {
    path: Path,
    element: Value,
}

impl ArrayAddHandler {
    pub fn new(path: Path, element: Value) -> Self {
        Self { path, element }
    }

    /// Path the new element will occupy
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add(&self) -> FormEvent {
        Edit::update(self.path.clone(), self.element.clone()).into()
    }
}

/// Deletes one array element, shifting the rest down
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayRemoveHandler {
    path: Path,
}

impl ArrayRemoveHandler {
    pub fn new(path: Path) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(&self) -> FormEvent {
        FormEvent::ArrayRemove(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    fn update(path: Path, value: impl Into<Value>) -> FormEvent {
        FormEvent::Edit(Edit::update(path, value))
    }

    fn clear(path: Path) -> FormEvent {
        FormEvent::Edit(Edit::remove(path, ArrayRemoval::SetToUndefined))
    }

    #[test]
    fn test_string_empty_clears() {
        let handler = ChangeHandler::new(path!["name"], LeafKind::String);
        assert_eq!(handler.on_input("Ada"), update(path!["name"], "Ada"));
        assert_eq!(handler.on_input(""), clear(path!["name"]));
    }

    #[test]
    fn test_number_parsing() {
        let handler = ChangeHandler::new(path!["age"], LeafKind::Number);
        assert_eq!(handler.on_input("18"), update(path!["age"], 18.0));
        assert_eq!(handler.on_input(""), clear(path!["age"]));
        assert_eq!(handler.on_input("abc"), clear(path!["age"]));
        assert_eq!(handler.on_value(Value::Number(f64::NAN)), clear(path!["age"]));
    }

    #[test]
    fn test_date_parsing() {
        let handler = ChangeHandler::new(path!["born"], LeafKind::Date);
        let date = NaiveDate::from_ymd_opt(1990, 4, 1).unwrap();
        assert_eq!(handler.on_input("1990-04-01"), update(path!["born"], date));
        assert_eq!(handler.on_input("not a date"), clear(path!["born"]));
    }

    #[test]
    fn test_enum_empty_is_unset_update() {
        let handler = ChangeHandler::new(path!["color"], LeafKind::Enum);
        assert_eq!(handler.on_input(""), update(path!["color"], Value::Undefined));
        assert_eq!(handler.on_input("red"), update(path!["color"], "red"));
    }

    #[test]
    fn test_boolean_always_updates() {
        let handler = ChangeHandler::new(path!["agree"], LeafKind::Boolean);
        assert_eq!(handler.on_value(Value::Bool(false)), update(path!["agree"], false));
        assert_eq!(handler.on_input("on"), update(path!["agree"], true));
    }

    #[test]
    fn test_toggle_keeps_option_order() {
        let options = vec!["apple".to_string(), "banana".to_string(), "cherry".to_string()];
        let handler = MultiChoiceHandler::new(
            path!["fruits"],
            options,
            vec!["cherry".to_string(), "apple".to_string()],
        );

        let expected: Vec<Value> = vec!["apple".into(), "banana".into(), "cherry".into()];
        assert_eq!(handler.toggle("banana", true), update(path!["fruits"], expected));

        let expected: Vec<Value> = vec!["apple".into()];
        assert_eq!(handler.toggle("cherry", false), update(path!["fruits"], expected));
    }

    #[test]
    fn test_array_handlers() {
        let add = ArrayAddHandler::new(path!["people", 2usize], Value::object());
        assert_eq!(add.add(), update(path!["people", 2usize], Value::object()));

        let remove = ArrayRemoveHandler::new(path!["people", 0usize]);
        assert_eq!(remove.remove(), FormEvent::ArrayRemove(path!["people", 0usize]));
    }
}
