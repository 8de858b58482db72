//! Visibility conditions
//!
//! A condition is evaluated against the whole current value tree. The
//! declarative variants deserialize from overlay documents:
//!
//! ```json
//! { "equals": { "path": "payment", "value": "card" } }
//! { "all": [ { "truthy": "agree" }, { "not": { "defined": "coupon" } } ] }
//! ```

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::path::Path;
use crate::value::Value;

/// Caller-supplied predicate over the root value
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(<fn>)")
    }
}

/// Predicate deciding whether a node is shown
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Node at `path` equals `value`; an unset node equals nothing
    Equals { path: Path, value: JsonValue },
    NotEquals { path: Path, value: JsonValue },
    /// Node at `path` equals one of `values`
    OneOf { path: Path, values: Vec<JsonValue> },
    Truthy(Path),
    Defined(Path),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    #[serde(skip)]
    Custom(Predicate),
}

impl Condition {
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Condition::Custom(Predicate::new(check))
    }

    pub fn equals(path: Path, value: JsonValue) -> Self {
        Condition::Equals { path, value }
    }

    pub fn evaluate(&self, root: &Value) -> bool {
        match self {
            Condition::Equals { path, value } => matches(root.lookup(path), value),
            Condition::NotEquals { path, value } => !matches(root.lookup(path), value),
            Condition::OneOf { path, values } => {
                let node = root.lookup(path);
                values.iter().any(|v| matches(node, v))
            }
            Condition::Truthy(path) => root.lookup(path).is_truthy(),
            Condition::Defined(path) => !root.lookup(path).is_undefined(),
            Condition::Not(inner) => !inner.evaluate(root),
            Condition::All(all) => all.iter().all(|c| c.evaluate(root)),
            Condition::Any(any) => any.iter().any(|c| c.evaluate(root)),
            Condition::Custom(Predicate(check)) => check(root),
        }
    }
}

fn matches(node: &Value, expected: &JsonValue) -> bool {
    !node.is_undefined() && node.to_json() == *expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    fn root() -> Value {
        Value::from(json!({
            "payment": "card",
            "agree": true,
            "count": 0,
            "tags": ["a"]
        }))
    }

    #[test]
    fn test_equals() {
        let cond = Condition::equals(path!["payment"], json!("card"));
        assert!(cond.evaluate(&root()));

        let cond = Condition::equals(path!["payment"], json!("paypal"));
        assert!(!cond.evaluate(&root()));
    }

    #[test]
    fn test_unset_equals_nothing() {
        let cond = Condition::equals(path!["missing"], json!(null));
        assert!(!cond.evaluate(&root()));

        let cond = Condition::NotEquals {
            path: path!["missing"],
            value: json!("x"),
        };
        assert!(cond.evaluate(&root()));
    }

    #[test]
    fn test_deserialize_combinators() {
        let cond: Condition = serde_json::from_value(json!({
            "all": [
                {"truthy": "agree"},
                {"not": {"truthy": "count"}},
                {"one_of": {"path": "payment", "values": ["card", "cash"]}},
                {"defined": "tags[0]"}
            ]
        }))
        .unwrap();
        assert!(cond.evaluate(&root()));

        let cond: Condition = serde_json::from_value(json!({
            "any": [{"defined": "nope"}, {"equals": {"path": "count", "value": 1}}]
        }))
        .unwrap();
        assert!(!cond.evaluate(&root()));
    }

    #[test]
    fn test_bad_path_rejected() {
        let result: Result<Condition, _> = serde_json::from_value(json!({"truthy": "a..b"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_custom() {
        let cond = Condition::custom(|root| root.field("tags").as_array().map(|t| t.len()) == Some(1));
        assert!(cond.evaluate(&root()));
    }
}
