//! Schema nodes describing the shape and constraints of form data
//!
//! Schemas are built from the constructor functions in this module and
//! narrowed with chainable modifiers:
//!
//! ```rust
//! use schemaform::schema::{object, string, number};
//!
//! let schema = object([
//!     ("name", string().min(3).optional()),
//!     ("age", number().int().min(0.0)),
//! ]);
//! ```

use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::path::Path;
use crate::value::Value;

pub mod introspect;
pub mod parse;
pub mod resolver;

pub use introspect::{classify, schema_at, unwrap, NodeKind, Unwrapped};
pub use parse::safe_parse;

/// Produces the value of a defaulted field
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Custom check run after the inner schema accepted a value
pub type RefineFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Descriptive metadata carried by any node, wrappers included
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Meta {
    /// Fill unset properties from `inner`; properties already set here win
    pub fn merge_inner(&mut self, inner: &Meta) {
        if self.title.is_none() {
            self.title = inner.title.clone();
        }
        if self.description.is_none() {
            self.description = inner.description.clone();
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
    pub email: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumberRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub integer: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DateRules {
    pub min: Option<chrono::NaiveDate>,
    pub max: Option<chrono::NaiveDate>,
}

#[derive(Clone, Debug)]
pub struct ArraySchema {
    pub element: Box<Schema>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub exact_items: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct ObjectSchema {
    /// Fields in declaration order
    pub fields: Vec<(String, Schema)>,
}

impl ObjectSchema {
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

/// Compiled regular expression with its source kept for messages
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: regex::Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: regex::Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A custom constraint attached with [`Schema::refine`]
#[derive(Clone)]
pub struct Refinement {
    pub check: RefineFn,
    pub message: String,
    /// Where the issue is reported, relative to the refined node
    pub path: Path,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("message", &self.message)
            .field("path", &self.path.to_string())
            .finish()
    }
}

/// Kind tag of a schema node
#[derive(Clone)]
pub enum SchemaKind {
    String(StringRules),
    Number(NumberRules),
    Boolean,
    Date(DateRules),
    Enum(Vec<String>),
    Array(ArraySchema),
    Object(ObjectSchema),
    Optional(Box<Schema>),
    Defaulted(Box<Schema>, DefaultFn),
    Refined(Box<Schema>, Refinement),
    /// Only `null` is accepted
    Null,
    /// Only this exact value is accepted
    Literal(JsonValue),
    /// First matching variant wins
    Union(Vec<Schema>),
    /// Anything is accepted; carries no kind the form engine can render
    Any,
}

impl SchemaKind {
    pub fn tag(&self) -> &'static str {
        match self {
            SchemaKind::String(_) => "string",
            SchemaKind::Number(_) => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Date(_) => "date",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
            SchemaKind::Optional(_) => "optional",
            SchemaKind::Defaulted(..) => "default",
            SchemaKind::Refined(..) => "refined",
            SchemaKind::Null => "null",
            SchemaKind::Literal(_) => "literal",
            SchemaKind::Union(_) => "union",
            SchemaKind::Any => "any",
        }
    }
}

impl fmt::Debug for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::String(r) => f.debug_tuple("String").field(r).finish(),
            SchemaKind::Number(r) => f.debug_tuple("Number").field(r).finish(),
            SchemaKind::Boolean => write!(f, "Boolean"),
            SchemaKind::Date(r) => f.debug_tuple("Date").field(r).finish(),
            SchemaKind::Enum(o) => f.debug_tuple("Enum").field(o).finish(),
            SchemaKind::Array(a) => f.debug_tuple("Array").field(a).finish(),
            SchemaKind::Object(o) => f.debug_tuple("Object").field(o).finish(),
            SchemaKind::Optional(i) => f.debug_tuple("Optional").field(i).finish(),
            SchemaKind::Defaulted(i, _) => f.debug_tuple("Defaulted").field(i).finish(),
            SchemaKind::Refined(i, r) => f.debug_tuple("Refined").field(i).field(r).finish(),
            SchemaKind::Null => write!(f, "Null"),
            SchemaKind::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            SchemaKind::Union(v) => f.debug_tuple("Union").field(v).finish(),
            SchemaKind::Any => write!(f, "Any"),
        }
    }
}

/// A schema node: kind plus descriptive metadata
#[derive(Clone, Debug)]
pub struct Schema {
    pub kind: SchemaKind,
    pub meta: Meta,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            meta: Meta::default(),
        }
    }

    fn wrap(self, make: impl FnOnce(Box<Schema>) -> SchemaKind) -> Self {
        Schema::new(make(Box::new(self)))
    }

    /// Accept an unset value
    pub fn optional(self) -> Self {
        self.wrap(SchemaKind::Optional)
    }

    /// Replace an unset value with `value`
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default_with(move || value.clone())
    }

    /// Replace an unset value with the result of `producer`
    pub fn default_with<F>(self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let producer: DefaultFn = Arc::new(producer);
        self.wrap(|inner| SchemaKind::Defaulted(inner, producer))
    }

    /// Add a custom check reported at this node
    pub fn refine<F>(self, check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_at(check, message, Path::root())
    }

    /// Add a custom check reported at `path` relative to this node
    pub fn refine_at<F>(self, check: F, message: impl Into<String>, path: Path) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let refinement = Refinement {
            check: Arc::new(check),
            message: message.into(),
            path,
        };
        self.wrap(|inner| SchemaKind::Refined(inner, refinement))
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    /// Lower bound: length for strings, value for numbers, count for arrays
    pub fn min(mut self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        match &mut self.kind {
            SchemaKind::String(r) => r.min_length = Some(bound.max(0.0) as usize),
            SchemaKind::Number(r) => r.minimum = Some(bound),
            SchemaKind::Array(a) => a.min_items = Some(bound.max(0.0) as usize),
            other => tracing::warn!("min() has no effect on a {} schema", other.tag()),
        }
        self
    }

    /// Upper bound: length for strings, value for numbers, count for arrays
    pub fn max(mut self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        match &mut self.kind {
            SchemaKind::String(r) => r.max_length = Some(bound.max(0.0) as usize),
            SchemaKind::Number(r) => r.maximum = Some(bound),
            SchemaKind::Array(a) => a.max_items = Some(bound.max(0.0) as usize),
            other => tracing::warn!("max() has no effect on a {} schema", other.tag()),
        }
        self
    }

    /// Exact element count of an array
    pub fn length(mut self, count: usize) -> Self {
        match &mut self.kind {
            SchemaKind::Array(a) => a.exact_items = Some(count),
            SchemaKind::String(r) => {
                r.min_length = Some(count);
                r.max_length = Some(count);
            }
            other => tracing::warn!("length() has no effect on a {} schema", other.tag()),
        }
        self
    }

    pub fn int(mut self) -> Self {
        match &mut self.kind {
            SchemaKind::Number(r) => r.integer = true,
            other => tracing::warn!("int() has no effect on a {} schema", other.tag()),
        }
        self
    }

    pub fn email(mut self) -> Self {
        match &mut self.kind {
            SchemaKind::String(r) => r.email = true,
            other => tracing::warn!("email() has no effect on a {} schema", other.tag()),
        }
        self
    }

    /// Require strings to match `pattern`
    pub fn pattern(mut self, pattern: Pattern) -> Self {
        match &mut self.kind {
            SchemaKind::String(r) => r.pattern = Some(pattern),
            other => tracing::warn!("pattern() has no effect on a {} schema", other.tag()),
        }
        self
    }

    /// Earliest accepted date
    pub fn after(mut self, date: chrono::NaiveDate) -> Self {
        match &mut self.kind {
            SchemaKind::Date(r) => r.min = Some(date),
            other => tracing::warn!("after() has no effect on a {} schema", other.tag()),
        }
        self
    }

    /// Latest accepted date
    pub fn before(mut self, date: chrono::NaiveDate) -> Self {
        match &mut self.kind {
            SchemaKind::Date(r) => r.max = Some(date),
            other => tracing::warn!("before() has no effect on a {} schema", other.tag()),
        }
        self
    }
}

pub fn string() -> Schema {
    Schema::new(SchemaKind::String(StringRules::default()))
}

pub fn number() -> Schema {
    Schema::new(SchemaKind::Number(NumberRules::default()))
}

pub fn boolean() -> Schema {
    Schema::new(SchemaKind::Boolean)
}

pub fn date() -> Schema {
    Schema::new(SchemaKind::Date(DateRules::default()))
}

/// Closed set of string options
pub fn enumeration<I, S>(options: I) -> Schema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Schema::new(SchemaKind::Enum(options.into_iter().map(Into::into).collect()))
}

pub fn array(element: Schema) -> Schema {
    Schema::new(SchemaKind::Array(ArraySchema {
        element: Box::new(element),
        min_items: None,
        max_items: None,
        exact_items: None,
    }))
}

/// Object with fields in the given order
pub fn object<I, S>(fields: I) -> Schema
where
    I: IntoIterator<Item = (S, Schema)>,
    S: Into<String>,
{
    Schema::new(SchemaKind::Object(ObjectSchema {
        fields: fields.into_iter().map(|(n, s)| (n.into(), s)).collect(),
    }))
}

pub fn null() -> Schema {
    Schema::new(SchemaKind::Null)
}

pub fn literal(value: JsonValue) -> Schema {
    Schema::new(SchemaKind::Literal(value))
}

pub fn union(variants: Vec<Schema>) -> Schema {
    Schema::new(SchemaKind::Union(variants))
}

pub fn any() -> Schema {
    Schema::new(SchemaKind::Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_wrap_outside_in() {
        let schema = string().min(3).optional().describe("Your name");

        match &schema.kind {
            SchemaKind::Optional(inner) => match &inner.kind {
                SchemaKind::String(rules) => assert_eq!(rules.min_length, Some(3)),
                other => panic!("unexpected inner kind {:?}", other),
            },
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(schema.meta.description.as_deref(), Some("Your name"));
    }

    #[test]
    fn test_bounds_target_the_right_rule() {
        let schema = array(string()).min(1).max(4);
        let SchemaKind::Array(arr) = &schema.kind else {
            panic!("expected array");
        };
        assert_eq!(arr.min_items, Some(1));
        assert_eq!(arr.max_items, Some(4));

        let schema = number().min(0).max(10.5).int();
        let SchemaKind::Number(rules) = &schema.kind else {
            panic!("expected number");
        };
        assert_eq!(rules.minimum, Some(0.0));
        assert_eq!(rules.maximum, Some(10.5));
        assert!(rules.integer);
    }

    #[test]
    fn test_object_field_lookup() {
        let schema = object([("a", string()), ("b", boolean())]);
        let SchemaKind::Object(obj) = &schema.kind else {
            panic!("expected object");
        };
        assert!(matches!(obj.field("b").map(|s| &s.kind), Some(SchemaKind::Boolean)));
        assert!(obj.field("c").is_none());
    }
}
