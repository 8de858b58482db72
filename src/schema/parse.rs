//! Schema-driven parsing of value trees
//!
//! [`safe_parse`] never fails fast: it walks the whole tree and reports every
//! violated constraint as an [`Issue`], in tree order.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use super::{ArraySchema, DateRules, NumberRules, ObjectSchema, Schema, SchemaKind, StringRules};
use crate::path::Path;
use crate::value::{Fields, Value, UNDEFINED};

/// Category of a validation issue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    Required,
    InvalidType,
    TooSmall,
    TooBig,
    InvalidString,
    InvalidEnumValue,
    InvalidLiteral,
    InvalidUnion,
    NotInteger,
    InvalidDate,
    Custom,
}

/// One violated constraint, addressed by the path of the offending node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub path: Path,
    pub message: String,
    pub code: IssueCode,
}

impl Issue {
    pub fn new(path: Path, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            code,
        }
    }
}

/// Parse `value` against `schema`
///
/// On success returns the normalized value: defaults filled in, unknown object
/// keys dropped, unset fields omitted and ISO date strings turned into dates.
pub fn safe_parse(schema: &Schema, value: &Value) -> Result<Value, Vec<Issue>> {
    let (parsed, issues) = parse_visible(schema, value, &[]);
    if issues.is_empty() {
        Ok(parsed)
    } else {
        Err(issues)
    }
}

/// Parse `value` as if every node at a `hidden` path were absent
///
/// Hidden object fields are left out and hidden array elements are spliced
/// out before length checks; neither is required. Issues of visible nodes keep
/// the paths the nodes have in `value`. The normalized value is returned
/// alongside the issues even when there are some.
pub fn parse_visible(schema: &Schema, value: &Value, hidden: &[&Path]) -> (Value, Vec<Issue>) {
    let mut cx = ParseContext {
        hidden,
        issues: Vec::new(),
    };
    let parsed = parse_node(schema, value, &Path::root(), &mut cx);
    (parsed, cx.issues)
}

struct ParseContext<'a> {
    hidden: &'a [&'a Path],
    issues: Vec<Issue>,
}

impl ParseContext<'_> {
    fn is_hidden(&self, path: &Path) -> bool {
        self.hidden.iter().any(|h| *h == path)
    }

    fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }
}

fn parse_node(schema: &Schema, value: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    if cx.is_hidden(path) {
        return Value::Undefined;
    }

    match &schema.kind {
        SchemaKind::Optional(inner) => {
            if value.is_undefined() {
                Value::Undefined
            } else {
                parse_node(inner, value, path, cx)
            }
        }
        SchemaKind::Defaulted(inner, producer) => {
            if value.is_undefined() {
                parse_node(inner, &producer(), path, cx)
            } else {
                parse_node(inner, value, path, cx)
            }
        }
        SchemaKind::Refined(inner, refinement) => {
            let before = cx.issues.len();
            let parsed = parse_node(inner, value, path, cx);
            // Refinements only see values the inner schema accepted
            if cx.issues.len() == before && !(refinement.check)(&parsed) {
                cx.push(Issue::new(
                    path.join(&refinement.path),
                    IssueCode::Custom,
                    refinement.message.clone(),
                ));
            }
            parsed
        }
        _ if value.is_undefined() => {
            cx.push(Issue::new(path.clone(), IssueCode::Required, "Required"));
            Value::Undefined
        }
        SchemaKind::String(rules) => parse_string(rules, value, path, cx),
        SchemaKind::Number(rules) => parse_number(rules, value, path, cx),
        SchemaKind::Boolean => match value {
            Value::Bool(_) => value.clone(),
            other => type_mismatch("boolean", other, path, cx),
        },
        SchemaKind::Date(rules) => parse_date(rules, value, path, cx),
        SchemaKind::Enum(options) => parse_enum(options, value, path, cx),
        SchemaKind::Array(arr) => parse_array(arr, value, path, cx),
        SchemaKind::Object(obj) => parse_object(obj, value, path, cx),
        SchemaKind::Null => match value {
            Value::Null => Value::Null,
            other => type_mismatch("null", other, path, cx),
        },
        SchemaKind::Literal(expected) => {
            if &value.to_json() == expected {
                value.clone()
            } else {
                cx.push(Issue::new(
                    path.clone(),
                    IssueCode::InvalidLiteral,
                    format!("Invalid literal value, expected {}", expected),
                ));
                value.clone()
            }
        }
        SchemaKind::Union(variants) => {
            for variant in variants {
                let mut scratch = ParseContext {
                    hidden: cx.hidden,
                    issues: Vec::new(),
                };
                let parsed = parse_node(variant, value, path, &mut scratch);
                if scratch.issues.is_empty() {
                    return parsed;
                }
            }
            cx.push(Issue::new(path.clone(), IssueCode::InvalidUnion, "Invalid input"));
            value.clone()
        }
        SchemaKind::Any => value.clone(),
    }
}

fn type_mismatch(expected: &str, found: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    cx.push(Issue::new(
        path.clone(),
        IssueCode::InvalidType,
        format!("Expected {}, received {}", expected, found.type_name()),
    ));
    found.clone()
}

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

/// Compiled [`EMAIL_PATTERN`]; `None` only if the pattern failed to compile,
/// which `test_email_pattern_compiles` rules out
fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

fn parse_string(rules: &StringRules, value: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    let Value::String(text) = value else {
        return type_mismatch("string", value, path, cx);
    };

    let length = text.chars().count();
    if let Some(min) = rules.min_length {
        if length < min {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooSmall,
                format!("String must contain at least {} character(s)", min),
            ));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooBig,
                format!("String must contain at most {} character(s)", max),
            ));
        }
    }
    if rules.email && !email_regex().is_some_and(|re| re.is_match(text)) {
        cx.push(Issue::new(path.clone(), IssueCode::InvalidString, "Invalid email"));
    }
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(text) {
            cx.push(Issue::new(path.clone(), IssueCode::InvalidString, "Invalid"));
        }
    }
    value.clone()
}

fn parse_number(rules: &NumberRules, value: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    let n = match value {
        Value::Number(n) if !n.is_nan() => *n,
        other => return type_mismatch("number", other, path, cx),
    };

    if rules.integer && n.fract() != 0.0 {
        cx.push(Issue::new(
            path.clone(),
            IssueCode::NotInteger,
            "Expected integer, received float",
        ));
    }
    if let Some(min) = rules.minimum {
        if n < min {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooSmall,
                format!("Number must be greater than or equal to {}", min),
            ));
        }
    }
    if let Some(max) = rules.maximum {
        if n > max {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooBig,
                format!("Number must be less than or equal to {}", max),
            ));
        }
    }
    value.clone()
}

/// Dates arrive as `Date` values or ISO-8601 strings (date or date-time)
pub(crate) fn coerce_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::String(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                chrono::DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|dt| dt.date_naive())
            }),
        _ => None,
    }
}

fn parse_date(rules: &DateRules, value: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    let Some(date) = coerce_date(value) else {
        if matches!(value, Value::String(_)) {
            cx.push(Issue::new(path.clone(), IssueCode::InvalidDate, "Invalid date"));
            return value.clone();
        }
        return type_mismatch("date", value, path, cx);
    };

    if let Some(min) = rules.min {
        if date < min {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooSmall,
                format!("Date must be greater than or equal to {}", min),
            ));
        }
    }
    if let Some(max) = rules.max {
        if date > max {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooBig,
                format!("Date must be smaller than or equal to {}", max),
            ));
        }
    }
    Value::Date(date)
}

fn parse_enum(options: &[String], value: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    match value {
        Value::String(s) if options.iter().any(|o| o == s) => value.clone(),
        other => {
            let expected = options
                .iter()
                .map(|o| format!("'{}'", o))
                .collect::<Vec<_>>()
                .join(" | ");
            let received = match other {
                Value::String(s) => format!("'{}'", s),
                v => v.type_name().to_string(),
            };
            cx.push(Issue::new(
                path.clone(),
                IssueCode::InvalidEnumValue,
                format!("Invalid enum value. Expected {}, received {}", expected, received),
            ));
            value.clone()
        }
    }
}

fn parse_array(arr: &ArraySchema, value: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    let Value::Array(items) = value else {
        return type_mismatch("array", value, path, cx);
    };

    let visible = items
        .iter()
        .enumerate()
        .filter(|(idx, _)| !cx.is_hidden(&path.push_index(*idx)))
        .collect::<Vec<_>>();

    let count = visible.len();
    if let Some(exact) = arr.exact_items {
        if count != exact {
            let code = if count < exact { IssueCode::TooSmall } else { IssueCode::TooBig };
            cx.push(Issue::new(
                path.clone(),
                code,
                format!("Array must contain exactly {} element(s)", exact),
            ));
        }
    }
    if let Some(min) = arr.min_items {
        if count < min {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooSmall,
                format!("Array must contain at least {} element(s)", min),
            ));
        }
    }
    if let Some(max) = arr.max_items {
        if count > max {
            cx.push(Issue::new(
                path.clone(),
                IssueCode::TooBig,
                format!("Array must contain at most {} element(s)", max),
            ));
        }
    }

    let parsed = visible
        .into_iter()
        .map(|(idx, item)| parse_node(&arr.element, item, &path.push_index(idx), cx))
        .collect();
    Value::Array(Arc::new(parsed))
}

fn parse_object(obj: &ObjectSchema, value: &Value, path: &Path, cx: &mut ParseContext<'_>) -> Value {
    let Value::Object(fields) = value else {
        return type_mismatch("object", value, path, cx);
    };

    let mut parsed = Fields::new();
    for (name, field_schema) in &obj.fields {
        let field_value = fields.get(name).unwrap_or(&UNDEFINED);
        let out = parse_node(field_schema, field_value, &path.push_key(name), cx);
        if !out.is_undefined() {
            parsed.insert(name.clone(), out);
        }
    }
    Value::Object(Arc::new(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array, boolean, date, enumeration, number, object, string, Pattern};
    use serde_json::json;

    fn messages(issues: &[Issue]) -> Vec<(String, String)> {
        issues
            .iter()
            .map(|i| (i.path.to_string(), i.message.clone()))
            .collect()
    }

    #[test]
    fn test_missing_required_field() {
        let schema = object([("name", string()), ("nick", string().optional())]);
        let issues = safe_parse(&schema, &Value::object()).unwrap_err();
        assert_eq!(messages(&issues), vec![("name".to_string(), "Required".to_string())]);
    }

    #[test]
    fn test_optional_unset_field_is_omitted() {
        let schema = object([("name", string().min(3).optional())]);
        let parsed = safe_parse(&schema, &Value::object()).unwrap();
        assert_eq!(parsed.to_json(), json!({}));
    }

    #[test]
    fn test_string_constraints() {
        let schema = object([
            ("name", string().min(3)),
            ("email", string().email()),
            ("code", string().pattern(Pattern::new("^[A-Z]+$").unwrap())),
        ]);
        let value = Value::from(json!({"name": "Jo", "email": "nope", "code": "abc"}));

        let issues = safe_parse(&schema, &value).unwrap_err();
        assert_eq!(
            messages(&issues),
            vec![
                ("name".to_string(), "String must contain at least 3 character(s)".to_string()),
                ("email".to_string(), "Invalid email".to_string()),
                ("code".to_string(), "Invalid".to_string()),
            ]
        );
    }

    #[test]
    fn test_number_constraints() {
        let schema = number().int().min(0).max(10);
        assert!(safe_parse(&schema, &Value::from(4)).is_ok());

        let issues = safe_parse(&schema, &Value::from(10.5)).unwrap_err();
        assert_eq!(issues[0].code, IssueCode::NotInteger);
        assert_eq!(issues[1].code, IssueCode::TooBig);

        let issues = safe_parse(&schema, &Value::Number(f64::NAN)).unwrap_err();
        assert_eq!(issues[0].message, "Expected number, received nan");
    }

    #[test]
    fn test_enum_membership() {
        let schema = enumeration(["payPal", "card"]);
        assert!(safe_parse(&schema, &Value::from("card")).is_ok());

        let issues = safe_parse(&schema, &Value::from("cash")).unwrap_err();
        assert_eq!(
            issues[0].message,
            "Invalid enum value. Expected 'payPal' | 'card', received 'cash'"
        );
    }

    #[test]
    fn test_array_lengths_and_element_paths() {
        let schema = object([("tags", array(string().min(2)).min(2))]);
        let value = Value::from(json!({"tags": ["a"]}));

        let issues = safe_parse(&schema, &value).unwrap_err();
        assert_eq!(
            messages(&issues),
            vec![
                ("tags".to_string(), "Array must contain at least 2 element(s)".to_string()),
                ("tags[0]".to_string(), "String must contain at least 2 character(s)".to_string()),
            ]
        );

        let exact = array(boolean()).length(2);
        let issues = safe_parse(&exact, &Value::from(json!([true]))).unwrap_err();
        assert_eq!(issues[0].message, "Array must contain exactly 2 element(s)");
    }

    #[test]
    fn test_defaults_are_applied() {
        let schema = object([("count", number().default_value(3))]);
        let parsed = safe_parse(&schema, &Value::object()).unwrap();
        assert_eq!(parsed.to_json(), json!({"count": 3}));
    }

    #[test]
    fn test_date_coercion() {
        let schema = object([("born", date())]);
        let parsed = safe_parse(&schema, &Value::from(json!({"born": "2001-04-05"}))).unwrap();
        assert_eq!(
            parsed.field("born").as_date(),
            NaiveDate::from_ymd_opt(2001, 4, 5)
        );

        let issues = safe_parse(&schema, &Value::from(json!({"born": "yesterday"}))).unwrap_err();
        assert_eq!(issues[0].code, IssueCode::InvalidDate);
    }

    #[test]
    fn test_refinement_with_relative_path() {
        let schema = object([("password", string()), ("confirm", string())]).refine_at(
            |v| v.field("password") == v.field("confirm"),
            "Passwords don't match",
            Path::parse("confirm").unwrap(),
        );
        let value = Value::from(json!({"password": "a", "confirm": "b"}));

        let issues = safe_parse(&schema, &value).unwrap_err();
        assert_eq!(
            messages(&issues),
            vec![("confirm".to_string(), "Passwords don't match".to_string())]
        );
    }

    #[test]
    fn test_refinement_skipped_when_inner_fails() {
        let schema = string().min(5).refine(|_| false, "never");
        let issues = safe_parse(&schema, &Value::from("ab")).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::TooSmall);
    }

    #[test]
    fn test_unknown_keys_are_stripped() {
        let schema = object([("a", string())]);
        let parsed = safe_parse(&schema, &Value::from(json!({"a": "x", "b": 1}))).unwrap();
        assert_eq!(parsed.to_json(), json!({"a": "x"}));
    }

    #[test]
    fn test_email_pattern_compiles() {
        let re = email_regex().unwrap();
        assert!(re.is_match("ada@example.com"));
        assert!(!re.is_match("ada@"));
    }

    #[test]
    fn test_hidden_required_field_is_not_required() {
        let schema = object([
            ("count", number().default_value(3)),
            ("extra", string()),
        ]);
        let extra = Path::parse("extra").unwrap();

        let (parsed, issues) = parse_visible(&schema, &Value::from(json!({"junk": 1})), &[&extra]);
        assert!(issues.is_empty());
        assert_eq!(parsed.to_json(), json!({"count": 3}));
    }

    #[test]
    fn test_refinement_runs_beside_hidden_field() {
        let schema = object([
            ("password", string()),
            ("confirm", string()),
            ("extra", string()),
        ])
        .refine_at(
            |v| v.field("password") == v.field("confirm"),
            "Passwords don't match",
            Path::parse("confirm").unwrap(),
        );
        let extra = Path::parse("extra").unwrap();
        let value = Value::from(json!({"password": "a", "confirm": "b"}));

        let (_, issues) = parse_visible(&schema, &value, &[&extra]);
        assert_eq!(
            messages(&issues),
            vec![("confirm".to_string(), "Passwords don't match".to_string())]
        );
    }

    #[test]
    fn test_hidden_array_elements_are_spliced_out() {
        let schema = array(object([("name", string())])).min(2);
        let value = Value::from(json!([{"name": "a"}, {}, {"name": "c"}]));
        let second = Path::parse("[1]").unwrap();

        let (parsed, issues) = parse_visible(&schema, &value, &[&second]);
        assert!(issues.is_empty());
        assert_eq!(parsed.to_json(), json!([{"name": "a"}, {"name": "c"}]));

        // Issues keep the element's original index
        let value = Value::from(json!([{}, {"name": "b"}, {"name": "c"}]));
        let (_, issues) = parse_visible(&schema, &value, &[&second]);
        assert_eq!(messages(&issues), vec![("[0].name".to_string(), "Required".to_string())]);
    }
}
