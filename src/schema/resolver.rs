//! JSON Schema import with $ref support
//!
//! Converts a JSON Schema document into a [`Schema`] tree, resolving local
//! `$ref`s and mapping `required`/`default` onto modifier wrappers.

use serde_json::{Map, Value as JsonValue};
use std::collections::{HashMap, HashSet};

use super::{
    any, array, boolean, date, enumeration, literal, null, number, object, string, union, Meta,
    Pattern, Schema, SchemaKind,
};
use crate::error::{FormError, Result};
use crate::path::Path;
use crate::value::Value;

/// Default bound on schema nesting during import
pub const DEFAULT_MAX_DEPTH: usize = 32;

// ============================================================================
// Resolution Context
// ============================================================================

/// Context for schema resolution, carrying available definitions
pub struct SchemaResolutionContext {
    /// Local definitions from the document (#/$defs/* or #/definitions/*)
    pub definitions: HashMap<String, JsonValue>,
    /// Refs currently being expanded, for cycle detection
    visiting: HashSet<String>,
    /// Maximum nesting depth
    pub max_depth: usize,
}

impl Default for SchemaResolutionContext {
    fn default() -> Self {
        Self {
            definitions: HashMap::new(),
            visiting: HashSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SchemaResolutionContext {
    /// Create a context with the definitions of `document`
    pub fn from_schema(document: &JsonValue) -> Self {
        let mut ctx = Self::default();

        for key in ["definitions", "$defs"] {
            if let Some(defs) = document.get(key).and_then(|v| v.as_object()) {
                for (name, def) in defs {
                    ctx.definitions.insert(name.clone(), def.clone());
                }
            }
        }

        ctx
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// ============================================================================
// Schema Resolution
// ============================================================================

/// Import a complete JSON Schema document
pub fn from_json_schema(document: &JsonValue) -> Result<Schema> {
    let mut ctx = SchemaResolutionContext::from_schema(document);
    resolve_schema(document, &mut ctx, &Path::root(), 0)
}

/// Import a JSON Schema document with a custom nesting bound
pub fn from_json_schema_with_depth(document: &JsonValue, max_depth: usize) -> Result<Schema> {
    let mut ctx = SchemaResolutionContext::from_schema(document).with_max_depth(max_depth);
    resolve_schema(document, &mut ctx, &Path::root(), 0)
}

/// Resolve one JSON Schema node found at `path`
pub fn resolve_schema(
    node: &JsonValue,
    ctx: &mut SchemaResolutionContext,
    path: &Path,
    depth: usize,
) -> Result<Schema> {
    if depth > ctx.max_depth {
        return Err(FormError::invalid_schema(
            path,
            format!("schema nesting exceeds {} levels", ctx.max_depth),
        ));
    }

    let Some(obj) = node.as_object() else {
        // `true` accepts anything; `false` is not representable as a form
        return match node {
            JsonValue::Bool(true) => Ok(any()),
            _ => Err(FormError::invalid_schema(path, "schema node must be an object")),
        };
    };

    if let Some(ref_value) = obj.get("$ref").and_then(|v| v.as_str()) {
        let mut resolved = resolve_ref(ref_value, ctx, path, depth)?;
        let meta = extract_meta(obj);
        let mut merged = meta;
        merged.merge_inner(&resolved.meta);
        resolved.meta = merged;
        return Ok(resolved);
    }

    let mut schema = resolve_kind(obj, ctx, path, depth)?;
    schema.meta = extract_meta(obj);
    Ok(schema)
}

fn resolve_kind(
    obj: &Map<String, JsonValue>,
    ctx: &mut SchemaResolutionContext,
    path: &Path,
    depth: usize,
) -> Result<Schema> {
    for key in ["oneOf", "anyOf"] {
        if let Some(variants) = obj.get(key).and_then(|v| v.as_array()) {
            let variants = variants
                .iter()
                .map(|v| resolve_schema(v, ctx, path, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            return Ok(union(variants));
        }
    }

    if let Some(value) = obj.get("const") {
        return Ok(literal(value.clone()));
    }

    if let Some(options) = obj.get("enum").and_then(|v| v.as_array()) {
        let values = options
            .iter()
            .map(|v| match v {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>();
        return Ok(enumeration(values));
    }

    let type_str = match obj.get("type") {
        Some(JsonValue::String(t)) => t.as_str(),
        Some(JsonValue::Array(types)) => return resolve_type_list(obj, types, ctx, path, depth),
        Some(other) => {
            return Err(FormError::invalid_schema(
                path,
                format!("'type' must be a string, found {}", other),
            ))
        }
        None if obj.contains_key("properties") => "object",
        None if obj.contains_key("items") => "array",
        None => return Ok(any()),
    };

    resolve_type(type_str, obj, ctx, path, depth)
}

/// `"type": ["string", "null"]` is an optional string; anything wider is a union
fn resolve_type_list(
    obj: &Map<String, JsonValue>,
    types: &[JsonValue],
    ctx: &mut SchemaResolutionContext,
    path: &Path,
    depth: usize,
) -> Result<Schema> {
    let names = types.iter().filter_map(|t| t.as_str()).collect::<Vec<_>>();
    let non_null = names.iter().filter(|t| **t != "null").collect::<Vec<_>>();

    match non_null.as_slice() {
        [single] if names.len() == 2 => Ok(resolve_type(single, obj, ctx, path, depth)?.optional()),
        _ => {
            let variants = names
                .iter()
                .map(|t| resolve_type(t, obj, ctx, path, depth))
                .collect::<Result<Vec<_>>>()?;
            Ok(union(variants))
        }
    }
}

fn resolve_type(
    type_str: &str,
    obj: &Map<String, JsonValue>,
    ctx: &mut SchemaResolutionContext,
    path: &Path,
    depth: usize,
) -> Result<Schema> {
    let schema = match type_str {
        "null" => null(),
        "boolean" => boolean(),
        "integer" => apply_number_rules(number().int(), obj),
        "number" => apply_number_rules(number(), obj),
        "string" => resolve_string_type(obj, path)?,
        "array" => resolve_array_type(obj, ctx, path, depth)?,
        "object" => resolve_object_type(obj, ctx, path, depth)?,
        other => {
            return Err(FormError::invalid_schema(
                path,
                format!("unknown type '{}'", other),
            ))
        }
    };
    Ok(schema)
}

/// Resolve a $ref reference
fn resolve_ref(
    ref_value: &str,
    ctx: &mut SchemaResolutionContext,
    path: &Path,
    depth: usize,
) -> Result<Schema> {
    let def_name = ref_value
        .strip_prefix("#/definitions/")
        .or_else(|| ref_value.strip_prefix("#/$defs/"))
        .ok_or_else(|| FormError::invalid_schema(path, format!("unsupported $ref '{}'", ref_value)))?;

    if !ctx.visiting.insert(ref_value.to_string()) {
        return Err(FormError::invalid_schema(
            path,
            format!("circular reference '{}'", ref_value),
        ));
    }

    let result = match ctx.definitions.get(def_name).cloned() {
        Some(def) => resolve_schema(&def, ctx, path, depth + 1),
        None => Err(FormError::invalid_schema(
            path,
            format!("definition not found: {}", def_name),
        )),
    };

    ctx.visiting.remove(ref_value);
    result
}

fn resolve_string_type(obj: &Map<String, JsonValue>, path: &Path) -> Result<Schema> {
    let format = obj.get("format").and_then(|v| v.as_str());
    if matches!(format, Some("date") | Some("date-time")) {
        return Ok(date());
    }

    let mut schema = string();
    if let Some(min) = obj.get("minLength").and_then(|v| v.as_u64()) {
        schema = schema.min(min as f64);
    }
    if let Some(max) = obj.get("maxLength").and_then(|v| v.as_u64()) {
        schema = schema.max(max as f64);
    }
    if format == Some("email") {
        schema = schema.email();
    }
    if let Some(source) = obj.get("pattern").and_then(|v| v.as_str()) {
        let pattern = Pattern::new(source).map_err(|e| {
            FormError::invalid_schema(path, format!("invalid pattern '{}': {}", source, e))
        })?;
        schema = schema.pattern(pattern);
    }
    Ok(schema)
}

fn apply_number_rules(mut schema: Schema, obj: &Map<String, JsonValue>) -> Schema {
    if let Some(min) = obj.get("minimum").and_then(|v| v.as_f64()) {
        schema = schema.min(min);
    }
    if let Some(max) = obj.get("maximum").and_then(|v| v.as_f64()) {
        schema = schema.max(max);
    }
    schema
}

/// Resolve array type
fn resolve_array_type(
    obj: &Map<String, JsonValue>,
    ctx: &mut SchemaResolutionContext,
    path: &Path,
    depth: usize,
) -> Result<Schema> {
    let element_path = path.push_index(0);
    let element = match obj.get("items") {
        Some(items) => resolve_schema(items, ctx, &element_path, depth + 1)?,
        None => any(),
    };

    let min_items = obj.get("minItems").and_then(|v| v.as_u64());
    let max_items = obj.get("maxItems").and_then(|v| v.as_u64());

    let mut schema = array(element);
    if let SchemaKind::Array(arr) = &mut schema.kind {
        match (min_items, max_items) {
            (Some(min), Some(max)) if min == max => arr.exact_items = Some(min as usize),
            _ => {
                arr.min_items = min_items.map(|n| n as usize);
                arr.max_items = max_items.map(|n| n as usize);
            }
        }
    }
    Ok(schema)
}

/// Resolve object type
fn resolve_object_type(
    obj: &Map<String, JsonValue>,
    ctx: &mut SchemaResolutionContext,
    path: &Path,
    depth: usize,
) -> Result<Schema> {
    let required: HashSet<&str> = obj
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let mut fields = Vec::new();
    if let Some(props) = obj.get("properties").and_then(|v| v.as_object()) {
        for (name, prop_schema) in props {
            let field_path = path.push_key(name);
            let mut field = resolve_schema(prop_schema, ctx, &field_path, depth + 1)?;

            if let Some(default) = prop_schema.get("default") {
                field = wrap_keeping_meta(field, |s| s.default_value(Value::from_json(default)));
            } else if !required.contains(name.as_str()) {
                field = wrap_keeping_meta(field, Schema::optional);
            }
            fields.push((name.clone(), field));
        }
    }

    Ok(object(fields))
}

/// Lift the node's own metadata onto the new wrapper so it stays outermost
fn wrap_keeping_meta(schema: Schema, wrap: impl FnOnce(Schema) -> Schema) -> Schema {
    let meta = schema.meta.clone();
    let mut wrapped = wrap(schema);
    wrapped.meta = meta;
    wrapped
}

/// Extract descriptive keywords of a node
fn extract_meta(obj: &Map<String, JsonValue>) -> Meta {
    Meta {
        title: obj.get("title").and_then(|v| v.as_str()).map(String::from),
        description: obj
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{classify, unwrap, NodeKind};
    use serde_json::json;

    fn field<'a>(schema: &'a Schema, name: &str) -> &'a Schema {
        match &schema.kind {
            SchemaKind::Object(obj) => obj.field(name).expect("field exists"),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_required_and_optional_properties() {
        let schema = from_json_schema(&json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 3, "description": "Full name"},
                "nick": {"type": "string"}
            },
            "required": ["name"]
        }))
        .unwrap();

        let name = unwrap(field(&schema, "name")).unwrap();
        assert!(name.required);
        assert_eq!(name.meta.description.as_deref(), Some("Full name"));
        let NodeKind::String(rules) = name.kind else {
            panic!("expected string");
        };
        assert_eq!(rules.min_length, Some(3));

        assert!(!unwrap(field(&schema, "nick")).unwrap().required);
    }

    #[test]
    fn test_default_becomes_defaulted_wrapper() {
        let schema = from_json_schema(&json!({
            "type": "object",
            "properties": {"count": {"type": "integer", "default": 5}}
        }))
        .unwrap();

        let count = unwrap(field(&schema, "count")).unwrap();
        let producer = count.default.expect("default producer");
        assert_eq!(producer(), Value::from(5));
    }

    #[test]
    fn test_refs_and_formats() {
        let schema = from_json_schema(&json!({
            "type": "object",
            "properties": {
                "address": {"$ref": "#/$defs/Address"},
                "born": {"type": "string", "format": "date"}
            },
            "required": ["address", "born"],
            "$defs": {
                "Address": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}},
                    "required": ["city"]
                }
            }
        }))
        .unwrap();

        assert_eq!(classify(field(&schema, "address")).unwrap().tag(), "object");
        assert_eq!(classify(field(&schema, "born")).unwrap().tag(), "date");
    }

    #[test]
    fn test_equal_item_bounds_are_exact_length() {
        let schema = from_json_schema(&json!({
            "type": "array", "items": {"type": "string"}, "minItems": 2, "maxItems": 2
        }))
        .unwrap();

        let NodeKind::Array(arr) = classify(&schema).unwrap() else {
            panic!("expected array");
        };
        assert_eq!(arr.exact_items, Some(2));
        assert_eq!(arr.min_items, None);
    }

    #[test]
    fn test_circular_ref_is_rejected() {
        let err = from_json_schema(&json!({
            "$ref": "#/definitions/Node",
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {"next": {"$ref": "#/definitions/Node"}}
                }
            }
        }))
        .unwrap_err();

        assert!(matches!(err, FormError::InvalidSchema { ref reason, .. } if reason.contains("circular")));
    }

    #[test]
    fn test_untyped_node_is_any() {
        let schema = from_json_schema(&json!({"description": "whatever"})).unwrap();
        assert!(matches!(schema.kind, SchemaKind::Any));
        assert!(matches!(classify(&schema), Err(FormError::InvalidSchema { .. })));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = from_json_schema(&json!({"type": "color"})).unwrap_err();
        assert!(matches!(err, FormError::InvalidSchema { .. }));
    }

    #[test]
    fn test_nullable_type_list_is_optional() {
        let schema = from_json_schema(&json!({"type": ["string", "null"]})).unwrap();
        let unwrapped = unwrap(&schema).unwrap();
        assert!(!unwrapped.required);
        assert_eq!(unwrapped.kind.tag(), "string");
    }

    #[test]
    fn test_depth_bound() {
        let mut doc = json!({"type": "string"});
        for _ in 0..5 {
            doc = json!({"type": "array", "items": doc});
        }
        assert!(from_json_schema_with_depth(&doc, 3).is_err());
        assert!(from_json_schema_with_depth(&doc, 10).is_ok());
    }
}
