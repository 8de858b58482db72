//! Initial value synthesis from a schema
//!
//! Booleans start `false`, declared defaults are produced, arrays are sized to
//! their exact or minimum length, and every other leaf starts unset. Unset
//! object fields are left out of the synthesized mapping.

use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::path::Path;
use crate::schema::{introspect, Schema, SchemaKind};
use crate::value::{Fields, Value};

/// Initial value tree for a form over `schema`
pub fn form_default_value(schema: &Schema) -> Result<Value> {
    default_value(schema, &Path::root())
}

/// Initial value for the node at `path`
pub fn default_value(schema: &Schema, path: &Path) -> Result<Value> {
    match &schema.kind {
        SchemaKind::String(_) | SchemaKind::Number(_) | SchemaKind::Date(_) => Ok(Value::Undefined),
        SchemaKind::Enum(_) => Ok(Value::Undefined),
        SchemaKind::Boolean => Ok(Value::Bool(false)),
        SchemaKind::Optional(_) => Ok(Value::Undefined),
        SchemaKind::Defaulted(_, producer) => Ok(producer()),
        SchemaKind::Refined(inner, _) => default_value(inner, path),
        SchemaKind::Array(arr) => {
            // Multi-choice arrays start with nothing selected
            if matches!(
                introspect::classify(&arr.element),
                Ok(introspect::NodeKind::Enum(_))
            ) {
                return Ok(Value::array());
            }

            let count = arr.exact_items.or(arr.min_items).unwrap_or(0);
            let items = (0..count)
                .map(|idx| default_value(&arr.element, &path.push_index(idx)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(Arc::new(items)))
        }
        SchemaKind::Object(obj) => {
            let mut fields = Fields::new();
            for (name, field_schema) in &obj.fields {
                let value = default_value(field_schema, &path.push_key(name))?;
                if !value.is_undefined() {
                    fields.insert(name.clone(), value);
                }
            }
            Ok(Value::Object(Arc::new(fields)))
        }
        other => Err(FormError::unsupported(other.tag(), path)),
    }
}
