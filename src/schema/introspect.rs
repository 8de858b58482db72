//! Classification of schema nodes into form node kinds
//!
//! Modifier wrappers (optional, defaulted, refined) are peeled off until a
//! terminal kind is reached, merging their metadata on the way down.

use super::{
    ArraySchema, DateRules, DefaultFn, Meta, NumberRules, ObjectSchema, Refinement, Schema,
    SchemaKind, StringRules,
};
use crate::error::{FormError, Result};
use crate::path::{Path, PathSegment};

/// Upper bound on directly nested modifier wrappers
pub const MAX_UNWRAP_DEPTH: usize = 32;

/// Terminal node kinds the form engine knows how to render
#[derive(Clone, Copy, Debug)]
pub enum NodeKind<'a> {
    String(&'a StringRules),
    Number(&'a NumberRules),
    Boolean,
    Date(&'a DateRules),
    Enum(&'a [String]),
    Array(&'a ArraySchema),
    Object(&'a ObjectSchema),
}

impl NodeKind<'_> {
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::String(_) => "string",
            NodeKind::Number(_) => "number",
            NodeKind::Boolean => "boolean",
            NodeKind::Date(_) => "date",
            NodeKind::Enum(_) => "enum",
            NodeKind::Array(_) => "array",
            NodeKind::Object(_) => "object",
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, NodeKind::Array(_) | NodeKind::Object(_))
    }
}

/// A schema node with its wrappers peeled off
#[derive(Clone)]
pub struct Unwrapped<'a> {
    /// The terminal node
    pub node: &'a Schema,
    pub kind: NodeKind<'a>,
    /// Wrapper metadata merged over the terminal node's own
    pub meta: Meta,
    /// False once an optional or defaulted wrapper was crossed
    pub required: bool,
    /// Producer of the outermost defaulted wrapper
    pub default: Option<&'a DefaultFn>,
    /// Refinements from outermost to innermost
    pub refinements: Vec<&'a Refinement>,
}

/// Terminal kind of `schema`
pub fn classify(schema: &Schema) -> Result<NodeKind<'_>> {
    unwrap(schema).map(|u| u.kind)
}

/// Peel wrappers off `schema`
pub fn unwrap(schema: &Schema) -> Result<Unwrapped<'_>> {
    unwrap_at(schema, &Path::root())
}

/// Peel wrappers off `schema`, reporting failures against `path`
pub fn unwrap_at<'a>(schema: &'a Schema, path: &Path) -> Result<Unwrapped<'a>> {
    let mut meta = schema.meta.clone();
    let mut required = true;
    let mut default = None;
    let mut refinements = Vec::new();
    let mut node = schema;

    for _ in 0..=MAX_UNWRAP_DEPTH {
        let inner = match &node.kind {
            SchemaKind::Optional(inner) => {
                required = false;
                inner.as_ref()
            }
            SchemaKind::Defaulted(inner, producer) => {
                required = false;
                default.get_or_insert(producer);
                inner.as_ref()
            }
            SchemaKind::Refined(inner, refinement) => {
                refinements.push(refinement);
                inner.as_ref()
            }
            terminal => {
                let kind = terminal_kind(terminal).ok_or_else(|| {
                    FormError::invalid_schema(
                        path,
                        format!("schema kind '{}' has no form representation", terminal.tag()),
                    )
                })?;
                return Ok(Unwrapped {
                    node,
                    kind,
                    meta,
                    required,
                    default,
                    refinements,
                });
            }
        };
        meta.merge_inner(&inner.meta);
        node = inner;
    }

    Err(FormError::invalid_schema(
        path,
        format!("more than {} nested modifiers", MAX_UNWRAP_DEPTH),
    ))
}

/// Schema node addressed by `path`, with wrappers along the way peeled off
///
/// The returned node itself is not unwrapped.
pub fn schema_at<'a>(schema: &'a Schema, path: &Path) -> Result<&'a Schema> {
    let mut node = schema;
    for (depth, segment) in path.segments().iter().enumerate() {
        let here = Path::from_segments(path.segments()[..depth].to_vec());
        node = match (unwrap_at(node, &here)?.kind, segment) {
            (NodeKind::Object(obj), PathSegment::Key(key)) => obj.field(key).ok_or_else(|| {
                FormError::InvalidPath {
                    input: path.to_string(),
                    reason: format!("no field '{}' at '{}'", key, here),
                }
            })?,
            (NodeKind::Array(arr), PathSegment::Index(_)) => arr.element.as_ref(),
            (kind, _) => {
                return Err(FormError::InvalidPath {
                    input: path.to_string(),
                    reason: format!("'{}' is a {} node", here, kind.tag()),
                })
            }
        };
    }
    Ok(node)
}

fn terminal_kind(kind: &SchemaKind) -> Option<NodeKind<'_>> {
    match kind {
        SchemaKind::String(r) => Some(NodeKind::String(r)),
        SchemaKind::Number(r) => Some(NodeKind::Number(r)),
        SchemaKind::Boolean => Some(NodeKind::Boolean),
        SchemaKind::Date(r) => Some(NodeKind::Date(r)),
        SchemaKind::Enum(options) => Some(NodeKind::Enum(options)),
        SchemaKind::Array(a) => Some(NodeKind::Array(a)),
        SchemaKind::Object(o) => Some(NodeKind::Object(o)),
        _ => None,
    }
}
