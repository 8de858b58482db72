//! Schema-driven render traversal
//!
//! Walks the schema, the current value and the overlay in lockstep and asks
//! the [`Renderers`] for a view of every visible node.

use tracing::trace;

use super::props::{
    ArrayAddHandler, ArrayItem, ArrayProps, ArrayRemoveHandler, ChangeHandler, EnumOption, FieldKind, FieldProps,
    MultiChoiceHandler, MultiChoiceProps, ObjectProps,
};
use super::registry::{RenderBackend, Renderers};
use crate::defaults::default_value;
use crate::error::Result;
use crate::overlay::{Component, UiNode};
use crate::path::{Path, PathSegment};
use crate::schema::introspect::unwrap_at;
use crate::schema::{ArraySchema, Meta, NodeKind, ObjectSchema, Schema};
use crate::validation::ErrorMap;
use crate::value::Value;
use crate::visibility::VisibilityMap;

/// Everything a traversal reads besides the node being rendered
pub struct RenderContext<'a, B: RenderBackend> {
    pub renderers: &'a Renderers<B>,
    /// Root of the value tree
    pub value: &'a Value,
    pub errors: &'a ErrorMap,
    pub visibility: &'a VisibilityMap,
}

impl<B: RenderBackend> Clone for RenderContext<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: RenderBackend> Copy for RenderContext<'_, B> {}

/// Render the whole form; `None` when the root itself is hidden
pub fn render_form<B: RenderBackend>(
    ctx: RenderContext<'_, B>,
    schema: &Schema,
    overlay: Option<&UiNode<B::View>>,
) -> Result<Option<B::View>> {
    render_node(ctx, schema, ctx.value, &Path::root(), overlay)
}

/// Render the node at `path`; `None` when it is hidden
pub fn render_node<B: RenderBackend>(
    ctx: RenderContext<'_, B>,
    schema: &Schema,
    value: &Value,
    path: &Path,
    overlay: Option<&UiNode<B::View>>,
) -> Result<Option<B::View>> {
    if !ctx.visibility.is_visible(path) {
        trace!(path = %path, "Skipping hidden node");
        return Ok(None);
    }

    let node = unwrap_at(schema, path)?;
    let view = match node.kind {
        NodeKind::Object(obj) => render_object(ctx, obj, &node.meta, node.required, value, path, overlay)?,
        NodeKind::Array(arr) => render_array(ctx, arr, &node.meta, node.required, value, path, overlay)?,
        leaf => {
            let kind = field_kind(leaf, overlay);
            let on_change = ChangeHandler::new(path.clone(), kind.leaf_kind());
            let props = FieldProps {
                kind,
                path: path.clone(),
                label: label(overlay, &node.meta, path),
                description: description(overlay, &node.meta),
                placeholder: overlay.and_then(|o| o.placeholder.clone()),
                value: value.clone(),
                error: error_at(ctx, path),
                required: node.required,
                auto_focus: overlay.is_some_and(|o| o.auto_focus),
                on_change,
            };
            ctx.renderers.render_field(component(overlay), props)?
        }
    };
    Ok(Some(view))
}

fn render_object<B: RenderBackend>(
    ctx: RenderContext<'_, B>,
    obj: &ObjectSchema,
    meta: &Meta,
    required: bool,
    value: &Value,
    path: &Path,
    overlay: Option<&UiNode<B::View>>,
) -> Result<B::View> {
    let mut children = Vec::with_capacity(obj.fields.len());
    for (name, field_schema) in &obj.fields {
        let child_overlay = overlay.and_then(|o| o.child(name));
        let child = render_node(ctx, field_schema, value.field(name), &path.push_key(name), child_overlay)?;
        children.extend(child);
    }

    // The root has no name of its own and is never wrapped
    if path.is_root() {
        return Ok(ctx.renderers.backend().fragment(children));
    }

    let props = ObjectProps {
        path: path.clone(),
        title: title(overlay, meta, path),
        description: description(overlay, meta),
        error: error_at(ctx, path),
        required,
        children,
    };
    ctx.renderers.render_object(component(overlay), props)
}

fn render_array<B: RenderBackend>(
    ctx: RenderContext<'_, B>,
    arr: &ArraySchema,
    meta: &Meta,
    required: bool,
    value: &Value,
    path: &Path,
    overlay: Option<&UiNode<B::View>>,
) -> Result<B::View> {
    let items = value.as_array().unwrap_or(&[]);
    let element = unwrap_at(&arr.element, &path.push_index(0))?;

    if let NodeKind::Enum(options) = element.kind {
        let element_overlay = overlay.and_then(UiNode::element_node);
        let options = enum_options(options, overlay, element_overlay);
        let selected: Vec<String> = items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect();
        let props = MultiChoiceProps {
            path: path.clone(),
            label: label(overlay, meta, path),
            description: description(overlay, meta),
            error: error_at(ctx, path),
            required,
            on_change: MultiChoiceHandler::new(
                path.clone(),
                options.iter().map(|o| o.value.clone()).collect(),
                selected.clone(),
            ),
            options,
            selected,
        };
        return ctx.renderers.render_multi_choice(component(overlay), props);
    }

    let element_overlay = overlay.and_then(UiNode::element_node);
    let mut rendered = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = path.push_index(index);
        if let Some(view) = render_node(ctx, &arr.element, item, &item_path, element_overlay)? {
            rendered.push(ArrayItem {
                index,
                on_remove: ArrayRemoveHandler::new(item_path.clone()),
                path: item_path,
                view,
            });
        }
    }

    let len = items.len();
    let max = arr.exact_items.or(arr.max_items);
    let min = arr.exact_items.or(arr.min_items).unwrap_or(0);
    let add_path = path.push_index(len);
    let props = ArrayProps {
        path: path.clone(),
        title: title(overlay, meta, path),
        description: description(overlay, meta),
        error: error_at(ctx, path),
        required,
        items: rendered,
        can_add: max.map_or(true, |max| len < max),
        can_remove: len > min,
        min_title: overlay.and_then(|o| o.min_title.clone()),
        max_title: overlay.and_then(|o| o.max_title.clone()),
        on_add: ArrayAddHandler::new(add_path.clone(), default_value(&arr.element, &add_path)?),
    };
    ctx.renderers.render_array(component(overlay), props)
}

fn field_kind<V>(kind: NodeKind<'_>, overlay: Option<&UiNode<V>>) -> FieldKind {
    match kind {
        NodeKind::String(rules) => FieldKind::String {
            min_length: rules.min_length,
            max_length: rules.max_length,
            email: rules.email,
        },
        NodeKind::Number(rules) => FieldKind::Number {
            minimum: rules.minimum,
            maximum: rules.maximum,
            integer: rules.integer,
        },
        NodeKind::Date(rules) => FieldKind::Date {
            min: rules.min,
            max: rules.max,
        },
        NodeKind::Enum(options) => FieldKind::Enum {
            options: enum_options(options, overlay, None),
        },
        // Compound kinds are dispatched before reaching here
        NodeKind::Boolean | NodeKind::Array(_) | NodeKind::Object(_) => FieldKind::Boolean,
    }
}

fn enum_options<V>(
    options: &[String],
    overlay: Option<&UiNode<V>>,
    fallback: Option<&UiNode<V>>,
) -> Vec<EnumOption> {
    options
        .iter()
        .map(|value| {
            let label = [overlay, fallback]
                .into_iter()
                .flatten()
                .find_map(|o| o.option_labels.get(value))
                .cloned()
                .unwrap_or_else(|| value.clone());
            EnumOption {
                value: value.clone(),
                label,
            }
        })
        .collect()
}

fn component<V>(overlay: Option<&UiNode<V>>) -> Option<&Component<V>> {
    overlay.and_then(|o| o.component.as_ref())
}

fn error_at<B: RenderBackend>(ctx: RenderContext<'_, B>, path: &Path) -> Option<String> {
    ctx.errors.first_message(path).map(str::to_string)
}

/// Overlay label, schema title, field name, or `#n` for array elements
fn label<V>(overlay: Option<&UiNode<V>>, meta: &Meta, path: &Path) -> String {
    overlay
        .and_then(|o| o.label.clone())
        .or_else(|| meta.title.clone())
        .unwrap_or_else(|| fallback_name(path))
}

/// Heading for compound nodes: overlay title first, then the label chain
fn title<V>(overlay: Option<&UiNode<V>>, meta: &Meta, path: &Path) -> String {
    overlay
        .and_then(|o| o.title.clone())
        .unwrap_or_else(|| label(overlay, meta, path))
}

fn description<V>(overlay: Option<&UiNode<V>>, meta: &Meta) -> Option<String> {
    overlay
        .and_then(|o| o.description.clone())
        .or_else(|| meta.description.clone())
}

fn fallback_name(path: &Path) -> String {
    match path.last() {
        Some(PathSegment::Key(key)) => key.clone(),
        Some(PathSegment::Index(idx)) => format!("#{}", idx + 1),
        None => String::new(),
    }
}
