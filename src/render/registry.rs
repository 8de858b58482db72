//! Renderer selection
//!
//! For every node the renderer is chosen in this order:
//!
//! 1. the overlay's `component`, inline or looked up by name, when its kind
//!    fits the node;
//! 2. the registry's override for the node's render kind;
//! 3. the backend's built-in renderer.
//!
//! Enum arrays always resolve as [`RenderKind::MultiChoice`], never as
//! generic arrays.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use super::props::{ArrayProps, FieldProps, LeafKind, MultiChoiceProps, ObjectProps};
use crate::error::{FormError, Result};
use crate::overlay::Component;
use crate::path::Path;

pub type FieldRenderer<V> = Arc<dyn Fn(FieldProps) -> V>;
pub type ObjectRenderer<V> = Arc<dyn Fn(ObjectProps<V>) -> V>;
pub type ArrayRenderer<V> = Arc<dyn Fn(ArrayProps<V>) -> V>;
pub type MultiChoiceRenderer<V> = Arc<dyn Fn(MultiChoiceProps) -> V>;

/// What a node renders as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderKind {
    Field(LeafKind),
    Object,
    Array,
    MultiChoice,
}

impl fmt::Display for RenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderKind::Field(LeafKind::String) => f.write_str("string"),
            RenderKind::Field(LeafKind::Number) => f.write_str("number"),
            RenderKind::Field(LeafKind::Boolean) => f.write_str("boolean"),
            RenderKind::Field(LeafKind::Date) => f.write_str("date"),
            RenderKind::Field(LeafKind::Enum) => f.write_str("enum"),
            RenderKind::Object => f.write_str("object"),
            RenderKind::Array => f.write_str("array"),
            RenderKind::MultiChoice => f.write_str("multi_choice"),
        }
    }
}

/// A renderer for one family of props
pub enum Renderer<V> {
    /// Renders any leaf field
    Field(FieldRenderer<V>),
    Object(ObjectRenderer<V>),
    Array(ArrayRenderer<V>),
    MultiChoice(MultiChoiceRenderer<V>),
}

impl<V> Renderer<V> {
    pub fn field(render: impl Fn(FieldProps) -> V + 'static) -> Self {
        Renderer::Field(Arc::new(render))
    }

    pub fn object(render: impl Fn(ObjectProps<V>) -> V + 'static) -> Self {
        Renderer::Object(Arc::new(render))
    }

    pub fn array(render: impl Fn(ArrayProps<V>) -> V + 'static) -> Self {
        Renderer::Array(Arc::new(render))
    }

    pub fn multi_choice(render: impl Fn(MultiChoiceProps) -> V + 'static) -> Self {
        Renderer::MultiChoice(Arc::new(render))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Renderer::Field(_) => "field",
            Renderer::Object(_) => "object",
            Renderer::Array(_) => "array",
            Renderer::MultiChoice(_) => "multi_choice",
        }
    }
}

impl<V> Clone for Renderer<V> {
    fn clone(&self) -> Self {
        match self {
            Renderer::Field(r) => Renderer::Field(r.clone()),
            Renderer::Object(r) => Renderer::Object(r.clone()),
            Renderer::Array(r) => Renderer::Array(r.clone()),
            Renderer::MultiChoice(r) => Renderer::MultiChoice(r.clone()),
        }
    }
}

/// Built-in renderers of a view technology
pub trait RenderBackend {
    type View;

    fn field(&self, props: FieldProps) -> Self::View;

    fn object(&self, props: ObjectProps<Self::View>) -> Self::View;

    fn array(&self, props: ArrayProps<Self::View>) -> Self::View;

    fn multi_choice(&self, props: MultiChoiceProps) -> Self::View;

    /// Unwrapped sequence of views, used for the root object's fields
    fn fragment(&self, children: Vec<Self::View>) -> Self::View;
}

/// Backend plus per-kind overrides and named renderers
pub struct Renderers<B: RenderBackend> {
    backend: B,
    overrides: HashMap<RenderKind, Renderer<B::View>>,
    named: HashMap<String, Renderer<B::View>>,
}

impl<B: RenderBackend> Renderers<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            overrides: HashMap::new(),
            named: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Override the built-in renderer for one leaf kind
    pub fn with_field(
        mut self,
        kind: LeafKind,
        render: impl Fn(FieldProps) -> B::View + 'static,
    ) -> Self {
        self.overrides
            .insert(RenderKind::Field(kind), Renderer::field(render));
        self
    }

    pub fn with_object(mut self, render: impl Fn(ObjectProps<B::View>) -> B::View + 'static) -> Self {
        self.overrides.insert(RenderKind::Object, Renderer::object(render));
        self
    }

    pub fn with_array(mut self, render: impl Fn(ArrayProps<B::View>) -> B::View + 'static) -> Self {
        self.overrides.insert(RenderKind::Array, Renderer::array(render));
        self
    }

    pub fn with_multi_choice(
        mut self,
        render: impl Fn(MultiChoiceProps) -> B::View + 'static,
    ) -> Self {
        self.overrides
            .insert(RenderKind::MultiChoice, Renderer::multi_choice(render));
        self
    }

    /// Make `renderer` available to overlays as `component: name`
    pub fn register(mut self, name: impl Into<String>, renderer: Renderer<B::View>) -> Self {
        self.named.insert(name.into(), renderer);
        self
    }

    pub fn render_field(
        &self,
        component: Option<&Component<B::View>>,
        props: FieldProps,
    ) -> Result<B::View> {
        let kind = RenderKind::Field(props.kind.leaf_kind());
        if let Some(Renderer::Field(render)) = self.select(component, kind, &props.path)? {
            return Ok(render(props));
        }
        Ok(self.backend.field(props))
    }

    pub fn render_object(
        &self,
        component: Option<&Component<B::View>>,
        props: ObjectProps<B::View>,
    ) -> Result<B::View> {
        if let Some(Renderer::Object(render)) = self.select(component, RenderKind::Object, &props.path)? {
            return Ok(render(props));
        }
        Ok(self.backend.object(props))
    }

    pub fn render_array(
        &self,
        component: Option<&Component<B::View>>,
        props: ArrayProps<B::View>,
    ) -> Result<B::View> {
        if let Some(Renderer::Array(render)) = self.select(component, RenderKind::Array, &props.path)? {
            return Ok(render(props));
        }
        Ok(self.backend.array(props))
    }

    pub fn render_multi_choice(
        &self,
        component: Option<&Component<B::View>>,
        props: MultiChoiceProps,
    ) -> Result<B::View> {
        if let Some(Renderer::MultiChoice(render)) =
            self.select(component, RenderKind::MultiChoice, &props.path)?
        {
            return Ok(render(props));
        }
        Ok(self.backend.multi_choice(props))
    }

    /// Overlay component if it fits `kind`, else the override for `kind`
    fn select<'a>(
        &'a self,
        component: Option<&'a Component<B::View>>,
        kind: RenderKind,
        path: &Path,
    ) -> Result<Option<&'a Renderer<B::View>>> {
        let chosen = match component {
            Some(Component::Inline(renderer)) => Some(renderer),
            Some(Component::Named(name)) => Some(
                self.named
                    .get(name)
                    .ok_or_else(|| FormError::UnknownRenderer { name: name.clone() })?,
            ),
            None => None,
        };

        if let Some(renderer) = chosen {
            if fits(renderer, kind) {
                return Ok(Some(renderer));
            }
            warn!(
                path = %path,
                renderer = renderer.kind(),
                node = %kind,
                "Overlay component does not fit node kind, using default renderer"
            );
        }

        Ok(self.overrides.get(&kind))
    }
}

fn fits<V>(renderer: &Renderer<V>, kind: RenderKind) -> bool {
    matches!(
        (renderer, kind),
        (Renderer::Field(_), RenderKind::Field(_))
            | (Renderer::Object(_), RenderKind::Object)
            | (Renderer::Array(_), RenderKind::Array)
            | (Renderer::MultiChoice(_), RenderKind::MultiChoice)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use crate::render::props::{ChangeHandler, FieldKind};
    use crate::value::Value;

    struct Tags;

    impl RenderBackend for Tags {
        type View = String;

        fn field(&self, props: FieldProps) -> String {
            format!("builtin-field:{}", props.path)
        }

        fn object(&self, props: ObjectProps<String>) -> String {
            format!("builtin-object:{}", props.path)
        }

        fn array(&self, props: ArrayProps<String>) -> String {
            format!("builtin-array:{}", props.path)
        }

        fn multi_choice(&self, props: MultiChoiceProps) -> String {
            format!("builtin-multi:{}", props.path)
        }

        fn fragment(&self, children: Vec<String>) -> String {
            children.join(",")
        }
    }

    fn props(kind: FieldKind) -> FieldProps {
        let leaf = kind.leaf_kind();
        FieldProps {
            kind,
            path: path!["name"],
            label: "name".to_string(),
            description: None,
            placeholder: None,
            value: Value::Undefined,
            error: None,
            required: true,
            auto_focus: false,
            on_change: ChangeHandler::new(path!["name"], leaf),
        }
    }

    fn text() -> FieldKind {
        FieldKind::String {
            min_length: None,
            max_length: None,
            email: false,
        }
    }

    #[test]
    fn test_builtin_fallback() {
        let renderers = Renderers::new(Tags);
        assert_eq!(renderers.render_field(None, props(text())).unwrap(), "builtin-field:name");
    }

    #[test]
    fn test_override_by_kind() {
        let renderers = Renderers::new(Tags).with_field(LeafKind::String, |p| format!("custom:{}", p.label));
        assert_eq!(renderers.render_field(None, props(text())).unwrap(), "custom:name");
        assert_eq!(
            renderers.render_field(None, props(FieldKind::Boolean)).unwrap(),
            "builtin-field:name"
        );
    }

    #[test]
    fn test_overlay_component_beats_override() {
        let renderers = Renderers::new(Tags)
            .with_field(LeafKind::String, |_| "override".to_string())
            .register("textarea", Renderer::field(|_| "textarea".to_string()));

        let inline = Component::Inline(Renderer::field(|_| "inline".to_string()));
        assert_eq!(renderers.render_field(Some(&inline), props(text())).unwrap(), "inline");

        let named = Component::Named("textarea".to_string());
        assert_eq!(renderers.render_field(Some(&named), props(text())).unwrap(), "textarea");
    }

    #[test]
    fn test_mismatched_component_falls_through() {
        let renderers = Renderers::new(Tags).with_field(LeafKind::String, |_| "override".to_string());
        let wrong = Component::Inline(Renderer::array(|_: ArrayProps<String>| "array".to_string()));
        assert_eq!(renderers.render_field(Some(&wrong), props(text())).unwrap(), "override");
    }

    #[test]
    fn test_unknown_named_component_fails() {
        let renderers = Renderers::new(Tags);
        let named = Component::Named("missing".to_string());
        let err = renderers.render_field(Some(&named), props(text())).unwrap_err();
        assert_eq!(err, FormError::UnknownRenderer { name: "missing".to_string() });
    }
}
