//! Presentation overlay
//!
//! A [`UiNode`] tree parallels the schema tree and carries everything the
//! schema does not: labels, placeholders, renderer choices and visibility
//! conditions. Object nodes keep their own settings apart from their
//! `fields`, so a field literally named `ui` never collides with node
//! configuration.

pub mod condition;
pub mod loader;

pub use condition::{Condition, Predicate};
pub use loader::load_overlay;

use std::collections::BTreeMap;

use crate::render::Renderer;

/// Renderer choice attached to a single node
pub enum Component<V> {
    /// Look the renderer up by name in the registry
    Named(String),
    /// Use this renderer directly
    Inline(Renderer<V>),
}

impl<V> Clone for Component<V> {
    fn clone(&self) -> Self {
        match self {
            Component::Named(name) => Component::Named(name.clone()),
            Component::Inline(renderer) => Component::Inline(renderer.clone()),
        }
    }
}

impl<V> std::fmt::Debug for Component<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Component::Inline(renderer) => f.debug_tuple("Inline").field(&renderer.kind()).finish(),
        }
    }
}

/// Overlay node for one schema node
///
/// `V` is the view type produced by inline renderers.
pub struct UiNode<V> {
    pub label: Option<String>,
    /// Heading for object and array nodes
    pub title: Option<String>,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub component: Option<Component<V>>,
    /// The node (and everything below it) is hidden while this is false
    pub cond: Option<Condition>,
    pub auto_focus: bool,
    /// Display labels for enum options, keyed by option value
    pub option_labels: BTreeMap<String, String>,
    /// Caption shown when an array sits at its minimum length
    pub min_title: Option<String>,
    /// Caption shown when an array sits at its maximum length
    pub max_title: Option<String>,
    /// Overlay applied to every element of an array node
    pub element: Option<Box<UiNode<V>>>,
    pub fields: BTreeMap<String, UiNode<V>>,
}

impl<V> Default for UiNode<V> {
    fn default() -> Self {
        Self {
            label: None,
            title: None,
            description: None,
            placeholder: None,
            component: None,
            cond: None,
            auto_focus: false,
            option_labels: BTreeMap::new(),
            min_title: None,
            max_title: None,
            element: None,
            fields: BTreeMap::new(),
        }
    }
}

impl<V> Clone for UiNode<V> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            placeholder: self.placeholder.clone(),
            component: self.component.clone(),
            cond: self.cond.clone(),
            auto_focus: self.auto_focus,
            option_labels: self.option_labels.clone(),
            min_title: self.min_title.clone(),
            max_title: self.max_title.clone(),
            element: self.element.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<V> std::fmt::Debug for UiNode<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiNode")
            .field("label", &self.label)
            .field("title", &self.title)
            .field("component", &self.component)
            .field("cond", &self.cond)
            .field("element", &self.element)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl<V> UiNode<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn component(mut self, component: Component<V>) -> Self {
        self.component = Some(component);
        self
    }

    pub fn renderer(self, renderer: Renderer<V>) -> Self {
        self.component(Component::Inline(renderer))
    }

    pub fn named_renderer(self, name: impl Into<String>) -> Self {
        self.component(Component::Named(name.into()))
    }

    pub fn cond(mut self, cond: Condition) -> Self {
        self.cond = Some(cond);
        self
    }

    pub fn auto_focus(mut self) -> Self {
        self.auto_focus = true;
        self
    }

    pub fn option_label(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.option_labels.insert(value.into(), label.into());
        self
    }

    pub fn min_title(mut self, title: impl Into<String>) -> Self {
        self.min_title = Some(title.into());
        self
    }

    pub fn max_title(mut self, title: impl Into<String>) -> Self {
        self.max_title = Some(title.into());
        self
    }

    pub fn element(mut self, element: UiNode<V>) -> Self {
        self.element = Some(Box::new(element));
        self
    }

    pub fn field(mut self, name: impl Into<String>, node: UiNode<V>) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    /// Overlay for the child field `name`
    pub fn child(&self, name: &str) -> Option<&UiNode<V>> {
        self.fields.get(name)
    }

    /// Overlay for array elements
    pub fn element_node(&self) -> Option<&UiNode<V>> {
        self.element.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn test_builder_nests() {
        let ui: UiNode<()> = UiNode::new()
            .title("Checkout")
            .field("name", UiNode::new().label("Full name").auto_focus())
            .field(
                "people",
                UiNode::new()
                    .min_title("At least one person")
                    .element(UiNode::new().field("age", UiNode::new().placeholder("years"))),
            )
            .field(
                "card",
                UiNode::new().cond(Condition::equals(path!["payment"], json!("card"))),
            );

        assert_eq!(ui.child("name").unwrap().label.as_deref(), Some("Full name"));
        assert!(ui.child("name").unwrap().auto_focus);
        let people = ui.child("people").unwrap();
        assert_eq!(
            people.element_node().unwrap().child("age").unwrap().placeholder.as_deref(),
            Some("years")
        );
        assert!(ui.child("card").unwrap().cond.is_some());
        assert!(ui.child("missing").is_none());
    }

    #[test]
    fn test_field_named_ui_is_ordinary() {
        let ui: UiNode<()> = UiNode::new()
            .title("Settings")
            .field("ui", UiNode::new().label("Theme"));
        assert_eq!(ui.title.as_deref(), Some("Settings"));
        assert_eq!(ui.child("ui").unwrap().label.as_deref(), Some("Theme"));
    }
}
