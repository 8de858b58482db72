//! View-less backend
//!
//! Renders the form into a plain [`RenderNode`] tree. Useful wherever there is
//! no UI toolkit: tests, the command line and snapshot tooling. Handlers are
//! kept on the nodes so callers can drive the form exactly as a UI would.

use serde::Serialize;

use super::props::{
    ArrayAddHandler, ArrayProps, ArrayRemoveHandler, ChangeHandler, EnumOption, FieldKind,
    FieldProps, MultiChoiceHandler, MultiChoiceProps, ObjectProps,
};
use super::registry::RenderBackend;
use crate::path::Path;
use crate::value::Value;

#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessBackend;

/// Rendered node
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderNode {
    Field {
        path: Path,
        label: String,
        description: Option<String>,
        placeholder: Option<String>,
        input: FieldKind,
        value: Value,
        error: Option<String>,
        required: bool,
        auto_focus: bool,
        #[serde(skip)]
        on_change: ChangeHandler,
    },
    Object {
        path: Path,
        title: String,
        description: Option<String>,
        error: Option<String>,
        children: Vec<RenderNode>,
    },
    Array {
        path: Path,
        title: String,
        description: Option<String>,
        error: Option<String>,
        can_add: bool,
        can_remove: bool,
        min_title: Option<String>,
        max_title: Option<String>,
        items: Vec<RenderItem>,
        #[serde(skip)]
        on_add: ArrayAddHandler,
    },
    MultiChoice {
        path: Path,
        label: String,
        description: Option<String>,
        error: Option<String>,
        options: Vec<EnumOption>,
        selected: Vec<String>,
        #[serde(skip)]
        on_change: MultiChoiceHandler,
    },
    Fragment {
        children: Vec<RenderNode>,
    },
}

/// Rendered array element
#[derive(Clone, Debug, Serialize)]
pub struct RenderItem {
    pub index: usize,
    pub node: RenderNode,
    #[serde(skip)]
    pub on_remove: ArrayRemoveHandler,
}

impl RenderNode {
    pub fn path(&self) -> Option<&Path> {
        match self {
            RenderNode::Field { path, .. }
            | RenderNode::Object { path, .. }
            | RenderNode::Array { path, .. }
            | RenderNode::MultiChoice { path, .. } => Some(path),
            RenderNode::Fragment { .. } => None,
        }
    }

    /// Label of leaves, title of compound nodes
    pub fn label(&self) -> Option<&str> {
        match self {
            RenderNode::Field { label, .. } | RenderNode::MultiChoice { label, .. } => Some(label),
            RenderNode::Object { title, .. } | RenderNode::Array { title, .. } => Some(title),
            RenderNode::Fragment { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RenderNode::Field { error, .. }
            | RenderNode::Object { error, .. }
            | RenderNode::Array { error, .. }
            | RenderNode::MultiChoice { error, .. } => error.as_deref(),
            RenderNode::Fragment { .. } => None,
        }
    }

    pub fn children(&self) -> Vec<&RenderNode> {
        match self {
            RenderNode::Object { children, .. } | RenderNode::Fragment { children } => {
                children.iter().collect()
            }
            RenderNode::Array { items, .. } => items.iter().map(|item| &item.node).collect(),
            RenderNode::Field { .. } | RenderNode::MultiChoice { .. } => Vec::new(),
        }
    }

    /// Depth-first search for the node rendered at `path`
    pub fn find(&self, path: &Path) -> Option<&RenderNode> {
        if self.path() == Some(path) {
            return Some(self);
        }
        self.children().into_iter().find_map(|child| child.find(path))
    }

    /// Every rendered path, depth first
    pub fn paths(&self) -> Vec<&Path> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a Path>) {
        out.extend(self.path());
        for child in self.children() {
            child.collect_paths(out);
        }
    }

    pub fn change_handler(&self) -> Option<&ChangeHandler> {
        match self {
            RenderNode::Field { on_change, .. } => Some(on_change),
            _ => None,
        }
    }

    pub fn multi_choice_handler(&self) -> Option<&MultiChoiceHandler> {
        match self {
            RenderNode::MultiChoice { on_change, .. } => Some(on_change),
            _ => None,
        }
    }

    pub fn add_handler(&self) -> Option<&ArrayAddHandler> {
        match self {
            RenderNode::Array { on_add, .. } => Some(on_add),
            _ => None,
        }
    }

    /// Remove handler of the element at `index`
    pub fn remove_handler(&self, index: usize) -> Option<&ArrayRemoveHandler> {
        match self {
            RenderNode::Array { items, .. } => items
                .iter()
                .find(|item| item.index == index)
                .map(|item| &item.on_remove),
            _ => None,
        }
    }
}

impl RenderBackend for HeadlessBackend {
    type View = RenderNode;

    fn field(&self, props: FieldProps) -> RenderNode {
        RenderNode::Field {
            path: props.path,
            label: props.label,
            description: props.description,
            placeholder: props.placeholder,
            input: props.kind,
            value: props.value,
            error: props.error,
            required: props.required,
            auto_focus: props.auto_focus,
            on_change: props.on_change,
        }
    }

    fn object(&self, props: ObjectProps<RenderNode>) -> RenderNode {
        RenderNode::Object {
            path: props.path,
            title: props.title,
            description: props.description,
            error: props.error,
            children: props.children,
        }
    }

    fn array(&self, props: ArrayProps<RenderNode>) -> RenderNode {
        RenderNode::Array {
            path: props.path,
            title: props.title,
            description: props.description,
            error: props.error,
            can_add: props.can_add,
            can_remove: props.can_remove,
            min_title: props.min_title,
            max_title: props.max_title,
            items: props
                .items
                .into_iter()
                .map(|item| RenderItem {
                    index: item.index,
                    node: item.view,
                    on_remove: item.on_remove,
                })
                .collect(),
            on_add: props.on_add,
        }
    }

    fn multi_choice(&self, props: MultiChoiceProps) -> RenderNode {
        RenderNode::MultiChoice {
            path: props.path,
            label: props.label,
            description: props.description,
            error: props.error,
            options: props.options,
            selected: props.selected,
            on_change: props.on_change,
        }
    }

    fn fragment(&self, children: Vec<RenderNode>) -> RenderNode {
        RenderNode::Fragment { children }
    }
}
