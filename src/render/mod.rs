//! Rendering: props, renderer registry, traversal and the headless backend

pub mod headless;
pub mod props;
pub mod registry;
pub mod traversal;

pub use headless::{HeadlessBackend, RenderItem, RenderNode};
pub use props::{
    ArrayAddHandler, ArrayItem, ArrayProps, ArrayRemoveHandler, ChangeHandler, EnumOption,
    FieldKind, FieldProps, LeafKind, MultiChoiceHandler, MultiChoiceProps, ObjectProps,
};
pub use registry::{RenderBackend, RenderKind, Renderer, Renderers};
pub use traversal::{render_form, render_node, RenderContext};
