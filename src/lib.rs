//! # Schemaform - schema-driven forms
//!
//! Schemaform turns a declarative value schema plus an optional presentation
//! overlay into a rendered form, and keeps the form's value, errors and
//! visibility consistent as the user edits it.
//!
//! ## Features
//!
//! - **Schema engine**: builder API and JSON Schema import, with defaults,
//!   optional/defaulted/refined wrappers and zod-style validation messages
//! - **Overlays**: labels, placeholders, renderer choices and conditional
//!   visibility, built in Rust or loaded from JSON
//! - **Pluggable rendering**: any view technology implementing [`RenderBackend`],
//!   with per-kind overrides and named renderers
//! - **Copy-on-write state**: edits share every untouched subtree
//! - **Visibility-aware validation**: hidden fields never block submission
//!
//! ## Quick Start
//!
//! ```rust
//! use schemaform::render::{HeadlessBackend, Renderers};
//! use schemaform::schema::{number, object, string};
//! use schemaform::{path, FormSession, SubmitOutcome};
//!
//! let schema = object([("name", string().optional()), ("age", number())]);
//! let mut session: FormSession = FormSession::builder(schema).build()?;
//!
//! let tree = session.render(&Renderers::new(HeadlessBackend))?.expect("root is visible");
//! let age = tree.find(&path!["age"]).and_then(|n| n.change_handler()).expect("age field");
//! session.dispatch(age.on_input("18"));
//!
//! match session.submit() {
//!     SubmitOutcome::Submitted(value) => assert_eq!(value.to_json(), serde_json::json!({"age": 18})),
//!     SubmitOutcome::Rejected(errors) => panic!("{:?}", errors),
//! }
//! # Ok::<(), schemaform::FormError>(())
//! ```
//!
//! ## Architecture
//!
//! - **Schema**: [`schema`] model, introspection, parsing and JSON Schema import
//! - **State**: [`value`] trees, [`path`] codec, [`mutation`] and [`defaults`]
//! - **Presentation**: [`overlay`] and [`visibility`]
//! - **Rendering**: [`render`] props, registry, traversal and the headless backend
//! - **Session**: [`session`] reconciles edits, validation and submission
//! - **Config**: [`config`] settings for the command-line front end

pub mod cli;
pub mod commands;
pub mod config;
pub mod defaults;
pub mod error;
pub mod mutation;
pub mod overlay;
pub mod path;
pub mod render;
pub mod schema;
pub mod session;
pub mod validation;
pub mod value;
pub mod visibility;

pub use defaults::{default_value, form_default_value};
pub use error::{FormError, Result};
pub use mutation::{ArrayRemoval, Edit};
pub use overlay::{Component, Condition, UiNode};
pub use path::{Path, PathSegment};
pub use render::{RenderBackend, Renderer, Renderers};
pub use schema::Schema;
pub use session::{
    ExternalValueOutcome, FormEvent, FormOptions, FormSession, FormSnapshot, SubmitOutcome,
    ValidationMode,
};
pub use validation::{validate, ErrorMap, ValidationOutcome};
pub use value::Value;
pub use visibility::{resolve_visibility, VisibilityMap};
