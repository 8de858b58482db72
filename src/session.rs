//! Form session
//!
//! Owns the current value, errors and visibility of one form and reconciles
//! them as events arrive. A session is either uncontrolled (it owns its
//! value) or controlled (the caller pushes replacement values in through
//! [`FormSession::set_external_value`]).

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::defaults::{default_value, form_default_value};
use crate::error::{FormError, Result};
use crate::mutation::{self, ArrayRemoval, Edit};
use crate::overlay::UiNode;
use crate::path::Path;
use crate::render::{render_form, RenderBackend, RenderContext, RenderNode, Renderers};
use crate::schema::introspect::unwrap_at;
use crate::schema::{schema_at, NodeKind, Schema};
use crate::validation::{validate_with, ErrorMap, ValidationOutcome};
use crate::value::Value;
use crate::visibility::{resolve_visibility, VisibilityMap};

/// Something a rendered control asked for
#[derive(Clone, Debug, PartialEq)]
pub enum FormEvent {
    Edit(Edit),
    /// Splice an array element out
    ArrayRemove(Path),
}

impl From<Edit> for FormEvent {
    fn from(edit: Edit) -> Self {
        FormEvent::Edit(edit)
    }
}

/// When the session re-validates on its own
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Only when submitting
    #[default]
    OnSubmit,
    /// After every change
    OnChange,
    /// After every change once a submit has failed
    OnChangeAfterSubmit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormOptions {
    pub validation_mode: ValidationMode,
}

/// Point-in-time copy of the session state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub value: Value,
    pub errors: ErrorMap,
    pub visibility: VisibilityMap,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// Normalized value handed to the submit callback
    Submitted(Value),
    Rejected(ErrorMap),
}

/// Whether the session owns its value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    Controlled,
    Uncontrolled,
}

/// What [`FormSession::set_external_value`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalValueOutcome {
    Applied,
    /// Nothing to do: no value given to an uncontrolled session
    Ignored,
    /// The call switched the session between modes
    ModeSwitched { from: ValueMode, to: ValueMode },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SubmitCallback = Box<dyn FnMut(&Value)>;
type ErrorListener = Box<dyn FnMut(&ErrorMap)>;

pub struct FormSession<V = RenderNode> {
    schema: Schema,
    overlay: UiNode<V>,
    options: FormOptions,
    initial: Value,
    state: FormSnapshot,
    mode: ValueMode,
    submit_failed: bool,
    on_submit: Option<SubmitCallback>,
    listeners: Vec<(SubscriptionId, ErrorListener)>,
    next_subscription: u64,
}

pub struct FormSessionBuilder<V = RenderNode> {
    schema: Schema,
    overlay: UiNode<V>,
    options: FormOptions,
    value: Option<Value>,
    defaults: Option<Value>,
    on_submit: Option<SubmitCallback>,
}

impl<V> FormSessionBuilder<V> {
    pub fn overlay(mut self, overlay: UiNode<V>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validation_mode(mut self, mode: ValidationMode) -> Self {
        self.options.validation_mode = mode;
        self
    }

    /// Start controlled with `value`
    pub fn value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Start uncontrolled with `defaults` instead of the schema's defaults
    pub fn defaults(mut self, defaults: Value) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn on_submit(mut self, callback: impl FnMut(&Value) + 'static) -> Self {
        self.on_submit = Some(Box::new(callback));
        self
    }

    /// Fails when the schema cannot produce default values
    pub fn build(self) -> Result<FormSession<V>> {
        let (initial, mode) = match (self.value, self.defaults) {
            (Some(value), _) => (value, ValueMode::Controlled),
            (None, Some(defaults)) => (defaults, ValueMode::Uncontrolled),
            (None, None) => (form_default_value(&self.schema)?, ValueMode::Uncontrolled),
        };
        let visibility = resolve_visibility(&self.overlay, &initial);
        debug!(mode = ?mode, validation = ?self.options.validation_mode, "Form session created");

        Ok(FormSession {
            schema: self.schema,
            overlay: self.overlay,
            options: self.options,
            state: FormSnapshot {
                value: initial.clone(),
                errors: ErrorMap::new(),
                visibility,
            },
            initial,
            mode,
            submit_failed: false,
            on_submit: self.on_submit,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }
}

impl<V> FormSession<V> {
    pub fn builder(schema: Schema) -> FormSessionBuilder<V> {
        FormSessionBuilder {
            schema,
            overlay: UiNode::new(),
            options: FormOptions::default(),
            value: None,
            defaults: None,
            on_submit: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn overlay(&self) -> &UiNode<V> {
        &self.overlay
    }

    pub fn value(&self) -> &Value {
        &self.state.value
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.state.errors
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.state.visibility
    }

    pub fn mode(&self) -> ValueMode {
        self.mode
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.state.clone()
    }

    /// Current value differs from the initial one
    pub fn is_dirty(&self) -> bool {
        self.state.value != self.initial
    }

    pub fn dispatch(&mut self, event: FormEvent) {
        match event {
            FormEvent::Edit(edit) => self.dispatch_edit(edit),
            FormEvent::ArrayRemove(path) => self.dispatch_array_remove(&path),
        }
    }

    pub fn dispatch_edit(&mut self, edit: Edit) {
        debug!(path = %edit.path(), "Applying edit");
        let value = mutation::apply(&self.state.value, &edit);
        self.commit(value);
    }

    pub fn dispatch_array_remove(&mut self, path: &Path) {
        debug!(path = %path, "Removing array element");
        let value = mutation::remove(&self.state.value, path, ArrayRemoval::Delete);
        self.commit(value);
    }

    /// Append a default element to the array at `path`
    pub fn append_element(&mut self, path: &Path) -> Result<()> {
        let node = schema_at(&self.schema, path)?;
        let NodeKind::Array(arr) = unwrap_at(node, path)?.kind else {
            return Err(FormError::InvalidPath {
                input: path.to_string(),
                reason: "not an array".to_string(),
            });
        };
        let len = self.state.value.lookup(path).as_array().map_or(0, <[Value]>::len);
        let element_path = path.push_index(len);
        let element = default_value(&arr.element, &element_path)?;
        self.dispatch_edit(Edit::update(element_path, element));
        Ok(())
    }

    /// Validate the current value and hand the normalized result to the
    /// submit callback
    pub fn submit(&mut self) -> SubmitOutcome {
        match validate_with(&self.state.value, &self.schema, &self.state.visibility) {
            ValidationOutcome::Valid(parsed) => {
                info!("Form submitted");
                self.set_errors(ErrorMap::new());
                if let Some(callback) = self.on_submit.as_mut() {
                    callback(&parsed);
                }
                SubmitOutcome::Submitted(parsed)
            }
            ValidationOutcome::Invalid(errors) => {
                info!(fields = errors.len(), "Form submission rejected");
                self.submit_failed = true;
                self.set_errors(errors.clone());
                SubmitOutcome::Rejected(errors)
            }
        }
    }

    /// Replace the displayed errors, e.g. with server-side validation results
    pub fn set_external_errors(&mut self, errors: ErrorMap) {
        self.set_errors(errors);
    }

    /// Push a new value from the owner of a controlled session
    ///
    /// `None` means the owner stopped controlling the value: the session keeps
    /// its current value and becomes uncontrolled.
    pub fn set_external_value(&mut self, value: Option<Value>) -> ExternalValueOutcome {
        match (self.mode, value) {
            (ValueMode::Controlled, Some(value)) => {
                self.commit(value);
                ExternalValueOutcome::Applied
            }
            (ValueMode::Uncontrolled, Some(value)) => {
                warn!("Uncontrolled form received an external value; switching to controlled");
                self.mode = ValueMode::Controlled;
                self.commit(value);
                ExternalValueOutcome::ModeSwitched {
                    from: ValueMode::Uncontrolled,
                    to: ValueMode::Controlled,
                }
            }
            (ValueMode::Controlled, None) => {
                warn!("Controlled form lost its external value; switching to uncontrolled");
                self.mode = ValueMode::Uncontrolled;
                ExternalValueOutcome::ModeSwitched {
                    from: ValueMode::Controlled,
                    to: ValueMode::Uncontrolled,
                }
            }
            (ValueMode::Uncontrolled, None) => ExternalValueOutcome::Ignored,
        }
    }

    /// Back to the initial value with no errors
    pub fn reset(&mut self) {
        self.submit_failed = false;
        self.state.visibility = resolve_visibility(&self.overlay, &self.initial);
        self.state.value = self.initial.clone();
        self.set_errors(ErrorMap::new());
    }

    /// Call `listener` whenever the displayed errors change
    pub fn subscribe_errors(&mut self, listener: impl FnMut(&ErrorMap) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Render the current state with `renderers`; `None` when the root is hidden
    pub fn render<B>(&self, renderers: &Renderers<B>) -> Result<Option<V>>
    where
        B: RenderBackend<View = V>,
    {
        let ctx = RenderContext {
            renderers,
            value: &self.state.value,
            errors: &self.state.errors,
            visibility: &self.state.visibility,
        };
        render_form(ctx, &self.schema, Some(&self.overlay))
    }

    fn commit(&mut self, value: Value) {
        self.state.visibility = resolve_visibility(&self.overlay, &value);
        self.state.value = value;

        if self.validates_on_change() {
            let errors = validate_with(&self.state.value, &self.schema, &self.state.visibility)
                .into_errors();
            self.set_errors(errors);
        }
    }

    fn validates_on_change(&self) -> bool {
        match self.options.validation_mode {
            ValidationMode::OnSubmit => false,
            ValidationMode::OnChange => true,
            ValidationMode::OnChangeAfterSubmit => self.submit_failed,
        }
    }

    fn set_errors(&mut self, errors: ErrorMap) {
        if errors == self.state.errors {
            return;
        }
        self.state.errors = errors;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state.errors);
        }
    }
}
