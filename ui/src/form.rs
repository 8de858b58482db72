//! Schema Form Component
//!
//! Hosts a [`FormSession`] in a local signal and re-renders it through the
//! [`LeptosBackend`] whenever the session changes.

use leptos::prelude::*;
use schemaform::render::{Renderer, Renderers};
use schemaform::{FormEvent, FormSession, Schema, UiNode, ValidationMode, Value};

use crate::backend::LeptosBackend;

/// Form generated from `schema`
///
/// `renderers` are registered by name so overlays can pick them with
/// `component`.
#[component]
pub fn SchemaForm(
    schema: Schema,
    #[prop(optional)] overlay: Option<UiNode<AnyView>>,
    #[prop(optional)] defaults: Option<Value>,
    #[prop(optional)] validation_mode: ValidationMode,
    #[prop(optional)] renderers: Vec<(String, Renderer<AnyView>)>,
    #[prop(optional)] on_submit: Option<Callback<Value>>,
    #[prop(default = "Submit".to_string())] submit_label: String,
) -> impl IntoView {
    let mut builder = FormSession::builder(schema)
        .overlay(overlay.unwrap_or_default())
        .validation_mode(validation_mode);
    if let Some(defaults) = defaults {
        builder = builder.defaults(defaults);
    }
    if let Some(callback) = on_submit {
        builder = builder.on_submit(move |value| callback.run(value.clone()));
    }

    let session = match builder.build() {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to create form session: {}", e);
            return view! {
                <div class="p-3 bg-red-50 text-red-700 rounded text-sm">{e.to_string()}</div>
            }
            .into_any();
        }
    };

    let session = RwSignal::new_local(session);
    let dispatch = Callback::new(move |event: FormEvent| session.update(|s| s.dispatch(event)));
    let registry = renderers.into_iter().fold(
        Renderers::new(LeptosBackend::new(dispatch)),
        |registry, (name, renderer)| registry.register(name, renderer),
    );
    let registry = StoredValue::new_local(registry);

    let on_form_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        session.update(|s| {
            s.submit();
        });
    };

    view! {
        <form class="space-y-4" on:submit=on_form_submit>
            {move || {
                session.with(|s| registry.with_value(|r| match s.render(r) {
                    Ok(Some(view)) => view,
                    Ok(None) => ().into_any(),
                    Err(e) => {
                        view! { <div class="p-3 bg-red-50 text-red-700 rounded text-sm">{e.to_string()}</div> }
                            .into_any()
                    }
                }))
            }}
            <div class="flex items-center gap-3">
                <button type="submit" class="px-4 py-2 bg-blue-600 text-white rounded hover:bg-blue-700">
                    {submit_label}
                </button>
                <button
                    type="button"
                    class="px-4 py-2 text-gray-600 rounded hover:bg-gray-100 disabled:opacity-40"
                    disabled=move || session.with(|s| !s.is_dirty())
                    on:click=move |_| session.update(|s| s.reset())
                >
                    "Reset"
                </button>
            </div>
        </form>
    }
    .into_any()
}
