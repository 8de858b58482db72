//! Leptos Render Backend
//!
//! Built-in renderers for every node kind. Controls turn user input into
//! [`FormEvent`]s through the props' handlers and pass them to `dispatch`.

use leptos::prelude::*;
use schemaform::render::{
    ArrayProps, FieldKind, FieldProps, MultiChoiceProps, ObjectProps, RenderBackend,
};
use schemaform::{FormEvent, Value};

const INPUT_CLASS: &str = "w-full px-3 py-2 border border-gray-300 rounded-md text-sm focus:outline-none focus:ring-2 focus:ring-blue-500";

/// Renders form nodes as Leptos views
#[derive(Clone, Copy)]
pub struct LeptosBackend {
    dispatch: Callback<FormEvent>,
}

impl LeptosBackend {
    pub fn new(dispatch: Callback<FormEvent>) -> Self {
        Self { dispatch }
    }
}

impl RenderBackend for LeptosBackend {
    type View = AnyView;

    fn field(&self, props: FieldProps) -> AnyView {
        let dispatch = self.dispatch;
        let FieldProps {
            kind,
            path,
            label,
            description,
            placeholder,
            value,
            error,
            required,
            auto_focus,
            on_change,
        } = props;
        let id = path.to_string();

        let control = match kind {
            // ================================================================
            // Text
            // ================================================================
            FieldKind::String {
                min_length,
                max_length,
                email,
            } => {
                let text = value.as_str().unwrap_or_default().to_string();
                view! {
                    <input
                        type=if email { "email" } else { "text" }
                        id=id.clone()
                        class=INPUT_CLASS
                        prop:value=text
                        placeholder=placeholder
                        minlength=min_length.map(|n| n.to_string())
                        maxlength=max_length.map(|n| n.to_string())
                        autofocus=auto_focus
                        on:change=move |ev| dispatch.run(on_change.on_input(&event_target_value(&ev)))
                    />
                }
                .into_any()
            }
            // ================================================================
            // Number
            // ================================================================
            FieldKind::Number {
                minimum,
                maximum,
                integer,
            } => {
                let text = value.as_f64().map(|n| n.to_string()).unwrap_or_default();
                view! {
                    <input
                        type="number"
                        id=id.clone()
                        class=INPUT_CLASS
                        prop:value=text
                        placeholder=placeholder
                        step=if integer { "1" } else { "any" }
                        min=minimum.map(|n| n.to_string())
                        max=maximum.map(|n| n.to_string())
                        autofocus=auto_focus
                        on:change=move |ev| dispatch.run(on_change.on_input(&event_target_value(&ev)))
                    />
                }
                .into_any()
            }
            // ================================================================
            // Boolean
            // ================================================================
            FieldKind::Boolean => {
                let checked = value.as_bool().unwrap_or(false);
                view! {
                    <input
                        type="checkbox"
                        id=id.clone()
                        class="h-4 w-4 text-blue-600 border-gray-300 rounded"
                        prop:checked=checked
                        autofocus=auto_focus
                        on:change=move |ev| {
                            dispatch.run(on_change.on_value(Value::Bool(event_target_checked(&ev))))
                        }
                    />
                }
                .into_any()
            }
            // ================================================================
            // Date
            // ================================================================
            FieldKind::Date { min, max } => {
                let text = value.as_date().map(|d| d.to_string()).unwrap_or_default();
                view! {
                    <input
                        type="date"
                        id=id.clone()
                        class=INPUT_CLASS
                        prop:value=text
                        min=min.map(|d| d.to_string())
                        max=max.map(|d| d.to_string())
                        autofocus=auto_focus
                        on:change=move |ev| dispatch.run(on_change.on_input(&event_target_value(&ev)))
                    />
                }
                .into_any()
            }
            // ================================================================
            // Enum
            // ================================================================
            FieldKind::Enum { options } => {
                let current = value.as_str().unwrap_or_default().to_string();
                let nothing_selected = current.is_empty();
                view! {
                    <select
                        id=id.clone()
                        class=INPUT_CLASS
                        autofocus=auto_focus
                        on:change=move |ev| dispatch.run(on_change.on_input(&event_target_value(&ev)))
                    >
                        <option value="" selected=nothing_selected>
                            {placeholder.unwrap_or_else(|| "Select...".to_string())}
                        </option>
                        {options
                            .into_iter()
                            .map(|option| {
                                let selected = option.value == current;
                                view! {
                                    <option value=option.value selected=selected>{option.label}</option>
                                }
                            })
                            .collect_view()}
                    </select>
                }
                .into_any()
            }
        };

        view! {
            <div class="mb-3">
                <label for=id class="block text-sm font-medium text-gray-700 mb-1">
                    {label}
                    {required.then(|| view! { <span class="text-red-500">" *"</span> })}
                </label>
                {control}
                {description.map(|d| view! { <p class="text-xs text-gray-500 mt-1">{d}</p> })}
                {error.map(|e| view! { <p class="text-xs text-red-600 mt-1">{e}</p> })}
            </div>
        }
        .into_any()
    }

    fn object(&self, props: ObjectProps<AnyView>) -> AnyView {
        view! {
            <fieldset class="border border-gray-200 rounded-lg p-3 mb-3">
                <legend class="px-1 text-sm font-semibold text-gray-700">{props.title}</legend>
                {props.description.map(|d| view! { <p class="text-xs text-gray-500 mb-2">{d}</p> })}
                {props.children}
                {props.error.map(|e| view! { <p class="text-xs text-red-600 mt-1">{e}</p> })}
            </fieldset>
        }
        .into_any()
    }

    fn array(&self, props: ArrayProps<AnyView>) -> AnyView {
        let dispatch = self.dispatch;
        let ArrayProps {
            title,
            description,
            error,
            items,
            can_add,
            can_remove,
            min_title,
            max_title,
            on_add,
            ..
        } = props;
        let count = items.len();

        let body = if items.is_empty() {
            view! {
                <div class="text-sm text-gray-400 italic p-3 text-center">
                    "No items. Click \"Add Item\" to add one."
                </div>
            }
            .into_any()
        } else {
            view! {
                <div class="space-y-2">
                    {items
                        .into_iter()
                        .map(|item| {
                            let on_remove = item.on_remove;
                            view! {
                                <div class="border border-gray-200 rounded-lg p-2 bg-white">
                                    <div class="flex items-center justify-between mb-2">
                                        <span class="text-xs font-medium text-gray-600">
                                            {format!("#{}", item.index + 1)}
                                        </span>
                                        <button
                                            type="button"
                                            class="text-red-500 hover:bg-red-50 p-1 rounded disabled:opacity-40"
                                            disabled=!can_remove
                                            on:click=move |_| dispatch.run(on_remove.remove())
                                        >
                                            <svg class="w-4 h-4" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                                                <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M6 18L18 6M6 6l12 12"/>
                                            </svg>
                                        </button>
                                    </div>
                                    {item.view}
                                </div>
                            }
                        })
                        .collect_view()}
                </div>
            }
            .into_any()
        };

        view! {
            <div class="border border-gray-200 rounded-lg p-3 bg-gray-50 mb-3">
                <div class="flex items-center justify-between mb-2">
                    <span class="text-sm font-medium text-gray-700">{title}</span>
                    <span class="text-xs text-gray-500">{format!("Items: {}", count)}</span>
                    <button
                        type="button"
                        class="px-2 py-1 text-xs rounded flex items-center gap-1 text-blue-600 hover:bg-blue-50 disabled:opacity-40"
                        disabled=!can_add
                        on:click=move |_| dispatch.run(on_add.add())
                    >
                        <svg class="w-3 h-3" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                            <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M12 4v16m8-8H4"/>
                        </svg>
                        "Add Item"
                    </button>
                </div>
                {description.map(|d| view! { <p class="text-xs text-gray-500 mb-2">{d}</p> })}
                {body}
                {(!can_add)
                    .then_some(max_title)
                    .flatten()
                    .map(|t| view! { <p class="text-xs text-gray-500 mt-2">{t}</p> })}
                {(!can_remove)
                    .then_some(min_title)
                    .flatten()
                    .map(|t| view! { <p class="text-xs text-gray-500 mt-2">{t}</p> })}
                {error.map(|e| view! { <p class="text-xs text-red-600 mt-1">{e}</p> })}
            </div>
        }
        .into_any()
    }

    fn multi_choice(&self, props: MultiChoiceProps) -> AnyView {
        let dispatch = self.dispatch;
        let checkboxes = props
            .options
            .iter()
            .map(|option| {
                let checked = props.is_selected(&option.value);
                let handler = props.on_change.clone();
                let value = option.value.clone();
                view! {
                    <label class="inline-flex items-center gap-2 mr-4 text-sm">
                        <input
                            type="checkbox"
                            class="h-4 w-4 text-blue-600 border-gray-300 rounded"
                            prop:checked=checked
                            on:change=move |ev| {
                                dispatch.run(handler.toggle(&value, event_target_checked(&ev)))
                            }
                        />
                        <span>{option.label.clone()}</span>
                    </label>
                }
            })
            .collect_view();

        view! {
            <div class="mb-3">
                <span class="block text-sm font-medium text-gray-700 mb-1">
                    {props.label}
                    {props.required.then(|| view! { <span class="text-red-500">" *"</span> })}
                </span>
                <div class="flex flex-wrap">{checkboxes}</div>
                {props.description.map(|d| view! { <p class="text-xs text-gray-500 mt-1">{d}</p> })}
                {props.error.map(|e| view! { <p class="text-xs text-red-600 mt-1">{e}</p> })}
            </div>
        }
        .into_any()
    }

    fn fragment(&self, children: Vec<AnyView>) -> AnyView {
        children.into_any()
    }
}
