use leptos::prelude::*;
use schemaform::overlay::Condition;
use schemaform::schema::{array, boolean, date, enumeration, number, object, string, Schema};
use schemaform::{path, UiNode, ValidationMode, Value};

mod backend;
mod form;

pub use backend::LeptosBackend;
pub use form::SchemaForm;

fn checkout_schema() -> Schema {
    object([
        ("name", string().min(2).title("Full name")),
        ("email", string().email().optional()),
        ("age", number().int().min(18).optional()),
        ("born", date().optional()),
        ("payment", enumeration(["card", "paypal"])),
        ("card", string().length(16)),
        ("paypal", string().email()),
        ("fruits", array(enumeration(["apple", "banana", "cherry"]))),
        (
            "people",
            array(object([("name", string()), ("vip", boolean())])).max(3),
        ),
        (
            "agree",
            boolean().refine(|v| v.as_bool() == Some(true), "You must accept the terms"),
        ),
    ])
}

fn checkout_overlay() -> UiNode<AnyView> {
    UiNode::new()
        .field("name", UiNode::new().auto_focus().placeholder("Ada Lovelace"))
        .field("payment", UiNode::new().option_label("card", "Credit card").option_label("paypal", "PayPal"))
        .field(
            "card",
            UiNode::new()
                .label("Card number")
                .cond(Condition::equals(path!["payment"], serde_json::json!("card"))),
        )
        .field(
            "paypal",
            UiNode::new()
                .label("PayPal account")
                .cond(Condition::equals(path!["payment"], serde_json::json!("paypal"))),
        )
        .field(
            "people",
            UiNode::new()
                .title("Travellers")
                .max_title("Up to three travellers")
                .element(UiNode::new().field("vip", UiNode::new().label("VIP"))),
        )
        .field("agree", UiNode::new().label("I accept the terms"))
}

#[component]
pub fn App() -> impl IntoView {
    let (submitted, set_submitted) = signal(None::<String>);
    let on_submit = Callback::new(move |value: Value| {
        set_submitted.set(serde_json::to_string_pretty(&value.to_json()).ok());
    });

    view! {
        <div class="max-w-2xl mx-auto p-6">
            <h1 class="text-2xl font-bold mb-6">"Checkout"</h1>
            <SchemaForm
                schema=checkout_schema()
                overlay=checkout_overlay()
                validation_mode=ValidationMode::OnChangeAfterSubmit
                on_submit=on_submit
            />
            {move || submitted.get().map(|json| view! {
                <pre class="mt-6 p-3 bg-gray-900 text-green-300 rounded text-xs overflow-x-auto">{json}</pre>
            })}
        </div>
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::mount_to_body(App);
}
