//! End-to-end form flows driven through the session and the headless renderer

use schemaform::overlay::Condition;
use schemaform::render::{HeadlessBackend, RenderNode, Renderers};
use schemaform::schema::{array, enumeration, number, object, string};
use schemaform::{path, FormSession, Path, SubmitOutcome, UiNode, ValidationMode, Value};
use serde_json::json;

fn render(session: &FormSession) -> RenderNode {
    session
        .render(&Renderers::new(HeadlessBackend))
        .expect("render succeeds")
        .expect("root is visible")
}

fn type_into(session: &mut FormSession, path: &Path, text: &str) {
    let tree = render(session);
    let handler = tree
        .find(path)
        .and_then(RenderNode::change_handler)
        .unwrap_or_else(|| panic!("no field rendered at {}", path))
        .clone();
    session.dispatch(handler.on_input(text));
}

fn submitted(session: &mut FormSession) -> serde_json::Value {
    match session.submit() {
        SubmitOutcome::Submitted(value) => value.to_json(),
        SubmitOutcome::Rejected(errors) => panic!("unexpected errors: {:?}", errors.messages()),
    }
}

#[test]
fn test_cleared_optional_field_is_absent_on_submit() {
    let schema = object([("name", string().min(3).optional())]);
    let mut session: FormSession = FormSession::builder(schema).build().unwrap();

    type_into(&mut session, &path!["name"], "John doe");
    assert_eq!(session.value().to_json(), json!({"name": "John doe"}));

    type_into(&mut session, &path!["name"], "");
    assert_eq!(submitted(&mut session), json!({}));
}

#[test]
fn test_number_input_submits_as_number() {
    let schema = object([("age", number())]);
    let mut session: FormSession = FormSession::builder(schema).build().unwrap();

    type_into(&mut session, &path!["age"], "18");
    let value = submitted(&mut session);
    assert_eq!(value, json!({"age": 18}));
    assert!(value["age"].is_number());
}

#[test]
fn test_enum_array_defaults_empty_and_grows_on_add() {
    let schema = object([("fruits", array(enumeration(["apple", "banana"])))]);
    let mut session: FormSession = FormSession::builder(schema).build().unwrap();
    assert_eq!(session.value().to_json(), json!({"fruits": []}));

    session.append_element(&path!["fruits"]).unwrap();
    let fruits = session.value().field("fruits").as_array().unwrap();
    assert_eq!(fruits.len(), 1);
    assert!(fruits[0].is_undefined());
}

#[test]
fn test_multi_choice_toggles() {
    let schema = object([("fruits", array(enumeration(["apple", "banana"])))]);
    let mut session: FormSession = FormSession::builder(schema).build().unwrap();

    for (option, checked) in [("banana", true), ("apple", true), ("banana", false)] {
        let tree = render(&session);
        let handler = tree
            .find(&path!["fruits"])
            .and_then(RenderNode::multi_choice_handler)
            .unwrap()
            .clone();
        session.dispatch(handler.toggle(option, checked));
    }

    assert_eq!(session.value().to_json(), json!({"fruits": ["apple"]}));
}

#[test]
fn test_hidden_field_reports_no_error() {
    let schema = object([
        ("paymentMethod", enumeration(["card", "payPal"]).optional()),
        ("paypalNumber", string()),
    ]);
    let ui = UiNode::new().field(
        "paypalNumber",
        UiNode::new().cond(Condition::custom(|data| {
            data.field("paymentMethod").as_str() == Some("payPal")
        })),
    );
    let mut session: FormSession = FormSession::builder(schema).overlay(ui).build().unwrap();

    assert_eq!(session.visibility().get(&path!["paypalNumber"]), Some(false));
    assert!(render(&session).find(&path!["paypalNumber"]).is_none());
    assert_eq!(submitted(&mut session), json!({}));

    // Once shown, the same field is required again
    type_into(&mut session, &path!["paymentMethod"], "payPal");
    assert_eq!(session.visibility().get(&path!["paypalNumber"]), Some(true));
    let SubmitOutcome::Rejected(errors) = session.submit() else {
        panic!("expected rejection");
    };
    assert_eq!(errors.first_message(&path!["paypalNumber"]), Some("Required"));
}

fn paypal_hidden_ui() -> UiNode<RenderNode> {
    UiNode::new().field(
        "paypalNumber",
        UiNode::new().cond(Condition::equals(path!["paymentMethod"], json!("payPal"))),
    )
}

#[test]
fn test_hidden_required_field_beside_defaults_and_unknown_keys() {
    let schema = object([
        ("paymentMethod", enumeration(["card", "payPal"]).optional()),
        ("paypalNumber", string()),
        ("count", number().default_value(3)),
    ]);
    let mut session: FormSession = FormSession::builder(schema)
        .overlay(paypal_hidden_ui())
        .defaults(Value::from(json!({"junk": 1, "paypalNumber": "stale"})))
        .build()
        .unwrap();

    assert_eq!(submitted(&mut session), json!({"count": 3}));
}

#[test]
fn test_hidden_required_field_does_not_bypass_refinement() {
    let schema = object([
        ("paymentMethod", enumeration(["card", "payPal"]).optional()),
        ("paypalNumber", string()),
        ("password", string()),
        ("confirm", string()),
    ])
    .refine_at(
        |v| v.field("password") == v.field("confirm"),
        "Passwords don't match",
        path!["confirm"],
    );
    let mut session: FormSession = FormSession::builder(schema)
        .overlay(paypal_hidden_ui())
        .defaults(Value::from(json!({"password": "a", "confirm": "b"})))
        .build()
        .unwrap();

    let SubmitOutcome::Rejected(errors) = session.submit() else {
        panic!("mismatched passwords were accepted");
    };
    assert_eq!(errors.first_message(&path!["confirm"]), Some("Passwords don't match"));
    assert!(errors.get(&path!["paypalNumber"]).is_none());

    type_into(&mut session, &path!["confirm"], "a");
    assert_eq!(submitted(&mut session), json!({"password": "a", "confirm": "a"}));
}

#[test]
fn test_nested_labels_and_errors_are_distinct() {
    let schema = object([("address", object([("city", string())]))]);
    let ui = UiNode::new().field(
        "address",
        UiNode::new()
            .label("Address")
            .field("city", UiNode::new().label("City")),
    );
    let mut session: FormSession = FormSession::builder(schema)
        .overlay(ui)
        .defaults(Value::from(json!({"address": {}})))
        .build()
        .unwrap();

    session.submit();
    let tree = render(&session);

    let address = tree.find(&path!["address"]).unwrap();
    let city = tree.find(&path!["address", "city"]).unwrap();
    assert_eq!(address.label(), Some("Address"));
    assert_eq!(city.label(), Some("City"));
    assert_eq!(city.error(), Some("Required"));
    assert_eq!(address.error(), None);
}

#[test]
fn test_array_rows_add_and_remove() {
    let schema = object([(
        "people",
        array(object([("name", string()), ("age", number().optional())])).min(1),
    )]);
    let mut session: FormSession = FormSession::builder(schema)
        .validation_mode(ValidationMode::OnChange)
        .build()
        .unwrap();
    assert_eq!(session.value().to_json(), json!({"people": [{}]}));

    let tree = render(&session);
    let people = tree.find(&path!["people"]).unwrap();
    assert!(matches!(people, RenderNode::Array { can_remove: false, .. }));
    session.dispatch(people.add_handler().unwrap().add());

    type_into(&mut session, &path!["people", 0usize, "name"], "Ada");
    type_into(&mut session, &path!["people", 1usize, "name"], "Grace");
    assert_eq!(
        session.errors().first_message(&path!["people", 0usize, "name"]),
        None
    );

    let tree = render(&session);
    let remove_first = tree.find(&path!["people"]).unwrap().remove_handler(0).unwrap().clone();
    session.dispatch(remove_first.remove());

    assert_eq!(submitted(&mut session), json!({"people": [{"name": "Grace"}]}));
}
