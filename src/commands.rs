//! Command execution for the `schemaform` binary

use anyhow::{anyhow, bail, Context};
use serde_json::{json, Value as JsonValue};
use std::fs;
use std::path::Path as FsPath;
use tracing::{debug, info};

use crate::cli::{Command, FormArgs};
use crate::config::Settings;
use crate::defaults::form_default_value;
use crate::mutation::{ArrayRemoval, Edit};
use crate::overlay::{load_overlay, UiNode};
use crate::path::Path;
use crate::render::{HeadlessBackend, RenderNode, Renderers};
use crate::schema::resolver::from_json_schema_with_depth;
use crate::schema::Schema;
use crate::session::{FormEvent, FormSession, SubmitOutcome};
use crate::validation::{validate, ValidationOutcome};
use crate::value::Value;

/// JSON to print and whether the command succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub body: JsonValue,
    pub success: bool,
}

impl CommandOutput {
    fn ok(body: JsonValue) -> Self {
        Self { body, success: true }
    }
}

pub fn run(command: &Command, settings: &Settings) -> anyhow::Result<CommandOutput> {
    match command {
        Command::Defaults { schema } => {
            let schema = load_schema(schema, settings)?;
            Ok(CommandOutput::ok(form_default_value(&schema)?.to_json()))
        }
        Command::Validate { form } => run_validate(form, settings),
        Command::Render { form } => {
            let session = open_session(&load_form(form, settings)?, settings)?;
            let tree = render(&session)?;
            Ok(CommandOutput::ok(serde_json::to_value(tree)?))
        }
        Command::Apply {
            form,
            add_rows,
            sets,
            unsets,
            remove_rows,
            submit,
        } => {
            let mut session = open_session(&load_form(form, settings)?, settings)?;
            apply_edits(&mut session, add_rows, sets, unsets, remove_rows)?;

            if *submit {
                return Ok(match session.submit() {
                    SubmitOutcome::Submitted(value) => CommandOutput::ok(json!({
                        "submitted": true,
                        "value": value.to_json(),
                    })),
                    SubmitOutcome::Rejected(errors) => CommandOutput {
                        body: json!({"submitted": false, "errors": errors.messages()}),
                        success: false,
                    },
                });
            }

            let snapshot = session.snapshot();
            Ok(CommandOutput::ok(json!({
                "value": snapshot.value.to_json(),
                "errors": snapshot.errors.messages(),
                "visibility": serde_json::to_value(&snapshot.visibility)?,
                "dirty": session.is_dirty(),
            })))
        }
    }
}

struct LoadedForm {
    schema: Schema,
    overlay: UiNode<RenderNode>,
    value: Option<Value>,
}

fn run_validate(form: &FormArgs, settings: &Settings) -> anyhow::Result<CommandOutput> {
    let loaded = load_form(form, settings)?;
    let value = match loaded.value {
        Some(value) => value,
        None => form_default_value(&loaded.schema)?,
    };

    Ok(match validate(&value, &loaded.schema, &loaded.overlay) {
        ValidationOutcome::Valid(parsed) => {
            CommandOutput::ok(json!({"valid": true, "value": parsed.to_json()}))
        }
        ValidationOutcome::Invalid(errors) => {
            info!(fields = errors.len(), "Value is invalid");
            CommandOutput {
                body: json!({"valid": false, "errors": errors.messages()}),
                success: false,
            }
        }
    })
}

fn apply_edits(
    session: &mut FormSession,
    add_rows: &[String],
    sets: &[String],
    unsets: &[String],
    remove_rows: &[String],
) -> anyhow::Result<()> {
    for raw in add_rows {
        session.append_element(&Path::parse(raw)?)?;
    }

    for raw in sets {
        let (raw_path, text) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected PATH=TEXT, got '{}'", raw))?;
        let path = Path::parse(raw_path)?;
        let tree = render(session)?;
        let event = match tree.as_ref().and_then(|t| t.find(&path)) {
            Some(node) => match node.change_handler() {
                Some(handler) => handler.on_input(text),
                None => raw_update(path, text),
            },
            // Hidden or not a form node: write the text as given
            None => raw_update(path, text),
        };
        debug!(event = ?event, "Replaying edit");
        session.dispatch(event);
    }

    for raw in unsets {
        let path = Path::parse(raw)?;
        session.dispatch(Edit::remove(path, ArrayRemoval::SetToUndefined).into());
    }

    for raw in remove_rows {
        let path = Path::parse(raw)?;
        if path.last().and_then(|s| s.as_index()).is_none() {
            bail!("'{}' does not address an array element", path);
        }
        session.dispatch(FormEvent::ArrayRemove(path));
    }

    Ok(())
}

/// JSON when `text` parses as JSON, the plain string otherwise
fn raw_update(path: Path, text: &str) -> FormEvent {
    let json = serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string()));
    Edit::update(path, Value::from_json(&json)).into()
}

fn render(session: &FormSession) -> anyhow::Result<Option<RenderNode>> {
    Ok(session.render(&Renderers::new(HeadlessBackend))?)
}

fn open_session(loaded: &LoadedForm, settings: &Settings) -> anyhow::Result<FormSession> {
    let mut builder = FormSession::builder(loaded.schema.clone())
        .overlay(loaded.overlay.clone())
        .options(settings.form_options());
    if let Some(value) = &loaded.value {
        builder = builder.defaults(value.clone());
    }
    Ok(builder.build()?)
}

fn load_form(args: &FormArgs, settings: &Settings) -> anyhow::Result<LoadedForm> {
    let schema = load_schema(&args.schema, settings)?;
    let overlay = match &args.ui {
        Some(path) => load_overlay(&schema, &read_json(path)?)
            .with_context(|| format!("Failed to load overlay {}", path.display()))?,
        None => UiNode::new(),
    };
    let value = match &args.value {
        Some(path) => Some(Value::from_json(&read_json(path)?)),
        None => None,
    };
    Ok(LoadedForm {
        schema,
        overlay,
        value,
    })
}

fn load_schema(path: &FsPath, settings: &Settings) -> anyhow::Result<Schema> {
    let document = read_json(path)?;
    from_json_schema_with_depth(&document, settings.form.max_schema_depth)
        .with_context(|| format!("Failed to import schema {}", path.display()))
}

fn read_json(path: &FsPath) -> anyhow::Result<JsonValue> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
