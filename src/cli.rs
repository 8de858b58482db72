use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::session::ValidationMode;

/// Schema-driven forms from the command line
#[derive(Parser, Debug, Clone)]
#[command(name = "schemaform", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SCHEMAFORM_CONFIG", default_value = "schemaform.toml")]
    pub config: PathBuf,

    /// Log level or tracing filter directive
    #[arg(long, env = "SCHEMAFORM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// When the session re-validates on its own
    #[arg(long, value_enum)]
    pub validation_mode: Option<ValidationMode>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the default value a schema produces
    Defaults {
        /// JSON Schema file
        #[arg(short, long)]
        schema: PathBuf,
    },
    /// Validate a value, ignoring fields the overlay hides
    Validate {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Print the rendered form tree
    Render {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Replay edits through a form session
    Apply {
        #[command(flatten)]
        form: FormArgs,

        /// Append a default element to the array at PATH
        #[arg(long = "add-row", value_name = "PATH")]
        add_rows: Vec<String>,

        /// Type TEXT into the field at PATH, as a user would
        #[arg(long = "set", value_name = "PATH=TEXT")]
        sets: Vec<String>,

        /// Unset the node at PATH
        #[arg(long = "unset", value_name = "PATH")]
        unsets: Vec<String>,

        /// Delete the array element at PATH
        #[arg(long = "remove-row", value_name = "PATH")]
        remove_rows: Vec<String>,

        /// Submit after applying the edits
        #[arg(long)]
        submit: bool,
    },
}

/// Files describing one form
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// JSON Schema file
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Overlay (presentation) file
    #[arg(short, long)]
    pub ui: Option<PathBuf>,

    /// Value file; the schema defaults are used when omitted
    #[arg(short, long)]
    pub value: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["schemaform", "defaults", "--schema", "form.json"]);
        assert_eq!(cli.config, PathBuf::from("schemaform.toml"));
        assert!(cli.log_level.is_none());
        assert!(cli.validation_mode.is_none());
        assert!(!cli.compact);
        assert!(matches!(cli.command, Command::Defaults { ref schema } if schema == &PathBuf::from("form.json")));
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "schemaform",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "--validation-mode",
            "on-change-after-submit",
            "--compact",
            "apply",
            "--schema",
            "form.json",
            "--ui",
            "ui.json",
            "--set",
            "name=Ada",
            "--set",
            "age=18",
            "--remove-row",
            "people[0]",
            "--submit",
        ]);

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.validation_mode, Some(ValidationMode::OnChangeAfterSubmit));
        assert!(cli.compact);

        let Command::Apply { form, sets, remove_rows, submit, unsets, .. } = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(form.ui, Some(PathBuf::from("ui.json")));
        assert!(form.value.is_none());
        assert_eq!(sets, vec!["name=Ada", "age=18"]);
        assert_eq!(remove_rows, vec!["people[0]"]);
        assert!(unsets.is_empty());
        assert!(submit);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["schemaform"]).is_err());
    }
}
