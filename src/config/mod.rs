use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod validator;

use crate::cli::Cli;
use crate::schema::resolver::DEFAULT_MAX_DEPTH;
use crate::session::{FormOptions, ValidationMode};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub form: FormSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FormSettings {
    #[serde(default)]
    pub validation_mode: ValidationMode,
    /// Bounds JSON Schema `$ref` resolution and nesting
    #[serde(default = "default_max_schema_depth")]
    pub max_schema_depth: usize,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::default(),
            max_schema_depth: default_max_schema_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Pretty-print JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_schema_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_pretty() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            form: FormSettings::default(),
            output: OutputSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Create settings from CLI arguments (config file, environment, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let settings = Self::load(path)?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .set_default("form.validation_mode", "on_submit")?
            .set_default("form.max_schema_depth", DEFAULT_MAX_DEPTH as i64)?
            .set_default("output.pretty", true)?
            .set_default("log_level", "info")?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("SCHEMAFORM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(mode) = cli.validation_mode {
            self.form.validation_mode = mode;
        }
        if cli.compact {
            self.output.pretty = false;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// Session options implied by these settings
    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            validation_mode: self.form.validation_mode,
        }
    }
}
