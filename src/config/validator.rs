use thiserror::Error;

use crate::config::{FormSettings, Settings};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_form(&settings.form) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_log_level(&settings.log_level) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_form(form: &FormSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if form.max_schema_depth == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "form.max_schema_depth".to_string(),
                reason: "Depth must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_log_level(level: &str) -> Result<(), Vec<ValidationError>> {
        if level.is_empty() {
            return Err(vec![ValidationError::MissingField("log_level".to_string())]);
        }

        // Filter directives such as "schemaform=debug" are passed through
        if level.contains('=') || LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            Err(vec![ValidationError::InvalidValue {
                field: "log_level".to_string(),
                reason: format!("Expected one of {}, got '{}'", LOG_LEVELS.join(", "), level),
            }])
        }
    }
}
