//! Error types for the form engine
//!
//! Only structural (programmer) errors live here. Validation problems with user
//! input are data, see [`crate::validation::Issue`].

use thiserror::Error;

/// Errors that terminate a form engine operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A schema node has no kind the form engine recognizes
    #[error("Invalid schema at '{path}': {reason}")]
    InvalidSchema { path: String, reason: String },

    /// Default synthesis reached a schema kind outside the supported set
    #[error("Unsupported schema kind '{kind}' at '{path}'")]
    UnsupportedSchemaKind { kind: String, path: String },

    /// A path lookup expected an index segment after `alias`
    #[error("Missing array index after '{alias}' in path '{path}'")]
    MissingIndex { alias: String, path: String },

    /// A serialized path could not be parsed
    #[error("Invalid path '{input}': {reason}")]
    InvalidPath { input: String, reason: String },

    /// An overlay document does not fit the schema it configures
    #[error("Invalid overlay at '{path}': {reason}")]
    InvalidOverlay { path: String, reason: String },

    /// An overlay referenced a named renderer that was never registered
    #[error("Unknown renderer: {name}")]
    UnknownRenderer { name: String },
}

impl FormError {
    pub(crate) fn invalid_schema(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_overlay(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidOverlay {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(kind: impl Into<String>, path: impl ToString) -> Self {
        Self::UnsupportedSchemaKind {
            kind: kind.into(),
            path: path.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
