//! Validation of the visible part of a form
//!
//! Hidden subtrees are treated as absent while the value is parsed, so a
//! field the user cannot see never blocks submission and never reaches the
//! submitted value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::overlay::UiNode;
use crate::path::Path;
use crate::schema::parse::parse_visible;
use crate::schema::Schema;
use crate::value::Value;
use crate::visibility::{resolve_visibility, VisibilityMap};

pub use crate::schema::parse::{Issue, IssueCode};

/// Issues grouped by the path they are reported at
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<Path, Vec<Issue>>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let mut map = Self::new();
        for issue in issues {
            map.push(issue);
        }
        map
    }

    pub fn push(&mut self, issue: Issue) {
        self.0.entry(issue.path.clone()).or_default().push(issue);
    }

    pub fn get(&self, path: &Path) -> Option<&[Issue]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Message of the first issue at exactly `path`
    pub fn first_message(&self, path: &Path) -> Option<&str> {
        self.get(path)
            .and_then(|issues| issues.first())
            .map(|issue| issue.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[Issue])> {
        self.0.iter().map(|(path, issues)| (path, issues.as_slice()))
    }

    /// Messages only, keyed by serialized path
    pub fn messages(&self) -> BTreeMap<String, Vec<String>> {
        self.0
            .iter()
            .map(|(path, issues)| {
                (
                    path.to_string(),
                    issues.iter().map(|i| i.message.clone()).collect(),
                )
            })
            .collect()
    }
}

/// Result of validating a form value
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationOutcome {
    /// Normalized output of the pruned value
    Valid(Value),
    Invalid(ErrorMap),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    /// Errors to display; empty when valid
    pub fn into_errors(self) -> ErrorMap {
        match self {
            ValidationOutcome::Valid(_) => ErrorMap::new(),
            ValidationOutcome::Invalid(errors) => errors,
        }
    }
}

/// Validate `value` against `schema`, ignoring whatever `overlay` hides
pub fn validate<V>(value: &Value, schema: &Schema, overlay: &UiNode<V>) -> ValidationOutcome {
    let visibility = resolve_visibility(overlay, value);
    validate_with(value, schema, &visibility)
}

/// Validate with an already resolved visibility map
///
/// Hidden nodes are parsed as absent, so they are never required and never
/// reach the output; refinements and defaults still apply to the rest of the
/// tree. Issues a refinement reports at or beneath a hidden path are dropped.
pub fn validate_with(value: &Value, schema: &Schema, visibility: &VisibilityMap) -> ValidationOutcome {
    let hidden: Vec<&Path> = visibility.hidden().collect();
    let (parsed, issues) = parse_visible(schema, value, &hidden);

    let total = issues.len();
    let errors = ErrorMap::from_issues(
        issues
            .into_iter()
            .filter(|issue| !hidden.iter().any(|h| issue.path.starts_with(h))),
    );

    if errors.is_empty() {
        ValidationOutcome::Valid(parsed)
    } else {
        debug!(issues = total, reported = errors.len(), "Validation failed");
        ValidationOutcome::Invalid(errors)
    }
}
