//! Error taxonomy. Nothing in this crate is fatal: failures either reject an
//! operator input before the store is touched or degrade to a stale display.

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Errors surfaced to the operator by console-level operations.
///
/// Store transitions themselves never fail; these errors come from the layer
/// above, where a gesture cannot be translated into transitions at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Invalid input provided by the operator.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed with the current state and selections.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Blocking error raised when a question bank or game setup fails
/// validation. The store is never mutated with partial data: either every
/// item commits or none does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The document violated one or more constraints; all of them are listed.
    #[error("invalid game data: {}", problems.join("; "))]
    Invalid {
        /// Every violation found, one message each.
        problems: Vec<String>,
    },
}

impl LoadError {
    /// Collect a set of violation messages into a single error.
    pub fn from_problems(problems: Vec<String>) -> Self {
        Self::Invalid { problems }
    }

    /// The individual violation messages.
    pub fn problems(&self) -> &[String] {
        match self {
            Self::Invalid { problems } => problems,
        }
    }
}

impl From<ValidationErrors> for LoadError {
    fn from(errors: ValidationErrors) -> Self {
        let mut problems = Vec::new();
        collect_problems(None, &errors, &mut problems);
        problems.sort();
        Self::Invalid { problems }
    }
}

/// Flatten nested validation errors into `path: message` lines.
fn collect_problems(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let detail = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(format!("{path}: {detail}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_problems(Some(&path), nested, out),
            ValidationErrorsKind::List(map) => {
                for (index, nested) in map {
                    collect_problems(Some(&format!("{path}[{index}]")), nested, out);
                }
            }
        }
    }
}
