//! Engine-level error taxonomy.

use crate::model::{CompletionError, ValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error returned by every engine operation.
#[derive(Debug)]
pub enum EngineError {
    /// Habit or task was already completed; user-correctable.
    DuplicateCompletion(CompletionError),
    /// Referenced habit, user, task or achievement does not exist.
    NotFound { entity: &'static str, id: String },
    /// Stored state contradicts an engine invariant, e.g. level/XP drift.
    InvariantViolation(String),
    /// Caller supplied a value the engine cannot accept.
    InvalidInput(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl EngineError {
    /// HTTP-equivalent status class for request handlers.
    pub fn status_class(&self) -> u16 {
        match self {
            Self::DuplicateCompletion(_) => 409,
            Self::NotFound { .. } => 404,
            Self::InvalidInput(_) => 400,
            Self::InvariantViolation(_) | Self::Repo(_) => 500,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCompletion(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvariantViolation(details) => write!(f, "invariant violated: {details}"),
            Self::InvalidInput(details) => write!(f, "invalid input: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateCompletion(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<CompletionError> for EngineError {
    fn from(value: CompletionError) -> Self {
        match value {
            CompletionError::HabitAlreadyCompleted { .. } | CompletionError::TaskAlreadyCompleted => {
                Self::DuplicateCompletion(value)
            }
            CompletionError::OutOfOrder { .. } | CompletionError::TaskCancelled => {
                Self::InvalidInput(value.to_string())
            }
        }
    }
}
