//! Store contracts and their SQLite implementation.
//!
//! # Responsibility
//! - Define the read/update contracts the engine consumes.
//! - Keep SQL details behind those contracts so tests can swap stores.
//!
//! # Invariants
//! - Write paths call the record's `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Unique-key collisions surface as `RepoError::Conflict`, never as a
//!   silent overwrite.

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod achievement_repo;
pub mod habit_repo;
pub mod metric_repo;
pub mod store;
pub mod task_repo;
pub mod user_repo;

pub use achievement_repo::{AchievementCatalog, UnlockRepository};
pub use habit_repo::HabitRepository;
pub use metric_repo::MetricRepository;
pub use store::{EngineStore, SqliteStore, TransactionScope};
pub use task_repo::TaskRepository;
pub use user_repo::UserRepository;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: String },
    /// Insert collided with an existing unique key.
    Conflict { entity: &'static str, id: String },
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Maps unique/primary-key violations of a write to `Conflict`, everything
    /// else to `Db`.
    pub(crate) fn from_insert(err: rusqlite::Error, entity: &'static str, id: impl ToString) -> Self {
        if is_unique_violation(&err) {
            Self::Conflict {
                entity,
                id: id.to_string(),
            }
        } else {
            err.into()
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { entity, id } => write!(f, "{entity} already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "store requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "store requires column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || inner.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

pub(crate) const DAY_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_day(value: &str, column: &str) -> RepoResult<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value, DAY_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid day `{value}` in {column}")))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
