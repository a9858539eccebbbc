//! SQLite store handle and transaction scope.
//!
//! # Responsibility
//! - Bind every store contract to one explicitly passed connection.
//! - Run multi-record updates atomically.
//!
//! # Invariants
//! - `SqliteStore` is only constructed over a fully migrated connection.
//! - `in_transaction` commits on `Ok` and rolls back on `Err` or panic.
//! - A scope opened while another is active joins the outer one, so the
//!   outermost caller decides commit or rollback.

use crate::db::ensure_migrated;
use crate::repo::{
    AchievementCatalog, HabitRepository, MetricRepository, RepoError, RepoResult,
    TaskRepository, UnlockRepository, UserRepository,
};
use rusqlite::{Connection, Transaction, TransactionBehavior};

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("users", &["uuid", "level", "experience", "starting_weight", "current_weight"]),
    (
        "habits",
        &["uuid", "user_uuid", "streak", "completed_today", "custom_days", "start_date"],
    ),
    ("habit_completions", &["habit_uuid", "seq", "day", "completed"]),
    ("tasks", &["uuid", "user_uuid", "size", "status", "due_date", "completed_at"]),
    ("task_tags", &["task_uuid", "position", "tag"]),
    ("achievements", &["id", "kind", "metric", "required_value", "experience_reward"]),
    ("achievement_unlocks", &["user_uuid", "achievement_id", "earned_at", "progress"]),
    ("user_metrics", &["user_uuid", "name", "value"]),
];

/// Runs a closure as one atomic unit of persistence work.
pub trait TransactionScope {
    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>;
}

/// Everything the engine service needs from storage.
pub trait EngineStore:
    UserRepository
    + HabitRepository
    + TaskRepository
    + AchievementCatalog
    + UnlockRepository
    + MetricRepository
    + TransactionScope
{
}

impl<S> EngineStore for S where
    S: UserRepository
        + HabitRepository
        + TaskRepository
        + AchievementCatalog
        + UnlockRepository
        + MetricRepository
        + TransactionScope
{
}

/// SQLite-backed implementation of every store contract.
pub struct SqliteStore<'conn> {
    pub(crate) conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a connection returned by `open_db*`.
    ///
    /// # Errors
    /// - `Db(UninitializedConnection)` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema was
    ///   altered behind the migration runner's back.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }
}

impl TransactionScope for SqliteStore<'_> {
    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>,
    {
        if !self.conn.is_autocommit() {
            return work();
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| E::from(RepoError::from(err)))?;
        let value = work()?;
        tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
        Ok(value)
    }
}

fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    for (table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(*table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: *table,
                    column: *column,
                });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
