//! Named per-user counters consumed by `Special` achievements.

use crate::model::achievement::validate_metric_name;
use crate::model::user::UserId;
use crate::model::ValidationError;
use crate::repo::{RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension};

pub trait MetricRepository {
    fn get_metric(&self, user_id: UserId, name: &str) -> RepoResult<Option<f64>>;
    /// Inserts or replaces the value of `name` for `user_id`.
    fn set_metric(&self, user_id: UserId, name: &str, value: f64) -> RepoResult<()>;
    /// All metrics of a user, sorted by name.
    fn list_metrics(&self, user_id: UserId) -> RepoResult<Vec<(String, f64)>>;
}

impl MetricRepository for SqliteStore<'_> {
    fn get_metric(&self, user_id: UserId, name: &str) -> RepoResult<Option<f64>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM user_metrics WHERE user_uuid = ?1 AND name = ?2;",
                params![user_id.to_string(), name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_metric(&self, user_id: UserId, name: &str, value: f64) -> RepoResult<()> {
        validate_metric_name(name)?;
        if !value.is_finite() {
            return Err(ValidationError::InvalidMetricValue(value).into());
        }

        self.conn.execute(
            "INSERT INTO user_metrics (user_uuid, name, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_uuid, name) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![user_id.to_string(), name, value],
        )?;
        Ok(())
    }

    fn list_metrics(&self, user_id: UserId) -> RepoResult<Vec<(String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, value
             FROM user_metrics
             WHERE user_uuid = ?1
             ORDER BY name ASC;",
        )?;
        let metrics = stmt
            .query_map([user_id.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(metrics)
    }
}
