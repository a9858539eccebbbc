//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations in one transaction.
//! - Let repositories verify that a connection is fully migrated.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Migration `1` owns progress tables, `2` the achievement catalogue and
//!   unlocks, `3` named per-user metrics, `4` habit schedules and task
//!   details (the `tasks` table is rebuilt to widen its status check).

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "progress",
        sql: include_str!("0001_progress.sql"),
    },
    Migration {
        version: 2,
        name: "achievements",
        sql: include_str!("0002_achievements.sql"),
    },
    Migration {
        version: 3,
        name: "user_metrics",
        sql: include_str!("0003_user_metrics.sql"),
    },
    Migration {
        version: 4,
        name: "schedules_and_task_details",
        sql: include_str!("0004_schedules_and_task_details.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads `PRAGMA user_version` from the connection.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database was written by a newer
///   binary.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = schema_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, schema_version, MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn task_rebuild_keeps_rows_written_before_version_4() {
        let mut conn = Connection::open_in_memory().unwrap();
        for migration in MIGRATIONS.iter().filter(|migration| migration.version <= 3) {
            conn.execute_batch(migration.sql).unwrap();
        }
        conn.execute_batch(
            "PRAGMA user_version = 3;
             INSERT INTO users (uuid, display_name) VALUES ('u', 'ana');
             INSERT INTO habits (uuid, user_uuid, title, frequency, priority, created_at)
             VALUES ('h', 'u', 'Run', 'daily', 'medium', 1709251200000);
             INSERT INTO tasks (uuid, user_uuid, title, size, status, completed_at)
             VALUES ('t', 'u', 'Ship', 'large', 'completed', 42);",
        )
        .unwrap();

        apply_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 4);

        let (status, completed_at): (String, i64) = conn
            .query_row(
                "SELECT status, completed_at FROM tasks WHERE uuid = 't';",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(status, "completed");
        assert_eq!(completed_at, 42);

        let (start_date, custom_days): (String, String) = conn
            .query_row(
                "SELECT start_date, custom_days FROM habits WHERE uuid = 'h';",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(start_date, "2024-03-01");
        assert_eq!(custom_days, "[]");

        conn.execute(
            "UPDATE tasks SET status = 'cancelled' WHERE uuid = 't';",
            [],
        )
        .unwrap();
    }
}
