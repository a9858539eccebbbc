use habitxp_core::db::migrations::latest_version;
use habitxp_core::db::{open_db, open_db_from_config, open_db_in_memory, DbError};
use habitxp_core::repo::{RepoError, SqliteStore};
use habitxp_core::EngineConfig;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "users",
        "habits",
        "habit_completions",
        "tasks",
        "achievements",
        "achievement_unlocks",
        "user_metrics",
        "task_tags",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitxp.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "habits");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn config_memory_path_opens_in_memory_database() {
    let config = EngineConfig::from_json_str(r#"{"db_path": ":memory:"}"#).unwrap();
    let conn = open_db_from_config(&config).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteStore::try_new(&conn).err().unwrap();
    match err {
        RepoError::Db(DbError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_rejects_schema_missing_a_required_column() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("ALTER TABLE user_metrics DROP COLUMN updated_at;")
        .unwrap();
    // updated_at is not required; dropping an unrelated column keeps the
    // store usable.
    assert!(SqliteStore::try_new(&conn).is_ok());

    conn.execute_batch("DROP TABLE user_metrics;").unwrap();
    let err = SqliteStore::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("user_metrics")));
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO habits (uuid, user_uuid, title, frequency, priority)
             VALUES ('h', 'missing-user', 'Run', 'daily', 'medium');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
