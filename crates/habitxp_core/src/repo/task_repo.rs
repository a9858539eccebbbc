//! Task persistence.
//!
//! # Invariants
//! - Task row and tag rows are written in one transaction.
//! - Tags are replaced wholesale on save and read back in insertion order.

use crate::model::task::{Task, TaskId, TaskSize, TaskStatus};
use crate::model::user::UserId;
use crate::repo::{
    parse_day, parse_uuid, RepoError, RepoResult, SqliteStore, TransactionScope, DAY_FORMAT,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    description,
    size,
    status,
    due_date,
    completed_at,
    created_at,
    updated_at
FROM tasks";

pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn find_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn save_task(&self, task: &Task) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Lists a user's tasks, optionally filtered by status, newest first.
    fn list_tasks(&self, user_id: UserId, status: Option<TaskStatus>) -> RepoResult<Vec<Task>>;
    fn count_completed_tasks(&self, user_id: UserId) -> RepoResult<u64>;
}

impl TaskRepository for SqliteStore<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.in_transaction(|| {
            self.conn
                .execute(
                    "INSERT INTO tasks (
                        uuid,
                        user_uuid,
                        title,
                        description,
                        size,
                        status,
                        due_date,
                        completed_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                    params![
                        task.uuid.to_string(),
                        task.user_id.to_string(),
                        task.title.as_str(),
                        task.description.as_deref(),
                        task.size.as_str(),
                        task.status.as_str(),
                        format_due_date(task),
                        task.completed_at,
                    ],
                )
                .map_err(|err| RepoError::from_insert(err, "task", task.uuid))?;
            write_tags(self.conn, task)?;
            Ok(task.uuid)
        })
    }

    fn find_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let task = stmt
            .query_row([id.to_string()], |row| Ok(read_task_row(row)))
            .optional()?
            .transpose()?;

        match task {
            Some(mut task) => {
                task.tags = load_tags(self.conn, task.uuid)?;
                task.validate()?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    fn save_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        self.in_transaction(|| {
            let changed = self.conn.execute(
                "UPDATE tasks
                 SET
                    title = ?1,
                    description = ?2,
                    size = ?3,
                    status = ?4,
                    due_date = ?5,
                    completed_at = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?7;",
                params![
                    task.title.as_str(),
                    task.description.as_deref(),
                    task.size.as_str(),
                    task.status.as_str(),
                    format_due_date(task),
                    task.completed_at,
                    task.uuid.to_string(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found("task", task.uuid));
            }

            self.conn.execute(
                "DELETE FROM task_tags WHERE task_uuid = ?1;",
                [task.uuid.to_string()],
            )?;
            write_tags(self.conn, task)
        })
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("task", id));
        }
        Ok(())
    }

    fn list_tasks(&self, user_id: UserId, status: Option<TaskStatus>) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE user_uuid = ?1
               AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            status.map(TaskStatus::as_str)
        ])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let mut task = read_task_row(row)?;
            task.tags = load_tags(self.conn, task.uuid)?;
            task.validate()?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    fn count_completed_tasks(&self, user_id: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE user_uuid = ?1 AND status = 'completed';",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn read_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;

    let size_text: String = row.get("size")?;
    let size = TaskSize::parse(&size_text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid size `{size_text}` in tasks.size")))?;
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in tasks.status"))
    })?;
    let due_date = row
        .get::<_, Option<String>>("due_date")?
        .map(|text| parse_day(&text, "tasks.due_date"))
        .transpose()?;

    Ok(Task {
        uuid: parse_uuid(&uuid_text, "tasks.uuid")?,
        user_id: parse_uuid(&user_text, "tasks.user_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        size,
        status,
        due_date,
        tags: Vec::new(),
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn format_due_date(task: &Task) -> Option<String> {
    task.due_date.map(|day| day.format(DAY_FORMAT).to_string())
}

fn load_tags(conn: &Connection, task_id: TaskId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM task_tags
         WHERE task_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let tags = stmt
        .query_map([task_id.to_string()], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tags)
}

fn write_tags(conn: &Connection, task: &Task) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO task_tags (task_uuid, position, tag)
         VALUES (?1, ?2, ?3);",
    )?;
    let task_uuid = task.uuid.to_string();
    for (position, tag) in task.tags.iter().enumerate() {
        stmt.execute(params![
            task_uuid.as_str(),
            i64::try_from(position).unwrap_or(i64::MAX),
            tag.as_str(),
        ])
        .map_err(|err| RepoError::from_insert(err, "task tag", tag))?;
    }
    Ok(())
}
