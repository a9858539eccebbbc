//! Habit persistence with append-only completion history.
//!
//! # Invariants
//! - `habit_completions` rows are only ever inserted; `save_habit` appends
//!   the in-memory tail beyond what is stored.
//! - A save whose history is shorter than, or diverges from, the stored
//!   prefix is rejected as `InvalidData`.
//! - Habit row update and history append happen in one transaction.

use crate::model::habit::{
    CompletionRecord, Habit, HabitCategory, HabitFrequency, HabitId, HabitPriority,
};
use crate::model::user::UserId;
use crate::repo::{
    bool_to_int, int_to_bool, parse_day, parse_uuid, RepoError, RepoResult, SqliteStore,
    TransactionScope, DAY_FORMAT,
};
use chrono::{NaiveDate, NaiveTime, Weekday};
use rusqlite::{params, Connection, OptionalExtension, Row};

const HABIT_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    description,
    frequency,
    custom_days,
    priority,
    category,
    start_date,
    target_end_date,
    reminder_time,
    streak,
    completed_today,
    created_at,
    updated_at
FROM habits";

const REMINDER_FORMAT: &str = "%H:%M";

pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    fn find_habit(&self, id: HabitId) -> RepoResult<Option<Habit>>;
    /// Updates habit state and appends new history entries.
    fn save_habit(&self, habit: &Habit) -> RepoResult<()>;
    fn delete_habit(&self, id: HabitId) -> RepoResult<()>;
    /// Lists a user's habits, newest first.
    fn list_habits(&self, user_id: UserId) -> RepoResult<Vec<Habit>>;
    fn count_habits(&self, user_id: UserId) -> RepoResult<u64>;
}

impl HabitRepository for SqliteStore<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        self.in_transaction(|| {
            self.conn
                .execute(
                    "INSERT INTO habits (
                        uuid,
                        user_uuid,
                        title,
                        description,
                        frequency,
                        custom_days,
                        priority,
                        category,
                        start_date,
                        target_end_date,
                        reminder_time,
                        streak,
                        completed_today
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
                    params![
                        habit.uuid.to_string(),
                        habit.user_id.to_string(),
                        habit.title.as_str(),
                        habit.description.as_deref(),
                        habit.frequency.as_str(),
                        encode_custom_days(&habit.custom_days)?,
                        habit.priority.as_str(),
                        habit.category.as_str(),
                        format_day(habit.start_date),
                        format_day(habit.target_end_date),
                        format_reminder(habit.reminder_time),
                        habit.streak,
                        bool_to_int(habit.completed_today),
                    ],
                )
                .map_err(|err| RepoError::from_insert(err, "habit", habit.uuid))?;
            append_history(self.conn, habit, 0)?;
            Ok(habit.uuid)
        })
    }

    fn find_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let habit = stmt
            .query_row([id.to_string()], |row| Ok(read_habit_row(row)))
            .optional()?
            .transpose()?;

        match habit {
            Some(mut habit) => {
                habit.completion_history = load_history(self.conn, habit.uuid)?;
                habit.validate()?;
                Ok(Some(habit))
            }
            None => Ok(None),
        }
    }

    fn save_habit(&self, habit: &Habit) -> RepoResult<()> {
        habit.validate()?;

        self.in_transaction(|| {
            let changed = self.conn.execute(
                "UPDATE habits
                 SET
                    title = ?1,
                    description = ?2,
                    frequency = ?3,
                    custom_days = ?4,
                    priority = ?5,
                    category = ?6,
                    start_date = ?7,
                    target_end_date = ?8,
                    reminder_time = ?9,
                    streak = ?10,
                    completed_today = ?11,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?12;",
                params![
                    habit.title.as_str(),
                    habit.description.as_deref(),
                    habit.frequency.as_str(),
                    encode_custom_days(&habit.custom_days)?,
                    habit.priority.as_str(),
                    habit.category.as_str(),
                    format_day(habit.start_date),
                    format_day(habit.target_end_date),
                    format_reminder(habit.reminder_time),
                    habit.streak,
                    bool_to_int(habit.completed_today),
                    habit.uuid.to_string(),
                ],
            )
            .map_err(|err| RepoError::from_insert(err, "habit", habit.uuid))?;
            if changed == 0 {
                return Err(RepoError::not_found("habit", habit.uuid));
            }

            let stored = load_history(self.conn, habit.uuid)?;
            if stored.len() > habit.completion_history.len()
                || habit.completion_history[..stored.len()] != stored[..]
            {
                return Err(RepoError::InvalidData(format!(
                    "completion history of habit {} is append-only",
                    habit.uuid
                )));
            }
            append_history(self.conn, habit, stored.len())
        })
    }

    fn delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("habit", id));
        }
        Ok(())
    }

    fn list_habits(&self, user_id: UserId) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE user_uuid = ?1
             ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            let mut habit = read_habit_row(row)?;
            habit.completion_history = load_history(self.conn, habit.uuid)?;
            habit.validate()?;
            habits.push(habit);
        }
        Ok(habits)
    }

    fn count_habits(&self, user_id: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE user_uuid = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn read_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;

    let frequency_text: String = row.get("frequency")?;
    let frequency = HabitFrequency::parse(&frequency_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid frequency `{frequency_text}` in habits.frequency"))
    })?;
    let priority_text: String = row.get("priority")?;
    let priority = HabitPriority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}` in habits.priority"))
    })?;
    let category_text: String = row.get("category")?;
    let category = HabitCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid category `{category_text}` in habits.category"))
    })?;

    let custom_days_text: String = row.get("custom_days")?;
    let reminder_time = row
        .get::<_, Option<String>>("reminder_time")?
        .map(|text| {
            NaiveTime::parse_from_str(&text, REMINDER_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!("invalid time `{text}` in habits.reminder_time"))
            })
        })
        .transpose()?;

    Ok(Habit {
        uuid: parse_uuid(&uuid_text, "habits.uuid")?,
        user_id: parse_uuid(&user_text, "habits.user_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        frequency,
        custom_days: decode_custom_days(&custom_days_text)?,
        priority,
        category,
        start_date: read_optional_day(row, "start_date")?,
        target_end_date: read_optional_day(row, "target_end_date")?,
        reminder_time,
        streak: row.get("streak")?,
        completed_today: int_to_bool(row.get("completed_today")?, "habits.completed_today")?,
        completion_history: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_history(conn: &Connection, habit_id: HabitId) -> RepoResult<Vec<CompletionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT day, completed
         FROM habit_completions
         WHERE habit_uuid = ?1
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([habit_id.to_string()])?;
    let mut history = Vec::new();
    while let Some(row) = rows.next()? {
        let day_text: String = row.get("day")?;
        history.push(CompletionRecord {
            date: parse_day(&day_text, "habit_completions.day")?,
            completed: int_to_bool(row.get("completed")?, "habit_completions.completed")?,
        });
    }
    Ok(history)
}

fn append_history(conn: &Connection, habit: &Habit, from: usize) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO habit_completions (habit_uuid, seq, day, completed)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    let habit_uuid = habit.uuid.to_string();
    for (seq, entry) in habit.completion_history.iter().enumerate().skip(from) {
        stmt.execute(params![
            habit_uuid.as_str(),
            i64::try_from(seq).unwrap_or(i64::MAX),
            entry.date.format(DAY_FORMAT).to_string(),
            bool_to_int(entry.completed),
        ])
        .map_err(|err| RepoError::from_insert(err, "habit completion", entry.date))?;
    }
    Ok(())
}

fn read_optional_day(row: &Row<'_>, column: &'static str) -> RepoResult<Option<NaiveDate>> {
    row.get::<_, Option<String>>(column)?
        .map(|text| parse_day(&text, column))
        .transpose()
}

fn format_day(day: Option<NaiveDate>) -> Option<String> {
    day.map(|day| day.format(DAY_FORMAT).to_string())
}

fn format_reminder(time: Option<NaiveTime>) -> Option<String> {
    time.map(|time| time.format(REMINDER_FORMAT).to_string())
}

/// Weekdays are stored as a JSON array of `0..=6`, Sunday first.
fn encode_custom_days(days: &[Weekday]) -> RepoResult<String> {
    let numbers: Vec<u32> = days.iter().map(Weekday::num_days_from_sunday).collect();
    serde_json::to_string(&numbers)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode custom days: {err}")))
}

fn decode_custom_days(text: &str) -> RepoResult<Vec<Weekday>> {
    let invalid = || RepoError::InvalidData(format!("invalid days `{text}` in habits.custom_days"));
    let numbers: Vec<u32> = serde_json::from_str(text).map_err(|_| invalid())?;
    numbers
        .into_iter()
        .map(|number| match number {
            0 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            _ => Err(invalid()),
        })
        .collect()
}
