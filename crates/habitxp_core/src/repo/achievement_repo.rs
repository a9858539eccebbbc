//! Achievement catalogue and per-user unlock persistence.
//!
//! # Invariants
//! - Catalogue entries are validated before insert and after read.
//! - At most one unlock exists per `(user, achievement)`; a second insert
//!   surfaces as `RepoError::Conflict`.

use crate::model::achievement::{Achievement, AchievementId, AchievementKind, AchievementUnlock};
use crate::model::user::UserId;
use crate::repo::{parse_uuid, RepoError, RepoResult, SqliteStore, TransactionScope};
use log::info;
use rusqlite::{params, OptionalExtension, Row};

const ACHIEVEMENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    kind,
    metric,
    required_value,
    experience_reward
FROM achievements";

pub trait AchievementCatalog {
    /// All rules, ordered by kind then threshold.
    fn list_achievements(&self) -> RepoResult<Vec<Achievement>>;
    fn find_achievement(&self, id: &str) -> RepoResult<Option<Achievement>>;
    /// Inserts `entries` when the catalogue is empty.
    ///
    /// Returns the number of inserted rows; `0` means the catalogue was
    /// already populated and nothing changed.
    fn seed_achievements(&self, entries: &[Achievement]) -> RepoResult<usize>;
}

pub trait UnlockRepository {
    fn unlock_exists(&self, user_id: UserId, achievement_id: &str) -> RepoResult<bool>;
    fn create_unlock(&self, unlock: &AchievementUnlock) -> RepoResult<()>;
    /// A user's unlocks in the order they were earned.
    fn list_unlocks(&self, user_id: UserId) -> RepoResult<Vec<AchievementUnlock>>;
}

impl AchievementCatalog for SqliteStore<'_> {
    fn list_achievements(&self) -> RepoResult<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACHIEVEMENT_SELECT_SQL} ORDER BY kind ASC, required_value ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut achievements = Vec::new();
        while let Some(row) = rows.next()? {
            achievements.push(read_achievement_row(row)?);
        }
        Ok(achievements)
    }

    fn find_achievement(&self, id: &str) -> RepoResult<Option<Achievement>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACHIEVEMENT_SELECT_SQL} WHERE id = ?1;"))?;
        stmt.query_row([id], |row| Ok(read_achievement_row(row)))
            .optional()?
            .transpose()
    }

    fn seed_achievements(&self, entries: &[Achievement]) -> RepoResult<usize> {
        for entry in entries {
            entry.validate()?;
        }

        self.in_transaction(|| {
            let existing: i64 =
                self.conn
                    .query_row("SELECT COUNT(*) FROM achievements;", [], |row| row.get(0))?;
            if existing > 0 {
                info!(
                    "event=catalogue_seed module=repo status=skipped existing={existing}"
                );
                return Ok(0);
            }

            let mut stmt = self.conn.prepare(
                "INSERT INTO achievements (
                    id,
                    title,
                    description,
                    kind,
                    metric,
                    required_value,
                    experience_reward
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.id.as_str(),
                    entry.title.as_str(),
                    entry.description.as_str(),
                    entry.kind.as_str(),
                    entry.metric.as_deref(),
                    entry.required_value,
                    entry.experience_reward,
                ])
                .map_err(|err| RepoError::from_insert(err, "achievement", &entry.id))?;
            }

            info!(
                "event=catalogue_seed module=repo status=ok inserted={}",
                entries.len()
            );
            Ok(entries.len())
        })
    }
}

impl UnlockRepository for SqliteStore<'_> {
    fn unlock_exists(&self, user_id: UserId, achievement_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM achievement_unlocks
                WHERE user_uuid = ?1 AND achievement_id = ?2
            );",
            params![user_id.to_string(), achievement_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_unlock(&self, unlock: &AchievementUnlock) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO achievement_unlocks (
                    user_uuid,
                    achievement_id,
                    earned_at,
                    progress
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    unlock.user_id.to_string(),
                    unlock.achievement_id.as_str(),
                    unlock.earned_at,
                    unlock.progress,
                ],
            )
            .map_err(|err| {
                RepoError::from_insert(
                    err,
                    "achievement unlock",
                    format!("{}/{}", unlock.user_id, unlock.achievement_id),
                )
            })?;
        Ok(())
    }

    fn list_unlocks(&self, user_id: UserId) -> RepoResult<Vec<AchievementUnlock>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_uuid, achievement_id, earned_at, progress
             FROM achievement_unlocks
             WHERE user_uuid = ?1
             ORDER BY earned_at ASC, achievement_id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut unlocks = Vec::new();
        while let Some(row) = rows.next()? {
            let user_text: String = row.get("user_uuid")?;
            unlocks.push(AchievementUnlock {
                user_id: parse_uuid(&user_text, "achievement_unlocks.user_uuid")?,
                achievement_id: row.get::<_, AchievementId>("achievement_id")?,
                earned_at: row.get("earned_at")?,
                progress: row.get("progress")?,
            });
        }
        Ok(unlocks)
    }
}

fn read_achievement_row(row: &Row<'_>) -> RepoResult<Achievement> {
    let kind_text: String = row.get("kind")?;
    let kind = AchievementKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in achievements.kind"))
    })?;

    let achievement = Achievement {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        kind,
        metric: row.get("metric")?,
        required_value: row.get("required_value")?,
        experience_reward: row.get("experience_reward")?,
    };
    achievement.validate()?;
    Ok(achievement)
}
