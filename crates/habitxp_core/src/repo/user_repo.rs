//! User progress persistence.

use crate::model::user::{UserId, UserProgress};
use crate::repo::{parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    display_name,
    level,
    experience,
    starting_weight,
    current_weight,
    created_at,
    updated_at
FROM users";

pub trait UserRepository {
    fn create_user(&self, user: &UserProgress) -> RepoResult<UserId>;
    fn find_user(&self, id: UserId) -> RepoResult<Option<UserProgress>>;
    /// Persists level, experience and weights in one statement.
    fn save_user(&self, user: &UserProgress) -> RepoResult<()>;
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, user: &UserProgress) -> RepoResult<UserId> {
        user.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (
                    uuid,
                    display_name,
                    level,
                    experience,
                    starting_weight,
                    current_weight
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    user.uuid.to_string(),
                    user.display_name.as_str(),
                    user.level,
                    user.experience,
                    user.starting_weight,
                    user.current_weight,
                ],
            )
            .map_err(|err| RepoError::from_insert(err, "user", user.uuid))?;

        Ok(user.uuid)
    }

    fn find_user(&self, id: UserId) -> RepoResult<Option<UserProgress>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(read_user_row(row)))
            .optional()?;
        row.transpose()
    }

    fn save_user(&self, user: &UserProgress) -> RepoResult<()> {
        user.validate()?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                display_name = ?1,
                level = ?2,
                experience = ?3,
                starting_weight = ?4,
                current_weight = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                user.display_name.as_str(),
                user.level,
                user.experience,
                user.starting_weight,
                user.current_weight,
                user.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found("user", user.uuid));
        }
        Ok(())
    }
}

fn read_user_row(row: &Row<'_>) -> RepoResult<UserProgress> {
    let uuid_text: String = row.get("uuid")?;
    let user = UserProgress {
        uuid: parse_uuid(&uuid_text, "users.uuid")?,
        display_name: row.get("display_name")?,
        level: row.get("level")?,
        experience: row.get("experience")?,
        starting_weight: row.get("starting_weight")?,
        current_weight: row.get("current_weight")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    user.validate()?;
    Ok(user)
}
