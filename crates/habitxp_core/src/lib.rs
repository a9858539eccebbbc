//! Core domain logic for the habit gamification engine.
//! This crate is the single source of truth for XP, level and achievement
//! invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod gamification;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use db::{open_db, open_db_from_config, open_db_in_memory, DbError, DbResult};
pub use gamification::{
    base_xp, experience_for_level, habit_completion_xp, level_for_experience, level_progress,
    streak_bonus, task_xp, LevelProgress,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::achievement::{
    default_catalogue, Achievement, AchievementId, AchievementKind, AchievementUnlock,
    ProgressTrigger,
};
pub use model::habit::{
    CompletionRecord, Habit, HabitCategory, HabitFrequency, HabitId, HabitPriority,
};
pub use model::task::{Task, TaskId, TaskSize, TaskStatus};
pub use model::user::{UserId, UserProgress};
pub use model::{CompletionError, ValidationError};
pub use repo::{EngineStore, RepoError, RepoResult, SqliteStore, TransactionScope};
pub use service::{
    CreatedHabit, EngineError, EngineResult, ExperienceUpdate, GamificationService,
    HabitCompletionOutcome, HabitDraft, Reconciliation, TaskCompletionOutcome, TaskDraft,
    UserStats,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
