//! Domain model for habits, tasks, user progress and achievements.
//!
//! # Responsibility
//! - Define canonical records used by the engine and repositories.
//! - Own the per-record state transitions (habit/task completion).
//!
//! # Invariants
//! - Every record is identified by a stable UUID, except catalogue
//!   achievements which use stable slugs.
//! - `validate()` is the single gate for structural record invariants;
//!   repositories call it before every write and after every read.

use chrono::{NaiveDate, Weekday};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod achievement;
pub mod habit;
pub mod task;
pub mod user;

pub(crate) const TITLE_MAX_CHARS: usize = 100;
pub(crate) const DESCRIPTION_MAX_CHARS: usize = 500;
pub(crate) const TAG_MAX_CHARS: usize = 32;

/// Structural invariant violation on a domain record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooLong { max: usize, actual: usize },
    DescriptionTooLong { max: usize, actual: usize },
    InvalidSlug { field: &'static str, value: String },
    MissingMetric(String),
    UnexpectedMetric(String),
    NonPositiveThreshold(i64),
    NegativeReward(i64),
    HistoryOutOfOrder { index: usize },
    DuplicateHistoryDay(NaiveDate),
    CompletedFlagWithoutEntry,
    StreakWithoutHistory(u32),
    InvalidWeight(f64),
    InvalidMetricValue(f64),
    NegativeExperience(i64),
    LevelBelowOne(i64),
    CustomDaysWithoutCustomFrequency,
    DuplicateCustomDay(Weekday),
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    InvalidTag(String),
    DuplicateTag(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "title has {actual} chars, max is {max}")
            }
            Self::DescriptionTooLong { max, actual } => {
                write!(f, "description has {actual} chars, max is {max}")
            }
            Self::InvalidSlug { field, value } => write!(f, "invalid {field} `{value}`"),
            Self::MissingMetric(id) => {
                write!(f, "special achievement `{id}` must name a metric")
            }
            Self::UnexpectedMetric(id) => {
                write!(f, "only special achievements carry a metric, got one on `{id}`")
            }
            Self::NonPositiveThreshold(value) => {
                write!(f, "required value must be >= 1, got {value}")
            }
            Self::NegativeReward(value) => {
                write!(f, "experience reward must be >= 0, got {value}")
            }
            Self::HistoryOutOfOrder { index } => {
                write!(f, "completion history is not chronological at entry {index}")
            }
            Self::DuplicateHistoryDay(date) => {
                write!(f, "completion history has more than one entry for {date}")
            }
            Self::CompletedFlagWithoutEntry => write!(
                f,
                "completed_today is set but the latest history entry is not a completion"
            ),
            Self::StreakWithoutHistory(streak) => write!(
                f,
                "streak {streak} exceeds the number of completions in history"
            ),
            Self::InvalidWeight(value) => write!(f, "weight must be a positive number, got {value}"),
            Self::InvalidMetricValue(value) => {
                write!(f, "metric value must be a finite number, got {value}")
            }
            Self::NegativeExperience(value) => write!(f, "experience must be >= 0, got {value}"),
            Self::LevelBelowOne(value) => write!(f, "level must be >= 1, got {value}"),
            Self::CustomDaysWithoutCustomFrequency => {
                write!(f, "custom frequency days require the `custom` frequency")
            }
            Self::DuplicateCustomDay(day) => write!(f, "custom frequency day {day} is listed twice"),
            Self::EndBeforeStart { start, end } => {
                write!(f, "target end date {end} is before start date {start}")
            }
            Self::InvalidTag(tag) => write!(
                f,
                "tag `{tag}` must be 1..={TAG_MAX_CHARS} chars without surrounding whitespace"
            ),
            Self::DuplicateTag(tag) => write!(f, "tag `{tag}` is listed twice"),
        }
    }
}

impl Error for ValidationError {}

/// Rejected completion transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionError {
    /// Habit already has a completion for this calendar day.
    HabitAlreadyCompleted { date: NaiveDate },
    /// Task is already in `completed` state.
    TaskAlreadyCompleted,
    /// Cancelled tasks must be reopened before they can be completed.
    TaskCancelled,
    /// Attempted entry would precede or collide with the latest history day.
    OutOfOrder {
        latest: NaiveDate,
        attempted: NaiveDate,
    },
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HabitAlreadyCompleted { date } => {
                write!(f, "habit already completed on {date}")
            }
            Self::TaskAlreadyCompleted => write!(f, "task already completed"),
            Self::TaskCancelled => write!(f, "task is cancelled"),
            Self::OutOfOrder { latest, attempted } => write!(
                f,
                "history entry for {attempted} would not follow latest entry {latest}"
            ),
        }
    }
}

impl Error for CompletionError {}

pub(crate) fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let actual = title.chars().count();
    if actual > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    if let Some(value) = description {
        let actual = value.chars().count();
        if actual > DESCRIPTION_MAX_CHARS {
            return Err(ValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX_CHARS,
                actual,
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    let actual = tag.chars().count();
    if actual == 0 || actual > TAG_MAX_CHARS || tag.trim() != tag {
        return Err(ValidationError::InvalidTag(tag.to_string()));
    }
    Ok(())
}
