//! One-off task record.
//!
//! # Invariants
//! - `completed_at` is set exactly when `status == Completed`.
//! - Completing an already completed or a cancelled task is rejected; the
//!   task must be reopened first.
//! - Tags are unique per task and kept in insertion order.

use crate::model::user::UserId;
use crate::model::{
    validate_description, validate_tag, validate_title, CompletionError, ValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

/// Effort bucket that fixes a task's XP award.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl TaskSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    /// Lenient parse for upstream input.
    ///
    /// Accepts the long names and the `S`/`M`/`L` shorthand; anything else is
    /// treated as `small`, the cheapest award.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "s" => Self::Small,
            "m" => Self::Medium,
            "l" => Self::Large,
            other => Self::parse(other).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub size: TaskSize,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    /// Unix epoch milliseconds of the latest completion.
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn new(user_id: UserId, title: impl Into<String>, size: TaskSize) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            size,
            status: TaskStatus::Todo,
            due_date: None,
            tags: Vec::new(),
            completed_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;
        for (index, tag) in self.tags.iter().enumerate() {
            validate_tag(tag)?;
            if self.tags[..index].contains(tag) {
                return Err(ValidationError::DuplicateTag(tag.clone()));
            }
        }
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Moves `todo` or `in_progress` to `completed` and stamps the
    /// completion time.
    pub fn complete(&mut self, now_ms: i64) -> Result<(), CompletionError> {
        self.ensure_open()?;
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now_ms);
        Ok(())
    }

    /// Moves `todo -> in_progress`. Returns `false` when already started.
    pub fn start(&mut self) -> Result<bool, CompletionError> {
        self.ensure_open()?;
        if self.status == TaskStatus::InProgress {
            return Ok(false);
        }
        self.status = TaskStatus::InProgress;
        Ok(true)
    }

    /// Cancels an open task. Returns `false` when already cancelled.
    ///
    /// A completed task has to be reopened before it can be cancelled.
    pub fn cancel(&mut self) -> Result<bool, CompletionError> {
        match self.status {
            TaskStatus::Cancelled => Ok(false),
            TaskStatus::Completed => Err(CompletionError::TaskAlreadyCompleted),
            TaskStatus::Todo | TaskStatus::InProgress => {
                self.status = TaskStatus::Cancelled;
                Ok(true)
            }
        }
    }

    /// Moves a completed or cancelled task back to `todo`.
    ///
    /// Returns `false` when the task was still open.
    pub fn reopen(&mut self) -> bool {
        if !matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled) {
            return false;
        }
        self.status = TaskStatus::Todo;
        self.completed_at = None;
        true
    }

    fn ensure_open(&self) -> Result<(), CompletionError> {
        match self.status {
            TaskStatus::Completed => Err(CompletionError::TaskAlreadyCompleted),
            TaskStatus::Cancelled => Err(CompletionError::TaskCancelled),
            TaskStatus::Todo | TaskStatus::InProgress => Ok(()),
        }
    }
}
