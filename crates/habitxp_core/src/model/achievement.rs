//! Achievement catalogue entries and unlock records.
//!
//! # Responsibility
//! - Define declarative achievement rules (kind + threshold + reward).
//! - Map progress triggers onto the rules they can satisfy.
//! - Provide the default seed catalogue.
//!
//! # Invariants
//! - Achievement ids and metric names are lowercase slugs.
//! - Only `Special` achievements name a metric, and they always do.
//! - An unlock exists at most once per `(user_id, achievement_id)`.

use crate::model::user::UserId;
use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type AchievementId = String;

/// Counter of days the user has avoided games.
pub const METRIC_DAYS_WITHOUT_GAMES: &str = "days_without_games";
/// Counter of side projects the user shipped.
pub const METRIC_PROJECTS_CREATED: &str = "projects_created";
/// Derived metric: `starting_weight - current_weight`.
pub const METRIC_WEIGHT_LOST_KG: &str = "weight_lost_kg";

static ACHIEVEMENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").expect("valid achievement id regex"));
static METRIC_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,63}$").expect("valid metric name regex"));

/// Which counter an achievement watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    Streak,
    HabitCount,
    TaskCount,
    Level,
    Experience,
    /// Named per-user counter; see [`Achievement::metric`].
    Special,
}

impl AchievementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streak => "streak",
            Self::HabitCount => "habit_count",
            Self::TaskCount => "task_count",
            Self::Level => "level",
            Self::Experience => "experience",
            Self::Special => "special",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "streak" => Some(Self::Streak),
            "habit_count" => Some(Self::HabitCount),
            "task_count" => Some(Self::TaskCount),
            "level" => Some(Self::Level),
            "experience" => Some(Self::Experience),
            "special" => Some(Self::Special),
            _ => None,
        }
    }
}

/// The counter that just changed and should be checked against the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProgressTrigger {
    Streak,
    HabitCount,
    TaskCount,
    Level,
    Experience,
    Metric(String),
}

impl ProgressTrigger {
    /// Short label used in log events.
    pub fn label(&self) -> &str {
        match self {
            Self::Streak => "streak",
            Self::HabitCount => "habit_count",
            Self::TaskCount => "task_count",
            Self::Level => "level",
            Self::Experience => "experience",
            Self::Metric(name) => name.as_str(),
        }
    }
}

/// Declarative achievement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    pub required_value: i64,
    pub experience_reward: i64,
}

impl Achievement {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: AchievementKind,
        required_value: i64,
        experience_reward: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            kind,
            metric: None,
            required_value,
            experience_reward,
        }
    }

    /// Builder helper for `Special` rules.
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !ACHIEVEMENT_ID_RE.is_match(&self.id) {
            return Err(ValidationError::InvalidSlug {
                field: "achievement id",
                value: self.id.clone(),
            });
        }
        match (self.kind, self.metric.as_deref()) {
            (AchievementKind::Special, None) => {
                return Err(ValidationError::MissingMetric(self.id.clone()));
            }
            (AchievementKind::Special, Some(metric)) => validate_metric_name(metric)?,
            (_, Some(_)) => return Err(ValidationError::UnexpectedMetric(self.id.clone())),
            (_, None) => {}
        }
        if self.required_value < 1 {
            return Err(ValidationError::NonPositiveThreshold(self.required_value));
        }
        if self.experience_reward < 0 {
            return Err(ValidationError::NegativeReward(self.experience_reward));
        }
        Ok(())
    }

    /// Whether a change of `trigger` can satisfy this rule.
    pub fn watches(&self, trigger: &ProgressTrigger) -> bool {
        match (self.kind, trigger) {
            (AchievementKind::Streak, ProgressTrigger::Streak)
            | (AchievementKind::HabitCount, ProgressTrigger::HabitCount)
            | (AchievementKind::TaskCount, ProgressTrigger::TaskCount)
            | (AchievementKind::Level, ProgressTrigger::Level)
            | (AchievementKind::Experience, ProgressTrigger::Experience) => true,
            (AchievementKind::Special, ProgressTrigger::Metric(name)) => {
                self.metric.as_deref() == Some(name.as_str())
            }
            _ => false,
        }
    }

    /// Threshold check. Values are compared as floats so fractional metrics
    /// such as kilograms work against integer thresholds.
    pub fn is_satisfied_by(&self, value: f64) -> bool {
        value >= self.required_value as f64
    }
}

/// Proof that a user earned an achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementUnlock {
    pub user_id: UserId,
    pub achievement_id: AchievementId,
    /// Unix epoch milliseconds.
    pub earned_at: i64,
    pub progress: i64,
}

/// Checks a counter name against the metric slug format.
pub fn validate_metric_name(name: &str) -> Result<(), ValidationError> {
    if METRIC_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSlug {
            field: "metric name",
            value: name.to_string(),
        })
    }
}

/// Catalogue seeded into fresh databases.
pub fn default_catalogue() -> Vec<Achievement> {
    vec![
        Achievement::new("first-habit", "First steps", AchievementKind::HabitCount, 1, 50)
            .with_description("Create your first habit"),
        Achievement::new("habit-master", "Habit master", AchievementKind::HabitCount, 10, 200)
            .with_description("Create 10 habits"),
        Achievement::new("streak-5", "Beginner", AchievementKind::Streak, 5, 100)
            .with_description("Complete a habit 5 days in a row"),
        Achievement::new("streak-7", "One full week", AchievementKind::Streak, 7, 150)
            .with_description("Complete a habit 7 days in a row"),
        Achievement::new("organizer", "Organizer", AchievementKind::TaskCount, 20, 150)
            .with_description("Complete 20 tasks"),
        Achievement::new("level-5", "Level 5", AchievementKind::Level, 5, 300)
            .with_description("Reach level 5"),
        Achievement::new("7-days-no-games", "Game-free week", AchievementKind::Special, 7, 50)
            .with_metric(METRIC_DAYS_WITHOUT_GAMES)
            .with_description("Stay away from games for 7 days"),
        Achievement::new("first-product", "First product", AchievementKind::Special, 1, 50)
            .with_metric(METRIC_PROJECTS_CREATED)
            .with_description("Ship your first project"),
        Achievement::new("weight-loss-5kg", "Minus 5 kg", AchievementKind::Special, 5, 100)
            .with_metric(METRIC_WEIGHT_LOST_KG)
            .with_description("Lose 5 kg from your starting weight"),
    ]
}

#[cfg(test)]
mod tests {
    use super::{default_catalogue, Achievement, AchievementKind, ProgressTrigger};
    use crate::model::ValidationError;

    #[test]
    fn default_catalogue_is_valid_and_unique() {
        let catalogue = default_catalogue();
        let mut ids = std::collections::HashSet::new();
        for achievement in &catalogue {
            achievement.validate().unwrap();
            assert!(ids.insert(achievement.id.clone()), "duplicate {}", achievement.id);
        }
    }

    #[test]
    fn special_rules_only_watch_their_metric() {
        let rule = Achievement::new("x", "x", AchievementKind::Special, 1, 0).with_metric("naps");
        assert!(rule.watches(&ProgressTrigger::Metric("naps".to_string())));
        assert!(!rule.watches(&ProgressTrigger::Metric("runs".to_string())));
        assert!(!rule.watches(&ProgressTrigger::Streak));
    }

    #[test]
    fn metric_placement_is_validated() {
        let missing = Achievement::new("a", "a", AchievementKind::Special, 1, 0);
        assert_eq!(
            missing.validate().unwrap_err(),
            ValidationError::MissingMetric("a".to_string())
        );

        let unexpected = Achievement::new("b", "b", AchievementKind::Level, 1, 0).with_metric("x");
        assert_eq!(
            unexpected.validate().unwrap_err(),
            ValidationError::UnexpectedMetric("b".to_string())
        );

        let bad_id = Achievement::new("Bad Id", "c", AchievementKind::Level, 1, 0);
        assert!(matches!(
            bad_id.validate().unwrap_err(),
            ValidationError::InvalidSlug { .. }
        ));
    }

    #[test]
    fn fractional_values_compare_against_threshold() {
        let rule = Achievement::new("w", "w", AchievementKind::Special, 5, 0).with_metric("kg");
        assert!(rule.is_satisfied_by(80.0 - 74.9));
        assert!(!rule.is_satisfied_by(80.0 - 75.5));
    }
}
