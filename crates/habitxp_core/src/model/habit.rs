//! Habit record and its completion state machine.
//!
//! # Responsibility
//! - Define the habit record and its enum attributes.
//! - Own the guarded `complete` transition and missed-day recording.
//! - Expose the query-time `completed_today` predicate.
//!
//! # Invariants
//! - `completion_history` is append-only and strictly chronological, with at
//!   most one entry per calendar day.
//! - `completed_today` is true only when the latest history entry records a
//!   completion.
//! - A habit can be completed at most once per calendar day; a rejected
//!   completion leaves the record untouched.
//! - Day rollover never clears `completed_today` here; callers refresh it
//!   with [`Habit::refresh_completed_today`] when loading.
//! - `custom_days` is only non-empty for the `custom` frequency.
//! - Schedule fields (`custom_days`, dates, reminder) never gate completion.

use crate::model::user::UserId;
use crate::model::{validate_description, validate_title, CompletionError, ValidationError};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type HabitId = Uuid;

/// How often a habit is expected to be performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl HabitFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }

    /// Strict parse used for persisted values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Lenient parse for upstream input; unknown values become `daily`.
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse(value.trim().to_ascii_lowercase().as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl HabitPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Lenient parse for upstream input; unknown values become `medium`.
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse(value.trim().to_ascii_lowercase().as_str()).unwrap_or_default()
    }
}

/// Display grouping only; has no effect on rewards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitCategory {
    Health,
    Productivity,
    Education,
    Social,
    Mindfulness,
    Career,
    Finance,
    #[default]
    Other,
}

impl HabitCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Productivity => "productivity",
            Self::Education => "education",
            Self::Social => "social",
            Self::Mindfulness => "mindfulness",
            Self::Career => "career",
            Self::Finance => "finance",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "health" => Some(Self::Health),
            "productivity" => Some(Self::Productivity),
            "education" => Some(Self::Education),
            "social" => Some(Self::Social),
            "mindfulness" => Some(Self::Mindfulness),
            "career" => Some(Self::Career),
            "finance" => Some(Self::Finance),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// One day in a habit's completion log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub date: NaiveDate,
    pub completed: bool,
}

/// Result of a successful `Habit::complete` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitCompletion {
    pub date: NaiveDate,
    /// Streak after the increment; this is the value rewards are based on.
    pub new_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub uuid: HabitId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub frequency: HabitFrequency,
    /// Weekdays a `custom` habit is due on; empty means every day.
    pub custom_days: Vec<Weekday>,
    pub priority: HabitPriority,
    pub category: HabitCategory,
    pub start_date: Option<NaiveDate>,
    pub target_end_date: Option<NaiveDate>,
    /// Local wall-clock time for reminders; delivery is up to the caller.
    pub reminder_time: Option<NaiveTime>,
    pub streak: u32,
    pub completed_today: bool,
    pub completion_history: Vec<CompletionRecord>,
    /// Unix epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Unix epoch milliseconds, assigned by storage.
    pub updated_at: i64,
}

impl Habit {
    /// Creates a habit with a fresh id, empty history and zero streak.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        frequency: HabitFrequency,
        priority: HabitPriority,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            frequency,
            custom_days: Vec::new(),
            priority,
            category: HabitCategory::default(),
            start_date: None,
            target_end_date: None,
            reminder_time: None,
            streak: 0,
            completed_today: false,
            completion_history: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Checks structural invariants of this record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;

        if !self.custom_days.is_empty() && self.frequency != HabitFrequency::Custom {
            return Err(ValidationError::CustomDaysWithoutCustomFrequency);
        }
        for (index, day) in self.custom_days.iter().enumerate() {
            if self.custom_days[..index].contains(day) {
                return Err(ValidationError::DuplicateCustomDay(*day));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.target_end_date) {
            if end < start {
                return Err(ValidationError::EndBeforeStart { start, end });
            }
        }

        for (index, pair) in self.completion_history.windows(2).enumerate() {
            if pair[1].date == pair[0].date {
                return Err(ValidationError::DuplicateHistoryDay(pair[1].date));
            }
            if pair[1].date < pair[0].date {
                return Err(ValidationError::HistoryOutOfOrder { index: index + 1 });
            }
        }

        if self.completed_today && !self.latest_entry().is_some_and(|entry| entry.completed) {
            return Err(ValidationError::CompletedFlagWithoutEntry);
        }

        if self.streak > self.trailing_completions() {
            return Err(ValidationError::StreakWithoutHistory(self.streak));
        }

        Ok(())
    }

    /// Latest completion-history entry, if any.
    pub fn latest_entry(&self) -> Option<&CompletionRecord> {
        self.completion_history.last()
    }

    /// Query-time predicate: did the latest entry complete this habit on `day`?
    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.latest_entry()
            .is_some_and(|entry| entry.date == day && entry.completed)
    }

    /// Whether `day` falls inside the habit's date window and, for `custom`
    /// habits with listed weekdays, on one of those weekdays.
    pub fn is_scheduled_on(&self, day: NaiveDate) -> bool {
        if self.start_date.is_some_and(|start| day < start)
            || self.target_end_date.is_some_and(|end| day > end)
        {
            return false;
        }
        self.custom_days.is_empty() || self.custom_days.contains(&day.weekday())
    }

    /// Recomputes `completed_today` for `today`.
    ///
    /// Returns `true` when the flag changed.
    pub fn refresh_completed_today(&mut self, today: NaiveDate) -> bool {
        let expected = self.is_completed_on(today);
        let changed = self.completed_today != expected;
        self.completed_today = expected;
        changed
    }

    /// Marks this habit completed for `today`.
    ///
    /// # Errors
    /// - `HabitAlreadyCompleted` when the habit is already completed today;
    ///   nothing is mutated in that case.
    /// - `OutOfOrder` when the latest entry is dated after `today`, or a
    ///   missed-day entry already exists for `today`.
    pub fn complete(&mut self, today: NaiveDate) -> Result<HabitCompletion, CompletionError> {
        if self.completed_today || self.is_completed_on(today) {
            return Err(CompletionError::HabitAlreadyCompleted { date: today });
        }
        self.ensure_follows_latest(today)?;

        self.completion_history.push(CompletionRecord {
            date: today,
            completed: true,
        });
        self.streak += 1;
        self.completed_today = true;

        Ok(HabitCompletion {
            date: today,
            new_streak: self.streak,
        })
    }

    /// Appends a missed-day entry and resets the streak.
    pub fn record_miss(&mut self, day: NaiveDate) -> Result<(), CompletionError> {
        self.ensure_follows_latest(day)?;

        self.completion_history.push(CompletionRecord {
            date: day,
            completed: false,
        });
        self.streak = 0;
        self.completed_today = false;
        Ok(())
    }

    /// Number of completions in history, ignoring missed-day entries.
    pub fn completion_count(&self) -> usize {
        self.completion_history
            .iter()
            .filter(|entry| entry.completed)
            .count()
    }

    fn trailing_completions(&self) -> u32 {
        let count = self
            .completion_history
            .iter()
            .rev()
            .take_while(|entry| entry.completed)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn ensure_follows_latest(&self, day: NaiveDate) -> Result<(), CompletionError> {
        match self.latest_entry() {
            Some(latest) if latest.date >= day => Err(CompletionError::OutOfOrder {
                latest: latest.date,
                attempted: day,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Habit, HabitFrequency, HabitPriority};
    use crate::model::{CompletionError, ValidationError};
    use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn habit() -> Habit {
        Habit::new(
            Uuid::new_v4(),
            "Read 10 pages",
            HabitFrequency::Daily,
            HabitPriority::Medium,
        )
    }

    #[test]
    fn complete_appends_history_and_increments_streak() {
        let mut habit = habit();
        let outcome = habit.complete(day(1)).unwrap();

        assert_eq!(outcome.new_streak, 1);
        assert_eq!(habit.streak, 1);
        assert!(habit.completed_today);
        assert_eq!(habit.completion_history.len(), 1);
        assert!(habit.completion_history[0].completed);
        habit.validate().unwrap();
    }

    #[test]
    fn second_completion_same_day_is_rejected_without_side_effects() {
        let mut habit = habit();
        habit.complete(day(1)).unwrap();
        let before = habit.clone();

        let err = habit.complete(day(1)).unwrap_err();
        assert_eq!(err, CompletionError::HabitAlreadyCompleted { date: day(1) });
        assert_eq!(habit, before);
    }

    #[test]
    fn stale_flag_blocks_completion_until_refreshed() {
        let mut habit = habit();
        habit.complete(day(1)).unwrap();

        assert!(habit.complete(day(2)).is_err());
        assert!(habit.refresh_completed_today(day(2)));
        assert!(!habit.completed_today);

        let outcome = habit.complete(day(2)).unwrap();
        assert_eq!(outcome.new_streak, 2);
    }

    #[test]
    fn refresh_sets_flag_from_history() {
        let mut habit = habit();
        habit.complete(day(4)).unwrap();
        habit.completed_today = false;

        assert!(habit.refresh_completed_today(day(4)));
        assert!(habit.completed_today);
        assert!(!habit.refresh_completed_today(day(4)));
    }

    #[test]
    fn completion_before_latest_entry_is_out_of_order() {
        let mut habit = habit();
        habit.complete(day(5)).unwrap();
        habit.refresh_completed_today(day(3));

        let err = habit.complete(day(3)).unwrap_err();
        assert!(matches!(err, CompletionError::OutOfOrder { .. }));
        assert_eq!(habit.completion_history.len(), 1);
    }

    #[test]
    fn record_miss_resets_streak() {
        let mut habit = habit();
        habit.complete(day(1)).unwrap();
        habit.refresh_completed_today(day(2));
        habit.complete(day(2)).unwrap();
        habit.record_miss(day(3)).unwrap();

        assert_eq!(habit.streak, 0);
        assert!(!habit.completed_today);
        assert_eq!(habit.completion_count(), 2);
        habit.validate().unwrap();

        let err = habit.complete(day(3)).unwrap_err();
        assert!(matches!(err, CompletionError::OutOfOrder { .. }));
    }

    #[test]
    fn validate_rejects_inconsistent_streak_and_flag() {
        let mut streaky = habit();
        streaky.streak = 3;
        assert_eq!(
            streaky.validate().unwrap_err(),
            ValidationError::StreakWithoutHistory(3)
        );

        let mut flagged = habit();
        flagged.completed_today = true;
        assert_eq!(
            flagged.validate().unwrap_err(),
            ValidationError::CompletedFlagWithoutEntry
        );
    }

    #[test]
    fn custom_days_follow_custom_frequency() {
        let mut habit = habit();
        habit.custom_days = vec![Weekday::Mon];
        assert_eq!(
            habit.validate().unwrap_err(),
            ValidationError::CustomDaysWithoutCustomFrequency
        );

        habit.frequency = HabitFrequency::Custom;
        habit.validate().unwrap();
        habit.custom_days.push(Weekday::Mon);
        assert_eq!(
            habit.validate().unwrap_err(),
            ValidationError::DuplicateCustomDay(Weekday::Mon)
        );
    }

    #[test]
    fn schedule_respects_weekdays_and_window() {
        let mut habit = habit();
        habit.frequency = HabitFrequency::Custom;
        // 2024-03-04 is a Monday.
        habit.custom_days = vec![Weekday::Mon, Weekday::Wed];
        assert!(habit.is_scheduled_on(day(4)));
        assert!(!habit.is_scheduled_on(day(5)));
        assert!(habit.is_scheduled_on(day(6)));

        habit.start_date = Some(day(5));
        habit.target_end_date = Some(day(11));
        assert!(!habit.is_scheduled_on(day(4)));
        assert!(habit.is_scheduled_on(day(11)));
        assert!(!habit.is_scheduled_on(day(13)));

        habit.target_end_date = Some(day(1));
        assert_eq!(
            habit.validate().unwrap_err(),
            ValidationError::EndBeforeStart {
                start: day(5),
                end: day(1)
            }
        );
    }

    #[test]
    fn lenient_parsers_fall_back_to_defaults() {
        assert_eq!(HabitFrequency::parse_lenient(" Weekly "), HabitFrequency::Weekly);
        assert_eq!(HabitFrequency::parse_lenient("sometimes"), HabitFrequency::Daily);
        assert_eq!(HabitPriority::parse_lenient("HIGH"), HabitPriority::High);
        assert_eq!(HabitPriority::parse_lenient("urgent"), HabitPriority::Medium);
    }
}
