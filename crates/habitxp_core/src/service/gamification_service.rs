//! Gamification use-case service.
//!
//! # Responsibility
//! - Turn habit/task completions into XP, level changes and unlocks.
//! - Keep every multi-record update inside one store transaction.
//!
//! # Invariants
//! - A completion either persists habit/task state, user XP and unlocks
//!   together, or persists nothing.
//! - `completed_today` is recomputed from history for the clock's current
//!   day whenever a habit is loaded.
//! - Experience never decreases through this service.
//! - Each `(user, achievement)` pair is unlocked and rewarded at most once.

use crate::clock::Clock;
use crate::gamification::{habit_completion_xp, level_for_experience, task_xp};
use crate::model::achievement::{
    default_catalogue, validate_metric_name, AchievementId, AchievementUnlock, ProgressTrigger,
    METRIC_WEIGHT_LOST_KG,
};
use crate::model::habit::{Habit, HabitCategory, HabitFrequency, HabitId, HabitPriority};
use crate::model::task::{Task, TaskId, TaskSize, TaskStatus};
use crate::model::user::{UserId, UserProgress};
use crate::model::ValidationError;
use crate::repo::{EngineStore, RepoError};
use crate::service::EngineError;
use chrono::{NaiveDate, NaiveTime, Weekday};
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

pub type EngineResult<T> = Result<T, EngineError>;

/// Editable habit attributes for create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub title: String,
    pub description: Option<String>,
    pub frequency: HabitFrequency,
    pub custom_days: Vec<Weekday>,
    pub priority: HabitPriority,
    pub category: HabitCategory,
    /// `None` keeps the stored start date, or uses today on create.
    pub start_date: Option<NaiveDate>,
    pub target_end_date: Option<NaiveDate>,
    pub reminder_time: Option<NaiveTime>,
}

impl HabitDraft {
    /// Daily, medium priority, `other` category.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            frequency: HabitFrequency::default(),
            custom_days: Vec::new(),
            priority: HabitPriority::default(),
            category: HabitCategory::default(),
            start_date: None,
            target_end_date: None,
            reminder_time: None,
        }
    }

    /// Switches to the `custom` frequency on the given weekdays.
    pub fn custom_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.frequency = HabitFrequency::Custom;
        self.custom_days = days.into_iter().collect();
        self
    }

    pub fn start_date(mut self, day: NaiveDate) -> Self {
        self.start_date = Some(day);
        self
    }

    pub fn target_end_date(mut self, day: NaiveDate) -> Self {
        self.target_end_date = Some(day);
        self
    }

    pub fn reminder_time(mut self, time: NaiveTime) -> Self {
        self.reminder_time = Some(time);
        self
    }

    pub fn frequency(mut self, frequency: HabitFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn priority(mut self, priority: HabitPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn category(mut self, category: HabitCategory) -> Self {
        self.category = category;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn apply_to(self, habit: &mut Habit) {
        habit.title = self.title;
        habit.description = self.description;
        habit.frequency = self.frequency;
        habit.custom_days = self.custom_days;
        habit.priority = self.priority;
        habit.category = self.category;
        habit.start_date = self.start_date.or(habit.start_date);
        habit.target_end_date = self.target_end_date;
        habit.reminder_time = self.reminder_time;
    }
}

/// Editable task attributes for create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub size: TaskSize,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl TaskDraft {
    /// Small task without description, due date or tags.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            size: TaskSize::default(),
            due_date: None,
            tags: Vec::new(),
        }
    }

    pub fn size(mut self, size: TaskSize) -> Self {
        self.size = size;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due_date(mut self, day: NaiveDate) -> Self {
        self.due_date = Some(day);
        self
    }

    /// Adds a trimmed tag; repeats are ignored.
    pub fn tag(mut self, tag: impl AsRef<str>) -> Self {
        let tag = tag.as_ref().trim().to_string();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    fn apply_to(self, task: &mut Task) {
        task.title = self.title;
        task.description = self.description;
        task.size = self.size;
        task.due_date = self.due_date;
        task.tags = self.tags;
    }
}

/// Level/XP change produced by one experience award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExperienceUpdate {
    pub old_level: i64,
    pub new_level: i64,
    /// Total experience after the award.
    pub experience: i64,
    pub level_up: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedHabit {
    pub habit: Habit,
    /// Achievements unlocked by the new habit count.
    pub unlocked: Vec<AchievementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitCompletionOutcome {
    pub habit: Habit,
    pub date: NaiveDate,
    pub new_streak: u32,
    /// XP credited for the completion itself, excluding achievement rewards.
    pub experience_awarded: i64,
    /// User state after the completion and all rewards.
    pub update: ExperienceUpdate,
    pub unlocked: Vec<AchievementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCompletionOutcome {
    pub task: Task,
    pub experience_awarded: i64,
    pub update: ExperienceUpdate,
    pub unlocked: Vec<AchievementId>,
}

/// Engine facade over a store and a clock.
pub struct GamificationService<S: EngineStore, C: Clock> {
    pub(crate) store: S,
    pub(crate) clock: C,
}

impl<S: EngineStore, C: Clock> GamificationService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Seeds the built-in catalogue into an empty store.
    pub fn seed_default_catalogue(&self) -> EngineResult<usize> {
        Ok(self.store.seed_achievements(&default_catalogue())?)
    }

    pub fn create_user(&self, display_name: impl Into<String>) -> EngineResult<UserProgress> {
        let user = UserProgress::new(display_name);
        let user_id = self.store.create_user(&user)?;
        info!("event=user_create module=service status=ok user={user_id}");
        self.load_user(user_id)
    }

    pub fn get_user(&self, user_id: UserId) -> EngineResult<UserProgress> {
        self.load_user(user_id)
    }

    /// Creates a habit and evaluates `habit_count` rules.
    pub fn create_habit(&self, user_id: UserId, draft: HabitDraft) -> EngineResult<CreatedHabit> {
        self.store.in_transaction(|| -> EngineResult<_> {
            self.load_user(user_id)?;

            let mut habit = Habit::new(user_id, String::new(), draft.frequency, draft.priority);
            draft.apply_to(&mut habit);
            habit.start_date.get_or_insert(self.clock.today());
            let habit_id = self
                .store
                .create_habit(&habit)
                .map_err(|err| map_title_conflict(err, &habit.title))?;

            let count = self.store.count_habits(user_id)?;
            let unlocked = self.evaluate(user_id, ProgressTrigger::HabitCount, count as f64)?;
            info!(
                "event=habit_create module=service status=ok user={user_id} habit={habit_id} habit_count={count} unlocked={}",
                unlocked.len()
            );

            Ok(CreatedHabit {
                habit: self.load_habit(habit_id)?,
                unlocked,
            })
        })
    }

    /// Replaces the editable attributes of a habit. Streak and history are
    /// left untouched.
    pub fn update_habit(&self, habit_id: HabitId, draft: HabitDraft) -> EngineResult<Habit> {
        self.store.in_transaction(|| -> EngineResult<_> {
            let mut habit = self.load_habit(habit_id)?;
            draft.apply_to(&mut habit);
            self.store
                .save_habit(&habit)
                .map_err(|err| map_title_conflict(err, &habit.title))?;
            self.load_habit(habit_id)
        })
    }

    pub fn delete_habit(&self, habit_id: HabitId) -> EngineResult<()> {
        self.store.delete_habit(habit_id)?;
        info!("event=habit_delete module=service status=ok habit={habit_id}");
        Ok(())
    }

    pub fn get_habit(&self, habit_id: HabitId) -> EngineResult<Habit> {
        self.load_habit(habit_id)
    }

    /// Lists a user's habits with `completed_today` evaluated for today.
    pub fn list_habits(&self, user_id: UserId) -> EngineResult<Vec<Habit>> {
        self.load_user(user_id)?;
        let today = self.clock.today();
        let mut habits = self.store.list_habits(user_id)?;
        for habit in &mut habits {
            habit.refresh_completed_today(today);
        }
        Ok(habits)
    }

    /// Habits scheduled for today by weekday and date window, with
    /// `completed_today` evaluated.
    pub fn list_habits_due_today(&self, user_id: UserId) -> EngineResult<Vec<Habit>> {
        let today = self.clock.today();
        let mut habits = self.list_habits(user_id)?;
        habits.retain(|habit| habit.is_scheduled_on(today));
        Ok(habits)
    }

    /// Completes a habit for the clock's current day.
    ///
    /// # Errors
    /// - `DuplicateCompletion` when already completed today; nothing is
    ///   written in that case.
    /// - `InvariantViolation` when the user's stored level/XP pair drifted.
    pub fn complete_habit(&self, habit_id: HabitId) -> EngineResult<HabitCompletionOutcome> {
        let today = self.clock.today();

        let outcome = self.store.in_transaction(|| -> EngineResult<_> {
            let mut habit = self.load_habit(habit_id)?;
            let old_level = self.load_user(habit.user_id)?.level;
            let completion = habit.complete(today).map_err(|err| {
                info!(
                    "event=habit_complete module=service status=rejected habit={habit_id} day={today} reason={err}"
                );
                EngineError::from(err)
            })?;
            self.store.save_habit(&habit)?;

            let experience_awarded =
                habit_completion_xp(habit.frequency, habit.priority, completion.new_streak);
            self.apply_experience(habit.user_id, experience_awarded)?;

            let unlocked = self.evaluate(
                habit.user_id,
                ProgressTrigger::Streak,
                f64::from(completion.new_streak),
            )?;
            let unlocked = self.settle_progress(habit.user_id, unlocked)?;

            Ok(HabitCompletionOutcome {
                update: self.update_since(habit.user_id, old_level)?,
                habit,
                date: completion.date,
                new_streak: completion.new_streak,
                experience_awarded,
                unlocked,
            })
        })?;

        info!(
            "event=habit_complete module=service status=ok habit={} user={} day={} streak={} xp={} level={} level_up={} unlocked={}",
            habit_id,
            outcome.habit.user_id,
            outcome.date,
            outcome.new_streak,
            outcome.experience_awarded,
            outcome.update.new_level,
            outcome.update.level_up,
            outcome.unlocked.len()
        );
        Ok(outcome)
    }

    /// Appends a missed-day entry for `day` and resets the streak.
    pub fn record_missed_day(&self, habit_id: HabitId, day: NaiveDate) -> EngineResult<Habit> {
        let today = self.clock.today();
        if day > today {
            return Err(EngineError::InvalidInput(format!(
                "missed day {day} is after today {today}"
            )));
        }

        self.store.in_transaction(|| -> EngineResult<_> {
            let mut habit = self.load_habit(habit_id)?;
            habit.record_miss(day)?;
            habit.refresh_completed_today(today);
            self.store.save_habit(&habit)?;
            info!("event=habit_miss module=service status=ok habit={habit_id} day={day}");
            Ok(habit)
        })
    }

    pub fn create_task(&self, user_id: UserId, draft: TaskDraft) -> EngineResult<Task> {
        self.load_user(user_id)?;
        let mut task = Task::new(user_id, String::new(), draft.size);
        draft.apply_to(&mut task);
        let task_id = self.store.create_task(&task)?;
        info!(
            "event=task_create module=service status=ok user={user_id} task={task_id} size={} tags={}",
            task.size.as_str(),
            task.tags.len()
        );
        self.load_task(task_id)
    }

    /// Replaces the editable attributes of a task. Status is left untouched.
    pub fn update_task(&self, task_id: TaskId, draft: TaskDraft) -> EngineResult<Task> {
        self.store.in_transaction(|| -> EngineResult<_> {
            let mut task = self.load_task(task_id)?;
            draft.apply_to(&mut task);
            self.store.save_task(&task)?;
            self.load_task(task_id)
        })
    }

    /// Moves a `todo` task to `in_progress`.
    pub fn start_task(&self, task_id: TaskId) -> EngineResult<Task> {
        self.store.in_transaction(|| -> EngineResult<_> {
            let mut task = self.load_task(task_id)?;
            if task.start()? {
                self.store.save_task(&task)?;
                info!("event=task_start module=service status=ok task={task_id}");
            }
            Ok(task)
        })
    }

    /// Cancels an open task; a cancelled task can only be reopened.
    pub fn cancel_task(&self, task_id: TaskId) -> EngineResult<Task> {
        self.store.in_transaction(|| -> EngineResult<_> {
            let mut task = self.load_task(task_id)?;
            if task.cancel()? {
                self.store.save_task(&task)?;
                info!("event=task_cancel module=service status=ok task={task_id}");
            }
            Ok(task)
        })
    }

    pub fn get_task(&self, task_id: TaskId) -> EngineResult<Task> {
        self.load_task(task_id)
    }

    pub fn list_tasks(&self, user_id: UserId, status: Option<TaskStatus>) -> EngineResult<Vec<Task>> {
        self.load_user(user_id)?;
        Ok(self.store.list_tasks(user_id, status)?)
    }

    /// Completes a task, awards `task_xp(size)` and evaluates `task_count`.
    pub fn complete_task(&self, task_id: TaskId) -> EngineResult<TaskCompletionOutcome> {
        let now_ms = self.clock.now_ms();

        let outcome = self.store.in_transaction(|| -> EngineResult<_> {
            let mut task = self.load_task(task_id)?;
            let old_level = self.load_user(task.user_id)?.level;
            task.complete(now_ms).map_err(|err| {
                info!(
                    "event=task_complete module=service status=rejected task={task_id} reason={err}"
                );
                EngineError::from(err)
            })?;
            self.store.save_task(&task)?;

            let experience_awarded = task_xp(task.size);
            self.apply_experience(task.user_id, experience_awarded)?;

            let completed = self.store.count_completed_tasks(task.user_id)?;
            let unlocked =
                self.evaluate(task.user_id, ProgressTrigger::TaskCount, completed as f64)?;
            let unlocked = self.settle_progress(task.user_id, unlocked)?;

            Ok(TaskCompletionOutcome {
                update: self.update_since(task.user_id, old_level)?,
                task: self.load_task(task_id)?,
                experience_awarded,
                unlocked,
            })
        })?;

        info!(
            "event=task_complete module=service status=ok task={} user={} xp={} level={} level_up={} unlocked={}",
            task_id,
            outcome.task.user_id,
            outcome.experience_awarded,
            outcome.update.new_level,
            outcome.update.level_up,
            outcome.unlocked.len()
        );
        Ok(outcome)
    }

    /// Moves a completed or cancelled task back to `todo`. Earned XP is kept.
    pub fn reopen_task(&self, task_id: TaskId) -> EngineResult<Task> {
        self.store.in_transaction(|| -> EngineResult<_> {
            let mut task = self.load_task(task_id)?;
            if task.reopen() {
                self.store.save_task(&task)?;
                info!("event=task_reopen module=service status=ok task={task_id}");
            }
            Ok(task)
        })
    }

    pub fn delete_task(&self, task_id: TaskId) -> EngineResult<()> {
        self.store.delete_task(task_id)?;
        info!("event=task_delete module=service status=ok task={task_id}");
        Ok(())
    }

    /// Adds `delta` XP to a user and recomputes the level.
    ///
    /// # Errors
    /// - `InvalidInput` for a negative delta.
    /// - `InvariantViolation` when the stored level does not match the
    ///   stored experience.
    pub fn apply_experience(&self, user_id: UserId, delta: i64) -> EngineResult<ExperienceUpdate> {
        if delta < 0 {
            return Err(EngineError::InvalidInput(format!(
                "experience delta must be >= 0, got {delta}"
            )));
        }

        self.store.in_transaction(|| -> EngineResult<_> {
            let mut user = self.load_user(user_id)?;
            if !user.is_level_consistent() {
                error!(
                    "event=experience_apply module=service status=error user={user_id} error_code=level_drift level={} experience={}",
                    user.level, user.experience
                );
                return Err(EngineError::InvariantViolation(format!(
                    "user {user_id} has level {} but experience {} maps to level {}",
                    user.level,
                    user.experience,
                    level_for_experience(user.experience)
                )));
            }

            let experience = user.experience.checked_add(delta).ok_or_else(|| {
                EngineError::InvalidInput(format!("experience overflow adding {delta}"))
            })?;
            let old_level = user.level;
            user.experience = experience;
            user.level = level_for_experience(experience);
            self.store.save_user(&user)?;

            let update = ExperienceUpdate {
                old_level,
                new_level: user.level,
                experience,
                level_up: user.level > old_level,
            };
            if update.level_up {
                info!(
                    "event=level_up module=service status=ok user={user_id} old_level={old_level} new_level={}",
                    update.new_level
                );
            }
            Ok(update)
        })
    }

    /// Unlocks every rule watching `trigger` that `new_value` satisfies.
    ///
    /// Rewards are credited immediately; when any reward is granted,
    /// level and experience rules are re-evaluated until nothing new
    /// unlocks. Returns the ids unlocked by this call, in unlock order.
    pub fn evaluate(
        &self,
        user_id: UserId,
        trigger: ProgressTrigger,
        new_value: f64,
    ) -> EngineResult<Vec<AchievementId>> {
        self.store.in_transaction(|| -> EngineResult<_> {
            self.load_user(user_id)?;
            let unlocked = self.unlock_matching(user_id, &trigger, new_value)?;
            if unlocked.is_empty()
                && !matches!(trigger, ProgressTrigger::Level | ProgressTrigger::Experience)
            {
                return Ok(unlocked);
            }
            self.settle_progress(user_id, unlocked)
        })
    }

    /// Stores a named counter and evaluates `special` rules watching it.
    pub fn record_metric(
        &self,
        user_id: UserId,
        name: &str,
        value: f64,
    ) -> EngineResult<Vec<AchievementId>> {
        validate_metric_name(name)?;
        if !value.is_finite() {
            return Err(ValidationError::InvalidMetricValue(value).into());
        }

        self.store.in_transaction(|| -> EngineResult<_> {
            self.load_user(user_id)?;
            self.store.set_metric(user_id, name, value)?;
            self.evaluate(user_id, ProgressTrigger::Metric(name.to_string()), value)
        })
    }

    /// Current value of a named counter, `None` when never recorded.
    pub fn get_metric(&self, user_id: UserId, name: &str) -> EngineResult<Option<f64>> {
        validate_metric_name(name)?;
        self.load_user(user_id)?;
        Ok(self.store.get_metric(user_id, name)?)
    }

    /// All named counters of a user, keyed by name.
    pub fn list_metrics(&self, user_id: UserId) -> EngineResult<BTreeMap<String, f64>> {
        self.load_user(user_id)?;
        Ok(self.store.list_metrics(user_id)?.into_iter().collect())
    }

    /// Sets the baseline for weight tracking.
    ///
    /// The current weight is initialized to the same value when unset.
    pub fn set_starting_weight(&self, user_id: UserId, kg: f64) -> EngineResult<UserProgress> {
        ensure_weight(kg)?;
        self.store.in_transaction(|| -> EngineResult<_> {
            let mut user = self.load_user(user_id)?;
            user.starting_weight = Some(kg);
            user.current_weight.get_or_insert(kg);
            self.store.save_user(&user)?;
            self.load_user(user_id)
        })
    }

    /// Records the current weight and evaluates the derived
    /// `weight_lost_kg` metric when a starting weight exists.
    pub fn record_weight(&self, user_id: UserId, kg: f64) -> EngineResult<Vec<AchievementId>> {
        ensure_weight(kg)?;
        self.store.in_transaction(|| -> EngineResult<_> {
            let mut user = self.load_user(user_id)?;
            user.current_weight = Some(kg);
            self.store.save_user(&user)?;

            match user.weight_lost_kg() {
                Some(lost) => {
                    self.store.set_metric(user_id, METRIC_WEIGHT_LOST_KG, lost)?;
                    self.evaluate(
                        user_id,
                        ProgressTrigger::Metric(METRIC_WEIGHT_LOST_KG.to_string()),
                        lost,
                    )
                }
                None => Ok(Vec::new()),
            }
        })
    }

    pub(crate) fn load_user(&self, user_id: UserId) -> EngineResult<UserProgress> {
        self.store
            .find_user(user_id)?
            .ok_or_else(|| EngineError::not_found("user", user_id))
    }

    /// Loads a habit with `completed_today` recomputed for today.
    pub(crate) fn load_habit(&self, habit_id: HabitId) -> EngineResult<Habit> {
        let mut habit = self
            .store
            .find_habit(habit_id)?
            .ok_or_else(|| EngineError::not_found("habit", habit_id))?;
        habit.refresh_completed_today(self.clock.today());
        Ok(habit)
    }

    fn load_task(&self, task_id: TaskId) -> EngineResult<Task> {
        self.store
            .find_task(task_id)?
            .ok_or_else(|| EngineError::not_found("task", task_id))
    }

    fn unlock_matching(
        &self,
        user_id: UserId,
        trigger: &ProgressTrigger,
        value: f64,
    ) -> EngineResult<Vec<AchievementId>> {
        let mut unlocked = Vec::new();
        for rule in self.store.list_achievements()? {
            if !rule.watches(trigger)
                || !rule.is_satisfied_by(value)
                || self.store.unlock_exists(user_id, &rule.id)?
            {
                continue;
            }

            let unlock = AchievementUnlock {
                user_id,
                achievement_id: rule.id.clone(),
                earned_at: self.clock.now_ms(),
                progress: rule.required_value,
            };
            self.store.create_unlock(&unlock).map_err(|err| match err {
                RepoError::Conflict { id, .. } => {
                    error!(
                        "event=achievement_unlock module=service status=error user={user_id} achievement={} error_code=duplicate_unlock",
                        rule.id
                    );
                    EngineError::InvariantViolation(format!("unlock {id} already exists"))
                }
                other => other.into(),
            })?;
            if rule.experience_reward > 0 {
                self.apply_experience(user_id, rule.experience_reward)?;
            }

            info!(
                "event=achievement_unlock module=service status=ok user={user_id} achievement={} trigger={} reward={}",
                rule.id,
                trigger.label(),
                rule.experience_reward
            );
            unlocked.push(rule.id);
        }
        Ok(unlocked)
    }

    /// Re-evaluates level and experience rules until a fixed point.
    fn settle_progress(
        &self,
        user_id: UserId,
        mut unlocked: Vec<AchievementId>,
    ) -> EngineResult<Vec<AchievementId>> {
        loop {
            let user = self.load_user(user_id)?;
            let mut round =
                self.unlock_matching(user_id, &ProgressTrigger::Level, user.level as f64)?;
            round.extend(self.unlock_matching(
                user_id,
                &ProgressTrigger::Experience,
                user.experience as f64,
            )?);
            if round.is_empty() {
                return Ok(unlocked);
            }
            unlocked.extend(round);
        }
    }

    /// Level/XP change of a user relative to `old_level`.
    fn update_since(&self, user_id: UserId, old_level: i64) -> EngineResult<ExperienceUpdate> {
        let user = self.load_user(user_id)?;
        Ok(ExperienceUpdate {
            old_level,
            new_level: user.level,
            experience: user.experience,
            level_up: user.level > old_level,
        })
    }
}

fn ensure_weight(kg: f64) -> EngineResult<()> {
    if kg.is_finite() && kg > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidWeight(kg).into())
    }
}

fn map_title_conflict(err: RepoError, title: &str) -> EngineError {
    match err {
        RepoError::Conflict { .. } => {
            warn!("event=habit_write module=service status=rejected error_code=duplicate_title");
            EngineError::InvalidInput(format!("habit title `{title}` is already in use"))
        }
        other => other.into(),
    }
}
