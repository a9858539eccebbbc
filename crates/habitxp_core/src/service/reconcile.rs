//! Progress projections and experience reconciliation.
//!
//! # Responsibility
//! - Summarize a user's progress for stats and experience-bar callers.
//! - Recompute the XP a user should hold from persisted facts and credit
//!   any shortfall.
//!
//! # Invariants
//! - Replay is a pure read; only `reconcile_experience` writes.
//! - Reconciliation never lowers stored experience.

use crate::clock::Clock;
use crate::gamification::{
    habit_completion_xp, level_for_experience, level_progress, task_xp, LevelProgress,
};
use crate::model::habit::Habit;
use crate::model::task::TaskStatus;
use crate::model::user::UserId;
use crate::repo::EngineStore;
use crate::service::{EngineError, EngineResult, ExperienceUpdate, GamificationService};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_habits: u64,
    /// Completion entries across all habits; missed days are not counted.
    pub completed_count: u64,
    /// Longest run of consecutive completions in any habit's history.
    pub longest_streak: u32,
    /// Highest live `streak` value across habits.
    pub current_streak: u32,
    pub completed_tasks: u64,
    pub unlocked_achievements: u64,
    pub level: i64,
    pub experience: i64,
    pub progress: LevelProgress,
    /// Named counters such as `days_without_games`.
    pub metrics: BTreeMap<String, f64>,
}

/// Result of comparing stored XP with replayed XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub stored_experience: i64,
    pub replayed_experience: i64,
    /// XP added by this reconciliation; `0` when nothing was missing.
    pub credited: i64,
    pub update: ExperienceUpdate,
}

impl<S: EngineStore, C: Clock> GamificationService<S, C> {
    pub fn user_stats(&self, user_id: UserId) -> EngineResult<UserStats> {
        let user = self.load_user(user_id)?;
        let habits = self.store.list_habits(user_id)?;

        let completed_count = habits
            .iter()
            .map(|habit| habit.completion_count() as u64)
            .sum::<u64>();
        let longest_streak = habits.iter().map(longest_run).max().unwrap_or(0);
        let current_streak = habits.iter().map(|habit| habit.streak).max().unwrap_or(0);

        Ok(UserStats {
            total_habits: habits.len() as u64,
            completed_count,
            longest_streak,
            current_streak,
            completed_tasks: self.store.count_completed_tasks(user_id)?,
            unlocked_achievements: self.store.list_unlocks(user_id)?.len() as u64,
            level: user.level,
            experience: user.experience,
            progress: level_progress(user.experience),
            metrics: self.store.list_metrics(user_id)?.into_iter().collect(),
        })
    }

    pub fn level_progress(&self, user_id: UserId) -> EngineResult<LevelProgress> {
        Ok(level_progress(self.load_user(user_id)?.experience))
    }

    /// XP implied by persisted history.
    ///
    /// Each completed history entry is worth its habit's base XP plus the
    /// streak bonus of its position in the run since the last miss.
    /// Completed tasks and unlocked achievement rewards are added on top.
    pub fn replay_experience(&self, user_id: UserId) -> EngineResult<i64> {
        self.load_user(user_id)?;

        let mut total = 0_i64;
        for habit in self.store.list_habits(user_id)? {
            total += replay_habit(&habit);
        }
        for task in self.store.list_tasks(user_id, Some(TaskStatus::Completed))? {
            total += task_xp(task.size);
        }
        for unlock in self.store.list_unlocks(user_id)? {
            let rule = self
                .store
                .find_achievement(&unlock.achievement_id)?
                .ok_or_else(|| EngineError::not_found("achievement", &unlock.achievement_id))?;
            total += rule.experience_reward;
        }
        Ok(total)
    }

    /// Credits XP lost between a habit write and its user write.
    ///
    /// Stored experience is raised to the replayed total when lower and the
    /// level is recomputed from the result, which also repairs a drifted
    /// level. Experience above the replayed total is kept.
    pub fn reconcile_experience(&self, user_id: UserId) -> EngineResult<Reconciliation> {
        let reconciliation = self.store.in_transaction(|| -> EngineResult<_> {
            let replayed = self.replay_experience(user_id)?;
            let mut user = self.load_user(user_id)?;
            let stored = user.experience;
            let old_level = user.level;

            let experience = stored.max(replayed);
            let level = level_for_experience(experience);
            if experience != stored || level != old_level {
                user.experience = experience;
                user.level = level;
                self.store.save_user(&user)?;
            }

            Ok(Reconciliation {
                stored_experience: stored,
                replayed_experience: replayed,
                credited: experience - stored,
                update: ExperienceUpdate {
                    old_level,
                    new_level: level,
                    experience,
                    level_up: level > old_level,
                },
            })
        })?;

        let update = reconciliation.update;
        if reconciliation.credited > 0 || update.old_level != update.new_level {
            warn!(
                "event=experience_reconcile module=service status=repaired user={} stored={} replayed={} credited={} old_level={} new_level={}",
                user_id,
                reconciliation.stored_experience,
                reconciliation.replayed_experience,
                reconciliation.credited,
                update.old_level,
                update.new_level
            );
        } else {
            info!(
                "event=experience_reconcile module=service status=ok user={} experience={}",
                user_id, reconciliation.stored_experience
            );
        }
        Ok(reconciliation)
    }
}

fn replay_habit(habit: &Habit) -> i64 {
    let mut run = 0_u32;
    let mut total = 0;
    for entry in &habit.completion_history {
        if entry.completed {
            run += 1;
            total += habit_completion_xp(habit.frequency, habit.priority, run);
        } else {
            run = 0;
        }
    }
    total
}

fn longest_run(habit: &Habit) -> u32 {
    let mut run = 0_u32;
    let mut longest = 0;
    for entry in &habit.completion_history {
        run = if entry.completed { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::{longest_run, replay_habit};
    use crate::model::habit::{Habit, HabitFrequency, HabitPriority};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn replay_restarts_bonus_after_a_miss() {
        let mut habit =
            Habit::new(Uuid::new_v4(), "Run", HabitFrequency::Daily, HabitPriority::Medium);
        for d in [1, 2, 4] {
            if d == 4 {
                habit.record_miss(day(3)).unwrap();
            }
            habit.refresh_completed_today(day(d));
            habit.complete(day(d)).unwrap();
        }

        // 20 + 2, 20 + 4, then the run restarts at 20 + 2.
        assert_eq!(replay_habit(&habit), 22 + 24 + 22);
        assert_eq!(longest_run(&habit), 2);
    }

    #[test]
    fn empty_history_replays_to_zero() {
        let habit =
            Habit::new(Uuid::new_v4(), "Read", HabitFrequency::Weekly, HabitPriority::High);
        assert_eq!(replay_habit(&habit), 0);
        assert_eq!(longest_run(&habit), 0);
    }
}
