//! Base XP lookup tables.

use crate::model::habit::{HabitFrequency, HabitPriority};
use crate::model::task::TaskSize;
use crate::gamification::streak::streak_bonus;

const DAILY_XP: i64 = 10;
const WEEKLY_XP: i64 = 30;
const MONTHLY_XP: i64 = 100;
const CUSTOM_XP: i64 = 15;

const LOW_PRIORITY_XP: i64 = 5;
const MEDIUM_PRIORITY_XP: i64 = 10;
const HIGH_PRIORITY_XP: i64 = 15;

const SMALL_TASK_XP: i64 = 10;
const MEDIUM_TASK_XP: i64 = 25;
const LARGE_TASK_XP: i64 = 50;

/// Returns the base award for one habit completion.
///
/// The frequency and priority components are independent and summed.
/// Callers holding raw strings should go through
/// [`HabitFrequency::parse_lenient`] / [`HabitPriority::parse_lenient`],
/// which fall back to `daily`/`medium`.
pub fn base_xp(frequency: HabitFrequency, priority: HabitPriority) -> i64 {
    frequency_xp(frequency) + priority_xp(priority)
}

/// Returns the fixed award for completing a task of the given size.
pub fn task_xp(size: TaskSize) -> i64 {
    match size {
        TaskSize::Small => SMALL_TASK_XP,
        TaskSize::Medium => MEDIUM_TASK_XP,
        TaskSize::Large => LARGE_TASK_XP,
    }
}

/// Total award for a habit completion.
///
/// `new_streak` must be the streak value after the completion increment.
pub fn habit_completion_xp(
    frequency: HabitFrequency,
    priority: HabitPriority,
    new_streak: u32,
) -> i64 {
    base_xp(frequency, priority) + streak_bonus(i64::from(new_streak))
}

fn frequency_xp(frequency: HabitFrequency) -> i64 {
    match frequency {
        HabitFrequency::Daily => DAILY_XP,
        HabitFrequency::Weekly => WEEKLY_XP,
        HabitFrequency::Monthly => MONTHLY_XP,
        HabitFrequency::Custom => CUSTOM_XP,
    }
}

fn priority_xp(priority: HabitPriority) -> i64 {
    match priority {
        HabitPriority::Low => LOW_PRIORITY_XP,
        HabitPriority::Medium => MEDIUM_PRIORITY_XP,
        HabitPriority::High => HIGH_PRIORITY_XP,
    }
}
