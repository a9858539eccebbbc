//! Pure reward rules.
//!
//! # Responsibility
//! - Map habit/task attributes to XP awards.
//! - Map streak length to bonus XP.
//! - Relate accumulated XP to level numbers.
//!
//! # Invariants
//! - Every function here is total: out-of-domain input degrades to the
//!   documented default instead of failing.
//! - No function here touches storage or the clock.

pub mod experience;
pub mod level;
pub mod streak;

pub use experience::{base_xp, habit_completion_xp, task_xp};
pub use level::{experience_for_level, level_for_experience, level_progress, LevelProgress};
pub use streak::streak_bonus;
