//! Progressive level curve.
//!
//! # Invariants
//! - `experience_for_level(1) == 0`.
//! - `level_for_experience(experience_for_level(l)) == l` for every `l >= 1`.
//! - `level_for_experience` is monotonic non-decreasing.

use serde::Serialize;

const LEVEL_BASE_XP: f64 = 100.0;
const LEVEL_EXPONENT: f64 = 1.5;
/// Upper bound for the level search; the curve saturates `i64` well below it.
const LEVEL_SEARCH_CEILING: i64 = 1 << 40;

/// Position of an XP total inside its current level band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: i64,
    /// XP earned since reaching `level`.
    pub xp_into_level: i64,
    /// XP still missing for `level + 1`.
    pub xp_to_next_level: i64,
    /// Whole-number share of the current band, clamped to `0..=100`.
    pub percent: u8,
}

/// Total XP required to reach `level`.
pub fn experience_for_level(level: i64) -> i64 {
    if level <= 1 {
        return 0;
    }
    (LEVEL_BASE_XP * ((level - 1) as f64).powf(LEVEL_EXPONENT)).floor() as i64
}

/// Level reached with `experience` total XP.
pub fn level_for_experience(experience: i64) -> i64 {
    if experience <= 0 {
        return 1;
    }

    // Largest level whose threshold is within `experience`.
    let (mut low, mut high) = (1, LEVEL_SEARCH_CEILING);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if experience_for_level(mid) <= experience {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    low
}

/// Projects an XP total onto the current level band.
pub fn level_progress(experience: i64) -> LevelProgress {
    let experience = experience.max(0);
    let level = level_for_experience(experience);
    let floor = experience_for_level(level);
    let ceiling = experience_for_level(level + 1);
    let band = (ceiling - floor).max(1);
    let xp_into_level = experience - floor;
    let percent = ((xp_into_level * 100) / band).clamp(0, 100) as u8;

    LevelProgress {
        level,
        xp_into_level,
        xp_to_next_level: ceiling - experience,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::{experience_for_level, level_for_experience, level_progress};

    #[test]
    fn known_thresholds() {
        assert_eq!(experience_for_level(0), 0);
        assert_eq!(experience_for_level(1), 0);
        assert_eq!(experience_for_level(2), 100);
        assert_eq!(experience_for_level(5), 800);
        assert_eq!(experience_for_level(10), 2700);
    }

    #[test]
    fn level_round_trips_through_threshold() {
        for level in 1..=100 {
            assert_eq!(level_for_experience(experience_for_level(level)), level);
        }
    }

    #[test]
    fn one_below_threshold_stays_on_previous_level() {
        for level in 2..=50 {
            assert_eq!(level_for_experience(experience_for_level(level) - 1), level - 1);
        }
    }

    #[test]
    fn level_is_monotonic() {
        let mut previous = level_for_experience(-10);
        for xp in -10..=30_000 {
            let current = level_for_experience(xp);
            assert!(current >= previous, "level dropped at xp {xp}");
            previous = current;
        }
    }

    #[test]
    fn huge_experience_resolves_without_scanning() {
        let level = 1_000_000;
        assert_eq!(level_for_experience(experience_for_level(level)), level);
        assert_eq!(level_for_experience(experience_for_level(level) - 1), level - 1);

        let near_max = level_for_experience(i64::MAX / 2);
        assert!(experience_for_level(near_max) <= i64::MAX / 2);
        assert!(experience_for_level(near_max + 1) > i64::MAX / 2);
        assert!(level_for_experience(i64::MAX) >= near_max);
    }

    #[test]
    fn progress_splits_band() {
        let progress = level_progress(150);
        assert_eq!(progress.level, 2);
        // Level 3 starts at floor(100 * 2^1.5) = 282.
        assert_eq!(progress.xp_into_level, 50);
        assert_eq!(progress.xp_to_next_level, 132);
        assert_eq!(progress.percent, 27);
    }

    #[test]
    fn progress_at_zero() {
        let progress = level_progress(0);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.xp_into_level, 0);
        assert_eq!(progress.xp_to_next_level, 100);
        assert_eq!(progress.percent, 0);
    }
}
