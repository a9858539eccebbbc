//! Streak bonus curve.
//!
//! Three linear regimes: 2 XP/day below one week, 3 XP/day up to a month,
//! 5 XP/day after. The additive constants keep the curve continuous at the
//! 7 and 30 day breakpoints.

const WEEK: i64 = 7;
const MONTH: i64 = 30;
const WEEK_BONUS: i64 = 14;
const MONTH_EXTRA_BONUS: i64 = 69;

/// Returns bonus XP for a streak of the given length.
///
/// Non-positive streaks earn nothing.
pub fn streak_bonus(streak: i64) -> i64 {
    if streak <= 0 {
        0
    } else if streak < WEEK {
        streak * 2
    } else if streak < MONTH {
        WEEK_BONUS + (streak - WEEK) * 3
    } else {
        WEEK_BONUS + MONTH_EXTRA_BONUS + (streak - MONTH) * 5
    }
}

#[cfg(test)]
mod tests {
    use super::streak_bonus;

    #[test]
    fn non_positive_streak_has_no_bonus() {
        assert_eq!(streak_bonus(0), 0);
        assert_eq!(streak_bonus(-4), 0);
    }

    #[test]
    fn boundaries_are_continuous() {
        assert_eq!(streak_bonus(1), 2);
        assert_eq!(streak_bonus(6), 12);
        assert_eq!(streak_bonus(7), 14);
        assert_eq!(streak_bonus(29), 80);
        assert_eq!(streak_bonus(30), 83);
        assert_eq!(streak_bonus(31), 88);
    }

    #[test]
    fn bonus_never_decreases() {
        let mut previous = streak_bonus(0);
        for streak in 1..=120 {
            let current = streak_bonus(streak);
            assert!(current >= previous, "bonus dropped at streak {streak}");
            previous = current;
        }
    }
}
