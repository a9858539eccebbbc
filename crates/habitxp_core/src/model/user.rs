//! User progress record.
//!
//! # Invariants
//! - `level == level_for_experience(experience)` after every persisted write.
//! - `experience` never decreases through engine operations.

use crate::gamification::level::level_for_experience;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Weight arithmetic is rounded to whole grams.
const GRAMS_PER_KG: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub uuid: UserId,
    pub display_name: String,
    pub level: i64,
    pub experience: i64,
    /// Kilograms; weight-loss achievements only apply when this is positive.
    pub starting_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserProgress {
    /// Creates a level 1 user with no experience.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            display_name: display_name.into(),
            level: 1,
            experience: 0,
            starting_weight: None,
            current_weight: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.experience < 0 {
            return Err(ValidationError::NegativeExperience(self.experience));
        }
        if self.level < 1 {
            return Err(ValidationError::LevelBelowOne(self.level));
        }
        for weight in [self.starting_weight, self.current_weight].into_iter().flatten() {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ValidationError::InvalidWeight(weight));
            }
        }
        Ok(())
    }

    /// Whether the stored level matches the level curve for stored XP.
    pub fn is_level_consistent(&self) -> bool {
        self.level == level_for_experience(self.experience)
    }

    /// Kilograms lost since the starting weight, rounded to the gram.
    ///
    /// `None` unless both weights are recorded and the starting weight is
    /// positive. Gains show up as negative values.
    pub fn weight_lost_kg(&self) -> Option<f64> {
        match (self.starting_weight, self.current_weight) {
            (Some(start), Some(current)) if start > 0.0 => {
                Some(((start - current) * GRAMS_PER_KG).round() / GRAMS_PER_KG)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UserProgress;

    #[test]
    fn new_user_is_consistent() {
        let user = UserProgress::new("ana");
        assert!(user.is_level_consistent());
        user.validate().unwrap();
    }

    #[test]
    fn weight_lost_requires_starting_weight() {
        let mut user = UserProgress::new("ana");
        user.current_weight = Some(74.9);
        assert_eq!(user.weight_lost_kg(), None);

        user.starting_weight = Some(80.0);
        assert_eq!(user.weight_lost_kg(), Some(5.1));
    }

    #[test]
    fn weight_lost_is_exact_at_whole_kilograms() {
        let mut user = UserProgress::new("ana");
        user.starting_weight = Some(64.1);
        user.current_weight = Some(59.1);
        assert_eq!(user.weight_lost_kg(), Some(5.0));

        user.current_weight = Some(66.35);
        assert_eq!(user.weight_lost_kg(), Some(-2.25));
    }

    #[test]
    fn drifted_level_is_detected() {
        let mut user = UserProgress::new("ana");
        user.experience = 150;
        assert!(!user.is_level_consistent());
        user.level = 2;
        assert!(user.is_level_consistent());
    }
}
