//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into gamification use-cases.
//! - Keep CLI and other callers decoupled from storage details.

pub mod error;
pub mod gamification_service;
pub mod reconcile;

pub use error::EngineError;
pub use gamification_service::{
    CreatedHabit, EngineResult, ExperienceUpdate, GamificationService, HabitCompletionOutcome,
    HabitDraft, TaskCompletionOutcome, TaskDraft,
};
pub use reconcile::{Reconciliation, UserStats};
