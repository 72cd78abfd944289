//! Error types for dataset construction.

use thiserror::Error;

/// Failures detected while building or loading a goal dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("goal {name:?} has an inverted day range [{low}, {high})")]
    InvertedGoalRange { name: String, low: f32, high: f32 },

    #[error("habit {habit:?} of goal {goal:?} has an inverted day range [{low}, {high})")]
    InvertedHabitRange {
        goal: String,
        habit: String,
        low: f32,
        high: f32,
    },

    #[error("goal name {0:?} appears more than once")]
    DuplicateGoal(String),

    #[error("goal at position {0} has an empty name")]
    EmptyName(usize),

    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
}
