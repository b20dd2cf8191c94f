use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-user daily counter of correct answers and the target that ends the loop.
///
/// The counter belongs to a calendar day (`last_progress_date`) and is only
/// meaningful after a rollover check against the current day; see
/// [`crate::daily_goal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalState {
    pub target_goal: u32,
    pub current_progress: u32,
    pub last_progress_date: NaiveDate,
}

impl GoalState {
    /// Default state for a user that never practiced: empty counter stamped `today`.
    #[must_use]
    pub fn new(target_goal: u32, today: NaiveDate) -> Self {
        Self {
            target_goal: target_goal.max(1),
            current_progress: 0,
            last_progress_date: today,
        }
    }

    /// Completion percentage, rounded and not capped at 100.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self) -> u32 {
        if self.target_goal == 0 {
            return 0;
        }
        let pct = f64::from(self.current_progress) / f64::from(self.target_goal) * 100.0;
        pct.round() as u32
    }

    /// Correct answers still needed today.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.target_goal.saturating_sub(self.current_progress)
    }
}
