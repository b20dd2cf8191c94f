//! Daily goal controller.
//!
//! Every function is a pure transition over [`GoalState`]. Rollover is lazy:
//! each operation first compares the stored day with `today` and zeroes the
//! counter when the day has moved on, so no timer is involved.

use chrono::NaiveDate;
use tracing::info;

use crate::model::GoalState;

/// Reset the counter when `today` differs from the stored day.
#[must_use]
pub fn check_rollover(state: &GoalState, today: NaiveDate) -> GoalState {
    if state.last_progress_date == today {
        return *state;
    }

    info!(
        from = %state.last_progress_date,
        to = %today,
        dropped = state.current_progress,
        "daily goal rolled over"
    );
    GoalState {
        target_goal: state.target_goal,
        current_progress: 0,
        last_progress_date: today,
    }
}

/// Count one correct answer for `today`.
#[must_use]
pub fn record_correct_answer(state: &GoalState, today: NaiveDate) -> GoalState {
    let rolled = check_rollover(state, today);
    GoalState {
        current_progress: rolled.current_progress.saturating_add(1),
        last_progress_date: today,
        ..rolled
    }
}

/// Change the target, restarting today's count.
///
/// Non-positive goals are replaced by `default_goal`.
#[must_use]
pub fn set_goal(state: &GoalState, goal: i64, default_goal: u32, today: NaiveDate) -> GoalState {
    let rolled = check_rollover(state, today);
    GoalState {
        target_goal: validate_goal(goal, default_goal),
        current_progress: 0,
        ..rolled
    }
}

/// Zero today's count without touching the target.
#[must_use]
pub fn reset_progress(state: &GoalState, today: NaiveDate) -> GoalState {
    GoalState {
        target_goal: state.target_goal,
        current_progress: 0,
        last_progress_date: today,
    }
}

#[must_use]
pub fn is_cycle_complete(state: &GoalState) -> bool {
    state.current_progress >= state.target_goal
}

/// Accept positive goals that fit in `u32`; anything else becomes `default_goal`.
#[must_use]
pub fn validate_goal(goal: i64, default_goal: u32) -> u32 {
    match u32::try_from(goal) {
        Ok(g) if g > 0 => g,
        _ => default_goal.max(1),
    }
}

/// Parse a user-entered goal, falling back to `default_goal` for anything invalid.
#[must_use]
pub fn parse_goal(raw: &str, default_goal: u32) -> u32 {
    raw.trim()
        .parse::<i64>()
        .map_or(default_goal.max(1), |g| validate_goal(g, default_goal))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
