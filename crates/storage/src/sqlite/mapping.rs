use chrono::{DateTime, NaiveDate, Utc};
use drill_core::model::{Card, CardId, GoalState, PersistedCard, SchedulingMetadata};
use sqlx::Row;
use tracing::warn;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn metadata_to_text(metadata: &SchedulingMetadata) -> Result<String, StorageError> {
    serde_json::to_string(metadata).map_err(ser)
}

pub(crate) fn metadata_from_text(raw: &str) -> Result<SchedulingMetadata, StorageError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(ser)?;
    Ok(SchedulingMetadata::from_value(value))
}

pub(crate) fn position_to_i64(position: usize) -> Result<i64, StorageError> {
    i64::try_from(position).map_err(|_| StorageError::Serialization("position overflow".into()))
}

/// Rebuild a card from a `card_pools` row.
///
/// Progress columns go through [`Card::from_persisted`], so rows edited by hand
/// with out-of-range values load clamped instead of failing.
pub(crate) fn map_card_row(row: &sqlx::sqlite::SqliteRow) -> Result<Card, StorageError> {
    let metadata_raw: String = row.try_get("scheduling_metadata").map_err(ser)?;
    let last_practiced: Option<DateTime<Utc>> = row.try_get("last_practiced").map_err(ser)?;

    Ok(Card::from_persisted(PersistedCard {
        id: CardId::new(row.try_get::<String, _>("card_id").map_err(ser)?),
        prompt: row.try_get("prompt").map_err(ser)?,
        answer: row.try_get("answer").map_err(ser)?,
        translation: row.try_get("translation").map_err(ser)?,
        sentence_translation: row.try_get("sentence_translation").map_err(ser)?,
        blanked_form: row.try_get("blanked_form").map_err(ser)?,
        session_progress: row.try_get("session_progress").map_err(ser)?,
        mastery_level: row.try_get("mastery_level").map_err(ser)?,
        session_completed: row.try_get("session_completed").map_err(ser)?,
        last_practiced,
        scheduling_metadata: metadata_from_text(&metadata_raw)?,
    }))
}

/// Clamp a stored counter into `[min, u32::MAX]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp_goal_value(value: i64, min: u32) -> u32 {
    value.clamp(i64::from(min), i64::from(u32::MAX)) as u32
}

/// Rebuild a goal state from a `goal_states` row, clamping counters into range.
pub(crate) fn map_goal_row(row: &sqlx::sqlite::SqliteRow) -> Result<GoalState, StorageError> {
    let raw_target: i64 = row.try_get("target_goal").map_err(ser)?;
    let raw_progress: i64 = row.try_get("current_progress").map_err(ser)?;
    let last_progress_date: NaiveDate = row.try_get("last_progress_date").map_err(ser)?;

    let target_goal = clamp_goal_value(raw_target, 1);
    let current_progress = clamp_goal_value(raw_progress, 0);
    if i64::from(target_goal) != raw_target || i64::from(current_progress) != raw_progress {
        warn!(
            target_goal = raw_target,
            current_progress = raw_progress,
            "clamped out-of-range goal state on load"
        );
    }

    Ok(GoalState {
        target_goal,
        current_progress,
        last_progress_date,
    })
}
