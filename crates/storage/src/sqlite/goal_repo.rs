use async_trait::async_trait;
use drill_core::model::{GoalState, UserId};

use super::{SqliteRepository, mapping::map_goal_row};
use crate::repository::{GoalRepository, StorageError};

#[async_trait]
impl GoalRepository for SqliteRepository {
    async fn load_goal_state(&self, user: &UserId) -> Result<Option<GoalState>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT target_goal, current_progress, last_progress_date
            FROM goal_states
            WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_goal_row).transpose()
    }

    async fn save_goal_state(&self, user: &UserId, state: &GoalState) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO goal_states (user_id, target_goal, current_progress, last_progress_date)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                target_goal = excluded.target_goal,
                current_progress = excluded.current_progress,
                last_progress_date = excluded.last_progress_date
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(state.target_goal))
        .bind(i64::from(state.current_progress))
        .bind(state.last_progress_date)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
