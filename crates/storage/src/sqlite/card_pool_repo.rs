use drill_core::model::{Card, UserId};
use tracing::debug;

use super::{
    SqliteRepository,
    mapping::{map_card_row, metadata_to_text, position_to_i64},
};
use crate::repository::{CardPoolRepository, StorageError};

#[async_trait::async_trait]
impl CardPoolRepository for SqliteRepository {
    async fn load_card_pool(&self, user: &UserId) -> Result<Vec<Card>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                card_id, prompt, answer, translation, sentence_translation,
                blanked_form, session_progress, mastery_level, session_completed,
                last_practiced, scheduling_metadata
            FROM card_pools
            WHERE user_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut cards = Vec::with_capacity(rows.len());
        for row in rows {
            cards.push(map_card_row(&row)?);
        }
        Ok(cards)
    }

    async fn save_card_pool(&self, user: &UserId, cards: &[Card]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM card_pools WHERE user_id = ?1")
            .bind(user.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, card) in cards.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO card_pools (
                    user_id, position, card_id, prompt, answer, translation,
                    sentence_translation, blanked_form, session_progress,
                    mastery_level, session_completed, last_practiced,
                    scheduling_metadata
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ",
            )
            .bind(user.as_str())
            .bind(position_to_i64(position)?)
            .bind(card.id().as_str())
            .bind(card.prompt())
            .bind(card.answer())
            .bind(card.translation())
            .bind(card.sentence_translation())
            .bind(card.blanked_form())
            .bind(i64::from(card.session_progress()))
            .bind(i64::from(card.mastery_level()))
            .bind(card.session_completed())
            .bind(card.last_practiced())
            .bind(metadata_to_text(card.scheduling_metadata())?)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        debug!(user_id = %user, cards = cards.len(), "saved card pool");
        Ok(())
    }
}
