use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Applies pending schema versions in order, recording each in `schema_migrations`.
///
/// Version 1 holds per-user card pools and daily goal states. Version 2 adds
/// the blanked form so exports can restore the exact sentence.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        // One row per card; `position` keeps the pool order stable across saves.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS card_pools (
                    user_id TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    card_id TEXT NOT NULL,
                    prompt TEXT NOT NULL,
                    answer TEXT NOT NULL,
                    translation TEXT NOT NULL DEFAULT '',
                    sentence_translation TEXT NOT NULL DEFAULT '',
                    session_progress INTEGER NOT NULL,
                    mastery_level INTEGER NOT NULL,
                    session_completed INTEGER NOT NULL,
                    last_practiced TEXT,
                    scheduling_metadata TEXT NOT NULL,
                    PRIMARY KEY (user_id, position)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS goal_states (
                    user_id TEXT PRIMARY KEY,
                    target_goal INTEGER NOT NULL CHECK (target_goal > 0),
                    current_progress INTEGER NOT NULL CHECK (current_progress >= 0),
                    last_progress_date TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_card_pools_user_card
                    ON card_pools (user_id, card_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        record_version(&mut tx, 1).await?;

        tx.commit().await?;
        info!(version = 1, "applied schema migration");
    }

    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query("ALTER TABLE card_pools ADD COLUMN blanked_form TEXT")
            .execute(&mut *tx)
            .await?;
        record_version(&mut tx, 2).await?;

        tx.commit().await?;
        info!(version = 2, "applied schema migration");
    }

    Ok(())
}

async fn record_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    version: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(version)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
