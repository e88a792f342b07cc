//! Sources repository

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::source::Source,
};

/// Bookkeeping mark recorded for a source during one aggregation cycle.
#[derive(Debug, Clone)]
pub enum PollMark {
    /// The poll attempt succeeded (independent of how many items were new)
    Polled { source_id: i32, at: DateTime<Utc> },
    /// The poll attempt failed with the given message
    Errored {
        source_id: i32,
        at: DateTime<Utc>,
        message: String,
    },
}

#[derive(Clone)]
pub struct SourcesRepository {
    pool: Pool<Postgres>,
}

impl SourcesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all sources
    pub async fn list(&self) -> AppResult<Vec<Source>> {
        let rows = sqlx::query_as::<_, Source>("SELECT * FROM sources ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// List sources that the scheduler should poll
    pub async fn list_active(&self) -> AppResult<Vec<Source>> {
        let rows = sqlx::query_as::<_, Source>(
            "SELECT * FROM sources WHERE active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get source by ID, failing when it does not exist
    pub async fn get_by_id(&self, id: i32) -> AppResult<Source> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Source {} not found", id)))
    }

    /// Get source by ID, returning None when it does not exist
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Source>> {
        let row = sqlx::query_as::<_, Source>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Create a new source
    pub async fn create(
        &self,
        name: &str,
        kind: &str,
        config: &serde_json::Value,
        active: bool,
    ) -> AppResult<Source> {
        let row = sqlx::query_as::<_, Source>(
            r#"
            INSERT INTO sources (name, kind, config, active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(kind)
        .bind(config)
        .bind(active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update a source definition
    pub async fn update(
        &self,
        id: i32,
        name: &str,
        kind: &str,
        config: &serde_json::Value,
        active: bool,
    ) -> AppResult<Source> {
        sqlx::query_as::<_, Source>(
            r#"
            UPDATE sources
            SET name = $1, kind = $2, config = $3, active = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(kind)
        .bind(config)
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Source {} not found", id)))
    }

    /// Delete a source; its articles go with it via the FK cascade
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Source {} not found", id)));
        }
        Ok(())
    }

    /// Flush the polled/error marks gathered during one aggregation cycle in
    /// a single transaction.
    pub async fn flush_poll_marks(&self, marks: &[PollMark]) -> AppResult<()> {
        if marks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for mark in marks {
            match mark {
                PollMark::Polled { source_id, at } => {
                    sqlx::query("UPDATE sources SET last_polled_at = $1 WHERE id = $2")
                        .bind(at)
                        .bind(source_id)
                        .execute(&mut *tx)
                        .await?;
                }
                PollMark::Errored {
                    source_id,
                    at,
                    message,
                } => {
                    sqlx::query(
                        "UPDATE sources SET last_error_at = $1, last_error = $2 WHERE id = $3",
                    )
                    .bind(at)
                    .bind(message)
                    .bind(source_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }
}
