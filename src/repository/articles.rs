//! Articles repository: dedup insert and filtered reads

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::article::{Article, NewArticle},
};

/// Filters for the latest-articles query. All filters compose with AND
/// semantics; `None` means "no restriction".
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub source_ids: Option<Vec<i32>>,
    pub categories: Option<Vec<String>>,
    pub source_kind: Option<String>,
}

#[derive(Clone)]
pub struct ArticlesRepository {
    pool: Pool<Postgres>,
}

impl ArticlesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert the candidates whose `(source_id, source_item_id)` pair is not
    /// already stored. Duplicates are dropped by the unique index, never
    /// surfaced as errors. Returns the number of rows actually inserted.
    pub async fn save_new(&self, candidates: &[NewArticle]) -> AppResult<u64> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for article in candidates {
            let result = sqlx::query(
                r#"
                INSERT INTO articles (
                    title, body, link, published_at, author, image_url,
                    category, metadata, indexed_at, source_id, source_item_id
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (source_id, source_item_id) DO NOTHING
                "#,
            )
            .bind(&article.title)
            .bind(&article.body)
            .bind(&article.link)
            .bind(article.published_at)
            .bind(&article.author)
            .bind(&article.image_url)
            .bind(&article.category)
            .bind(&article.metadata)
            .bind(article.indexed_at)
            .bind(article.source_id)
            .bind(&article.source_item_id)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Latest articles ordered by publication time, newest first.
    pub async fn query_latest(&self, filter: &ArticleFilter) -> AppResult<Vec<Article>> {
        // Search text is a literal substring, never a pattern
        let search = filter.search.as_deref().map(escape_like);
        let rows = sqlx::query_as::<_, Article>(
            r#"
            SELECT a.*
            FROM articles a
            JOIN sources s ON s.id = a.source_id
            WHERE ($1::text IS NULL OR a.title ILIKE '%' || $1 || '%' OR a.body ILIKE '%' || $1 || '%')
              AND ($2::timestamptz IS NULL OR a.published_at >= $2)
              AND ($3::int[] IS NULL OR a.source_id = ANY($3))
              AND ($4::text[] IS NULL OR a.category = ANY($4))
              AND ($5::text IS NULL OR lower(s.kind) = lower($5))
            ORDER BY a.published_at DESC
            OFFSET $6 LIMIT $7
            "#,
        )
        .bind(&search)
        .bind(filter.from)
        .bind(&filter.source_ids)
        .bind(&filter.categories)
        .bind(&filter.source_kind)
        .bind(filter.offset)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Escape LIKE metacharacters so bound search text matches literally.
/// Backslash is the Postgres default escape character.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
