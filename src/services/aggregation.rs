//! News aggregation job and its scheduler loop
//!
//! One run polls either a single source or every active source. Failures of
//! one source are recorded on that source and never abort the cycle; only a
//! failing store does, since nothing can be persisted without it.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::source::{Source, SourceConfig, SourceKind},
    providers::NewsProvider,
    repository::{sources::PollMark, Repository},
};

pub struct AggregationJob {
    repository: Repository,
    registry: Arc<dyn NewsProvider>,
    default_item_limit: u32,
    cancel: CancellationToken,
    // Held for the duration of a cycle so runs never overlap
    running: Mutex<()>,
}

impl AggregationJob {
    pub fn new(
        repository: Repository,
        registry: Arc<dyn NewsProvider>,
        default_item_limit: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            repository,
            registry,
            default_item_limit,
            cancel,
            running: Mutex::new(()),
        }
    }

    /// Execute one aggregation cycle.
    ///
    /// With `target` set, only that source is polled (a missing or inactive
    /// source is a logged no-op). Per-source errors are recorded as that
    /// source's `last_error`; only database errors escape.
    pub async fn run(&self, target: Option<i32>) -> AppResult<()> {
        let _guard = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!("Aggregation cycle already in progress, skipping");
                return Ok(());
            }
        };

        let sources = match target {
            Some(id) => match self.repository.sources.find_by_id(id).await? {
                None => {
                    tracing::warn!("Source {} not found, nothing to aggregate", id);
                    return Ok(());
                }
                Some(source) if !source.active => {
                    tracing::info!("Source {} is inactive, aggregation skipped", id);
                    return Ok(());
                }
                Some(source) => vec![source],
            },
            None => self.repository.sources.list_active().await?,
        };

        tracing::debug!("Starting aggregation cycle over {} source(s)", sources.len());

        let mut marks = Vec::with_capacity(sources.len());
        for source in &sources {
            if self.cancel.is_cancelled() {
                tracing::info!("Aggregation cancelled, stopping after {} mark(s)", marks.len());
                break;
            }
            if let Some(mark) = self.poll_source(source).await? {
                marks.push(mark);
            }
        }

        // One durable commit for the whole cycle's bookkeeping
        self.repository.sources.flush_poll_marks(&marks).await?;
        tracing::debug!("Aggregation cycle finished");
        Ok(())
    }

    /// Poll one source. Returns the bookkeeping mark to record, or `None`
    /// when the source is skipped entirely (unknown kind). Database errors
    /// propagate; everything else is folded into the mark.
    async fn poll_source(&self, source: &Source) -> AppResult<Option<PollMark>> {
        tracing::debug!(
            "Polling source {} (id: {}, kind: {})",
            source.name,
            source.id,
            source.kind
        );

        let kind = match SourceKind::from_str(&source.kind) {
            Ok(kind) => kind,
            Err(_) => {
                tracing::warn!(
                    "Unknown source kind '{}' for source {}, skipping",
                    source.kind,
                    source.id
                );
                return Ok(None);
            }
        };

        // A broken stored config is recorded as the source's error so that
        // operators can see the source is wedged.
        let config = match SourceConfig::decode(kind, &source.config, self.default_item_limit) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Invalid config for source {} (id: {}): {}",
                    source.name,
                    source.id,
                    err
                );
                return Ok(Some(PollMark::Errored {
                    source_id: source.id,
                    at: Utc::now(),
                    message: err.to_string(),
                }));
            }
        };

        match self.registry.fetch(&config).await {
            Ok(mut items) => {
                for item in &mut items {
                    item.source_id = source.id;
                }
                if !items.is_empty() {
                    let inserted = self.repository.articles.save_new(&items).await?;
                    tracing::debug!(
                        "Source {} returned {} item(s), {} new",
                        source.name,
                        items.len(),
                        inserted
                    );
                } else {
                    tracing::debug!("Source {} returned no items", source.name);
                }
                // A poll that found nothing new is still a successful poll
                Ok(Some(PollMark::Polled {
                    source_id: source.id,
                    at: Utc::now(),
                }))
            }
            Err(AppError::Database(e)) => Err(AppError::Database(e)),
            Err(err) => {
                tracing::error!(
                    "Failed to poll source {} (id: {}): {}",
                    source.name,
                    source.id,
                    err
                );
                Ok(Some(PollMark::Errored {
                    source_id: source.id,
                    at: Utc::now(),
                    message: err.to_string(),
                }))
            }
        }
    }
}

/// Drive the aggregation job once immediately and then on a fixed interval,
/// until the token is cancelled. Ticks that would overlap a running cycle
/// are skipped, never queued.
pub async fn run_scheduler(job: Arc<AggregationJob>, interval: Duration, cancel: CancellationToken) {
    tracing::info!("Aggregation scheduler started, interval {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Aggregation scheduler stopped");
                break;
            }
            _ = ticker.tick() => {
                if let Err(err) = job.run(None).await {
                    tracing::error!("Aggregation cycle failed: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::article::NewArticle;
    use crate::providers::MockNewsProvider;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    async fn test_repository() -> Repository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");
        Repository::new(pool)
    }

    fn candidate(item_id: &str) -> NewArticle {
        NewArticle {
            title: format!("title {item_id}"),
            body: "body".to_string(),
            link: format!("https://example.com/{item_id}"),
            published_at: Utc::now(),
            author: None,
            image_url: None,
            category: None,
            metadata: None,
            indexed_at: Utc::now(),
            source_id: 0,
            source_item_id: item_id.to_string(),
        }
    }

    async fn create_feed_source(repository: &Repository, name: &str, url: &str) -> i32 {
        repository
            .sources
            .create(name, "rss", &json!({ "url": url, "limit": 5 }), true)
            .await
            .expect("Failed to create test source")
            .id
    }

    // Requires a live Postgres; run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn one_failing_source_does_not_abort_the_cycle() {
        let repository = test_repository().await;
        let good_a =
            create_feed_source(&repository, "good-a", "https://example.com/a.xml").await;
        let bad = create_feed_source(&repository, "bad", "https://bad.example.com/rss").await;
        let good_b =
            create_feed_source(&repository, "good-b", "https://example.com/b.xml").await;

        let mut registry = MockNewsProvider::new();
        registry.expect_fetch().returning(|config| match config {
            SourceConfig::Rss(rss) if rss.url.contains("bad.example.com") => {
                Err(AppError::Provider("feed unreachable".to_string()))
            }
            _ => Ok(vec![candidate("item-1")]),
        });

        let job = AggregationJob::new(
            repository.clone(),
            Arc::new(registry),
            10,
            CancellationToken::new(),
        );

        job.run(None).await.expect("run must not propagate provider errors");

        let polled_a = repository.sources.get_by_id(good_a).await.unwrap();
        let failed = repository.sources.get_by_id(bad).await.unwrap();
        let polled_b = repository.sources.get_by_id(good_b).await.unwrap();

        assert!(polled_a.last_polled_at.is_some());
        assert!(polled_b.last_polled_at.is_some());
        assert!(failed.last_error_at.is_some());
        assert!(failed.last_error.as_deref().unwrap().contains("feed unreachable"));

        for id in [good_a, bad, good_b] {
            repository.sources.delete(id).await.unwrap();
        }
    }

    #[tokio::test]
    #[ignore]
    async fn second_identical_cycle_inserts_nothing_but_still_polls() {
        let repository = test_repository().await;
        let source_id =
            create_feed_source(&repository, "steady-feed", "https://example.com/rss").await;

        let mut registry = MockNewsProvider::new();
        registry
            .expect_fetch()
            .returning(|_| Ok((0..5).map(|i| candidate(&format!("item-{i}"))).collect()));

        let job = AggregationJob::new(
            repository.clone(),
            Arc::new(registry),
            10,
            CancellationToken::new(),
        );

        job.run(Some(source_id)).await.unwrap();
        let first_poll = repository
            .sources
            .get_by_id(source_id)
            .await
            .unwrap()
            .last_polled_at
            .unwrap();

        job.run(Some(source_id)).await.unwrap();
        let source = repository.sources.get_by_id(source_id).await.unwrap();
        assert!(source.last_polled_at.unwrap() >= first_poll);

        let stored = repository
            .articles
            .query_latest(&crate::repository::articles::ArticleFilter {
                limit: 50,
                offset: 0,
                source_ids: Some(vec![source_id]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(stored.len(), 5);

        repository.sources.delete(source_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn broken_config_is_recorded_as_the_sources_error() {
        let repository = test_repository().await;
        let source_id = repository
            .sources
            .create("broken", "rss", &json!({ "limit": 5 }), true)
            .await
            .unwrap()
            .id;

        let mut registry = MockNewsProvider::new();
        registry.expect_fetch().never();

        let job = AggregationJob::new(
            repository.clone(),
            Arc::new(registry),
            10,
            CancellationToken::new(),
        );
        job.run(Some(source_id)).await.unwrap();

        let source = repository.sources.get_by_id(source_id).await.unwrap();
        assert!(source.last_error.is_some());
        assert!(source.last_polled_at.is_none());

        repository.sources.delete(source_id).await.unwrap();
    }
}
