//! Source management: CRUD plus the immediate post-mutation refresh

use std::str::FromStr;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::source::{CreateSource, Source, SourceConfig, SourceKind},
    repository::Repository,
    services::aggregation::AggregationJob,
};

#[derive(Clone)]
pub struct SourcesService {
    repository: Repository,
    job: Arc<AggregationJob>,
    default_item_limit: u32,
}

impl SourcesService {
    pub fn new(repository: Repository, job: Arc<AggregationJob>, default_item_limit: u32) -> Self {
        Self {
            repository,
            job,
            default_item_limit,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Source>> {
        self.repository.sources.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Source> {
        self.repository.sources.get_by_id(id).await
    }

    /// Create a source after validating its kind and configuration, then
    /// kick off an immediate poll so that articles show up without waiting
    /// for the next scheduled cycle.
    pub async fn create(&self, request: CreateSource) -> AppResult<Source> {
        let (kind, config) = self.check_definition(&request)?;
        let source = self
            .repository
            .sources
            .create(
                request.name.trim(),
                &kind.to_string(),
                &config,
                request.active,
            )
            .await?;
        self.refresh_best_effort(source.id).await;
        Ok(source)
    }

    pub async fn update(&self, id: i32, request: CreateSource) -> AppResult<Source> {
        let (kind, config) = self.check_definition(&request)?;
        let source = self
            .repository
            .sources
            .update(
                id,
                request.name.trim(),
                &kind.to_string(),
                &config,
                request.active,
            )
            .await?;
        self.refresh_best_effort(source.id).await;
        Ok(source)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.sources.delete(id).await
    }

    /// All sources plus the distinct category labels their configs carry,
    /// for building client-side filters.
    pub async fn filter_options(&self) -> AppResult<(Vec<Source>, Vec<String>)> {
        let sources = self.repository.sources.list().await?;
        let categories = distinct_categories(&sources);
        Ok((sources, categories))
    }

    /// Run the aggregation job for this source right now.
    pub async fn refresh(&self, id: i32) -> AppResult<Source> {
        // Existence check first, so a bogus id is a 404 and not a silent no-op
        self.repository.sources.get_by_id(id).await?;
        self.job.run(Some(id)).await?;
        self.repository.sources.get_by_id(id).await
    }

    /// Validate a source definition and return the canonical kind plus the
    /// document to store. The stored document keeps the caller's limit field
    /// as-is (including zero, which means "follow the server default").
    fn check_definition(
        &self,
        request: &CreateSource,
    ) -> AppResult<(SourceKind, serde_json::Value)> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }

        let kind = SourceKind::from_str(&request.kind)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut config = request.config.clone();
        if kind == SourceKind::Rss {
            normalize_feed_url(&mut config);
        }

        // Decode proves the document is usable before it is persisted
        SourceConfig::decode(kind, &config, self.default_item_limit)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok((kind, config))
    }

    async fn refresh_best_effort(&self, id: i32) {
        if let Err(err) = self.job.run(Some(id)).await {
            tracing::warn!("Immediate poll of source {} failed: {}", id, err);
        }
    }
}

/// Distinct category labels across source configs, in source order.
/// Feed and subreddit sources contribute their configured category; event
/// sources are grouped under "GitHub". A broken config is skipped, not fatal.
fn distinct_categories(sources: &[Source]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for source in sources {
        let category = match SourceKind::from_str(&source.kind) {
            Ok(SourceKind::Rss) => serde_json::from_value::<crate::models::source::RssConfig>(
                source.config.clone(),
            )
            .ok()
            .and_then(|c| c.category),
            Ok(SourceKind::Reddit) => {
                serde_json::from_value::<crate::models::source::RedditConfig>(
                    source.config.clone(),
                )
                .ok()
                .and_then(|c| c.category)
            }
            Ok(SourceKind::GitHub) => Some("GitHub".to_string()),
            Err(_) => {
                tracing::warn!(
                    "Unknown kind '{}' for source {}, not counted in filters",
                    source.kind,
                    source.id
                );
                None
            }
        };
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
    }
    categories
}

/// Trim the configured feed URL and default its scheme to https.
fn normalize_feed_url(config: &mut serde_json::Value) {
    let Some(url) = config.get("url").and_then(|u| u.as_str()) else {
        return;
    };
    let trimmed = url.trim();
    let normalized = if trimmed.is_empty() || trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    config["url"] = serde_json::Value::String(normalized);
}
