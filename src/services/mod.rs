//! Business logic services

pub mod aggregation;
pub mod news;
pub mod sources;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    config::AggregationConfig,
    error::{AppError, AppResult},
    providers::ProviderRegistry,
    repository::Repository,
};

const USER_AGENT: &str = concat!("newsdesk-server/", env!("CARGO_PKG_VERSION"));

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub sources: sources::SourcesService,
    pub news: news::NewsService,
    pub aggregation: Arc<aggregation::AggregationJob>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        aggregation_config: &AggregationConfig,
        cancel: CancellationToken,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(aggregation_config.http_timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let registry = Arc::new(ProviderRegistry::new(http));
        let job = Arc::new(aggregation::AggregationJob::new(
            repository.clone(),
            registry,
            aggregation_config.default_item_limit,
            cancel,
        ));

        Ok(Self {
            sources: sources::SourcesService::new(
                repository.clone(),
                job.clone(),
                aggregation_config.default_item_limit,
            ),
            news: news::NewsService::new(repository),
            aggregation: job,
        })
    }
}
