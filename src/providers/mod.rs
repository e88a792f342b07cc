//! Per-kind content providers (fetch + normalize) and their dispatch

pub mod github;
pub mod reddit;
pub mod rss;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{article::NewArticle, source::SourceConfig},
};

pub use github::GitHubProvider;
pub use reddit::RedditProvider;
pub use rss::RssProvider;

/// Capability contract consumed by the aggregation job: fetch raw content for
/// one typed source configuration and return normalized candidates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch(&self, config: &SourceConfig) -> AppResult<Vec<NewArticle>>;
}

/// Routes a decoded configuration to the provider able to handle it.
///
/// Unknown kinds are rejected earlier, when the stored `kind` string is
/// parsed into [`crate::models::source::SourceKind`]; by the time a
/// [`SourceConfig`] exists there is exactly one matching provider.
pub struct ProviderRegistry {
    rss: RssProvider,
    github: GitHubProvider,
    reddit: RedditProvider,
}

impl ProviderRegistry {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            rss: RssProvider::new(http.clone()),
            github: GitHubProvider::new(http.clone()),
            reddit: RedditProvider::new(http),
        }
    }
}

#[async_trait]
impl NewsProvider for ProviderRegistry {
    async fn fetch(&self, config: &SourceConfig) -> AppResult<Vec<NewArticle>> {
        match config {
            SourceConfig::Rss(cfg) => self.rss.fetch(cfg).await,
            SourceConfig::GitHub(cfg) => self.github.fetch(cfg).await,
            SourceConfig::Reddit(cfg) => self.reddit.fetch(cfg).await,
        }
    }
}
