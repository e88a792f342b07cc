//! Source model and typed per-kind configuration

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// A configured external content origin (one feed, one repository, one
/// subreddit).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Source {
    pub id: i32,
    pub name: String,
    /// Discriminator for the provider handling this source (`rss|github|reddit`)
    pub kind: String,
    /// Kind-specific configuration document; decoded into [`SourceConfig`]
    /// when the aggregation job runs
    #[schema(value_type = Object)]
    pub config: serde_json::Value,
    pub active: bool,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Supported source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Rss,
    GitHub,
    Reddit,
}

impl FromStr for SourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rss" => Ok(SourceKind::Rss),
            "github" => Ok(SourceKind::GitHub),
            "reddit" => Ok(SourceKind::Reddit),
            other => Err(AppError::Configuration(format!(
                "Unknown source kind: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Rss => "rss",
            SourceKind::GitHub => "github",
            SourceKind::Reddit => "reddit",
        };
        f.write_str(s)
    }
}

/// Subreddit listing order. Unknown values decode to `Hot` so that a stale
/// stored config cannot wedge a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Hot,
    New,
    Top,
}

impl<'de> Deserialize<'de> for SortMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.to_ascii_lowercase().as_str() {
            "new" => SortMode::New,
            "top" => SortMode::Top,
            _ => SortMode::Hot,
        })
    }
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Hot => "hot",
            SortMode::New => "new",
            SortMode::Top => "top",
        }
    }
}

/// RSS/Atom feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RssConfig {
    #[validate(url(message = "url must be a valid absolute URL"))]
    pub url: String,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// GitHub repository event stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GitHubConfig {
    #[validate(length(min = 1, message = "owner must not be empty"))]
    pub owner: String,
    #[validate(length(min = 1, message = "repo must not be empty"))]
    pub repo: String,
    /// Personal access token, applied to a single request at a time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub limit: u32,
    /// Event-type allowlist; empty or absent means all events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_types: Option<Vec<String>>,
}

/// Subreddit listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RedditConfig {
    #[validate(length(min = 1, message = "subreddit must not be empty"))]
    pub subreddit: String,
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Typed union of all per-kind configurations, decoded from a source's
/// `kind` column plus its stored JSON document.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SourceConfig {
    Rss(RssConfig),
    GitHub(GitHubConfig),
    Reddit(RedditConfig),
}

impl SourceConfig {
    /// Decode a stored configuration document into the variant matching
    /// `kind`, substituting `default_limit` when the document carries a
    /// zero/absent limit.
    pub fn decode(
        kind: SourceKind,
        raw: &serde_json::Value,
        default_limit: u32,
    ) -> AppResult<Self> {
        let decoded = match kind {
            SourceKind::Rss => {
                let mut cfg: RssConfig = serde_json::from_value(raw.clone())
                    .map_err(|e| AppError::Configuration(format!("Invalid rss config: {}", e)))?;
                if cfg.limit == 0 {
                    cfg.limit = default_limit;
                }
                SourceConfig::Rss(cfg)
            }
            SourceKind::GitHub => {
                let mut cfg: GitHubConfig = serde_json::from_value(raw.clone()).map_err(|e| {
                    AppError::Configuration(format!("Invalid github config: {}", e))
                })?;
                if cfg.limit == 0 {
                    cfg.limit = default_limit;
                }
                SourceConfig::GitHub(cfg)
            }
            SourceKind::Reddit => {
                let mut cfg: RedditConfig = serde_json::from_value(raw.clone()).map_err(|e| {
                    AppError::Configuration(format!("Invalid reddit config: {}", e))
                })?;
                if cfg.limit == 0 {
                    cfg.limit = default_limit;
                }
                SourceConfig::Reddit(cfg)
            }
        };
        decoded.validate()?;
        Ok(decoded)
    }

    fn validate(&self) -> AppResult<()> {
        let result = match self {
            SourceConfig::Rss(c) => c.validate(),
            SourceConfig::GitHub(c) => c.validate(),
            SourceConfig::Reddit(c) => c.validate(),
        };
        result.map_err(|e| AppError::Configuration(e.to_string()))
    }
}

/// Create/update source request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSource {
    pub name: String,
    pub kind: String,
    /// Kind-specific configuration document
    #[schema(value_type = Object)]
    pub config: serde_json::Value,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
