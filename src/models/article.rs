//! Article model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A stored, normalized content record pulled from one source.
///
/// Articles are immutable after insertion and are removed only when their
/// owning source is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    /// Opaque provider-specific extras (e.g. commit SHA / PR number), JSON-encoded
    pub metadata: Option<String>,
    pub indexed_at: DateTime<Utc>,
    pub source_id: i32,
    /// The provider's own identifier for this item; unique per source
    pub source_item_id: String,
}

/// An insert candidate produced by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub metadata: Option<String>,
    pub indexed_at: DateTime<Utc>,
    /// Stamped with the owning source's id by the aggregation job; providers
    /// leave it at zero.
    pub source_id: i32,
    pub source_item_id: String,
}
