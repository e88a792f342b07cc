//! Reddit subreddit listing provider
//!
//! Reads the public JSON listing of a subreddit. A 429 from Reddit is
//! treated as "no new items this cycle", not as a source failure.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        article::NewArticle,
        source::{RedditConfig, SortMode},
    },
};

const REDDIT_API_BASE: &str = "https://www.reddit.com";

/// Listing size ceiling imposed by the provider.
const MAX_LIMIT: u32 = 100;

pub struct RedditProvider {
    http: reqwest::Client,
    base_url: String,
}

impl RedditProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: REDDIT_API_BASE.to_string(),
        }
    }

    pub async fn fetch(&self, config: &RedditConfig) -> AppResult<Vec<NewArticle>> {
        let url = self.listing_url(config);
        tracing::debug!(
            "Fetching r/{} (sort: {}, limit: {})",
            config.subreddit,
            config.sort.as_str(),
            config.limit
        );

        let response = self.http.get(&url).send().await.map_err(|e| {
            AppError::Provider(format!(
                "Failed to fetch r/{}: {}",
                config.subreddit, e
            ))
        })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(
                "Reddit rate-limited the request for r/{}; treating as empty",
                config.subreddit
            );
            return Ok(Vec::new());
        }

        let response = response.error_for_status().map_err(|e| {
            AppError::Provider(format!(
                "Reddit returned error for r/{}: {}",
                config.subreddit, e
            ))
        })?;

        let listing: RedditListing = response.json().await.map_err(|e| {
            AppError::Provider(format!(
                "Failed to parse Reddit listing for r/{}: {}",
                config.subreddit, e
            ))
        })?;

        let items = normalize_listing(listing, config);
        tracing::debug!("r/{} yielded {} post(s)", config.subreddit, items.len());
        Ok(items)
    }

    fn listing_url(&self, config: &RedditConfig) -> String {
        // Top listings without a time window are near-static; scope to a week
        let time_filter = match config.sort {
            SortMode::Top => "&t=week",
            _ => "",
        };
        format!(
            "{}/r/{}/{}.json?limit={}{}",
            self.base_url,
            config.subreddit,
            config.sort.as_str(),
            config.limit.min(MAX_LIMIT),
            time_filter
        )
    }
}

fn normalize_listing(listing: RedditListing, config: &RedditConfig) -> Vec<NewArticle> {
    listing
        .data
        .map(|d| d.children)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|child| child.data)
        .take(config.limit as usize)
        .map(|post| post_to_article(post, config.category.as_deref()))
        .collect()
}

fn post_to_article(post: RedditPost, category: Option<&str>) -> NewArticle {
    let link = match &post.url {
        Some(url) if url.starts_with("http") => url.clone(),
        _ => format!(
            "https://www.reddit.com{}",
            post.permalink.as_deref().unwrap_or_default()
        ),
    };

    let image_url = post
        .preview
        .as_ref()
        .and_then(|p| p.images.first())
        .and_then(|i| i.source.as_ref())
        .and_then(|s| s.url.as_ref())
        .map(|url| html_escape::decode_html_entities(url).to_string())
        .or_else(|| {
            post.thumbnail
                .as_ref()
                .filter(|t| t.starts_with("http"))
                .map(|t| html_escape::decode_html_entities(t).to_string())
        });

    NewArticle {
        title: post.title.unwrap_or_else(|| "Untitled".to_string()),
        body: post.selftext.unwrap_or_default(),
        link,
        published_at: DateTime::from_timestamp(post.created_utc as i64, 0)
            .unwrap_or_else(Utc::now),
        author: post.author,
        image_url,
        category: category
            .map(str::to_string)
            .or_else(|| Some("Reddit".to_string())),
        metadata: None,
        indexed_at: Utc::now(),
        source_id: 0,
        source_item_id: post.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: Option<RedditListingData>,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    #[serde(default)]
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: Option<RedditPost>,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    id: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    url: Option<String>,
    permalink: Option<String>,
    author: Option<String>,
    #[serde(default)]
    created_utc: f64,
    thumbnail: Option<String>,
    preview: Option<RedditPreview>,
}

#[derive(Debug, Deserialize)]
struct RedditPreview {
    #[serde(default)]
    images: Vec<RedditImage>,
}

#[derive(Debug, Deserialize)]
struct RedditImage {
    source: Option<RedditImageSource>,
}

#[derive(Debug, Deserialize)]
struct RedditImageSource {
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(limit: u32, sort: SortMode, category: Option<&str>) -> RedditConfig {
        RedditConfig {
            subreddit: "rust".to_string(),
            sort,
            limit,
            category: category.map(str::to_string),
        }
    }

    fn listing(posts: Vec<serde_json::Value>) -> RedditListing {
        serde_json::from_value(json!({ "data": { "children":
            posts.into_iter().map(|p| json!({ "data": p })).collect::<Vec<_>>()
        }}))
        .expect("fixture listing must deserialize")
    }

    fn post(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": "A post",
            "selftext": "text body",
            "url": "https://blog.example.com/article",
            "permalink": format!("/r/rust/comments/{id}/a_post/"),
            "author": "ferris",
            "created_utc": 1736157600.0,
        })
    }

    #[test]
    fn cap_is_enforced() {
        let posts = (0..9).map(|i| post(&i.to_string())).collect();
        let articles = normalize_listing(listing(posts), &config(4, SortMode::Hot, None));
        assert_eq!(articles.len(), 4);
    }

    #[test]
    fn listing_url_is_hard_ceilinged_and_sorted() {
        let provider = RedditProvider::new(reqwest::Client::new());
        let url = provider.listing_url(&config(500, SortMode::New, None));
        assert_eq!(url, "https://www.reddit.com/r/rust/new.json?limit=100");

        let url = provider.listing_url(&config(10, SortMode::Top, None));
        assert_eq!(url, "https://www.reddit.com/r/rust/top.json?limit=10&t=week");
    }

    #[test]
    fn external_url_wins_over_permalink() {
        let articles = normalize_listing(listing(vec![post("a")]), &config(10, SortMode::Hot, None));
        assert_eq!(articles[0].link, "https://blog.example.com/article");

        let mut self_post = post("b");
        self_post["url"] = json!("/r/rust/comments/b/a_post/");
        let articles =
            normalize_listing(listing(vec![self_post]), &config(10, SortMode::Hot, None));
        assert_eq!(
            articles[0].link,
            "https://www.reddit.com/r/rust/comments/b/a_post/"
        );
    }

    #[test]
    fn preview_image_is_entity_decoded() {
        let mut p = post("a");
        p["preview"] = json!({ "images": [
            { "source": { "url": "https://preview.example.com/img.jpg?width=640&amp;crop=smart" } }
        ]});
        let articles = normalize_listing(listing(vec![p]), &config(10, SortMode::Hot, None));
        assert_eq!(
            articles[0].image_url.as_deref(),
            Some("https://preview.example.com/img.jpg?width=640&crop=smart")
        );
    }

    #[test]
    fn thumbnail_is_used_only_when_it_is_a_url() {
        let mut p = post("a");
        p["thumbnail"] = json!("self");
        let articles = normalize_listing(listing(vec![p]), &config(10, SortMode::Hot, None));
        assert_eq!(articles[0].image_url, None);

        let mut p = post("b");
        p["thumbnail"] = json!("https://thumbs.example.com/t.png");
        let articles = normalize_listing(listing(vec![p]), &config(10, SortMode::Hot, None));
        assert_eq!(
            articles[0].image_url.as_deref(),
            Some("https://thumbs.example.com/t.png")
        );
    }

    #[test]
    fn category_prefers_the_configured_label() {
        let articles =
            normalize_listing(listing(vec![post("a")]), &config(10, SortMode::Hot, Some("Dev")));
        assert_eq!(articles[0].category.as_deref(), Some("Dev"));

        let articles = normalize_listing(listing(vec![post("a")]), &config(10, SortMode::Hot, None));
        assert_eq!(articles[0].category.as_deref(), Some("Reddit"));
    }

    #[test]
    fn created_utc_epoch_becomes_utc_timestamp() {
        let articles = normalize_listing(listing(vec![post("a")]), &config(10, SortMode::Hot, None));
        assert_eq!(
            articles[0].published_at.to_rfc3339(),
            "2025-01-06T10:00:00+00:00"
        );
    }
}
