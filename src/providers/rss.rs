//! RSS/Atom feed provider
//!
//! Fetches a syndication feed over HTTP, parses it with feed-rs and
//! normalizes the entries into article candidates. Feed bodies are reduced to
//! plain text; an image URL is extracted opportunistically from the feed's
//! media extension or from the first `<img>` tag in the raw body.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{article::NewArticle, source::RssConfig},
};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static IMG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap());

pub struct RssProvider {
    http: reqwest::Client,
}

impl RssProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch and normalize at most `config.limit` entries, in feed order.
    /// Transport and parse errors propagate; no partial results.
    pub async fn fetch(&self, config: &RssConfig) -> AppResult<Vec<NewArticle>> {
        tracing::debug!("Fetching feed {}", config.url);

        let response = self
            .http
            .get(&config.url)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to fetch feed {}: {}", config.url, e)))?
            .error_for_status()
            .map_err(|e| AppError::Provider(format!("Feed {} returned error: {}", config.url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to read feed {}: {}", config.url, e)))?;

        let feed = feed_rs::parser::parse(&bytes[..])
            .map_err(|e| AppError::Provider(format!("Failed to parse feed {}: {}", config.url, e)))?;

        let items = normalize_feed(feed, config);
        tracing::debug!("Feed {} yielded {} item(s)", config.url, items.len());
        Ok(items)
    }
}

fn normalize_feed(feed: feed_rs::model::Feed, config: &RssConfig) -> Vec<NewArticle> {
    feed.entries
        .into_iter()
        .take(config.limit as usize)
        .map(|entry| entry_to_article(entry, config.category.as_deref()))
        .collect()
}

fn entry_to_article(entry: feed_rs::model::Entry, category: Option<&str>) -> NewArticle {
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let source_item_id = if !entry.id.is_empty() {
        entry.id.clone()
    } else if !link.is_empty() {
        link.clone()
    } else {
        Uuid::new_v4().to_string()
    };

    // Full content wins over the summary
    let raw_body = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .filter(|b| !b.trim().is_empty())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
        .unwrap_or_default();

    let image_url = extract_media_image(&entry).or_else(|| extract_img_src(&raw_body));

    NewArticle {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        body: strip_html(&raw_body),
        link,
        published_at: entry.published.or(entry.updated).unwrap_or_else(Utc::now),
        author: entry.authors.first().map(|p| p.name.clone()),
        image_url,
        // The configured category overrides anything provider-side
        category: category.map(str::to_string),
        metadata: None,
        indexed_at: Utc::now(),
        source_id: 0,
        source_item_id,
    }
}

/// First usable URL from the entry's media extension (thumbnails preferred).
fn extract_media_image(entry: &feed_rs::model::Entry) -> Option<String> {
    for media in &entry.media {
        if let Some(thumbnail) = media.thumbnails.first() {
            return Some(thumbnail.image.uri.clone());
        }
        if let Some(url) = media.content.iter().find_map(|c| c.url.as_ref()) {
            return Some(url.to_string());
        }
    }
    None
}

/// First `<img src="...">` in a raw HTML fragment.
fn extract_img_src(raw: &str) -> Option<String> {
    IMG_RE
        .captures(raw)
        .map(|caps| caps[1].to_string())
}

/// Drop tags, decode entities, trim.
fn strip_html(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, "");
    html_escape::decode_html_entities(without_tags.as_ref())
        .trim()
        .to_string()
}
