//! News read endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::article::Article,
    services::news::NewsQuery,
};

/// Query parameters for the news listing
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct NewsListQuery {
    /// Pagination offset
    pub offset: Option<i64>,
    /// Page size (capped server-side)
    pub limit: Option<i64>,
    /// Case-insensitive substring match on title and body
    pub search: Option<String>,
    /// Time-window shorthand: day, week or month
    pub period: Option<String>,
    /// Explicit lower bound on publication time (RFC 3339)
    pub from_date: Option<DateTime<Utc>>,
    /// Comma-separated source ids
    pub source_ids: Option<String>,
    /// Comma-separated category labels
    pub categories: Option<String>,
    /// Restrict to one source kind (rss, github, reddit)
    pub source_type: Option<String>,
}

/// List the latest aggregated articles
#[utoipa::path(
    get,
    path = "/news",
    tag = "news",
    params(NewsListQuery),
    responses(
        (status = 200, description = "Matching articles, newest first", body = [Article]),
        (status = 400, description = "Invalid filter parameters", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_news(
    State(state): State<crate::AppState>,
    Query(query): Query<NewsListQuery>,
) -> AppResult<Json<Vec<Article>>> {
    let articles = state.services.news.latest(query.try_into()?).await?;
    Ok(Json(articles))
}

impl TryFrom<NewsListQuery> for NewsQuery {
    type Error = AppError;

    fn try_from(query: NewsListQuery) -> Result<Self, Self::Error> {
        let source_ids = query
            .source_ids
            .as_deref()
            .map(parse_id_list)
            .transpose()?;
        let categories = query.categories.as_deref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        Ok(NewsQuery {
            offset: query.offset,
            limit: query.limit,
            search: query.search,
            period: query.period,
            from: query.from_date,
            source_ids,
            categories,
            source_kind: query.source_type,
        })
    }
}

fn parse_id_list(raw: &str) -> AppResult<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| AppError::BadRequest(format!("Invalid source id '{}'", s)))
        })
        .collect()
}
