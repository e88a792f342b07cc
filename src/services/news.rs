//! Read-side queries over aggregated articles

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::{AppError, AppResult},
    models::article::Article,
    repository::{articles::ArticleFilter, Repository},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Caller-facing filter set, prior to translation into an [`ArticleFilter`].
#[derive(Debug, Clone, Default)]
pub struct NewsQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// Time-window shorthand: `day`, `week` or `month`
    pub period: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub source_ids: Option<Vec<i32>>,
    pub categories: Option<Vec<String>>,
    pub source_kind: Option<String>,
}

#[derive(Clone)]
pub struct NewsService {
    repository: Repository,
}

impl NewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Latest stored articles matching the query, newest first.
    pub async fn latest(&self, query: NewsQuery) -> AppResult<Vec<Article>> {
        let filter = build_filter(query, Utc::now())?;
        self.repository.articles.query_latest(&filter).await
    }
}

fn build_filter(query: NewsQuery, now: DateTime<Utc>) -> AppResult<ArticleFilter> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    // An explicit lower bound wins over the period shorthand
    let from = match (query.from, query.period.as_deref()) {
        (Some(from), _) => Some(from),
        (None, Some(period)) => Some(period_start(period, now)?),
        (None, None) => None,
    };

    Ok(ArticleFilter {
        limit,
        offset,
        search: query.search.filter(|s| !s.trim().is_empty()),
        from,
        source_ids: query.source_ids.filter(|v| !v.is_empty()),
        categories: query.categories.filter(|v| !v.is_empty()),
        source_kind: query.source_kind.filter(|s| !s.trim().is_empty()),
    })
}

fn period_start(period: &str, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    match period.to_ascii_lowercase().as_str() {
        "day" => Ok(now - Duration::days(1)),
        "week" => Ok(now - Duration::weeks(1)),
        "month" => Ok(now - Duration::days(30)),
        other => Err(AppError::BadRequest(format!(
            "Unknown period '{}', expected day, week or month",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn period_shorthand_maps_to_a_lower_bound() {
        let day = period_start("day", now()).unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2025, 1, 30, 12, 0, 0).unwrap());

        let week = period_start("WEEK", now()).unwrap();
        assert_eq!(week, Utc.with_ymd_and_hms(2025, 1, 24, 12, 0, 0).unwrap());

        let month = period_start("month", now()).unwrap();
        assert_eq!(month, Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn unknown_period_is_rejected() {
        let err = period_start("year", now()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn explicit_from_wins_over_period() {
        let explicit = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let filter = build_filter(
            NewsQuery {
                from: Some(explicit),
                period: Some("day".to_string()),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert_eq!(filter.from, Some(explicit));
    }

    #[test]
    fn limit_is_defaulted_and_clamped() {
        let filter = build_filter(NewsQuery::default(), now()).unwrap();
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.offset, 0);

        let filter = build_filter(
            NewsQuery {
                limit: Some(10_000),
                offset: Some(-5),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn blank_filters_collapse_to_none() {
        let filter = build_filter(
            NewsQuery {
                search: Some("   ".to_string()),
                source_ids: Some(vec![]),
                categories: Some(vec![]),
                source_kind: Some(String::new()),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert!(filter.search.is_none());
        assert!(filter.source_ids.is_none());
        assert!(filter.categories.is_none());
        assert!(filter.source_kind.is_none());
    }
}
