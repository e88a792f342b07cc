//! GitHub repository event provider
//!
//! Pulls the recent event stream of one repository and turns each event into
//! an article candidate via an event-type dispatch. An access token, when
//! configured, is attached to the single outgoing request and nowhere else,
//! so no credential can leak into another source's fetch.

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{article::NewArticle, source::GitHubConfig},
};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Provider-side page size ceiling, applied regardless of the requested cap.
const MAX_PER_PAGE: u32 = 100;

pub struct GitHubProvider {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: GITHUB_API_BASE.to_string(),
        }
    }

    pub async fn fetch(&self, config: &GitHubConfig) -> AppResult<Vec<NewArticle>> {
        tracing::debug!("Fetching events for {}/{}", config.owner, config.repo);

        let response = self
            .build_request(config)
            .send()
            .await
            .map_err(|e| {
                AppError::Provider(format!(
                    "Failed to fetch events for {}/{}: {}",
                    config.owner, config.repo, e
                ))
            })?
            .error_for_status()
            .map_err(|e| {
                AppError::Provider(format!(
                    "GitHub returned error for {}/{}: {}",
                    config.owner, config.repo, e
                ))
            })?;

        let events: Vec<GitHubEvent> = response.json().await.map_err(|e| {
            AppError::Provider(format!(
                "Failed to parse GitHub events for {}/{}: {}",
                config.owner, config.repo, e
            ))
        })?;

        let items = normalize_events(events, config);
        tracing::debug!(
            "{}/{} yielded {} event(s)",
            config.owner,
            config.repo,
            items.len()
        );
        Ok(items)
    }

    /// Build the events request; the token is scoped to this request only.
    fn build_request(&self, config: &GitHubConfig) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/repos/{}/{}/events?per_page={}",
            self.base_url,
            config.owner,
            config.repo,
            config.limit.min(MAX_PER_PAGE)
        );
        let request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github.v3+json");
        match &config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn normalize_events(events: Vec<GitHubEvent>, config: &GitHubConfig) -> Vec<NewArticle> {
    let allowlist: Vec<String> = config
        .event_types
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|t| t.to_ascii_lowercase())
        .collect();

    events
        .into_iter()
        .filter(|e| allowlist.is_empty() || allowlist.contains(&e.kind.to_ascii_lowercase()))
        .take(config.limit as usize)
        .map(|e| event_to_article(e, &config.owner, &config.repo))
        .collect()
}

fn event_to_article(event: GitHubEvent, owner: &str, repo: &str) -> NewArticle {
    let repo_name = event
        .repo
        .as_ref()
        .map(|r| r.name.clone())
        .unwrap_or_else(|| format!("{}/{}", owner, repo));
    let actor = event
        .actor
        .as_ref()
        .map(|a| a.login.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let payload = event.payload.as_ref();

    let title = event_title(&event.kind, &repo_name, payload);
    let mut description = event_description(&event.kind, &repo_name, &actor, payload);

    let mut link = format!("https://github.com/{}/{}", owner, repo);
    let mut sha = None;
    let mut pr_number = None;

    if let Some(payload) = payload {
        match event.kind.as_str() {
            "PushEvent" => {
                if let Some(commit) = payload.commits.as_deref().and_then(|c| c.first()) {
                    sha = Some(commit.sha.clone());
                    link = format!(
                        "https://github.com/{}/{}/commit/{}",
                        owner, repo, commit.sha
                    );
                    description = format!("{}\n\n{}", commit.message, description);
                }
            }
            "IssuesEvent" => {
                if let Some(url) = payload.issue.as_ref().and_then(|i| i.html_url.clone()) {
                    link = url;
                }
            }
            "PullRequestEvent" => {
                if let Some(pr) = payload.pull_request.as_ref() {
                    if let Some(url) = pr.html_url.clone() {
                        link = url;
                    }
                    pr_number = Some(pr.number);
                }
            }
            "ReleaseEvent" => {
                link = payload
                    .release
                    .as_ref()
                    .and_then(|r| r.html_url.clone())
                    .unwrap_or_else(|| {
                        format!("https://github.com/{}/{}/releases", owner, repo)
                    });
            }
            _ => {}
        }
    }

    let metadata = serde_json::json!({
        "github_type": event.kind,
        "sha": sha,
        "pr_number": pr_number,
    });

    NewArticle {
        title,
        body: description,
        link,
        published_at: event.created_at,
        author: event.actor.as_ref().map(|a| a.login.clone()),
        image_url: event.actor.and_then(|a| a.avatar_url),
        category: Some(event.kind),
        metadata: Some(metadata.to_string()),
        indexed_at: Utc::now(),
        source_id: 0,
        source_item_id: event.id,
    }
}

fn event_title(kind: &str, repo: &str, payload: Option<&GitHubPayload>) -> String {
    match kind {
        "PushEvent" => format!("Push to {}", repo),
        "IssuesEvent" => format!(
            "Issue: {}",
            payload
                .and_then(|p| p.issue.as_ref())
                .map(|i| i.title.as_str())
                .unwrap_or("Unknown")
        ),
        "PullRequestEvent" => format!(
            "Pull Request: {}",
            payload
                .and_then(|p| p.pull_request.as_ref())
                .map(|pr| pr.title.as_str())
                .unwrap_or("Unknown")
        ),
        "CreateEvent" => format!(
            "Created {} in {}",
            payload
                .and_then(|p| p.ref_type.as_deref())
                .unwrap_or("resource"),
            repo
        ),
        "DeleteEvent" => format!(
            "Deleted {} from {}",
            payload
                .and_then(|p| p.ref_type.as_deref())
                .unwrap_or("resource"),
            repo
        ),
        "ReleaseEvent" => format!(
            "Release: {}",
            payload
                .and_then(|p| p.release.as_ref())
                .map(|r| r.name.as_str())
                .unwrap_or("Unknown")
        ),
        other => format!("{} in {}", other, repo),
    }
}

fn event_description(
    kind: &str,
    repo: &str,
    actor: &str,
    payload: Option<&GitHubPayload>,
) -> String {
    match kind {
        "PushEvent" => format!(
            "{} pushed {} commit(s) to {}",
            actor,
            payload
                .and_then(|p| p.commits.as_ref())
                .map(|c| c.len())
                .unwrap_or(0),
            repo
        ),
        "IssuesEvent" => payload
            .and_then(|p| p.issue.as_ref())
            .and_then(|i| i.body.clone())
            .unwrap_or_else(|| format!("Issue event in {}", repo)),
        "PullRequestEvent" => payload
            .and_then(|p| p.pull_request.as_ref())
            .and_then(|pr| pr.body.clone())
            .unwrap_or_else(|| format!("Pull request event in {}", repo)),
        "CreateEvent" => format!(
            "{} created {} in {}",
            actor,
            payload
                .and_then(|p| p.ref_type.as_deref())
                .unwrap_or("resource"),
            repo
        ),
        "DeleteEvent" => format!(
            "{} deleted {} from {}",
            actor,
            payload
                .and_then(|p| p.ref_type.as_deref())
                .unwrap_or("resource"),
            repo
        ),
        "ReleaseEvent" => payload
            .and_then(|p| p.release.as_ref())
            .and_then(|r| r.body.clone())
            .unwrap_or_else(|| format!("Release in {}", repo)),
        other => format!("{} performed {} in {}", actor, other, repo),
    }
}

#[derive(Debug, Deserialize)]
struct GitHubEvent {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    created_at: DateTime<Utc>,
    actor: Option<GitHubActor>,
    repo: Option<GitHubRepo>,
    payload: Option<GitHubPayload>,
}

#[derive(Debug, Deserialize)]
struct GitHubActor {
    login: String,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubPayload {
    #[serde(default)]
    commits: Option<Vec<GitHubCommit>>,
    #[serde(default)]
    issue: Option<GitHubIssue>,
    #[serde(default)]
    pull_request: Option<GitHubPullRequest>,
    #[serde(default)]
    ref_type: Option<String>,
    #[serde(default)]
    release: Option<GitHubRelease>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    title: String,
    body: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubPullRequest {
    title: String,
    body: Option<String>,
    html_url: Option<String>,
    number: i64,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    name: String,
    body: Option<String>,
    html_url: Option<String>,
}
