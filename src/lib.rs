//! Newsdesk News Aggregation Service
//!
//! A Rust implementation of a multi-source news aggregator: RSS/Atom feeds,
//! GitHub repository events and Reddit listings are polled on an interval,
//! normalized into articles, deduplicated and served over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
