//! Repository layer for database operations

pub mod articles;
pub mod sources;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub sources: sources::SourcesRepository,
    pub articles: articles::ArticlesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            sources: sources::SourcesRepository::new(pool.clone()),
            articles: articles::ArticlesRepository::new(pool.clone()),
            pool,
        }
    }
}
