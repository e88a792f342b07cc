//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, news, sources};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Newsdesk API",
        version = "1.0.0",
        description = "News aggregation service REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // News
        news::list_news,
        // Sources
        sources::list_sources,
        sources::filter_options,
        sources::get_source,
        sources::create_source,
        sources::update_source,
        sources::delete_source,
        sources::refresh_source,
    ),
    components(
        schemas(
            // News
            crate::models::article::Article,
            // Sources
            crate::models::source::Source,
            crate::models::source::CreateSource,
            crate::models::source::RssConfig,
            crate::models::source::GitHubConfig,
            crate::models::source::RedditConfig,
            crate::models::source::SortMode,
            sources::SourceOption,
            sources::FilterOptions,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "news", description = "Aggregated article queries"),
        (name = "sources", description = "Source management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
