//! Newsdesk Server - News Aggregation Service
//!
//! REST API server with a background aggregation scheduler.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsdesk_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{aggregation, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("newsdesk_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Newsdesk Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let polling_interval = Duration::from_secs(config.aggregation.polling_interval_minutes * 60);

    // Create repository and services
    let cancel = CancellationToken::new();
    let repository = Repository::new(pool);
    let services = Services::new(repository, &config.aggregation, cancel.clone())
        .expect("Failed to create services");

    // Start the background aggregation scheduler
    let scheduler = tokio::spawn(aggregation::run_scheduler(
        services.aggregation.clone(),
        polling_interval,
        cancel.clone(),
    ));

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    // Let the scheduler wind down before exiting
    scheduler.await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolve on Ctrl-C, cancelling the background scheduler first
async fn shutdown_signal(cancel: CancellationToken) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("Shutdown signal received");
    cancel.cancel();
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // News
        .route("/news", get(api::news::list_news))
        // Sources
        .route("/sources", get(api::sources::list_sources))
        .route("/sources", post(api::sources::create_source))
        .route("/sources/filter-options", get(api::sources::filter_options))
        .route("/sources/:id", get(api::sources::get_source))
        .route("/sources/:id", put(api::sources::update_source))
        .route("/sources/:id", delete(api::sources::delete_source))
        .route("/sources/:id/refresh", post(api::sources::refresh_source))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
