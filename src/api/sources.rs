//! Source management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::source::{CreateSource, Source},
};

/// One source as shown in filter pickers
#[derive(Serialize, ToSchema)]
pub struct SourceOption {
    pub id: i32,
    pub name: String,
    pub kind: String,
}

/// Building blocks for client-side article filters
#[derive(Serialize, ToSchema)]
pub struct FilterOptions {
    pub sources: Vec<SourceOption>,
    /// Distinct category labels across all source configs
    pub categories: Vec<String>,
}

/// List all configured sources
#[utoipa::path(
    get,
    path = "/sources",
    tag = "sources",
    responses(
        (status = 200, description = "All sources", body = [Source])
    )
)]
pub async fn list_sources(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Source>>> {
    let sources = state.services.sources.list().await?;
    Ok(Json(sources))
}

/// List the sources and categories available as article filters
#[utoipa::path(
    get,
    path = "/sources/filter-options",
    tag = "sources",
    responses(
        (status = 200, description = "Available filter values", body = FilterOptions)
    )
)]
pub async fn filter_options(
    State(state): State<crate::AppState>,
) -> AppResult<Json<FilterOptions>> {
    let (sources, categories) = state.services.sources.filter_options().await?;
    Ok(Json(FilterOptions {
        sources: sources
            .into_iter()
            .map(|s| SourceOption {
                id: s.id,
                name: s.name,
                kind: s.kind,
            })
            .collect(),
        categories,
    }))
}

/// Get a source by id
#[utoipa::path(
    get,
    path = "/sources/{id}",
    tag = "sources",
    params(("id" = i32, Path, description = "Source id")),
    responses(
        (status = 200, description = "The source", body = Source),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_source(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Source>> {
    let source = state.services.sources.get(id).await?;
    Ok(Json(source))
}

/// Create a source and poll it immediately
#[utoipa::path(
    post,
    path = "/sources",
    tag = "sources",
    request_body = CreateSource,
    responses(
        (status = 201, description = "Source created", body = Source),
        (status = 400, description = "Invalid definition", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_source(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateSource>,
) -> AppResult<(StatusCode, Json<Source>)> {
    let source = state.services.sources.create(request).await?;
    Ok((StatusCode::CREATED, Json(source)))
}

/// Update a source definition and poll it immediately
#[utoipa::path(
    put,
    path = "/sources/{id}",
    tag = "sources",
    params(("id" = i32, Path, description = "Source id")),
    request_body = CreateSource,
    responses(
        (status = 200, description = "Source updated", body = Source),
        (status = 400, description = "Invalid definition", body = crate::error::ErrorResponse),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_source(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<CreateSource>,
) -> AppResult<Json<Source>> {
    let source = state.services.sources.update(id, request).await?;
    Ok(Json(source))
}

/// Delete a source and its articles
#[utoipa::path(
    delete,
    path = "/sources/{id}",
    tag = "sources",
    params(("id" = i32, Path, description = "Source id")),
    responses(
        (status = 204, description = "Source deleted"),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_source(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.sources.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Trigger an immediate poll of one source
#[utoipa::path(
    post,
    path = "/sources/{id}/refresh",
    tag = "sources",
    params(("id" = i32, Path, description = "Source id")),
    responses(
        (status = 200, description = "Source after the poll attempt", body = Source),
        (status = 404, description = "Source not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh_source(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Source>> {
    let source = state.services.sources.refresh(id).await?;
    Ok(Json(source))
}
