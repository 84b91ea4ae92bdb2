use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fluxwire_common::{Source, SourceKind};
use fluxwire_store::SourcePatch;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub id: i64,
    pub name: String,
    pub kind: SourceKind,
    pub locator: String,
    pub enabled: bool,
    pub country_override: Option<String>,
    pub created_at: DateTime<Utc>,
    pub article_count: i64,
}

impl SourceResponse {
    fn from_source(source: Source, article_count: i64) -> Self {
        Self {
            id: source.id,
            name: source.name,
            kind: source.kind,
            locator: source.locator,
            enabled: source.enabled,
            country_override: source.country_override,
            created_at: source.created_at,
            article_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub enabled: Option<bool>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SourceResponse>>, ApiError> {
    let sources = state.store.list_sources(params.enabled).await?;

    let mut items = Vec::with_capacity(sources.len());
    for source in sources {
        let count = state.store.source_article_count(source.id).await?;
        items.push(SourceResponse::from_source(source, count));
    }
    Ok(Json(items))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(source_id): Path<i64>,
) -> Result<Json<SourceResponse>, ApiError> {
    let source = state
        .store
        .get_source(source_id)
        .await?
        .ok_or(ApiError::NotFound("source"))?;
    let count = state.store.source_article_count(source_id).await?;
    Ok(Json(SourceResponse::from_source(source, count)))
}

#[derive(Debug, Deserialize)]
pub struct CreateSource {
    pub name: String,
    pub kind: SourceKind,
    pub locator: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub country_override: Option<String>,
}

fn default_enabled() -> bool {
    true
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSource>,
) -> Result<(StatusCode, Json<SourceResponse>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    if body.locator.trim().is_empty() {
        return Err(ApiError::Validation("locator must not be empty".into()));
    }
    if state.store.source_name_exists(&body.name, None).await? {
        return Err(ApiError::Conflict("source name already exists".into()));
    }

    let source = state
        .store
        .create_source(
            &body.name,
            body.kind,
            &body.locator,
            body.enabled,
            body.country_override.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SourceResponse::from_source(source, 0)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSource {
    pub name: Option<String>,
    pub kind: Option<SourceKind>,
    pub locator: Option<String>,
    pub enabled: Option<bool>,
    /// Present-and-null clears the override; absent leaves it unchanged.
    #[serde(default, deserialize_with = "double_option")]
    pub country_override: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(source_id): Path<i64>,
    Json(body): Json<UpdateSource>,
) -> Result<Json<SourceResponse>, ApiError> {
    if let Some(name) = &body.name {
        if state.store.source_name_exists(name, Some(source_id)).await? {
            return Err(ApiError::Conflict("source name already exists".into()));
        }
    }

    let source = state
        .store
        .update_source(
            source_id,
            SourcePatch {
                name: body.name,
                kind: body.kind,
                locator: body.locator,
                enabled: body.enabled,
                country_override: body.country_override,
            },
        )
        .await?;
    let count = state.store.source_article_count(source_id).await?;
    Ok(Json(SourceResponse::from_source(source, count)))
}

/// Deleting a source cascades to its articles and chunks.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(source_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_source(source_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
