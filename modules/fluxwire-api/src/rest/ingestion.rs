use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use fluxwire_common::IngestionRun;
use fluxwire_rag::BriefRequest;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Trigger a full ingestion run. Refused while one is already in flight.
/// After a successful run the briefs for the configured major countries are
/// refreshed; a brief failure never fails the ingestion response.
pub async fn trigger(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IngestionRun>, ApiError> {
    let run = match state.scheduler.trigger().await {
        Ok(Ok(run)) => run,
        Ok(Err(e)) => return Err(ApiError::internal("ingestion run failed", e)),
        Err(_) => return Err(ApiError::Busy("an ingestion run is already in progress")),
    };

    for country in &state.config.brief_countries {
        let request = BriefRequest {
            country: Some(country.clone()),
            ..Default::default()
        };
        if let Err(e) = state.briefs.generate(&request).await {
            warn!(country = country.as_str(), error = %e, "post-run brief refresh failed");
        }
    }

    Ok(Json(run))
}

#[derive(Debug, Deserialize)]
pub struct ListRunsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRunsParams>,
) -> Result<Json<Vec<IngestionRun>>, ApiError> {
    if !(1..=100).contains(&params.limit) || params.offset < 0 {
        return Err(ApiError::Validation("invalid limit/offset".into()));
    }
    let runs = state.store.list_runs(params.limit, params.offset).await?;
    Ok(Json(runs))
}

pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<i64>,
) -> Result<Json<IngestionRun>, ApiError> {
    let run = state
        .store
        .get_run(run_id)
        .await?
        .ok_or(ApiError::NotFound("ingestion run"))?;
    Ok(Json(run))
}
