use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use fluxwire_rag::{BriefOutcome, BriefRequest};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BriefParams {
    pub country: Option<String>,
    pub topic: Option<String>,
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_max_articles")]
    pub max_articles: i64,
}

fn default_days() -> i64 {
    7
}
fn default_max_articles() -> i64 {
    15
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BriefParams>,
) -> Result<Json<BriefOutcome>, ApiError> {
    if !(1..=90).contains(&params.days) {
        return Err(ApiError::Validation("days must be between 1 and 90".into()));
    }
    if !(1..=50).contains(&params.max_articles) {
        return Err(ApiError::Validation("max_articles must be between 1 and 50".into()));
    }
    if let Some(country) = &params.country {
        if country.len() != 2 {
            return Err(ApiError::Validation("country must be an ISO alpha-2 code".into()));
        }
    }

    let request = BriefRequest {
        country: params.country.map(|c| c.to_uppercase()),
        topic: params.topic,
        days: params.days,
        max_articles: params.max_articles,
    };

    let outcome = state.briefs.generate(&request).await?;
    Ok(Json(outcome))
}
