use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use fluxwire_rag::retriever::DEFAULT_K;
use fluxwire_rag::ChatOutcome;
use fluxwire_store::SearchFilters;

use crate::error::ApiError;
use crate::AppState;

const MAX_K: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ChatFilters {
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub filters: Option<ChatFilters>,
    pub k: Option<i64>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::Validation("question must not be empty".into()));
    }
    let k = request.k.unwrap_or(DEFAULT_K);
    if !(1..=MAX_K).contains(&k) {
        return Err(ApiError::Validation(format!("k must be between 1 and {MAX_K}")));
    }

    let filters = request
        .filters
        .map(|f| SearchFilters {
            countries: f.countries,
            topics: f.topics,
            date_from: f.date_from,
            date_to: f.date_to,
        })
        .unwrap_or_default();

    let outcome = state.answerer.chat(&request.question, &filters, k).await?;
    Ok(Json(outcome))
}
