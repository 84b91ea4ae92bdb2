use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    #[serde(default = "default_days")]
    pub days: i64,
    pub country: Option<String>,
}

fn default_days() -> i64 {
    7
}

#[derive(Debug, Serialize)]
pub struct DayCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub days: i64,
    pub country: Option<String>,
    pub data: Vec<DayCount>,
    pub total: i64,
}

/// Daily article counts over the window.
pub async fn activity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<ActivityResponse>, ApiError> {
    if !(1..=365).contains(&params.days) {
        return Err(ApiError::Validation("days must be between 1 and 365".into()));
    }

    let rows = state
        .store
        .daily_article_counts(params.days, params.country.as_deref())
        .await?;

    let data: Vec<DayCount> = rows
        .into_iter()
        .map(|(date, count)| DayCount {
            date: date.to_string(),
            count,
        })
        .collect();
    let total = data.iter().map(|d| d.count).sum();

    Ok(Json(ActivityResponse {
        days: params.days,
        country: params.country,
        data,
        total,
    }))
}

#[derive(Debug, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct TopicBreakdownResponse {
    pub days: i64,
    pub country: Option<String>,
    pub topics: Vec<TopicCount>,
    pub total: u64,
}

/// Article counts per topic over the window, top ten.
pub async fn topics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<TopicBreakdownResponse>, ApiError> {
    if !(1..=365).contains(&params.days) {
        return Err(ApiError::Validation("days must be between 1 and 365".into()));
    }

    let arrays = state
        .store
        .topic_arrays_since(params.days, params.country.as_deref())
        .await?;

    let total = arrays.len() as u64;
    let mut counts: HashMap<String, u64> = HashMap::new();
    for tags in arrays {
        for tag in tags {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    let mut topics: Vec<TopicCount> = counts
        .into_iter()
        .map(|(topic, count)| TopicCount { topic, count })
        .collect();
    topics.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
    topics.truncate(10);

    Ok(Json(TopicBreakdownResponse {
        days: params.days,
        country: params.country,
        topics,
        total,
    }))
}
