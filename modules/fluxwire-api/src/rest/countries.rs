use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use fluxwire_nlp::country_data::country_name;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CountriesParams {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

#[derive(Debug, Serialize)]
pub struct CountryStats {
    pub code: String,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct CountryListResponse {
    pub items: Vec<CountryStats>,
    pub days: i64,
    pub total_articles: u64,
}

/// Countries seen in recent articles with counts, from the `country_codes`
/// column only, ordered by count descending.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountriesParams>,
) -> Result<Json<CountryListResponse>, ApiError> {
    if !(1..=365).contains(&params.days) {
        return Err(ApiError::Validation("days must be between 1 and 365".into()));
    }

    let arrays = state.store.country_arrays_since(params.days).await?;

    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut total_articles = 0u64;
    for codes in arrays {
        if codes.is_empty() {
            continue;
        }
        total_articles += 1;
        for code in codes {
            *counts.entry(code).or_insert(0) += 1;
        }
    }

    let mut items: Vec<CountryStats> = counts
        .into_iter()
        .map(|(code, count)| CountryStats {
            name: country_name(&code).to_string(),
            code,
            count,
        })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));

    Ok(Json(CountryListResponse {
        items,
        days: params.days,
        total_articles,
    }))
}
