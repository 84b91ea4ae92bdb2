use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fluxwire_common::AppConfig;
use fluxwire_store::TopStoryCandidate;

use crate::error::ApiError;
use crate::AppState;

/// Preview snippet length in article listings.
const SNIPPET_CHARS: usize = 200;

/// Title keywords that boost a story's ranking score.
const PRIORITY_KEYWORDS: &[&str] = &[
    "announcement", "announced", "announce",
    "policy", "regulation", "law",
    "breakthrough", "innovation",
    "investment", "funding",
    "target", "goal", "commitment",
];

fn snippet(content: &Option<String>) -> Option<String> {
    content.as_ref().map(|text| {
        let truncated: String = text.chars().take(SNIPPET_CHARS).collect();
        if text.chars().count() > SNIPPET_CHARS {
            format!("{truncated}...")
        } else {
            truncated
        }
    })
}

// --- Listing ---

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub country: Option<String>,
    pub topic: Option<String>,
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_days() -> i64 {
    7
}
fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct ArticleItem {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
    pub country_codes: Option<Vec<String>>,
    pub topic_tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub items: Vec<ArticleItem>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    if !(1..=365).contains(&params.days) {
        return Err(ApiError::Validation("days must be between 1 and 365".into()));
    }
    if params.page < 1 {
        return Err(ApiError::Validation("page must be >= 1".into()));
    }
    if !(1..=100).contains(&params.page_size) {
        return Err(ApiError::Validation("page_size must be between 1 and 100".into()));
    }

    let page = state
        .store
        .list_articles(
            params.country.as_deref(),
            params.topic.as_deref(),
            params.days,
            params.page,
            params.page_size,
        )
        .await?;

    let items = page
        .items
        .into_iter()
        .map(|row| ArticleItem {
            id: row.id,
            title: row.title,
            url: row.url,
            published_at: row.published_at,
            source_name: row.source_name,
            country_codes: row.country_codes,
            topic_tags: row.topic_tags,
            image_url: row.image_url,
            summary: snippet(&row.content_text),
        })
        .collect();

    Ok(Json(ArticleListResponse {
        items,
        total: page.total,
        page: params.page,
        page_size: params.page_size,
        has_next: params.page * params.page_size < page.total,
        has_prev: params.page > 1,
    }))
}

// --- Top stories ---

#[derive(Debug, Deserialize)]
pub struct TopStoriesParams {
    pub country: String,
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct TopStory {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
    pub country_codes: Option<Vec<String>>,
    pub topic_tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct TopStoriesResponse {
    pub items: Vec<TopStory>,
    pub country: String,
    pub days: i64,
}

/// Ranking heuristic: recency (0-40) + source tier (10/20/30) + priority
/// keyword hits, title x2 and body x1, scaled x3 and capped at 30.
pub fn score_story(
    candidate: &TopStoryCandidate,
    now: DateTime<Utc>,
    days: i64,
    config: &AppConfig,
) -> f64 {
    let mut score = 0.0;

    if let Some(published) = candidate.published_at {
        let age_hours = (now - published).num_seconds() as f64 / 3600.0;
        let max_age_hours = (days * 24) as f64;
        score += 40.0 * (1.0 - (age_hours / max_age_hours).min(1.0));
    }

    let host = fluxwire_common::url_host(&candidate.url);
    if config.tier1_domains.iter().any(|d| host.contains(d.as_str())) {
        score += 30.0;
    } else if config.tier2_domains.iter().any(|d| host.contains(d.as_str())) {
        score += 20.0;
    } else {
        score += 10.0;
    }

    let title = candidate.title.to_lowercase();
    let body = candidate
        .content_text
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let mut keyword_matches = 0u32;
    for keyword in PRIORITY_KEYWORDS {
        if title.contains(keyword) {
            keyword_matches += 2;
        } else if body.contains(keyword) {
            keyword_matches += 1;
        }
    }
    score += f64::from(keyword_matches * 3).min(30.0);

    score
}

pub async fn top_stories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopStoriesParams>,
) -> Result<Json<TopStoriesResponse>, ApiError> {
    if params.country.len() != 2 {
        return Err(ApiError::Validation("country must be an ISO alpha-2 code".into()));
    }
    if !(1..=30).contains(&params.days) {
        return Err(ApiError::Validation("days must be between 1 and 30".into()));
    }

    let country = params.country.to_uppercase();
    let candidates = state.store.top_story_candidates(&country, params.days).await?;

    let now = Utc::now();
    let mut scored: Vec<(f64, TopStoryCandidate)> = candidates
        .into_iter()
        .map(|c| (score_story(&c, now, params.days, &state.config), c))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(params.limit.min(50));

    let items = scored
        .into_iter()
        .map(|(score, c)| TopStory {
            id: c.id,
            title: c.title,
            url: c.url,
            published_at: c.published_at,
            source_name: c.source_name,
            country_codes: c.country_codes,
            topic_tags: c.topic_tags,
            summary: snippet(&c.content_text),
            score: (score * 100.0).round() / 100.0,
        })
        .collect();

    Ok(Json(TopStoriesResponse {
        items,
        country,
        days: params.days,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: String::new(),
            openai_api_key: String::new(),
            chat_model: String::new(),
            embedding_model: String::new(),
            embedding_dim: 1536,
            user_agent: String::new(),
            request_timeout_secs: 30,
            max_inflight_per_host: 4,
            max_inflight_global: 32,
            ingest_interval_minutes: 30,
            article_workers: 8,
            api_host: String::new(),
            api_port: 0,
            tier1_domains: vec!["reuters.com".into()],
            tier2_domains: vec!["bbc.com".into()],
            brief_countries: vec![],
        }
    }

    fn candidate(url: &str, title: &str, hours_old: i64) -> TopStoryCandidate {
        TopStoryCandidate {
            id: 1,
            title: title.to_string(),
            url: url.to_string(),
            published_at: Some(Utc::now() - chrono::Duration::hours(hours_old)),
            country_codes: Some(vec!["DE".into()]),
            topic_tags: None,
            content_text: None,
            source_name: "src".into(),
        }
    }

    #[test]
    fn tier1_source_outranks_unknown_source() {
        let config = config();
        let now = Utc::now();
        let tier1 = candidate("https://www.reuters.com/a", "plain title", 1);
        let other = candidate("https://smallblog.example/a", "plain title", 1);
        assert!(score_story(&tier1, now, 7, &config) > score_story(&other, now, 7, &config));
    }

    #[test]
    fn fresher_story_scores_higher() {
        let config = config();
        let now = Utc::now();
        let fresh = candidate("https://x.example/a", "t", 1);
        let stale = candidate("https://x.example/b", "t", 24 * 6);
        assert!(score_story(&fresh, now, 7, &config) > score_story(&stale, now, 7, &config));
    }

    #[test]
    fn title_keywords_boost_and_cap() {
        let config = config();
        let now = Utc::now();
        let keyword_title = candidate(
            "https://x.example/a",
            "Policy announcement on investment target",
            1,
        );
        let plain = candidate("https://x.example/b", "quiet day in the market", 1);
        let with_kw = score_story(&keyword_title, now, 7, &config);
        let without = score_story(&plain, now, 7, &config);
        assert!(with_kw > without);
        // Keyword component can never exceed its 30-point cap.
        assert!(with_kw - without <= 30.0 + 1e-9);
    }

    #[test]
    fn snippet_truncates_long_content() {
        let long = Some("x".repeat(500));
        let s = snippet(&long).unwrap();
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), 203);
    }
}
