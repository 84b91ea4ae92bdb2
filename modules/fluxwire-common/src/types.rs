use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Sources ---

/// How a source is ingested.
/// `Paywalled` sources keep their feed entries but skip page extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Rss,
    WebScraper,
    Paywalled,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Rss => write!(f, "rss"),
            SourceKind::WebScraper => write!(f, "web_scraper"),
            SourceKind::Paywalled => write!(f, "paywalled"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rss" => Ok(Self::Rss),
            "web_scraper" => Ok(Self::WebScraper),
            "paywalled" => Ok(Self::Paywalled),
            other => Err(format!("unknown SourceKind: {other}")),
        }
    }
}

/// An ingestion origin. `locator` is a feed URL for rss/paywalled sources
/// and a scraper registry key for web_scraper sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub kind: SourceKind,
    pub locator: String,
    pub enabled: bool,
    /// When set, pins every article from this source to this country code
    /// instead of running the country tagger (known-national outlets).
    pub country_override: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Entries ---

/// A normalized feed/scrape entry before it becomes an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
}

// --- Articles ---

/// Closed metadata record for an article. Every producer and consumer is
/// known to the core, so this is not an open map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub image_url: Option<String>,
    /// Non-country regions detected by the tagger (e.g. "EU").
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub raw_summary: Option<String>,
    pub content_text: Option<String>,
    /// ISO-639-1 code, set when detection succeeded on extracted content.
    pub language: Option<String>,
    pub content_hash: String,
    /// ISO-3166-1 alpha-2 codes, at most 3.
    pub country_codes: Option<Vec<String>>,
    /// Topic taxonomy ids, at most 3.
    pub topic_tags: Option<Vec<String>>,
    pub metadata: ArticleMetadata,
}

// --- Ingestion runs ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown RunStatus: {other}")),
        }
    }
}

/// Audit record of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRun {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub stats: Option<serde_json::Value>,
}

// --- Briefs ---

/// Cached generated summary per country/window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    pub id: i64,
    pub country_code: String,
    pub content: String,
    pub article_count: i32,
    pub days_range: i32,
    pub generated_at: DateTime<Utc>,
}
