pub mod config;
pub mod hash;
pub mod types;

pub use config::AppConfig;
pub use hash::content_hash;
pub use types::{
    Article, ArticleMetadata, Brief, Entry, IngestionRun, RunStatus, Source, SourceKind,
};

/// Extract the host part of a URL for display (e.g. citation sources).
/// Falls back to "unknown" when the URL does not parse.
pub fn url_host(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
