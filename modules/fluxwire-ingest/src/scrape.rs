//! Site scrapers for sources without feeds. Each adapter is keyed by a short
//! identifier stored in the source's `locator` and produces the same
//! normalized entries as the feed parser.

pub mod neso;

use std::sync::Arc;

use async_trait::async_trait;

use fluxwire_common::Entry;

use crate::fetcher::{FetchError, Fetcher};

/// A per-site adapter. Implementations own pagination termination (an empty
/// page stops the walk), absolute-URL construction, and cheap per-entry
/// image resolution.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    fn key(&self) -> &'static str;

    async fn scrape(&self, max_pages: u32) -> Result<Vec<Entry>, FetchError>;
}

/// Resolve a registry key to its compiled-in adapter.
pub fn scraper_for_key(key: &str, fetcher: Arc<Fetcher>) -> Option<Box<dyn SiteScraper>> {
    match key.to_lowercase().as_str() {
        "neso" => Some(Box::new(neso::NesoScraper::new(fetcher))),
        _ => None,
    }
}
