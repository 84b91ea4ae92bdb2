//! RSS/Atom decoding into normalized entries.

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use fluxwire_common::Entry;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed feed: {0}")]
    Malformed(String),

    #[error("feed contains no parseable entries")]
    NoEntries,
}

/// Decode feed bytes into entries. Entries without a title or URL are
/// skipped with a warning; a feed yielding nothing at all is an error.
/// Publication dates come from the structured published/updated fields
/// (feed-rs parses RFC-2822 pubDate strings into these).
pub fn parse(bytes: &[u8]) -> Result<Vec<Entry>, ParseError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let mut entries = Vec::new();
    for entry in feed.entries {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());

        let url = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|u| !u.is_empty())
            .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()));

        let (Some(title), Some(url)) = (title, url) else {
            warn!(entry_id = %entry.id, "skipping entry without title or url");
            continue;
        };

        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        let summary = entry
            .summary
            .map(|s| s.content.trim().to_string())
            .filter(|s| !s.is_empty());

        entries.push(Entry {
            title,
            url,
            published_at,
            summary,
            image_url: None,
        });
    }

    if entries.is_empty() {
        return Err(ParseError::NoEntries);
    }

    Ok(entries)
}
