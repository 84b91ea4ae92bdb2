//! Scraper for the NESO (National Energy System Operator) news index.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use scraper::{Html, Selector};
use tracing::{info, warn};

use fluxwire_common::Entry;

use crate::fetcher::{FetchError, Fetcher};
use crate::scrape::SiteScraper;

const BASE_URL: &str = "https://www.neso.energy";
const NEWS_PATH: &str = "/news-and-events";

pub struct NesoScraper {
    fetcher: Arc<Fetcher>,
}

impl NesoScraper {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    fn parse_news_page(html: &str) -> Vec<Entry> {
        let document = Html::parse_document(html);
        let card_selector = Selector::parse("article.node--type-article").expect("valid selector");
        let link_selector = Selector::parse("a.article-link").expect("valid selector");
        let title_selector = Selector::parse("h3.article-title").expect("valid selector");
        let published_selector = Selector::parse("p.published-read").expect("valid selector");
        let summary_selector = Selector::parse("div.article-description").expect("valid selector");

        let mut entries = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for card in document.select(&card_selector) {
            let Some(link) = card.select(&link_selector).next() else {
                continue;
            };
            let href = link.value().attr("href").unwrap_or_default();

            // News articles only; the index mixes in calendar events.
            if !href.starts_with("/news/") {
                continue;
            }
            let url = format!("{BASE_URL}{href}");
            if !seen.insert(url.clone()) {
                continue;
            }

            let title = link
                .select(&title_selector)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| link.text().collect::<String>().trim().to_string());
            if title.chars().count() <= 5 {
                continue;
            }

            // "22 Jan 2026 - 3 min read" -> date before the dash.
            let published_at = link
                .select(&published_selector)
                .next()
                .map(|p| p.text().collect::<String>())
                .and_then(|text| {
                    let date_part = text.split(" - ").next().unwrap_or(&text).trim().to_string();
                    parse_display_date(&date_part)
                });

            let summary = link
                .select(&summary_selector)
                .next()
                .map(|d| d.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty());

            entries.push(Entry {
                title,
                url,
                published_at,
                summary,
                image_url: None,
            });
        }

        entries
    }

    /// Lead image lives on the article page in the image field wrapper.
    async fn fetch_article_image(&self, article_url: &str) -> Option<String> {
        let bytes = self.fetcher.fetch(article_url).await.ok()?;
        let html = String::from_utf8_lossy(&bytes);
        let document = Html::parse_document(&html);
        let wrapper = Selector::parse("div.field-field-image img").ok()?;

        let src = document
            .select(&wrapper)
            .next()
            .and_then(|img| img.value().attr("src"))?
            .trim()
            .to_string();

        if src.starts_with('/') {
            Some(format!("{BASE_URL}{src}"))
        } else {
            Some(src)
        }
    }
}

#[async_trait]
impl SiteScraper for NesoScraper {
    fn key(&self) -> &'static str {
        "neso"
    }

    async fn scrape(&self, max_pages: u32) -> Result<Vec<Entry>, FetchError> {
        let mut entries = Vec::new();

        for page in 0..max_pages {
            let url = if page == 0 {
                format!("{BASE_URL}{NEWS_PATH}")
            } else {
                format!("{BASE_URL}{NEWS_PATH}?page={page}")
            };

            let bytes = match self.fetcher.fetch(&url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(url, error = %e, "news page fetch failed, stopping pagination");
                    break;
                }
            };

            let html = String::from_utf8_lossy(&bytes);
            let mut page_entries = Self::parse_news_page(&html);
            if page_entries.is_empty() {
                break;
            }

            for entry in &mut page_entries {
                entry.image_url = self.fetch_article_image(&entry.url).await;
            }

            info!(url, count = page_entries.len(), "scraped news page");
            entries.append(&mut page_entries);
        }

        Ok(entries)
    }
}

/// Parse the index's display date, e.g. "22 Jan 2026".
fn parse_display_date(raw: &str) -> Option<chrono::DateTime<Utc>> {
    NaiveDate::parse_from_str(raw, "%d %b %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
      <article class="node--type-article">
        <a class="article-link" href="/news/winter-outlook-published">
          <h3 class="article-title">Winter outlook published</h3>
          <p class="published-read">22 Jan 2026 - 3 min read</p>
          <div class="article-description">System margins look adequate.</div>
        </a>
      </article>
      <article class="node--type-article">
        <a class="article-link" href="/events/stakeholder-webinar">
          <h3 class="article-title">Stakeholder webinar</h3>
        </a>
      </article>
      <article class="node--type-article">
        <a class="article-link" href="/news/winter-outlook-published">
          <h3 class="article-title">Winter outlook published (duplicate)</h3>
        </a>
      </article>
    </body></html>"#;

    #[test]
    fn parses_cards_and_filters_events_and_duplicates() {
        let entries = NesoScraper::parse_news_page(PAGE);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.title, "Winter outlook published");
        assert_eq!(entry.url, "https://www.neso.energy/news/winter-outlook-published");
        assert_eq!(entry.summary.as_deref(), Some("System margins look adequate."));
        assert_eq!(
            entry.published_at.unwrap().format("%Y-%m-%d").to_string(),
            "2026-01-22"
        );
    }

    #[test]
    fn display_date_parses() {
        let date = parse_display_date("5 Mar 2026").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2026-03-05");
    }

    #[test]
    fn bad_date_is_none() {
        assert!(parse_display_date("sometime soon").is_none());
    }
}
