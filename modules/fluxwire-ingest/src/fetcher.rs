//! Polite HTTP fetching with retries and a process-wide egress budget:
//! a global in-flight cap plus per-host fairness semaphores. Retries hold
//! their permits, so they participate in the budget.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, warn};

/// Max attempts per fetch for transient failures (I/O, timeout, 5xx).
const MAX_ATTEMPTS: u32 = 3;
/// Exponential backoff base; delay is base * 2^attempt, capped below.
const RETRY_BASE: Duration = Duration::from_secs(2);
const RETRY_CAP: Duration = Duration::from_secs(10);

/// Hosts whose links are redirect aggregators worth resolving.
const REDIRECT_AGGREGATOR_HOSTS: &[&str] = &["news.google.com"];
/// Consent/interstitial hosts; landing on one means resolution failed.
const CONSENT_HOSTS: &[&str] = &["consent.google.com", "consent.youtube.com"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("timeout fetching {url}")]
    Timeout { url: String },

    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

pub struct Fetcher {
    client: reqwest::Client,
    user_agent: String,
    global: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
    per_host_limit: usize,
}

impl Fetcher {
    pub fn new(
        user_agent: &str,
        timeout_secs: u64,
        per_host_limit: usize,
        global_limit: usize,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            user_agent: user_agent.to_string(),
            global: Arc::new(Semaphore::new(global_limit)),
            per_host: Mutex::new(HashMap::new()),
            per_host_limit,
        }
    }

    fn page_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers
    }

    fn feed_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/rss+xml, application/xml, text/xml, */*"),
        );
        headers
    }

    async fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut map = self.per_host.lock().await;
        map.entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
            .clone()
    }

    /// Fetch page bytes with polite headers.
    pub async fn fetch(&self, url: &str) -> Result<bytes::Bytes, FetchError> {
        self.fetch_with_headers(url, self.page_headers()).await
    }

    /// Fetch feed bytes with an RSS-flavoured Accept header.
    pub async fn fetch_feed(&self, url: &str) -> Result<bytes::Bytes, FetchError> {
        self.fetch_with_headers(url, self.feed_headers()).await
    }

    async fn fetch_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<bytes::Bytes, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        let host = parsed.host_str().ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        // Permits are held for the whole attempt loop so that retries cannot
        // exceed the egress budget.
        let _global = self
            .global
            .acquire()
            .await
            .map_err(|_| FetchError::Timeout { url: url.to_string() })?;
        let host_sem = self.host_semaphore(host).await;
        let _host = host_sem
            .acquire()
            .await
            .map_err(|_| FetchError::Timeout { url: url.to_string() })?;

        let mut last_err = FetchError::Timeout { url: url.to_string() };

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = (RETRY_BASE * 2u32.pow(attempt - 1)).min(RETRY_CAP);
                let jitter = Duration::from_millis(rand::rng().random_range(0..500));
                debug!(url, attempt, backoff_ms = backoff.as_millis() as u64, "retrying fetch");
                tokio::time::sleep(backoff + jitter).await;
            }

            let result = self.client.get(url).headers(headers.clone()).send().await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.bytes().await.map_err(|e| FetchError::Http {
                            url: url.to_string(),
                            source: e,
                        });
                    }
                    if status.is_server_error() {
                        warn!(url, status = status.as_u16(), attempt, "server error, will retry");
                        last_err = FetchError::Status {
                            status: status.as_u16(),
                            url: url.to_string(),
                        };
                        continue;
                    }
                    // 4xx is not transient.
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                Err(e) if e.is_timeout() => {
                    warn!(url, attempt, "timeout, will retry");
                    last_err = FetchError::Timeout { url: url.to_string() };
                }
                Err(e) if e.is_connect() || e.is_request() => {
                    warn!(url, attempt, error = %e, "transport error, will retry");
                    last_err = FetchError::Http {
                        url: url.to_string(),
                        source: e,
                    };
                }
                Err(e) => {
                    return Err(FetchError::Http {
                        url: url.to_string(),
                        source: e,
                    });
                }
            }
        }

        Err(last_err)
    }

    /// Resolve a redirect-aggregator link (Google-News-shaped) to its final
    /// article URL. Non-aggregator URLs pass through unchanged, and landing
    /// on a consent interstitial returns the original URL.
    pub async fn resolve(&self, url: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        let host = parsed.host_str().unwrap_or_default();

        if !REDIRECT_AGGREGATOR_HOSTS.iter().any(|h| host == *h) {
            return Ok(url.to_string());
        }

        let response = match self
            .client
            .get(url)
            .headers(self.page_headers())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "redirect resolution failed, keeping original");
                return Ok(url.to_string());
            }
        };

        let final_url = response.url().clone();
        let final_host = final_url.host_str().unwrap_or_default();
        if CONSENT_HOSTS.iter().any(|h| final_host == *h) {
            debug!(url, "landed on consent interstitial, keeping original");
            return Ok(url.to_string());
        }

        Ok(final_url.to_string())
    }

    /// True when the URL points at a known redirect aggregator.
    pub fn is_aggregator_url(url: &str) -> bool {
        url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .map(|host| REDIRECT_AGGREGATOR_HOSTS.iter().any(|a| host == *a))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregator_detection() {
        assert!(Fetcher::is_aggregator_url(
            "https://news.google.com/rss/articles/abc"
        ));
        assert!(!Fetcher::is_aggregator_url("https://www.reuters.com/a"));
        assert!(!Fetcher::is_aggregator_url("not a url"));
    }
}
