//! The ingestion orchestrator: per-source jobs, per-article fan-out with
//! strict per-article stage ordering, failure isolation at both levels, and
//! run metrics persisted to `ingestion_runs`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use fluxwire_common::{content_hash, Entry, IngestionRun, RunStatus, Source, SourceKind};
use fluxwire_nlp::{CountryTagger, TopicTagger};
use fluxwire_rag::{Chunker, EmbeddingService};
use fluxwire_store::{ArticleEnrichment, NewChunk, Store, StoreError, UpsertOutcome};

use crate::extract::ContentExtractor;
use crate::fetcher::Fetcher;
use crate::{feed, scrape};

/// Entries processed per source per run.
const MAX_ENTRIES_PER_SOURCE: usize = 25;
/// Error samples kept in run stats; the counter stays exact beyond this.
const MAX_ERROR_SAMPLES: usize = 10;
/// Index pages walked per scraper source.
const SCRAPE_MAX_PAGES: u32 = 3;

#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Store,
    pub fetcher: Arc<Fetcher>,
    pub embedding: EmbeddingService,
    pub country_tagger: Arc<CountryTagger>,
    pub topic_tagger: Arc<TopicTagger>,
    pub chunker: Arc<Chunker>,
    pub article_workers: usize,
}

/// Per-run counters. Serialized into `ingestion_runs.stats`.
#[derive(Debug, Default, Serialize)]
pub struct RunMetrics {
    pub sources_processed: u32,
    pub articles_fetched: u32,
    pub articles_new: u32,
    pub articles_updated: u32,
    pub articles_unchanged: u32,
    pub articles_extracted: u32,
    pub articles_tagged: u32,
    pub chunks_created: u32,
    pub chunks_embedded: u32,
    pub errors: u64,
    pub error_samples: Vec<String>,
    pub duration_seconds: f64,
}

impl RunMetrics {
    fn record_error(&mut self, message: String) {
        self.errors += 1;
        if self.error_samples.len() < MAX_ERROR_SAMPLES {
            self.error_samples.push(message);
        }
    }
}

pub struct IngestionPipeline {
    deps: PipelineDeps,
    cancel: Arc<AtomicBool>,
}

impl IngestionPipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            deps,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag; setting it stops the current run from dispatching new
    /// source jobs. In-flight article tasks are always drained.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run one full ingestion cycle over all enabled sources.
    pub async fn run(&self) -> anyhow::Result<IngestionRun> {
        let run = self.deps.store.create_run().await?;
        let started = Instant::now();
        let metrics = Arc::new(Mutex::new(RunMetrics::default()));
        let mut cancelled = false;

        let sources = self.deps.store.enabled_sources().await?;
        info!(run_id = run.id, sources = sources.len(), "ingestion run starting");

        for source in sources {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(run_id = run.id, "cancellation requested, stopping source dispatch");
                cancelled = true;
                break;
            }

            metrics.lock().await.sources_processed += 1;
            self.ingest_source(&source, &metrics).await;
        }

        let status = if cancelled {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };

        let stats = {
            let mut m = metrics.lock().await;
            m.duration_seconds = started.elapsed().as_secs_f64();
            info!(
                run_id = run.id,
                sources = m.sources_processed,
                new = m.articles_new,
                updated = m.articles_updated,
                chunks = m.chunks_created,
                embedded = m.chunks_embedded,
                errors = m.errors,
                status = %status,
                "ingestion run finished"
            );
            serde_json::to_value(&*m)?
        };

        self.deps.store.finish_run(run.id, status, &stats).await?;

        Ok(IngestionRun {
            id: run.id,
            started_at: run.started_at,
            finished_at: Some(chrono::Utc::now()),
            status,
            stats: Some(stats),
        })
    }

    /// One source job: collect entries, then fan articles out over a bounded
    /// worker set. A source-level failure is recorded and the run continues.
    async fn ingest_source(&self, source: &Source, metrics: &Arc<Mutex<RunMetrics>>) {
        let entries = match self.collect_entries(source).await {
            Ok(mut entries) => {
                entries.truncate(MAX_ENTRIES_PER_SOURCE);
                entries
            }
            Err(message) => {
                warn!(source = %source.name, error = %message, "source failed");
                metrics.lock().await.record_error(message);
                return;
            }
        };

        info!(source = %source.name, entries = entries.len(), "source entries collected");
        metrics.lock().await.articles_fetched += entries.len() as u32;

        let semaphore = Arc::new(Semaphore::new(self.deps.article_workers));
        let mut tasks: JoinSet<()> = JoinSet::new();

        for entry in entries {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let deps = self.deps.clone();
            let source = source.clone();
            let metrics = metrics.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let url = entry.url.clone();
                if let Err(message) = process_entry(&deps, &source, entry, &metrics).await {
                    warn!(url, error = %message, "article failed");
                    metrics.lock().await.record_error(message);
                }
            });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                metrics.lock().await.record_error(format!("article task panicked: {e}"));
            }
        }
    }

    /// Entries for a source: feed fetch+parse for rss/paywalled, the
    /// registered adapter for web scrapers.
    async fn collect_entries(&self, source: &Source) -> Result<Vec<Entry>, String> {
        match source.kind {
            SourceKind::Rss | SourceKind::Paywalled => {
                let bytes = self
                    .deps
                    .fetcher
                    .fetch_feed(&source.locator)
                    .await
                    .map_err(|e| format!("{}: {e}", source.name))?;
                feed::parse(&bytes).map_err(|e| format!("{}: {e}", source.name))
            }
            SourceKind::WebScraper => {
                let scraper = scrape::scraper_for_key(&source.locator, self.deps.fetcher.clone())
                    .ok_or_else(|| {
                        format!("{}: no scraper registered for '{}'", source.name, source.locator)
                    })?;
                scraper
                    .scrape(SCRAPE_MAX_PAGES)
                    .await
                    .map_err(|e| format!("{}: {e}", source.name))
            }
        }
    }
}

/// Process one entry through upsert, extraction, tagging, chunking and
/// embedding. Stages are strictly sequential; all writes beyond the upsert
/// land in a single per-article transaction.
async fn process_entry(
    deps: &PipelineDeps,
    source: &Source,
    entry: Entry,
    metrics: &Arc<Mutex<RunMetrics>>,
) -> Result<(), String> {
    let hash = content_hash(&entry.title, &entry.url, entry.summary.as_deref());

    let outcome = retry_transient(|| deps.store.upsert_article(source.id, &entry, &hash))
        .await
        .map_err(|e| format!("upsert {}: {e}", entry.url))?;

    let article_id = outcome.article_id();
    {
        let mut m = metrics.lock().await;
        match outcome {
            UpsertOutcome::Inserted(_) => m.articles_new += 1,
            UpsertOutcome::Updated(_) => m.articles_updated += 1,
            UpsertOutcome::Unchanged(_) => m.articles_unchanged += 1,
        }
    }

    // Content is sticky: an article that already has text is never
    // re-extracted or re-chunked by the pipeline.
    let article = deps
        .store
        .get_article(article_id)
        .await
        .map_err(|e| format!("load {}: {e}", entry.url))?;
    if article.map(|a| a.content_text.is_some()).unwrap_or(false) {
        return Ok(());
    }

    let mut enrichment = ArticleEnrichment::default();
    let mut content: Option<String> = None;

    if source.kind != SourceKind::Paywalled {
        match ContentExtractor::extract_article(&deps.fetcher, &entry.url).await {
            Ok(extracted) => {
                if let Some(text) = extracted.text {
                    metrics.lock().await.articles_extracted += 1;
                    enrichment.content = Some((
                        text.clone(),
                        extracted.language,
                        extracted.image_url.or_else(|| entry.image_url.clone()),
                    ));
                    content = Some(text);
                }
            }
            Err(e) => {
                // The article stays, without content; a later run retries.
                metrics
                    .lock()
                    .await
                    .record_error(format!("extract {}: {e}", entry.url));
            }
        }
    }

    // Tagging runs on title + content, falling back to the feed summary when
    // extraction was skipped or empty.
    let tag_body = content.as_deref().or(entry.summary.as_deref());
    let (countries, regions) = match &source.country_override {
        Some(code) => (vec![code.clone()], Vec::new()),
        None => deps.country_tagger.tag_article(&entry.title, tag_body),
    };
    let topics = deps.topic_tagger.tag_article(&entry.title, tag_body);

    if !countries.is_empty() || !topics.is_empty() || !regions.is_empty() {
        metrics.lock().await.articles_tagged += 1;
        enrichment.tags = Some((countries.clone(), topics.clone(), regions));
    }

    if let Some(text) = &content {
        let chunks = deps.chunker.chunk(text);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        // Embedding failure is not fatal: chunks are persisted without
        // vectors and the backfill job fills them in later.
        let embeddings = match deps.embedding.embed_texts(&texts).await {
            Ok(vectors) => Some(vectors),
            Err(e) => {
                warn!(url = %entry.url, error = %e, "embedding failed, persisting chunks without vectors");
                metrics
                    .lock()
                    .await
                    .record_error(format!("embed {}: {e}", entry.url));
                None
            }
        };

        let chunk_countries = (!countries.is_empty()).then(|| countries.clone());
        let chunk_topics = (!topics.is_empty()).then(|| topics.clone());

        let new_chunks: Vec<NewChunk> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| NewChunk {
                chunk_index: chunk.chunk_index,
                text: chunk.text.clone(),
                embedding: embeddings.as_ref().map(|e| e[i].clone()),
                country_codes: chunk_countries.clone(),
                topic_tags: chunk_topics.clone(),
                published_at: entry.published_at,
            })
            .collect();

        {
            let mut m = metrics.lock().await;
            m.chunks_created += new_chunks.len() as u32;
            if embeddings.is_some() {
                m.chunks_embedded += new_chunks.len() as u32;
            }
        }

        enrichment.chunks = Some(new_chunks);
    }

    retry_transient(|| deps.store.persist_enrichment(article_id, &enrichment))
        .await
        .map_err(|e| format!("persist {}: {e}", entry.url))?;

    Ok(())
}

/// Run a store operation, retrying exactly once on a transient failure.
async fn retry_transient<T, F, Fut>(mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, StoreError>>,
{
    match op().await {
        Err(e) if e.is_transient() => {
            warn!(error = %e, "transient store error, retrying once");
            op().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_samples_are_capped_but_counter_is_exact() {
        let mut metrics = RunMetrics::default();
        for i in 0..25 {
            metrics.record_error(format!("error {i}"));
        }
        assert_eq!(metrics.errors, 25);
        assert_eq!(metrics.error_samples.len(), MAX_ERROR_SAMPLES);
        assert_eq!(metrics.error_samples[0], "error 0");
    }

    #[test]
    fn metrics_serialize_with_all_counters() {
        let mut metrics = RunMetrics::default();
        metrics.sources_processed = 2;
        metrics.articles_new = 3;
        metrics.record_error("boom".to_string());

        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["sources_processed"], 2);
        assert_eq!(value["articles_new"], 3);
        assert_eq!(value["errors"], 1);
        assert_eq!(value["error_samples"][0], "boom");
    }
}
