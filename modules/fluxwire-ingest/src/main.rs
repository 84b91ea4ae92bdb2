use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use fluxwire_common::AppConfig;
use fluxwire_ingest::backfill::embed_missing_chunks;
use fluxwire_ingest::pipeline::{IngestionPipeline, PipelineDeps};
use fluxwire_ingest::scheduler::Scheduler;
use fluxwire_ingest::Fetcher;
use fluxwire_nlp::{CountryTagger, TopicTagger};
use fluxwire_rag::{Chunker, EmbeddingService};
use fluxwire_store::Store;

#[derive(Parser)]
#[command(name = "fluxwire-worker", about = "Fluxwire ingestion worker")]
struct Args {
    /// Run one ingestion cycle and exit instead of looping.
    #[arg(long)]
    once: bool,

    /// Embed chunks that are missing vectors, then exit.
    #[arg(long)]
    backfill: bool,

    /// Batch size for --backfill.
    #[arg(long, default_value_t = 100)]
    batch_size: i64,

    /// Insert the curated default source set, then exit.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fluxwire=info".parse()?))
        .init();

    let args = Args::parse();

    info!("Fluxwire ingestion worker starting...");
    let config = AppConfig::from_env()?;

    let store = Store::connect(&config.database_url, config.embedding_dim).await?;

    if args.seed {
        let (added, skipped) = fluxwire_ingest::seed::seed_default_sources(&store).await?;
        info!(added, skipped, "seeding complete");
        return Ok(());
    }

    let openai = OpenAi::new(&config.openai_api_key, &config.chat_model)
        .with_embedding_model(&config.embedding_model, config.embedding_dim);
    let embedding = EmbeddingService::new(Arc::new(openai));

    if args.backfill {
        let count = embed_missing_chunks(&store, &embedding, args.batch_size).await?;
        info!(count, "backfill complete");
        return Ok(());
    }

    let fetcher = Arc::new(Fetcher::new(
        &config.user_agent,
        config.request_timeout_secs,
        config.max_inflight_per_host,
        config.max_inflight_global,
    ));

    let pipeline = Arc::new(IngestionPipeline::new(PipelineDeps {
        store,
        fetcher,
        embedding,
        country_tagger: Arc::new(CountryTagger::default()),
        topic_tagger: Arc::new(TopicTagger::default()),
        chunker: Arc::new(Chunker::default()),
        article_workers: config.article_workers,
    }));

    if args.once {
        let run = pipeline.run().await?;
        info!(run_id = run.id, status = %run.status, "single run complete");
        return Ok(());
    }

    let scheduler = Scheduler::new(pipeline.clone(), config.ingest_interval_minutes);
    let shutdown = Arc::new(AtomicBool::new(false));

    // Ctrl-C stops dispatching new work; the in-flight run winds down and
    // records a partial stats snapshot.
    let cancel = pipeline.cancel_flag();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            cancel.store(true, Ordering::SeqCst);
            shutdown_signal.store(true, Ordering::SeqCst);
        }
    });

    scheduler.run_loop(shutdown).await;
    info!("worker stopped");
    Ok(())
}
