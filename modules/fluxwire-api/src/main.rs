use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use fluxwire_common::AppConfig;
use fluxwire_ingest::pipeline::{IngestionPipeline, PipelineDeps};
use fluxwire_ingest::scheduler::Scheduler;
use fluxwire_ingest::Fetcher;
use fluxwire_nlp::{CountryTagger, TopicTagger};
use fluxwire_rag::{Answerer, BriefGenerator, Chunker, EmbeddingService, Retriever};
use fluxwire_store::Store;

mod error;
mod rest;

pub struct AppState {
    pub store: Store,
    pub answerer: Answerer,
    pub briefs: BriefGenerator,
    pub scheduler: Arc<Scheduler>,
    pub config: AppConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fluxwire=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    let store = Store::connect(&config.database_url, config.embedding_dim).await?;

    let openai = Arc::new(
        OpenAi::new(&config.openai_api_key, &config.chat_model)
            .with_embedding_model(&config.embedding_model, config.embedding_dim),
    );
    let embedding = EmbeddingService::new(openai.clone());

    let retriever = Retriever::new(store.clone(), embedding.clone());
    let answerer = Answerer::new(openai.clone(), retriever);
    let briefs = BriefGenerator::new(openai, store.clone());

    let fetcher = Arc::new(Fetcher::new(
        &config.user_agent,
        config.request_timeout_secs,
        config.max_inflight_per_host,
        config.max_inflight_global,
    ));
    let pipeline = Arc::new(IngestionPipeline::new(PipelineDeps {
        store: store.clone(),
        fetcher,
        embedding,
        country_tagger: Arc::new(CountryTagger::default()),
        topic_tagger: Arc::new(TopicTagger::default()),
        chunker: Arc::new(Chunker::default()),
        article_workers: config.article_workers,
    }));
    let scheduler = Arc::new(Scheduler::new(pipeline, config.ingest_interval_minutes));

    let addr = format!("{}:{}", config.api_host, config.api_port);
    let state = Arc::new(AppState {
        store,
        answerer,
        briefs,
        scheduler,
        config,
    });

    let app = Router::new()
        .route("/chat", post(rest::chat::chat))
        .route("/briefs", get(rest::briefs::generate))
        .route("/articles", get(rest::articles::list))
        .route("/articles/top-stories", get(rest::articles::top_stories))
        .route("/countries", get(rest::countries::list))
        .route("/ingestion/run", post(rest::ingestion::trigger))
        .route("/ingestion/runs", get(rest::ingestion::list_runs))
        .route("/ingestion/runs/{run_id}", get(rest::ingestion::get_run))
        .route("/sources", get(rest::sources::list).post(rest::sources::create))
        .route(
            "/sources/{source_id}",
            get(rest::sources::get_one)
                .put(rest::sources::update)
                .delete(rest::sources::remove),
        )
        .route("/stats/activity", get(rest::stats::activity))
        .route("/stats/topics", get(rest::stats::topics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!(addr = %addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
