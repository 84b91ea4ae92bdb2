//! Pipeline integration test: one failing source, one healthy source served
//! by an in-process HTTP stub. Requires a Postgres instance with pgvector.
//! Set DATABASE_TEST_URL or the test is skipped.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ai_client::FakeEmbedder;
use fluxwire_common::SourceKind;
use fluxwire_ingest::pipeline::{IngestionPipeline, PipelineDeps};
use fluxwire_ingest::Fetcher;
use fluxwire_nlp::{CountryTagger, TopicTagger};
use fluxwire_rag::{Chunker, EmbeddingService};
use fluxwire_store::{migrate, Store};

const DIM: usize = 8;

async fn test_store() -> Option<Store> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = sqlx::PgPool::connect(&url).await.ok()?;
    migrate::ensure_schema(&pool, DIM).await.ok()?;
    sqlx::query("TRUNCATE sources, articles, article_chunks, ingestion_runs, briefs RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .ok()?;
    Some(Store::from_pool(pool))
}

fn feed_xml(base: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Stub Wire</title>
  <item>
    <title>Germany approves 2GW offshore wind auction</title>
    <link>{base}/articles/1</link>
    <pubDate>Mon, 20 Jul 2026 10:00:00 GMT</pubDate>
    <description>The tender was confirmed.</description>
  </item>
  <item>
    <title>Battery storage pipeline grows</title>
    <link>{base}/articles/2</link>
    <pubDate>Tue, 21 Jul 2026 08:00:00 GMT</pubDate>
  </item>
</channel></rss>"#
    )
}

const ARTICLE_ONE: &str = r#"<html><body><article>
<p>The German government approved a two gigawatt offshore wind auction on Monday,
confirming the largest tender of the year and setting delivery deadlines for the
winning developers across the North Sea cluster.</p>
<p>Grid connection timelines remain the binding constraint, according to the
transmission operator, which expects the first turbines to feed power into the
German grid before the end of the decade.</p>
</article></body></html>"#;

const ARTICLE_TWO: &str = r#"<html><body><article>
<p>Developers reported a growing pipeline of battery storage projects, with grid
scale systems dominating interconnection queues in several European markets over
the last quarter.</p>
<p>Falling cell prices and new revenue streams from frequency regulation keep
pushing stationary storage economics ahead of expectations, analysts said.</p>
</article></body></html>"#;

/// Minimal HTTP stub serving the feed and two article pages.
async fn spawn_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");
    let feed = feed_xml(&base);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let feed = feed.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let Ok(n) = socket.read(&mut buf).await else {
                    return;
                };
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();

                let (content_type, body) = match path.as_str() {
                    "/feed" => ("application/rss+xml", feed),
                    "/articles/1" => ("text/html", ARTICLE_ONE.to_string()),
                    "/articles/2" => ("text/html", ARTICLE_TWO.to_string()),
                    _ => ("text/plain", String::new()),
                };

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    base
}

#[tokio::test]
async fn run_survives_failing_source_and_ingests_healthy_one() {
    let Some(store) = test_store().await else {
        return;
    };

    let base = spawn_stub().await;

    // A source whose feed endpoint refuses connections...
    store
        .create_source("broken", SourceKind::Rss, "http://127.0.0.1:9/feed", true, None)
        .await
        .unwrap();
    // ...and a healthy one served by the stub.
    store
        .create_source("stub-wire", SourceKind::Rss, &format!("{base}/feed"), true, None)
        .await
        .unwrap();

    let fetcher = Arc::new(Fetcher::new("fluxwire-test/0.1", 5, 4, 32));
    let embedding = EmbeddingService::new(Arc::new(FakeEmbedder::new(DIM)));

    let pipeline = IngestionPipeline::new(PipelineDeps {
        store: store.clone(),
        fetcher,
        embedding,
        country_tagger: Arc::new(CountryTagger::default()),
        topic_tagger: Arc::new(TopicTagger::default()),
        chunker: Arc::new(Chunker::default()),
        article_workers: 4,
    });

    let run = pipeline.run().await.unwrap();

    assert_eq!(run.status.to_string(), "completed");
    let stats = run.stats.unwrap();
    assert_eq!(stats["sources_processed"], 2);
    assert!(stats["errors"].as_u64().unwrap() >= 1, "broken source must be recorded");
    assert_eq!(stats["articles_new"], 2);
    assert!(stats["chunks_created"].as_u64().unwrap() > 0);
    assert_eq!(stats["chunks_created"], stats["chunks_embedded"]);

    // The wind article got extracted, tagged and chunked.
    let article = store
        .get_article_by_url(&format!("{base}/articles/1"))
        .await
        .unwrap()
        .unwrap();
    assert!(article.content_text.is_some());
    assert_eq!(article.language.as_deref(), Some("en"));
    let countries = article.country_codes.clone().unwrap_or_default();
    assert!(countries.contains(&"DE".to_string()), "got {countries:?}");
    let topics = article.topic_tags.clone().unwrap_or_default();
    assert!(topics.contains(&"renewables_wind".to_string()), "got {topics:?}");

    let chunks = store.chunk_texts_for_article(article.id).await.unwrap();
    assert!(!chunks.is_empty());
    assert_eq!(chunks[0].0, 0);

    // A second run over the unchanged feed creates nothing new.
    let second = pipeline.run().await.unwrap();
    let stats = second.stats.unwrap();
    assert_eq!(stats["articles_new"], 0);
    assert_eq!(stats["chunks_created"], 0);
}
