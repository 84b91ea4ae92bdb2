//! RAG loop integration tests over deterministic providers.
//! Requires a Postgres instance with pgvector. Set DATABASE_TEST_URL or
//! these tests are skipped.

use std::sync::Arc;

use chrono::Utc;

use ai_client::{Embedder, FakeChat, FakeEmbedder};
use fluxwire_common::{Entry, SourceKind};
use fluxwire_rag::{Answerer, Chunker, EmbeddingService, Retriever};
use fluxwire_store::{migrate, ArticleEnrichment, NewChunk, SearchFilters, Store};

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

fn answerer(store: &Store) -> Answerer {
    let embedding = EmbeddingService::new(Arc::new(FakeEmbedder::new(DIM)));
    let retriever = Retriever::new(store.clone(), embedding);
    Answerer::new(Arc::new(FakeChat::new()), retriever)
}

/// Insert an article with tags and, optionally, an embedded chunk.
async fn seed_article(
    store: &Store,
    url: &str,
    title: &str,
    body: &str,
    countries: &[&str],
    topics: &[&str],
    embed: bool,
) -> i64 {
    let source_id = match store.get_source(1).await.unwrap() {
        Some(s) => s.id,
        None => {
            store
                .create_source("wire", SourceKind::Rss, "https://example.com/feed", true, None)
                .await
                .unwrap()
                .id
        }
    };

    let entry = Entry {
        title: title.to_string(),
        url: url.to_string(),
        published_at: Some(Utc::now()),
        summary: None,
        image_url: None,
    };
    let hash = fluxwire_common::content_hash(&entry.title, &entry.url, None);
    let article_id = store
        .upsert_article(source_id, &entry, &hash)
        .await
        .unwrap()
        .article_id();

    let countries: Vec<String> = countries.iter().map(|s| s.to_string()).collect();
    let topics: Vec<String> = topics.iter().map(|s| s.to_string()).collect();

    let chunker = Chunker::default();
    let chunks = chunker.chunk(body);
    let embedder = FakeEmbedder::new(DIM);

    let mut new_chunks = Vec::new();
    for chunk in &chunks {
        let embedding = if embed {
            Some(
                embedder
                    .embed_batch(&[chunk.text.clone()])
                    .await
                    .unwrap()
                    .remove(0),
            )
        } else {
            None
        };
        new_chunks.push(NewChunk {
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
            embedding,
            country_codes: Some(countries.clone()),
            topic_tags: Some(topics.clone()),
            published_at: Some(Utc::now()),
        });
    }

    let enrichment = ArticleEnrichment {
        content: Some((body.to_string(), Some("en".to_string()), None)),
        tags: Some((countries, topics, Vec::new())),
        chunks: Some(new_chunks),
    };
    store.persist_enrichment(article_id, &enrichment).await.unwrap();
    article_id
}

#[tokio::test]
async fn identical_question_retrieves_chunk_with_high_confidence() {
    let Some(store) = test_store().await else {
        return;
    };

    let body = "Germany approves a two gigawatt offshore wind auction for the North Sea.";
    seed_article(
        &store,
        "https://example.com/de-wind",
        "Germany approves 2GW offshore wind auction",
        body,
        &["DE"],
        &["renewables_wind"],
        true,
    )
    .await;

    // The fake embedder maps equal text to equal vectors, so asking with the
    // chunk's own text pins similarity at 1.0.
    let outcome = answerer(&store)
        .chat(body, &SearchFilters::default(), 8)
        .await
        .unwrap();

    assert_eq!(outcome.confidence, "high");
    assert_eq!(outcome.citations.len(), 1);
    assert_eq!(outcome.citations[0].url, "https://example.com/de-wind");
    assert!((outcome.citations[0].similarity - 1.0).abs() < 1e-4);
    // "Germany" in the question became a DE filter.
    assert_eq!(outcome.filters_applied["countries"][0], "DE");
    // FakeChat saw numbered context and cited it.
    assert!(outcome.answer.contains("[1]"));
}

#[tokio::test]
async fn country_fallback_serves_medium_confidence_with_citations() {
    let Some(store) = test_store().await else {
        return;
    };

    // DE articles exist but carry no embeddings, so semantic search is empty.
    seed_article(
        &store,
        "https://example.com/de-solar",
        "German solar expansion continues",
        "Rooftop solar installations in Germany grew again this quarter.",
        &["DE"],
        &["renewables_solar"],
        false,
    )
    .await;

    let outcome = answerer(&store)
        .chat("what is happening with solar in Germany?", &SearchFilters::default(), 8)
        .await
        .unwrap();

    assert_eq!(outcome.confidence, "medium");
    assert!(!outcome.citations.is_empty());
    for citation in &outcome.citations {
        let article = store.get_article(citation.id).await.unwrap().unwrap();
        assert!(article
            .country_codes
            .unwrap_or_default()
            .contains(&"DE".to_string()));
    }
}

#[tokio::test]
async fn empty_corpus_falls_back_to_general_knowledge() {
    let Some(store) = test_store().await else {
        return;
    };

    let outcome = answerer(&store)
        .chat("explain perovskite tandem efficiency records", &SearchFilters::default(), 8)
        .await
        .unwrap();

    assert_eq!(outcome.confidence, "low");
    assert!(outcome.citations.is_empty());
}

#[tokio::test]
async fn caller_topic_filter_excludes_other_topics() {
    let Some(store) = test_store().await else {
        return;
    };

    let wind_body = "Offshore turbines were installed at record pace across the North Sea zone.";
    let solar_body = "Module prices fell sharply as new factories reached volume production.";
    seed_article(
        &store,
        "https://example.com/wind",
        "Turbine installs at record pace",
        wind_body,
        &["GB"],
        &["renewables_wind"],
        true,
    )
    .await;
    seed_article(
        &store,
        "https://example.com/solar",
        "Module prices fall",
        solar_body,
        &["GB"],
        &["renewables_solar"],
        true,
    )
    .await;

    let filters = SearchFilters {
        topics: vec!["renewables_wind".to_string()],
        ..Default::default()
    };
    // Ask with the wind chunk's text so the top hit is deterministic.
    let outcome = answerer(&store).chat(wind_body, &filters, 8).await.unwrap();

    assert!(!outcome.citations.is_empty());
    for citation in &outcome.citations {
        assert_eq!(citation.url, "https://example.com/wind");
    }
}
