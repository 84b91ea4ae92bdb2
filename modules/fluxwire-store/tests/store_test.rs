//! Integration tests for the Postgres store.
//! Requires a Postgres instance with the pgvector extension. Set
//! DATABASE_TEST_URL or these tests are skipped.

use chrono::Utc;

use fluxwire_common::{Entry, RunStatus, SourceKind};
use fluxwire_store::{
    migrate, ArticleEnrichment, NewChunk, SearchFilters, SourcePatch, Store, UpsertOutcome,
};

/// Embedding dimension used by the test schema.
const DIM: usize = 4;

/// Get a test store, or skip when no test DB is available.
async fn test_store() -> Option<Store> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = sqlx::PgPool::connect(&url).await.ok()?;

    migrate::ensure_schema(&pool, DIM).await.ok()?;

    // Clean slate for each test
    sqlx::query("TRUNCATE sources, articles, article_chunks, ingestion_runs, briefs RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .ok()?;

    Some(Store::from_pool(pool))
}

fn entry(title: &str, url: &str, summary: Option<&str>) -> Entry {
    Entry {
        title: title.to_string(),
        url: url.to_string(),
        published_at: Some(Utc::now()),
        summary: summary.map(|s| s.to_string()),
        image_url: None,
    }
}

/// Axis-aligned unit vector; cosine similarity between distinct axes is 0.
fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[i] = 1.0;
    v
}

async fn seed_source(store: &Store) -> i64 {
    store
        .create_source("wire", SourceKind::Rss, "https://example.com/feed", true, None)
        .await
        .unwrap()
        .id
}

// =========================================================================
// Upsert
// =========================================================================

#[tokio::test]
async fn upsert_twice_with_same_hash_is_unchanged() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;
    let e = entry("Title", "https://example.com/a", Some("sum"));
    let hash = fluxwire_common::content_hash(&e.title, &e.url, e.summary.as_deref());

    let first = store.upsert_article(source_id, &e, &hash).await.unwrap();
    assert!(matches!(first, UpsertOutcome::Inserted(_)));

    let second = store.upsert_article(source_id, &e, &hash).await.unwrap();
    assert!(matches!(second, UpsertOutcome::Unchanged(_)));
    assert_eq!(first.article_id(), second.article_id());
}

#[tokio::test]
async fn changed_hash_updates_title_and_summary() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    let e1 = entry("Old title", "https://example.com/a", Some("old"));
    let h1 = fluxwire_common::content_hash(&e1.title, &e1.url, e1.summary.as_deref());
    store.upsert_article(source_id, &e1, &h1).await.unwrap();

    let e2 = entry("New title", "https://example.com/a", Some("new"));
    let h2 = fluxwire_common::content_hash(&e2.title, &e2.url, e2.summary.as_deref());
    let outcome = store.upsert_article(source_id, &e2, &h2).await.unwrap();
    assert!(matches!(outcome, UpsertOutcome::Updated(_)));

    let article = store.get_article(outcome.article_id()).await.unwrap().unwrap();
    assert_eq!(article.title, "New title");
    assert_eq!(article.raw_summary.as_deref(), Some("new"));
    assert_eq!(article.content_hash, h2);
}

// =========================================================================
// Chunk replacement
// =========================================================================

fn chunk(index: i32, text: &str, embedding: Option<Vec<f32>>) -> NewChunk {
    NewChunk {
        chunk_index: index,
        text: text.to_string(),
        embedding,
        country_codes: Some(vec!["DE".to_string()]),
        topic_tags: Some(vec!["renewables_wind".to_string()]),
        published_at: Some(Utc::now()),
    }
}

#[tokio::test]
async fn replace_chunks_is_atomic_and_dense() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;
    let e = entry("T", "https://example.com/a", None);
    let hash = fluxwire_common::content_hash(&e.title, &e.url, None);
    let article_id = store
        .upsert_article(source_id, &e, &hash)
        .await
        .unwrap()
        .article_id();

    store
        .replace_chunks(
            article_id,
            &[chunk(0, "old zero", None), chunk(1, "old one", None)],
        )
        .await
        .unwrap();

    store
        .replace_chunks(
            article_id,
            &[
                chunk(0, "new zero", None),
                chunk(1, "new one", None),
                chunk(2, "new two", None),
            ],
        )
        .await
        .unwrap();

    let rows = store.chunk_texts_for_article(article_id).await.unwrap();
    assert_eq!(rows.len(), 3);
    for (i, (index, text)) in rows.iter().enumerate() {
        assert_eq!(*index, i as i32);
        assert!(text.starts_with("new"), "stale chunk survived: {text}");
    }
}

#[tokio::test]
async fn enrichment_writes_content_tags_and_chunks_together() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;
    let e = entry("T", "https://example.com/a", None);
    let hash = fluxwire_common::content_hash(&e.title, &e.url, None);
    let article_id = store
        .upsert_article(source_id, &e, &hash)
        .await
        .unwrap()
        .article_id();

    let enrichment = ArticleEnrichment {
        content: Some((
            "body text".to_string(),
            Some("en".to_string()),
            Some("https://cdn.example.com/x.jpg".to_string()),
        )),
        tags: Some((
            vec!["DE".to_string()],
            vec!["renewables_wind".to_string()],
            vec!["EU".to_string()],
        )),
        chunks: Some(vec![chunk(0, "body text", Some(axis(0)))]),
    };
    store.persist_enrichment(article_id, &enrichment).await.unwrap();

    let article = store.get_article(article_id).await.unwrap().unwrap();
    assert_eq!(article.content_text.as_deref(), Some("body text"));
    assert_eq!(article.language.as_deref(), Some("en"));
    assert_eq!(article.country_codes, Some(vec!["DE".to_string()]));
    assert_eq!(article.metadata.regions, vec!["EU".to_string()]);
    assert_eq!(
        article.metadata.image_url.as_deref(),
        Some("https://cdn.example.com/x.jpg")
    );

    let rows = store.chunk_texts_for_article(article_id).await.unwrap();
    assert_eq!(rows.len(), 1);
}

// =========================================================================
// Vector search
// =========================================================================

async fn seed_chunked_article(
    store: &Store,
    source_id: i64,
    url: &str,
    countries: &[&str],
    embedding: Option<Vec<f32>>,
) -> i64 {
    let e = entry("T", url, None);
    let hash = fluxwire_common::content_hash(&e.title, &e.url, None);
    let article_id = store
        .upsert_article(source_id, &e, &hash)
        .await
        .unwrap()
        .article_id();

    let mut c = chunk(0, "chunk text", embedding);
    c.country_codes = Some(countries.iter().map(|s| s.to_string()).collect());
    store.replace_chunks(article_id, &[c]).await.unwrap();
    article_id
}

#[tokio::test]
async fn vector_search_orders_by_similarity() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    let near = seed_chunked_article(&store, source_id, "https://example.com/near", &["DE"], Some(axis(0))).await;
    let _far = seed_chunked_article(&store, source_id, "https://example.com/far", &["DE"], Some(axis(1))).await;

    let hits = store
        .vector_search(&axis(0), &SearchFilters::default(), 8)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].article_id, near);
    assert!((hits[0].similarity - 1.0).abs() < 1e-6);
    assert!(hits[1].similarity < 0.01);
}

#[tokio::test]
async fn vector_search_set_intersection_on_countries() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    // Chunk tagged US+GB must match a US-only filter.
    seed_chunked_article(&store, source_id, "https://example.com/a", &["US", "GB"], Some(axis(0))).await;
    seed_chunked_article(&store, source_id, "https://example.com/b", &["FR"], Some(axis(0))).await;

    let filters = SearchFilters {
        countries: vec!["US".to_string()],
        ..Default::default()
    };
    let hits = store.vector_search(&axis(0), &filters, 8).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].article_url, "https://example.com/a");
}

#[tokio::test]
async fn null_embeddings_are_not_candidates() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    seed_chunked_article(&store, source_id, "https://example.com/a", &["DE"], None).await;
    seed_chunked_article(&store, source_id, "https://example.com/b", &["DE"], Some(axis(0))).await;

    let hits = store
        .vector_search(&axis(0), &SearchFilters::default(), 8)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].article_url, "https://example.com/b");
}

#[tokio::test]
async fn k_zero_returns_empty_without_error() {
    let Some(store) = test_store().await else {
        return;
    };
    let hits = store
        .vector_search(&axis(0), &SearchFilters::default(), 0)
        .await
        .unwrap();
    assert!(hits.is_empty());
}

// =========================================================================
// Structured article search
// =========================================================================

#[tokio::test]
async fn title_phrase_hits_rank_above_keyword_hits() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    for (url, title) in [
        ("https://example.com/1", "Grid fees rise in offshore regions"),
        ("https://example.com/2", "Offshore wind auction clears"),
    ] {
        let e = entry(title, url, None);
        let hash = fluxwire_common::content_hash(&e.title, &e.url, None);
        store.upsert_article(source_id, &e, &hash).await.unwrap();
    }

    let articles = store
        .articles_by_title_keywords(
            &["offshore wind".to_string()],
            &["offshore".to_string()],
            &[],
            &[],
            5,
        )
        .await
        .unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].url, "https://example.com/2", "phrase match must rank first");
}

#[tokio::test]
async fn articles_by_topics_uses_set_intersection() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    let wind = entry("Wind story", "https://example.com/wind", None);
    let hash = fluxwire_common::content_hash(&wind.title, &wind.url, None);
    let wind_id = store
        .upsert_article(source_id, &wind, &hash)
        .await
        .unwrap()
        .article_id();
    store
        .persist_enrichment(
            wind_id,
            &ArticleEnrichment {
                tags: Some((vec![], vec!["renewables_wind".to_string()], vec![])),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let solar = entry("Solar story", "https://example.com/solar", None);
    let hash = fluxwire_common::content_hash(&solar.title, &solar.url, None);
    let solar_id = store
        .upsert_article(source_id, &solar, &hash)
        .await
        .unwrap()
        .article_id();
    store
        .persist_enrichment(
            solar_id,
            &ArticleEnrichment {
                tags: Some((vec![], vec!["renewables_solar".to_string()], vec![])),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let found = store
        .articles_by_topics(&["renewables_wind".to_string(), "hydrogen".to_string()], 10)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, wind_id);
}

// =========================================================================
// Runs, briefs, sources
// =========================================================================

#[tokio::test]
async fn list_articles_paginates_and_counts() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    for i in 0..5 {
        let e = entry(&format!("Story {i}"), &format!("https://example.com/{i}"), None);
        let hash = fluxwire_common::content_hash(&e.title, &e.url, None);
        store.upsert_article(source_id, &e, &hash).await.unwrap();
    }

    let page1 = store.list_articles(None, None, 7, 1, 2).await.unwrap();
    assert_eq!(page1.total, 5);
    assert_eq!(page1.items.len(), 2);
    assert_eq!(page1.items[0].source_name, "wire");

    let page3 = store.list_articles(None, None, 7, 3, 2).await.unwrap();
    assert_eq!(page3.items.len(), 1);

    // Country filter with no matches returns an empty page but a zero total.
    let filtered = store.list_articles(Some("JP"), None, 7, 1, 2).await.unwrap();
    assert_eq!(filtered.total, 0);
    assert!(filtered.items.is_empty());
}

#[tokio::test]
async fn run_lifecycle_records_stats() {
    let Some(store) = test_store().await else {
        return;
    };

    let run = store.create_run().await.unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.finished_at.is_none());

    let stats = serde_json::json!({"articles_new": 3, "errors": 1});
    store.finish_run(run.id, RunStatus::Completed, &stats).await.unwrap();

    let reloaded = store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, RunStatus::Completed);
    assert!(reloaded.finished_at.is_some());
    assert_eq!(reloaded.stats.unwrap()["articles_new"], 3);

    let listed = store.list_runs(10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn brief_cache_round_trip() {
    let Some(store) = test_store().await else {
        return;
    };

    store.insert_brief("DE", "brief text", 12, 7).await.unwrap();

    let cached = store.cached_brief("DE", 7, 24).await.unwrap();
    assert_eq!(cached.unwrap().content, "brief text");

    // Different window misses the cache.
    assert!(store.cached_brief("DE", 14, 24).await.unwrap().is_none());
    assert!(store.cached_brief("FR", 7, 24).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_source_cascades_to_articles_and_chunks() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;
    let article_id =
        seed_chunked_article(&store, source_id, "https://example.com/a", &["DE"], Some(axis(0))).await;

    store.delete_source(source_id).await.unwrap();

    assert!(store.get_article(article_id).await.unwrap().is_none());
    let rows = store.chunk_texts_for_article(article_id).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn source_update_patches_fields() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;

    let updated = store
        .update_source(
            source_id,
            SourcePatch {
                enabled: Some(false),
                country_override: Some(Some("GB".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!updated.enabled);
    assert_eq!(updated.country_override.as_deref(), Some("GB"));
    assert_eq!(updated.name, "wire");

    let enabled = store.enabled_sources().await.unwrap();
    assert!(enabled.is_empty());
}

#[tokio::test]
async fn backfill_finds_only_vectorless_chunks() {
    let Some(store) = test_store().await else {
        return;
    };
    let source_id = seed_source(&store).await;
    seed_chunked_article(&store, source_id, "https://example.com/a", &["DE"], None).await;
    seed_chunked_article(&store, source_id, "https://example.com/b", &["DE"], Some(axis(0))).await;

    let missing = store.chunks_missing_embeddings(10).await.unwrap();
    assert_eq!(missing.len(), 1);

    store.set_chunk_embedding(missing[0].0, &axis(2)).await.unwrap();
    assert!(store.chunks_missing_embeddings(10).await.unwrap().is_empty());
}
