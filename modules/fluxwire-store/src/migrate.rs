//! Idempotent schema setup. Tables cascade sources -> articles ->
//! article_chunks; the vector index is ivfflat with cosine ops and may be
//! rebuilt lazily by Postgres.

use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

pub async fn ensure_schema(pool: &PgPool, embedding_dim: usize) -> Result<()> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            id               BIGSERIAL    PRIMARY KEY,
            name             TEXT         NOT NULL UNIQUE,
            kind             TEXT         NOT NULL DEFAULT 'rss',
            locator          TEXT         NOT NULL,
            enabled          BOOLEAN      NOT NULL DEFAULT TRUE,
            country_override TEXT,
            created_at       TIMESTAMPTZ  NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id            BIGSERIAL    PRIMARY KEY,
            source_id     BIGINT       NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
            title         TEXT         NOT NULL,
            url           TEXT         NOT NULL UNIQUE,
            published_at  TIMESTAMPTZ,
            fetched_at    TIMESTAMPTZ  NOT NULL DEFAULT now(),
            raw_summary   TEXT,
            content_text  TEXT,
            language      TEXT,
            content_hash  TEXT         NOT NULL,
            country_codes TEXT[],
            topic_tags    TEXT[],
            image_url     TEXT,
            regions       TEXT[]
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The chunk embedding dimension is fixed at migration time. Schema
    // carries no per-row dimension; changing it means re-embedding everything.
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS article_chunks (
            id            BIGSERIAL    PRIMARY KEY,
            article_id    BIGINT       NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
            chunk_index   INTEGER      NOT NULL,
            text          TEXT         NOT NULL,
            embedding     vector({embedding_dim}),
            country_codes TEXT[],
            topic_tags    TEXT[],
            published_at  TIMESTAMPTZ,
            created_at    TIMESTAMPTZ  NOT NULL DEFAULT now(),
            UNIQUE (article_id, chunk_index)
        )
        "#,
    ))
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_runs (
            id          BIGSERIAL    PRIMARY KEY,
            started_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
            finished_at TIMESTAMPTZ,
            status      TEXT         NOT NULL,
            stats       JSONB
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS briefs (
            id            BIGSERIAL    PRIMARY KEY,
            country_code  TEXT         NOT NULL,
            content       TEXT         NOT NULL,
            article_count INTEGER      NOT NULL DEFAULT 0,
            days_range    INTEGER      NOT NULL DEFAULT 7,
            generated_at  TIMESTAMPTZ  NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_articles_source_id ON articles(source_id)",
        "CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at)",
        "CREATE INDEX IF NOT EXISTS idx_articles_content_hash ON articles(content_hash)",
        "CREATE INDEX IF NOT EXISTS idx_articles_country_codes_gin ON articles USING gin(country_codes)",
        "CREATE INDEX IF NOT EXISTS idx_articles_topic_tags_gin ON articles USING gin(topic_tags)",
        "CREATE INDEX IF NOT EXISTS idx_chunks_article_id ON article_chunks(article_id, chunk_index)",
        "CREATE INDEX IF NOT EXISTS idx_chunks_published_at ON article_chunks(published_at)",
        "CREATE INDEX IF NOT EXISTS idx_chunks_country_codes_gin ON article_chunks USING gin(country_codes)",
        "CREATE INDEX IF NOT EXISTS idx_chunks_topic_tags_gin ON article_chunks USING gin(topic_tags)",
        "CREATE INDEX IF NOT EXISTS idx_briefs_country ON briefs(country_code, days_range, generated_at)",
    ];
    for stmt in indexes {
        sqlx::query(stmt).execute(pool).await?;
    }

    // ivfflat needs data to build useful lists; creation may be a no-op on an
    // empty table, so tolerate failure and let a later run create it.
    let _ = sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_chunks_embedding_ivfflat
        ON article_chunks USING ivfflat (embedding vector_cosine_ops)
        WITH (lists = 100)
        "#,
    )
    .execute(pool)
    .await;

    info!(embedding_dim, "database schema ensured");
    Ok(())
}
