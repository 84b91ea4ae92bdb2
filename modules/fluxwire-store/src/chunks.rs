use chrono::{DateTime, Utc};
use pgvector::Vector;

use crate::error::Result;
use crate::Store;

/// A chunk row ready to be written. Filter fields are the parent article's
/// values at write time (the denormalization that enables filter pushdown).
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub chunk_index: i32,
    pub text: String,
    pub embedding: Option<Vec<f32>>,
    pub country_codes: Option<Vec<String>>,
    pub topic_tags: Option<Vec<String>>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Everything the pipeline learned about one article, written atomically.
#[derive(Debug, Clone, Default)]
pub struct ArticleEnrichment {
    /// (content_text, language, image_url)
    pub content: Option<(String, Option<String>, Option<String>)>,
    /// (country_codes, topic_tags, regions)
    pub tags: Option<(Vec<String>, Vec<String>, Vec<String>)>,
    pub chunks: Option<Vec<NewChunk>>,
}

impl Store {
    /// Atomically replace all chunks of an article: delete-then-insert inside
    /// one transaction, so readers never observe a mixed old/new chunk set.
    pub async fn replace_chunks(&self, article_id: i64, chunks: &[NewChunk]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        replace_chunks_tx(&mut tx, article_id, chunks).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Write content, tags and chunks for one article inside a single
    /// transaction: a failure at any statement rolls back only this article.
    pub async fn persist_enrichment(
        &self,
        article_id: i64,
        enrichment: &ArticleEnrichment,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some((content_text, language, image_url)) = &enrichment.content {
            sqlx::query(
                r#"
                UPDATE articles
                SET content_text = $2, language = $3,
                    image_url = COALESCE($4, image_url)
                WHERE id = $1
                "#,
            )
            .bind(article_id)
            .bind(content_text)
            .bind(language)
            .bind(image_url)
            .execute(&mut *tx)
            .await?;
        }

        if let Some((countries, topics, regions)) = &enrichment.tags {
            sqlx::query(
                "UPDATE articles SET country_codes = $2, topic_tags = $3, regions = $4 WHERE id = $1",
            )
            .bind(article_id)
            .bind((!countries.is_empty()).then_some(countries))
            .bind((!topics.is_empty()).then_some(topics))
            .bind((!regions.is_empty()).then_some(regions))
            .execute(&mut *tx)
            .await?;
        }

        if let Some(chunks) = &enrichment.chunks {
            replace_chunks_tx(&mut tx, article_id, chunks).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Chunk texts without vectors, oldest first, for the embedding backfill.
    pub async fn chunks_missing_embeddings(&self, limit: i64) -> Result<Vec<(i64, String)>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT id, text FROM article_chunks
            WHERE embedding IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn set_chunk_embedding(&self, chunk_id: i64, embedding: &[f32]) -> Result<()> {
        sqlx::query("UPDATE article_chunks SET embedding = $2 WHERE id = $1")
            .bind(chunk_id)
            .bind(Vector::from(embedding.to_vec()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Chunk (index, text) pairs for one article, ordered by index.
    /// Used by integration tests to check density and atomic replacement.
    pub async fn chunk_texts_for_article(&self, article_id: i64) -> Result<Vec<(i32, String)>> {
        let rows: Vec<(i32, String)> = sqlx::query_as(
            r#"
            SELECT chunk_index, text FROM article_chunks
            WHERE article_id = $1
            ORDER BY chunk_index
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

async fn replace_chunks_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    article_id: i64,
    chunks: &[NewChunk],
) -> Result<()> {
    sqlx::query("DELETE FROM article_chunks WHERE article_id = $1")
        .bind(article_id)
        .execute(&mut **tx)
        .await?;

    for chunk in chunks {
        let embedding = chunk.embedding.as_ref().map(|e| Vector::from(e.clone()));
        sqlx::query(
            r#"
            INSERT INTO article_chunks
                (article_id, chunk_index, text, embedding, country_codes, topic_tags, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(article_id)
        .bind(chunk.chunk_index)
        .bind(&chunk.text)
        .bind(embedding)
        .bind(&chunk.country_codes)
        .bind(&chunk.topic_tags)
        .bind(chunk.published_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
