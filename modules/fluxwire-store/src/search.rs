use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::FromRow;

use crate::error::Result;
use crate::Store;

/// Structured filters pushed down into vector search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Set-intersection on chunk `country_codes`.
    pub countries: Vec<String>,
    /// Set-intersection on chunk `topic_tags`.
    pub topics: Vec<String>,
    /// Inclusive range on chunk `published_at`.
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
            && self.topics.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

/// A retrieved chunk joined with its article fields, by value.
#[derive(Debug, Clone, FromRow)]
pub struct ChunkHit {
    pub chunk_id: i64,
    pub chunk_index: i32,
    pub text: String,
    /// `1 - cosine_distance`; higher is closer.
    pub similarity: f64,
    pub article_id: i64,
    pub article_title: String,
    pub article_url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub country_codes: Option<Vec<String>>,
    pub topic_tags: Option<Vec<String>>,
}

impl Store {
    /// K-nearest chunks by cosine distance among chunks that have an
    /// embedding and satisfy the filters. `k = 0` returns an empty set.
    pub async fn vector_search(
        &self,
        query_embedding: &[f32],
        filters: &SearchFilters,
        k: i64,
    ) -> Result<Vec<ChunkHit>> {
        if k <= 0 {
            return Ok(Vec::new());
        }

        let query_vec = Vector::from(query_embedding.to_vec());

        let mut qb = sqlx::QueryBuilder::new(
            "SELECT c.id AS chunk_id, c.chunk_index, c.text, \
             1 - (c.embedding <=> ",
        );
        qb.push_bind(query_vec.clone());
        qb.push(
            ") AS similarity, \
             c.article_id, a.title AS article_title, a.url AS article_url, \
             c.published_at, c.country_codes, c.topic_tags \
             FROM article_chunks c \
             JOIN articles a ON a.id = c.article_id \
             WHERE c.embedding IS NOT NULL ",
        );

        if !filters.countries.is_empty() {
            qb.push("AND c.country_codes && ");
            qb.push_bind(filters.countries.clone());
            qb.push(" ");
        }
        if !filters.topics.is_empty() {
            qb.push("AND c.topic_tags && ");
            qb.push_bind(filters.topics.clone());
            qb.push(" ");
        }
        if let Some(from) = filters.date_from {
            qb.push("AND c.published_at >= ");
            qb.push_bind(from);
            qb.push(" ");
        }
        if let Some(to) = filters.date_to {
            qb.push("AND c.published_at <= ");
            qb.push_bind(to);
            qb.push(" ");
        }

        qb.push("ORDER BY c.embedding <=> ");
        qb.push_bind(query_vec);
        qb.push(" LIMIT ");
        qb.push_bind(k);

        let hits = qb.build_query_as::<ChunkHit>().fetch_all(&self.pool).await?;
        Ok(hits)
    }
}
