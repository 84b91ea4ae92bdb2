//! Postgres + pgvector persistence for fluxwire.
//!
//! The store is the only component that knows the physical schema. It exposes
//! upsert/replace/search operations; the vector index (ivfflat, cosine ops)
//! is an internal decision of `migrate`.

pub mod articles;
pub mod briefs;
pub mod chunks;
pub mod error;
pub mod migrate;
pub mod runs;
pub mod search;
pub mod sources;

pub use articles::{ArticleListPage, ArticleListRow, TopStoryCandidate, UpsertOutcome};
pub use chunks::{ArticleEnrichment, NewChunk};
pub use error::{Result, StoreError};
pub use search::{ChunkHit, SearchFilters};
pub use sources::SourcePatch;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Default connection pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connect and ensure the schema exists. `embedding_dim` fixes the vector
    /// column dimension; changing it requires regenerating all vectors.
    pub async fn connect(database_url: &str, embedding_dim: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        migrate::ensure_schema(&store.pool, embedding_dim).await?;
        Ok(store)
    }

    /// Wrap an existing pool (tests). Does not run migrations.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
