//! Embedding backfill: fill in vectors for chunks the pipeline persisted
//! without them (provider outage, rate limiting).

use tracing::info;

use fluxwire_rag::EmbeddingService;
use fluxwire_store::Store;

/// Embed up to `batch_size` vector-less chunks. Returns how many were
/// updated; zero means the backlog is clear.
pub async fn embed_missing_chunks(
    store: &Store,
    embedding: &EmbeddingService,
    batch_size: i64,
) -> anyhow::Result<u32> {
    let rows = store.chunks_missing_embeddings(batch_size).await?;
    if rows.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = rows.iter().map(|(_, text)| text.clone()).collect();
    let vectors = embedding.embed_texts(&texts).await?;

    let mut count = 0u32;
    for ((chunk_id, _), vector) in rows.iter().zip(vectors.iter()) {
        store.set_chunk_embedding(*chunk_id, vector).await?;
        count += 1;
    }

    info!(count, "backfilled chunk embeddings");
    Ok(count)
}
