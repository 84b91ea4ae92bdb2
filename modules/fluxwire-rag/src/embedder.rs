use std::sync::Arc;

use ai_client::{AiClientError, Embedder};
use thiserror::Error;
use tracing::debug;

/// Provider request batches are capped here; the pipeline and backfill jobs
/// may hand in arbitrarily many texts.
const MAX_BATCH: usize = 100;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(transparent)]
    Provider(#[from] AiClientError),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Batching wrapper around an [`Embedder`] that enforces the configured
/// dimension contract on every returned vector.
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self.embedder.dimension();
        let mut out = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH) {
            let vectors = self.embedder.embed_batch(batch).await?;
            for vector in vectors {
                if vector.len() != expected {
                    return Err(EmbedError::DimensionMismatch {
                        expected,
                        got: vector.len(),
                    });
                }
                out.push(vector);
            }
        }

        debug!(texts = texts.len(), "embedded texts");
        Ok(out)
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_texts(&texts).await?;
        vectors
            .pop()
            .ok_or(EmbedError::Provider(AiClientError::EmptyResponse))
    }
}
