//! Deterministic in-memory providers for tests. The fake embedder derives a
//! unit-norm vector from the SHA-256 of the input text, so equal texts embed
//! identically and cosine comparisons are well-defined.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::traits::{ChatModel, Embedder, Message, MessageRole};

pub struct FakeEmbedder {
    dimension: usize,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        // Chain SHA-256 digests until we have enough bytes, then map each
        // 4-byte group to [-1, 1] and normalize to unit length.
        let mut bytes = Vec::with_capacity(self.dimension * 4);
        let mut block = Sha256::digest(text.as_bytes());
        while bytes.len() < self.dimension * 4 {
            bytes.extend_from_slice(&block);
            block = Sha256::digest(&block);
        }

        let mut vector: Vec<f32> = bytes
            .chunks_exact(4)
            .take(self.dimension)
            .map(|chunk| {
                let n = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                (n as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
            })
            .collect();

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Scripted chat model. Returns the configured response, or a canned
/// citation-bearing answer when the system prompt carries context.
pub struct FakeChat {
    response: Option<String>,
}

impl FakeChat {
    pub fn new() -> Self {
        Self { response: None }
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }
}

impl Default for FakeChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn generate(
        &self,
        messages: &[Message],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String> {
        if let Some(response) = &self.response {
            return Ok(response.clone());
        }

        let has_context = messages
            .iter()
            .any(|m| m.role == MessageRole::System && m.content.contains("[1]"));

        if has_context {
            Ok("Based on the provided context, here is the answer [1].".to_string())
        } else {
            Ok("I don't have enough information in the corpus to answer this question.".to_string())
        }
    }
}
