use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AiClientError, Result};
use crate::traits::{ChatModel, Embedder, Message};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Max attempts for rate-limited embedding requests.
const RATE_LIMIT_MAX_ATTEMPTS: u32 = 3;
/// Base backoff for 429 responses. Actual delay is base * 2^attempt.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

// =============================================================================
// OpenAi client
// =============================================================================

/// OpenAI-compatible client providing both chat completions and embeddings.
/// Point `base_url` at any compatible endpoint.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    embedding_model: String,
    embedding_dim: usize,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dim: 1536,
            base_url: OPENAI_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>, dim: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dim = dim;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(auth) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, auth);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait]
impl ChatModel for OpenAi {
    async fn generate(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature,
            max_tokens,
        };

        debug!(model = %self.model, "chat completion request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiClientError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AiClientError::EmptyResponse)
    }
}

#[async_trait]
impl Embedder for OpenAi {
    /// Embed a batch of texts. 429 responses retry with exponential backoff;
    /// other failures surface immediately.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
            dimensions: self.embedding_dim,
        };

        for attempt in 0..RATE_LIMIT_MAX_ATTEMPTS {
            let response = self
                .http
                .post(&url)
                .headers(self.headers())
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if status.as_u16() == 429 {
                if attempt + 1 < RATE_LIMIT_MAX_ATTEMPTS {
                    let backoff = RATE_LIMIT_BACKOFF * 2u32.pow(attempt);
                    warn!(attempt = attempt + 1, "embedding rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                return Err(AiClientError::RateLimited {
                    attempts: RATE_LIMIT_MAX_ATTEMPTS,
                });
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AiClientError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: EmbeddingResponse = response.json().await?;
            return Ok(parsed.data.into_iter().map(|d| d.embedding).collect());
        }

        Err(AiClientError::RateLimited {
            attempts: RATE_LIMIT_MAX_ATTEMPTS,
        })
    }

    fn dimension(&self) -> usize {
        self.embedding_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_models() {
        let ai = OpenAi::new("sk-test", "gpt-4o-mini").with_embedding_model("text-embedding-3-large", 3072);
        assert_eq!(ai.model(), "gpt-4o-mini");
        assert_eq!(ai.embedding_model, "text-embedding-3-large");
        assert_eq!(Embedder::dimension(&ai), 3072);
    }

    #[test]
    fn base_url_override() {
        let ai = OpenAi::new("sk-test", "gpt-4o-mini").with_base_url("http://localhost:11434/v1");
        assert_eq!(ai.base_url, "http://localhost:11434/v1");
    }
}
