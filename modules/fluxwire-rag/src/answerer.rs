//! Grounded generation over retrieved chunks, with citation extraction and
//! the general-knowledge fallback mode.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use ai_client::{AiClientError, ChatModel, Message};
use fluxwire_common::url_host;
use fluxwire_store::{ChunkHit, SearchFilters};

use crate::retriever::{RetrievalMode, RetrieveError, Retriever};

/// Per-request generation deadline.
const GENERATION_DEADLINE: Duration = Duration::from_secs(60);
const ANSWER_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("generation timed out")]
    Timeout,

    #[error("chat provider failed: {0}")]
    Provider(#[from] AiClientError),

    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
}

#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Host of the article URL.
    pub source: String,
    pub chunk_id: i64,
    pub similarity: f64,
}

#[derive(Debug, Serialize)]
pub struct ChatOutcome {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub confidence: String,
    pub filters_applied: serde_json::Value,
}

pub struct Answerer {
    chat: Arc<dyn ChatModel>,
    retriever: Retriever,
}

impl Answerer {
    pub fn new(chat: Arc<dyn ChatModel>, retriever: Retriever) -> Self {
        Self { chat, retriever }
    }

    pub async fn chat(
        &self,
        question: &str,
        caller_filters: &SearchFilters,
        k: i64,
    ) -> Result<ChatOutcome, AnswerError> {
        let retrieval = self.retriever.retrieve(question, caller_filters, k).await?;

        let (system_prompt, temperature) = match retrieval.mode {
            RetrievalMode::Semantic => (grounded_prompt(&retrieval.chunks), 0.1),
            RetrievalMode::CountryArticles => (
                fallback_prompt(&retrieval.chunks, "match your requested location"),
                0.2,
            ),
            RetrievalMode::TitleKeywords => (
                fallback_prompt(&retrieval.chunks, "contain keywords from your question"),
                0.2,
            ),
            RetrievalMode::GeneralKnowledge => (general_knowledge_prompt(), 0.3),
        };

        let messages = [Message::system(system_prompt), Message::user(question)];

        let answer = tokio::time::timeout(
            GENERATION_DEADLINE,
            self.chat.generate(&messages, temperature, ANSWER_MAX_TOKENS),
        )
        .await
        .map_err(|_| AnswerError::Timeout)??;

        let citations = if retrieval.mode == RetrievalMode::GeneralKnowledge {
            Vec::new()
        } else {
            extract_citations(&retrieval.chunks)
        };

        info!(
            mode = ?retrieval.mode,
            confidence = retrieval.confidence.as_str(),
            citations = citations.len(),
            "chat answered"
        );

        Ok(ChatOutcome {
            answer,
            citations,
            confidence: retrieval.confidence.as_str().to_string(),
            filters_applied: serialize_filters(&retrieval.filters),
        })
    }

}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Numbered context blocks for the grounded system prompt.
fn context_blocks(chunks: &[ChunkHit]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[{}] {}\n(Source: {}, Published: {})",
                i + 1,
                chunk.text,
                chunk.article_title,
                format_date(chunk.published_at),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn grounded_prompt(chunks: &[ChunkHit]) -> String {
    let context = context_blocks(chunks);
    format!(
        r#"You are an AI assistant specialized in energy transition news and policy.

Your task is to answer questions using the context provided below. Follow these rules:

1. **Prioritize the provided context**: Your primary goal is to surface information from the news articles provided.
2. **Synthesize with general knowledge**: You can use your general knowledge to provide background, context, or explanations that make the answer more complete and easier to understand.
3. **Cite sources**: Always cite the source articles using bracketed numbers like [1], [2], etc. when you use information from them.
4. **Be transparent**: If the context doesn't contain enough information to answer a specific part of the question, say so, but provide a helpful answer based on what IS there.
5. **Concise and Professional**: Be concise but comprehensive.

Context:
{context}

Now answer the user's question by combining the latest news from the context above with your general expertise in energy transition."#
    )
}

fn fallback_prompt(chunks: &[ChunkHit], match_reason: &str) -> String {
    let context = chunks
        .iter()
        .take(5)
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[{}] {}\nPublished: {}\nContent: {}...",
                i + 1,
                chunk.article_title,
                format_date(chunk.published_at),
                chunk.text,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an AI assistant specializing in energy and renewable energy topics.

Below are relevant articles from our database that {match_reason}:

{context}

Answer the user's question based on these articles and your general knowledge. Summarize key trends or developments.
Cite sources by referencing the article numbers [1], [2], etc."#
    )
}

fn general_knowledge_prompt() -> String {
    r#"You are an AI assistant specializing in energy and renewable energy topics.

The user has asked a question, but we don't have relevant articles in our database to answer it directly.
However, you can use your general knowledge to provide a helpful answer.

IMPORTANT: At the end of your response, add a note that this answer is based on general knowledge
since we don't have specific articles on this topic in our database.

Be helpful, accurate, and concise."#
        .to_string()
}

/// Unique article citations in context order.
fn extract_citations(chunks: &[ChunkHit]) -> Vec<Citation> {
    let mut seen: HashSet<i64> = HashSet::new();
    chunks
        .iter()
        .filter(|chunk| seen.insert(chunk.article_id))
        .map(|chunk| Citation {
            id: chunk.article_id,
            title: chunk.article_title.clone(),
            url: chunk.article_url.clone(),
            published_at: chunk.published_at,
            source: url_host(&chunk.article_url),
            chunk_id: chunk.chunk_id,
            similarity: chunk.similarity,
        })
        .collect()
}

fn serialize_filters(filters: &SearchFilters) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    if !filters.countries.is_empty() {
        map.insert("countries".into(), serde_json::json!(filters.countries));
    }
    if !filters.topics.is_empty() {
        map.insert("topics".into(), serde_json::json!(filters.topics));
    }
    if let Some(from) = filters.date_from {
        map.insert("date_from".into(), serde_json::json!(from.to_rfc3339()));
    }
    if let Some(to) = filters.date_to {
        map.insert("date_to".into(), serde_json::json!(to.to_rfc3339()));
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(article_id: i64, chunk_id: i64, similarity: f64) -> ChunkHit {
        ChunkHit {
            chunk_id,
            chunk_index: 0,
            text: format!("chunk {chunk_id}"),
            similarity,
            article_id,
            article_title: format!("Article {article_id}"),
            article_url: format!("https://news.example.com/{article_id}"),
            published_at: None,
            country_codes: None,
            topic_tags: None,
        }
    }

    #[test]
    fn citations_deduplicate_by_article() {
        let chunks = vec![hit(1, 10, 0.9), hit(1, 11, 0.8), hit(2, 20, 0.7)];
        let citations = extract_citations(&chunks);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].id, 1);
        assert_eq!(citations[0].chunk_id, 10);
        assert_eq!(citations[1].id, 2);
        assert_eq!(citations[0].source, "news.example.com");
    }

    #[test]
    fn grounded_prompt_numbers_chunks() {
        let chunks = vec![hit(1, 10, 0.9), hit(2, 20, 0.8)];
        let prompt = grounded_prompt(&chunks);
        assert!(prompt.contains("[1] chunk 10"));
        assert!(prompt.contains("[2] chunk 20"));
        assert!(prompt.contains("Published: Unknown"));
    }

    #[test]
    fn general_prompt_demands_disclaimer() {
        assert!(general_knowledge_prompt().contains("general knowledge"));
    }

    #[test]
    fn filters_serialize_skips_empty_fields() {
        let filters = SearchFilters {
            countries: vec!["DE".into()],
            ..Default::default()
        };
        let value = serialize_filters(&filters);
        assert_eq!(value["countries"][0], "DE");
        assert!(value.get("topics").is_none());
    }
}
