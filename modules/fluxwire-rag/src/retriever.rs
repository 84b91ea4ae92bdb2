//! Hybrid retrieval: filter fusion, thresholded vector search, confidence
//! grading, and the escalation ladder used when semantic recall is weak.

use std::collections::HashSet;

use tracing::{debug, info};

use fluxwire_common::Article;
use fluxwire_nlp::{detect_countries_in_text, topics_in_question};
use fluxwire_store::{ChunkHit, SearchFilters, Store, StoreError};

use crate::embedder::{EmbedError, EmbeddingService};

/// Default number of chunks retrieved per question.
pub const DEFAULT_K: i64 = 8;
/// Chunks below this similarity are never used for grounding.
const MIN_SIMILARITY: f64 = 0.5;
/// Articles pulled per country in the first fallback rung.
const COUNTRY_FALLBACK_LIMIT: i64 = 10;
/// Articles pulled by the title-keyword fallback.
const KEYWORD_FALLBACK_LIMIT: i64 = 5;
/// Preview length for synthetic chunks built from articles.
const PREVIEW_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Which rung of the ladder produced the grounding set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Filtered vector search cleared the confidence bar.
    Semantic,
    /// Country-scoped recent articles, served as preview chunks.
    CountryArticles,
    /// Title keyword/phrase matches, served as preview chunks.
    TitleKeywords,
    /// Nothing usable; the answerer must disclaim general knowledge.
    GeneralKnowledge,
}

#[derive(Debug)]
pub struct Retrieval {
    pub chunks: Vec<ChunkHit>,
    pub confidence: Confidence,
    pub mode: RetrievalMode,
    pub filters: SearchFilters,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Retriever {
    store: Store,
    embedding: EmbeddingService,
}

impl Retriever {
    pub fn new(store: Store, embedding: EmbeddingService) -> Self {
        Self { store, embedding }
    }

    /// Merge caller-context filters with filters detected in the question.
    /// The question is an imperative: a country named in it replaces any
    /// caller-supplied country hint. Topic lists are unioned.
    pub fn fuse_filters(question: &str, caller: &SearchFilters) -> SearchFilters {
        let mut fused = caller.clone();

        let detected_countries = detect_countries_in_text(question);
        if !detected_countries.is_empty() {
            fused.countries = detected_countries;
        }

        let mut seen: HashSet<String> = fused.topics.iter().cloned().collect();
        for topic in topics_in_question(question) {
            if seen.insert(topic.clone()) {
                fused.topics.push(topic);
            }
        }

        fused
    }

    /// Grade retrieval quality from similarity statistics.
    pub fn grade(chunks: &[ChunkHit]) -> Confidence {
        if chunks.is_empty() {
            return Confidence::Low;
        }
        let max = chunks.iter().map(|c| c.similarity).fold(f64::MIN, f64::max);
        let mean = chunks.iter().map(|c| c.similarity).sum::<f64>() / chunks.len() as f64;

        if max >= 0.80 && mean >= 0.70 {
            Confidence::High
        } else if max >= 0.65 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub async fn retrieve(
        &self,
        question: &str,
        caller_filters: &SearchFilters,
        k: i64,
    ) -> Result<Retrieval, RetrieveError> {
        let filters = Self::fuse_filters(question, caller_filters);
        debug!(?filters, "fused retrieval filters");

        let query_embedding = self.embedding.embed_one(question).await?;
        let mut chunks = self.store.vector_search(&query_embedding, &filters, k).await?;
        chunks.retain(|c| c.similarity >= MIN_SIMILARITY);

        let confidence = Self::grade(&chunks);
        if !chunks.is_empty() && confidence != Confidence::Low {
            info!(
                chunks = chunks.len(),
                confidence = confidence.as_str(),
                "semantic retrieval succeeded"
            );
            return Ok(Retrieval {
                chunks,
                confidence,
                mode: RetrievalMode::Semantic,
                filters,
            });
        }

        // Rung 1: country-scoped recent articles, still honouring topics.
        for country in &filters.countries {
            let articles = self
                .store
                .articles_by_country(country, &filters.topics, COUNTRY_FALLBACK_LIMIT)
                .await?;
            if !articles.is_empty() {
                info!(country, articles = articles.len(), "country fallback engaged");
                return Ok(Retrieval {
                    chunks: articles.iter().map(synthetic_chunk).collect(),
                    confidence: Confidence::Medium,
                    mode: RetrievalMode::CountryArticles,
                    filters,
                });
            }
        }

        // Rung 2: title keyword/phrase search within the structured filters.
        let (phrases, keywords) = question_search_terms(question);
        if !phrases.is_empty() || !keywords.is_empty() {
            let articles = self
                .store
                .articles_by_title_keywords(
                    &phrases,
                    &keywords,
                    &filters.countries,
                    &filters.topics,
                    KEYWORD_FALLBACK_LIMIT,
                )
                .await?;
            if !articles.is_empty() {
                info!(articles = articles.len(), "title keyword fallback engaged");
                return Ok(Retrieval {
                    chunks: articles.iter().map(synthetic_chunk).collect(),
                    confidence: Confidence::Medium,
                    mode: RetrievalMode::TitleKeywords,
                    filters,
                });
            }
        }

        // Rung 3: nothing to ground on.
        info!("retrieval exhausted, signalling general knowledge");
        Ok(Retrieval {
            chunks: Vec::new(),
            confidence: Confidence::Low,
            mode: RetrievalMode::GeneralKnowledge,
            filters,
        })
    }
}

/// Build a preview chunk from an article for the fallback rungs. Chunk id 0
/// marks a synthetic entry; similarity is 0 because no vector was compared.
fn synthetic_chunk(article: &Article) -> ChunkHit {
    let body = article
        .content_text
        .as_deref()
        .or(article.raw_summary.as_deref())
        .unwrap_or("No content available");
    let preview: String = body.chars().take(PREVIEW_CHARS).collect();

    ChunkHit {
        chunk_id: 0,
        chunk_index: 0,
        text: preview,
        similarity: 0.0,
        article_id: article.id,
        article_title: article.title.clone(),
        article_url: article.url.clone(),
        published_at: article.published_at,
        country_codes: article.country_codes.clone(),
        topic_tags: article.topic_tags.clone(),
    }
}

const STOPWORDS: &[&str] = &[
    "do", "we", "have", "any", "articles", "article", "on", "about", "the", "a", "an", "is",
    "are", "tell", "me", "what", "who", "when", "where", "why", "how", "can", "you", "show",
    "find",
];

/// Turn a question into title-search terms: all meaningful keywords joined as
/// one phrase, adjacent pairs, and long single keywords. Phrases rank above
/// single keywords downstream.
pub fn question_search_terms(question: &str) -> (Vec<String>, Vec<String>) {
    let question_lower = question.to_lowercase();
    let keywords: Vec<String> = question_lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| ".,!?".contains(c)).to_string())
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.as_str()))
        .collect();

    if keywords.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut phrases = Vec::new();
    if keywords.len() >= 2 {
        phrases.push(keywords.join(" "));
        for pair in keywords.windows(2) {
            phrases.push(format!("{} {}", pair[0], pair[1]));
        }
    }

    let long_keywords: Vec<String> = keywords.into_iter().filter(|k| k.len() > 5).collect();

    (phrases, long_keywords)
}
