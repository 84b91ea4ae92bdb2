//! Country/topic briefs: analyst-style synthesis over a date window, cached
//! per country and window in the briefs table.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use ai_client::{ChatModel, Message};
use fluxwire_common::Article;
use fluxwire_store::Store;

use crate::answerer::AnswerError;

const BRIEF_MAX_TOKENS: u32 = 2000;
const BRIEF_TEMPERATURE: f32 = 0.3;
const GENERATION_DEADLINE: Duration = Duration::from_secs(60);
/// A cached brief younger than this is served without regeneration.
const CACHE_MAX_AGE_HOURS: i64 = 6;
/// How many article previews feed the prompt context.
const PREVIEW_CHARS: usize = 500;
/// How many articles are returned for display alongside the brief.
const DISPLAY_ARTICLES: usize = 5;

#[derive(Debug, Clone)]
pub struct BriefRequest {
    pub country: Option<String>,
    pub topic: Option<String>,
    pub days: i64,
    pub max_articles: i64,
}

impl Default for BriefRequest {
    fn default() -> Self {
        Self {
            country: None,
            topic: None,
            days: 7,
            max_articles: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BriefArticle {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BriefOutcome {
    pub brief: String,
    pub article_count: usize,
    pub articles: Vec<BriefArticle>,
    pub country: Option<String>,
    pub topic: Option<String>,
    pub date_range: DateRange,
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub struct BriefGenerator {
    chat: Arc<dyn ChatModel>,
    store: Store,
}

impl BriefGenerator {
    pub fn new(chat: Arc<dyn ChatModel>, store: Store) -> Self {
        Self { chat, store }
    }

    pub async fn generate(&self, request: &BriefRequest) -> Result<BriefOutcome, AnswerError> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(request.days);

        // Country briefs without a topic filter are cacheable.
        if let (Some(country), None) = (&request.country, &request.topic) {
            if let Ok(Some(cached)) = self
                .store
                .cached_brief(country, request.days as i32, CACHE_MAX_AGE_HOURS)
                .await
            {
                info!(country, "serving cached brief");
                return Ok(BriefOutcome {
                    brief: cached.content,
                    article_count: cached.article_count as usize,
                    articles: Vec::new(),
                    country: request.country.clone(),
                    topic: None,
                    date_range: DateRange { start, end },
                });
            }
        }

        let articles = self
            .store
            .articles_in_window(
                request.country.as_deref(),
                request.topic.as_deref(),
                start,
                end,
                request.max_articles,
            )
            .await
            .map_err(crate::retriever::RetrieveError::Store)?;

        if articles.is_empty() {
            return Ok(BriefOutcome {
                brief: "No articles found matching the specified criteria.".to_string(),
                article_count: 0,
                articles: Vec::new(),
                country: request.country.clone(),
                topic: request.topic.clone(),
                date_range: DateRange { start, end },
            });
        }

        let system_prompt = brief_prompt(&articles, request.country.as_deref(), request.topic.as_deref());
        let messages = [
            Message::system(system_prompt),
            Message::user("Please generate the brief based on the articles provided."),
        ];

        let brief = tokio::time::timeout(
            GENERATION_DEADLINE,
            self.chat.generate(&messages, BRIEF_TEMPERATURE, BRIEF_MAX_TOKENS),
        )
        .await
        .map_err(|_| AnswerError::Timeout)??;

        if let (Some(country), None) = (&request.country, &request.topic) {
            if let Err(e) = self
                .store
                .insert_brief(country, &brief, articles.len() as i32, request.days as i32)
                .await
            {
                tracing::warn!(error = %e, "failed to cache brief");
            }
        }

        let display: Vec<BriefArticle> = articles
            .iter()
            .take(DISPLAY_ARTICLES)
            .map(|a| BriefArticle {
                id: a.id,
                title: a.title.clone(),
                url: a.url.clone(),
                image_url: a.metadata.image_url.clone(),
            })
            .collect();

        info!(
            articles = articles.len(),
            country = request.country.as_deref().unwrap_or("-"),
            "brief generated"
        );

        Ok(BriefOutcome {
            brief,
            article_count: articles.len(),
            articles: display,
            country: request.country.clone(),
            topic: request.topic.clone(),
            date_range: DateRange { start, end },
        })
    }
}

fn article_block(index: usize, article: &Article) -> String {
    let countries = article
        .country_codes
        .as_deref()
        .map(|c| c.join(", "))
        .unwrap_or_else(|| "None".to_string());
    let topics = article
        .topic_tags
        .as_deref()
        .map(|t| t.join(", "))
        .unwrap_or_else(|| "None".to_string());
    let published = article
        .published_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let preview: String = article
        .content_text
        .as_deref()
        .or(article.raw_summary.as_deref())
        .unwrap_or("No content available")
        .chars()
        .take(PREVIEW_CHARS)
        .collect();

    format!(
        "[{index}] {title}\nPublished: {published}\nCountries: {countries}\nTopics: {topics}\nURL: {url}\n\n{preview}...",
        title = article.title,
        url = article.url,
    )
}

fn brief_prompt(articles: &[Article], country: Option<&str>, topic: Option<&str>) -> String {
    let context = articles
        .iter()
        .enumerate()
        .map(|(i, a)| article_block(i + 1, a))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut filter_desc = Vec::new();
    if let Some(country) = country {
        filter_desc.push(format!("country: {country}"));
    }
    if let Some(topic) = topic {
        filter_desc.push(format!("topic: {topic}"));
    }
    let filters_text = if filter_desc.is_empty() {
        String::new()
    } else {
        format!(" ({})", filter_desc.join(", "))
    };

    format!(
        r#"You are an energy market analyst synthesizing recent developments from news articles{filters_text}.

Writing Principles:
- Maintain a neutral, analytical tone throughout
- Focus on developments, policy decisions, project announcements, and capacity changes
- Explain outcomes through market structure, policy incentives, and physical constraints
- Avoid hype, advocacy, or speculative language
- Make uncertainty explicit when discussing future implications

Opening Requirement:
Begin with the most significant development or emerging trend from the articles (e.g., policy change, major project announcement, capacity milestone, or market shift).

Structure:
1. Lead with the key development or pattern
2. Explain the underlying drivers and context
3. Discuss implications for market participants, asset deployment, or system operation
4. Identify what comes next and the variables to monitor

Style Constraints:
- Short to medium-length sentences
- Minimal adjectives and adverbs
- No rhetorical questions
- No generic conclusions or calls to action
- Write 300-500 words total

Source Handling:
- Synthesize the provided articles into original analysis
- Do not quote sources directly
- Reference articles using [1], [2] format when citing specific facts
- Do not mention "the articles" or "according to sources" - write as direct analysis

Output:
- Write for energy market professionals
- Assume familiarity with power markets, renewables, storage, and policy frameworks
- Focus on what the news means for market participants and system development

Here are the articles to analyze:

{context}

Write the brief now:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, title: &str) -> Article {
        Article {
            id,
            source_id: 1,
            title: title.to_string(),
            url: format!("https://example.com/{id}"),
            published_at: None,
            fetched_at: Utc::now(),
            raw_summary: Some("short summary".into()),
            content_text: None,
            language: None,
            content_hash: "h".into(),
            country_codes: Some(vec!["DE".into()]),
            topic_tags: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn prompt_numbers_articles_and_carries_filters() {
        let articles = vec![article(1, "First story"), article(2, "Second story")];
        let prompt = brief_prompt(&articles, Some("DE"), None);
        assert!(prompt.contains("[1] First story"));
        assert!(prompt.contains("[2] Second story"));
        assert!(prompt.contains("(country: DE)"));
        assert!(prompt.contains("Countries: DE"));
    }

    #[test]
    fn article_block_falls_back_to_summary() {
        let block = article_block(1, &article(1, "T"));
        assert!(block.contains("short summary"));
    }
}
