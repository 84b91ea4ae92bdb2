use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::FromRow;

use fluxwire_common::{Article, ArticleMetadata, Entry};

use crate::error::Result;
use crate::Store;

/// Outcome of an upsert-by-URL, carrying the article id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
    /// Incoming content hash matched the stored one; nothing written.
    Unchanged(i64),
}

impl UpsertOutcome {
    pub fn article_id(&self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id)
            | UpsertOutcome::Updated(id)
            | UpsertOutcome::Unchanged(id) => *id,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ArticleRow {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub raw_summary: Option<String>,
    pub content_text: Option<String>,
    pub language: Option<String>,
    pub content_hash: String,
    pub country_codes: Option<Vec<String>>,
    pub topic_tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub regions: Option<Vec<String>>,
}

impl ArticleRow {
    pub(crate) fn into_article(self) -> Article {
        Article {
            id: self.id,
            source_id: self.source_id,
            title: self.title,
            url: self.url,
            published_at: self.published_at,
            fetched_at: self.fetched_at,
            raw_summary: self.raw_summary,
            content_text: self.content_text,
            language: self.language,
            content_hash: self.content_hash,
            country_codes: self.country_codes,
            topic_tags: self.topic_tags,
            metadata: ArticleMetadata {
                image_url: self.image_url,
                regions: self.regions.unwrap_or_default(),
            },
        }
    }
}

pub(crate) const ARTICLE_COLUMNS: &str = "id, source_id, title, url, published_at, fetched_at, \
     raw_summary, content_text, language, content_hash, country_codes, topic_tags, image_url, regions";

/// Listing row for the paged articles surface, including the source name.
#[derive(Debug, Clone, FromRow)]
pub struct ArticleListRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub country_codes: Option<Vec<String>>,
    pub topic_tags: Option<Vec<String>>,
    pub content_text: Option<String>,
    pub image_url: Option<String>,
    pub source_name: String,
}

#[derive(Debug)]
pub struct ArticleListPage {
    pub items: Vec<ArticleListRow>,
    pub total: i64,
}

/// Candidate row for top-story ranking; scoring happens in the API layer
/// with configured tier data.
#[derive(Debug, Clone, FromRow)]
pub struct TopStoryCandidate {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub country_codes: Option<Vec<String>>,
    pub topic_tags: Option<Vec<String>>,
    pub content_text: Option<String>,
    pub source_name: String,
}

impl Store {
    /// Insert a new article for this entry, or update title/summary/date when
    /// the content hash changed. Content is never cleared here.
    pub async fn upsert_article(
        &self,
        source_id: i64,
        entry: &Entry,
        content_hash: &str,
    ) -> Result<UpsertOutcome> {
        let existing: Option<(i64, String)> =
            sqlx::query_as("SELECT id, content_hash FROM articles WHERE url = $1")
                .bind(&entry.url)
                .fetch_optional(&self.pool)
                .await?;

        match existing {
            Some((id, stored_hash)) if stored_hash == content_hash => {
                Ok(UpsertOutcome::Unchanged(id))
            }
            Some((id, _)) => {
                sqlx::query(
                    r#"
                    UPDATE articles
                    SET title = $2, raw_summary = $3, published_at = $4,
                        content_hash = $5, fetched_at = now()
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&entry.title)
                .bind(&entry.summary)
                .bind(entry.published_at)
                .bind(content_hash)
                .execute(&self.pool)
                .await?;
                Ok(UpsertOutcome::Updated(id))
            }
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    r#"
                    INSERT INTO articles
                        (source_id, title, url, published_at, raw_summary, content_hash, image_url)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id
                    "#,
                )
                .bind(source_id)
                .bind(&entry.title)
                .bind(&entry.url)
                .bind(entry.published_at)
                .bind(&entry.summary)
                .bind(content_hash)
                .bind(&entry.image_url)
                .fetch_one(&self.pool)
                .await?;
                Ok(UpsertOutcome::Inserted(id))
            }
        }
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.into_article()))
    }

    pub async fn get_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = $1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.into_article()))
    }

    /// Most recent articles tagged with the country, optionally narrowed by
    /// topics. Date-descending; used by the retriever's country fallback.
    pub async fn articles_by_country(
        &self,
        country_code: &str,
        topics: &[String],
        limit: i64,
    ) -> Result<Vec<Article>> {
        let rows = if topics.is_empty() {
            sqlx::query_as::<_, ArticleRow>(&format!(
                r#"
                SELECT {ARTICLE_COLUMNS} FROM articles
                WHERE country_codes @> ARRAY[$1]::text[]
                ORDER BY published_at DESC NULLS LAST
                LIMIT $2
                "#
            ))
            .bind(country_code)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, ArticleRow>(&format!(
                r#"
                SELECT {ARTICLE_COLUMNS} FROM articles
                WHERE country_codes @> ARRAY[$1]::text[]
                  AND topic_tags && $2
                ORDER BY published_at DESC NULLS LAST
                LIMIT $3
                "#
            ))
            .bind(country_code)
            .bind(topics)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows.into_iter().map(|r| r.into_article()).collect())
    }

    /// Articles whose topic tags intersect the given set, date-descending.
    pub async fn articles_by_topics(&self, topics: &[String], limit: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS} FROM articles
            WHERE topic_tags && $1
            ORDER BY published_at DESC NULLS LAST
            LIMIT $2
            "#
        ))
        .bind(topics)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.into_article()).collect())
    }

    /// Case-insensitive title search. Phrase conditions rank above single
    /// keywords; ranking happens here after the ILIKE fetch so the priority
    /// order is explicit and testable.
    pub async fn articles_by_title_keywords(
        &self,
        phrases: &[String],
        keywords: &[String],
        countries: &[String],
        topics: &[String],
        limit: i64,
    ) -> Result<Vec<Article>> {
        if phrases.is_empty() && keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = sqlx::QueryBuilder::new(format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE ("
        ));

        let mut first = true;
        for term in phrases.iter().chain(keywords.iter()) {
            if !first {
                qb.push(" OR ");
            }
            first = false;
            qb.push("title ILIKE ");
            qb.push_bind(format!("%{term}%"));
        }
        qb.push(") ");

        if !countries.is_empty() {
            qb.push("AND country_codes && ");
            qb.push_bind(countries.to_vec());
            qb.push(" ");
        }
        if !topics.is_empty() {
            qb.push("AND topic_tags && ");
            qb.push_bind(topics.to_vec());
            qb.push(" ");
        }

        qb.push("ORDER BY published_at DESC NULLS LAST LIMIT ");
        qb.push_bind(limit * 4);

        let rows = qb.build_query_as::<ArticleRow>().fetch_all(&self.pool).await?;
        let mut articles: Vec<Article> = rows.into_iter().map(|r| r.into_article()).collect();

        let rank = |article: &Article| -> usize {
            let title = article.title.to_lowercase();
            for (i, phrase) in phrases.iter().enumerate() {
                if title.contains(&phrase.to_lowercase()) {
                    return i;
                }
            }
            phrases.len()
                + keywords
                    .iter()
                    .position(|k| title.contains(&k.to_lowercase()))
                    .unwrap_or(keywords.len())
        };
        articles.sort_by_key(|a| rank(a));
        articles.truncate(limit as usize);
        Ok(articles)
    }

    /// Paged article listing for the HTTP surface.
    pub async fn list_articles(
        &self,
        country: Option<&str>,
        topic: Option<&str>,
        days: i64,
        page: i64,
        page_size: i64,
    ) -> Result<ArticleListPage> {
        let cutoff = Utc::now() - Duration::days(days);

        let mut qb = sqlx::QueryBuilder::new(
            "SELECT a.id, a.title, a.url, a.published_at, a.country_codes, a.topic_tags, \
             a.content_text, a.image_url, s.name AS source_name \
             FROM articles a JOIN sources s ON s.id = a.source_id \
             WHERE a.published_at >= ",
        );
        qb.push_bind(cutoff);
        if let Some(country) = country {
            qb.push(" AND a.country_codes @> ARRAY[");
            qb.push_bind(country);
            qb.push("]::text[]");
        }
        if let Some(topic) = topic {
            qb.push(" AND a.topic_tags @> ARRAY[");
            qb.push_bind(topic);
            qb.push("]::text[]");
        }
        qb.push(" ORDER BY a.published_at DESC NULLS LAST LIMIT ");
        qb.push_bind(page_size);
        qb.push(" OFFSET ");
        qb.push_bind((page - 1) * page_size);

        let items = qb.build_query_as::<ArticleListRow>().fetch_all(&self.pool).await?;

        let mut count_qb = sqlx::QueryBuilder::new(
            "SELECT COUNT(*) FROM articles a WHERE a.published_at >= ",
        );
        count_qb.push_bind(cutoff);
        if let Some(country) = country {
            count_qb.push(" AND a.country_codes @> ARRAY[");
            count_qb.push_bind(country);
            count_qb.push("]::text[]");
        }
        if let Some(topic) = topic {
            count_qb.push(" AND a.topic_tags @> ARRAY[");
            count_qb.push_bind(topic);
            count_qb.push("]::text[]");
        }
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(&self.pool).await?;

        Ok(ArticleListPage { items, total })
    }

    /// Candidates for top-story ranking: everything for the country in the
    /// window, with source names for tier lookup.
    pub async fn top_story_candidates(
        &self,
        country_code: &str,
        days: i64,
    ) -> Result<Vec<TopStoryCandidate>> {
        let cutoff = Utc::now() - Duration::days(days);
        let rows = sqlx::query_as::<_, TopStoryCandidate>(
            r#"
            SELECT a.id, a.title, a.url, a.published_at, a.country_codes, a.topic_tags,
                   a.content_text, s.name AS source_name
            FROM articles a
            JOIN sources s ON s.id = a.source_id
            WHERE a.country_codes @> ARRAY[$1]::text[]
              AND a.published_at >= $2
            "#,
        )
        .bind(country_code)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Article country arrays for the last N days; counting happens in the
    /// caller (only `country_codes` column data is consulted).
    pub async fn country_arrays_since(&self, days: i64) -> Result<Vec<Vec<String>>> {
        let cutoff = Utc::now() - Duration::days(days);
        let rows: Vec<(Vec<String>,)> = sqlx::query_as(
            r#"
            SELECT country_codes FROM articles
            WHERE published_at >= $1 AND country_codes IS NOT NULL
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(codes,)| codes).collect())
    }

    /// Articles inside a date window for brief generation, newest first.
    pub async fn articles_in_window(
        &self,
        country: Option<&str>,
        topic: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Article>> {
        let mut qb = sqlx::QueryBuilder::new(format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE published_at >= "
        ));
        qb.push_bind(from);
        qb.push(" AND published_at <= ");
        qb.push_bind(to);
        if let Some(country) = country {
            qb.push(" AND country_codes @> ARRAY[");
            qb.push_bind(country);
            qb.push("]::text[]");
        }
        if let Some(topic) = topic {
            qb.push(" AND topic_tags @> ARRAY[");
            qb.push_bind(topic);
            qb.push("]::text[]");
        }
        qb.push(" ORDER BY published_at DESC LIMIT ");
        qb.push_bind(limit);

        let rows = qb.build_query_as::<ArticleRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|r| r.into_article()).collect())
    }

    /// Daily article counts for the activity stats surface.
    pub async fn daily_article_counts(
        &self,
        days: i64,
        country: Option<&str>,
    ) -> Result<Vec<(NaiveDate, i64)>> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut qb = sqlx::QueryBuilder::new(
            "SELECT published_at::date AS day, COUNT(*) FROM articles WHERE published_at >= ",
        );
        qb.push_bind(cutoff);
        if let Some(country) = country {
            qb.push(" AND country_codes @> ARRAY[");
            qb.push_bind(country);
            qb.push("]::text[]");
        }
        qb.push(" GROUP BY day ORDER BY day");

        let rows: Vec<(NaiveDate, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Topic arrays for the breakdown stats surface; counted by the caller.
    pub async fn topic_arrays_since(
        &self,
        days: i64,
        country: Option<&str>,
    ) -> Result<Vec<Vec<String>>> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut qb = sqlx::QueryBuilder::new(
            "SELECT topic_tags FROM articles WHERE published_at >= ",
        );
        qb.push_bind(cutoff);
        qb.push(" AND topic_tags IS NOT NULL");
        if let Some(country) = country {
            qb.push(" AND country_codes @> ARRAY[");
            qb.push_bind(country);
            qb.push("]::text[]");
        }
        let rows: Vec<(Vec<String>,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(tags,)| tags).collect())
    }
}
