use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

use fluxwire_common::Brief;

use crate::error::Result;
use crate::Store;

#[derive(Debug, FromRow)]
struct BriefRow {
    id: i64,
    country_code: String,
    content: String,
    article_count: i32,
    days_range: i32,
    generated_at: DateTime<Utc>,
}

impl BriefRow {
    fn into_brief(self) -> Brief {
        Brief {
            id: self.id,
            country_code: self.country_code,
            content: self.content,
            article_count: self.article_count,
            days_range: self.days_range,
            generated_at: self.generated_at,
        }
    }
}

impl Store {
    pub async fn insert_brief(
        &self,
        country_code: &str,
        content: &str,
        article_count: i32,
        days_range: i32,
    ) -> Result<Brief> {
        let row = sqlx::query_as::<_, BriefRow>(
            r#"
            INSERT INTO briefs (country_code, content, article_count, days_range)
            VALUES ($1, $2, $3, $4)
            RETURNING id, country_code, content, article_count, days_range, generated_at
            "#,
        )
        .bind(country_code)
        .bind(content)
        .bind(article_count)
        .bind(days_range)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_brief())
    }

    /// Latest cached brief for a country/window no older than `max_age_hours`.
    pub async fn cached_brief(
        &self,
        country_code: &str,
        days_range: i32,
        max_age_hours: i64,
    ) -> Result<Option<Brief>> {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let row = sqlx::query_as::<_, BriefRow>(
            r#"
            SELECT id, country_code, content, article_count, days_range, generated_at
            FROM briefs
            WHERE country_code = $1 AND days_range = $2 AND generated_at >= $3
            ORDER BY generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(country_code)
        .bind(days_range)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.into_brief()))
    }
}
