use chrono::{DateTime, Utc};
use sqlx::FromRow;

use fluxwire_common::{Source, SourceKind};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Debug, FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    kind: String,
    locator: String,
    enabled: bool,
    country_override: Option<String>,
    created_at: DateTime<Utc>,
}

impl SourceRow {
    fn into_source(self) -> Result<Source> {
        let kind: SourceKind = self
            .kind
            .parse()
            .map_err(|_| StoreError::Fatal(sqlx::Error::Decode(
                format!("invalid source kind: {}", self.kind).into(),
            )))?;
        Ok(Source {
            id: self.id,
            name: self.name,
            kind,
            locator: self.locator,
            enabled: self.enabled,
            country_override: self.country_override,
            created_at: self.created_at,
        })
    }
}

/// Fields accepted by `update_source`. `None` leaves a column unchanged;
/// `country_override` uses a nested Option so it can be cleared explicitly.
#[derive(Debug, Default)]
pub struct SourcePatch {
    pub name: Option<String>,
    pub kind: Option<SourceKind>,
    pub locator: Option<String>,
    pub enabled: Option<bool>,
    pub country_override: Option<Option<String>>,
}

const SOURCE_COLUMNS: &str = "id, name, kind, locator, enabled, country_override, created_at";

impl Store {
    pub async fn list_sources(&self, enabled: Option<bool>) -> Result<Vec<Source>> {
        let rows = match enabled {
            Some(flag) => {
                sqlx::query_as::<_, SourceRow>(&format!(
                    "SELECT {SOURCE_COLUMNS} FROM sources WHERE enabled = $1 ORDER BY name"
                ))
                .bind(flag)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SourceRow>(&format!(
                    "SELECT {SOURCE_COLUMNS} FROM sources ORDER BY name"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(|r| r.into_source()).collect()
    }

    pub async fn enabled_sources(&self) -> Result<Vec<Source>> {
        self.list_sources(Some(true)).await
    }

    pub async fn get_source(&self, id: i64) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.into_source()).transpose()
    }

    pub async fn source_name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM sources WHERE name = $1 AND ($2::bigint IS NULL OR id <> $2)",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn create_source(
        &self,
        name: &str,
        kind: SourceKind,
        locator: &str,
        enabled: bool,
        country_override: Option<&str>,
    ) -> Result<Source> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            r#"
            INSERT INTO sources (name, kind, locator, enabled, country_override)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SOURCE_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(kind.to_string())
        .bind(locator)
        .bind(enabled)
        .bind(country_override)
        .fetch_one(&self.pool)
        .await?;
        row.into_source()
    }

    pub async fn update_source(&self, id: i64, patch: SourcePatch) -> Result<Source> {
        let existing = self.get_source(id).await?.ok_or(StoreError::NotFound)?;

        let name = patch.name.unwrap_or(existing.name);
        let kind = patch.kind.unwrap_or(existing.kind);
        let locator = patch.locator.unwrap_or(existing.locator);
        let enabled = patch.enabled.unwrap_or(existing.enabled);
        let country_override = match patch.country_override {
            Some(value) => value,
            None => existing.country_override,
        };

        let row = sqlx::query_as::<_, SourceRow>(&format!(
            r#"
            UPDATE sources
            SET name = $2, kind = $3, locator = $4, enabled = $5, country_override = $6
            WHERE id = $1
            RETURNING {SOURCE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(kind.to_string())
        .bind(locator)
        .bind(enabled)
        .bind(country_override)
        .fetch_one(&self.pool)
        .await?;
        row.into_source()
    }

    /// Deletes the source and, via cascade, all of its articles and chunks.
    pub async fn delete_source(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM sources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn source_article_count(&self, id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE source_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
