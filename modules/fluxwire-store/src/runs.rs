use chrono::{DateTime, Utc};
use sqlx::FromRow;

use fluxwire_common::{IngestionRun, RunStatus};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Debug, FromRow)]
struct RunRow {
    id: i64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    status: String,
    stats: Option<serde_json::Value>,
}

impl RunRow {
    fn into_run(self) -> Result<IngestionRun> {
        let status: RunStatus = self.status.parse().map_err(|_| {
            StoreError::Fatal(sqlx::Error::Decode(
                format!("invalid run status: {}", self.status).into(),
            ))
        })?;
        Ok(IngestionRun {
            id: self.id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            status,
            stats: self.stats,
        })
    }
}

impl Store {
    /// Open a new run in `running` state.
    pub async fn create_run(&self) -> Result<IngestionRun> {
        let row = sqlx::query_as::<_, RunRow>(
            r#"
            INSERT INTO ingestion_runs (status)
            VALUES ('running')
            RETURNING id, started_at, finished_at, status, stats
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        row.into_run()
    }

    pub async fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        stats: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE ingestion_runs SET status = $2, stats = $3, finished_at = now() WHERE id = $1",
        )
        .bind(run_id)
        .bind(status.to_string())
        .bind(stats)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_runs(&self, limit: i64, offset: i64) -> Result<Vec<IngestionRun>> {
        let rows = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, started_at, finished_at, status, stats
            FROM ingestion_runs
            ORDER BY started_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.into_run()).collect()
    }

    pub async fn get_run(&self, run_id: i64) -> Result<Option<IngestionRun>> {
        let row = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, started_at, finished_at, status, stats
            FROM ingestion_runs
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.into_run()).transpose()
    }
}
