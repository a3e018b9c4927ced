use chrono::{DateTime, TimeDelta, Utc};
use gleaner_core::error::AppError;
use gleaner_core::models::{
    ExtractionOutcome, ExtractionResult, ExtractionStatus, PurgeReport, ScrapeStats, StatsSummary,
    StoredResult, StructuredPayload,
};
use gleaner_core::traits::ResultStore;
use gleaner_core::util::{round2, success_rate};
use sqlx::SqlitePool;

fn db_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

/// Repository for extraction results and per-attempt statistics in SQLite.
#[derive(Clone)]
pub struct ResultRepository {
    pool: SqlitePool,
}

impl ResultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save an extraction result. Returns the new row id.
    pub async fn save(&self, result: &ExtractionResult) -> Result<i64, AppError> {
        let (title, content, structured_data, error_message) = match &result.outcome {
            ExtractionOutcome::Success {
                title,
                body,
                payload,
            } => (
                title.clone(),
                Some(body.clone()),
                Some(serde_json::to_string(payload)?),
                None,
            ),
            ExtractionOutcome::Error { message } => (None, None, None, Some(message.clone())),
        };

        let done = sqlx::query(
            r#"
            INSERT INTO extraction_results
                (task_id, url, status, title, content, structured_data, error_message,
                 response_time, status_code, content_size, scraped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(result.task_id)
        .bind(&result.url)
        .bind(result.outcome.status().as_str())
        .bind(title)
        .bind(content)
        .bind(structured_data)
        .bind(error_message)
        .bind(result.response_time)
        .bind(result.status_code.map(i64::from))
        .bind(to_i64(result.content_size))
        .bind(result.scraped_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(done.last_insert_rowid())
    }

    /// Save a statistics row. Returns the new row id.
    pub async fn save_stats(&self, stats: &ScrapeStats) -> Result<i64, AppError> {
        let done = sqlx::query(
            r#"
            INSERT INTO scrape_stats
                (task_id, url, response_time, content_size, status_code, scraped_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(stats.task_id)
        .bind(&stats.url)
        .bind(stats.response_time)
        .bind(to_i64(stats.content_size))
        .bind(stats.status_code.map(i64::from))
        .bind(stats.scraped_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(done.last_insert_rowid())
    }

    /// Results for a task, newest first.
    pub async fn query_results(
        &self,
        task_id: i64,
        limit: usize,
    ) -> Result<Vec<StoredResult>, AppError> {
        let rows = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id, task_id, url, status, title, content, structured_data, error_message,
                   response_time, status_code, content_size, scraped_at
            FROM extraction_results
            WHERE task_id = ?
            ORDER BY scraped_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(task_id)
        .bind(to_i64(limit as u64))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(StoredResult::try_from).collect()
    }

    /// Aggregate statistics for a task.
    ///
    /// Averages and timestamps come from the statistics rows; the success
    /// rate comes from the result rows.
    pub async fn query_stats_summary(&self, task_id: i64) -> Result<StatsSummary, AppError> {
        let (total_attempts, avg_response_time, avg_content_size, first_attempt_at, last_attempt_at): (
            i64,
            Option<f64>,
            Option<f64>,
            Option<DateTime<Utc>>,
            Option<DateTime<Utc>>,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*), AVG(response_time), AVG(content_size),
                   MIN(scraped_at), MAX(scraped_at)
            FROM scrape_stats
            WHERE task_id = ?
            "#,
        )
        .bind(task_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let (total_results, successful): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END), 0)
            FROM extraction_results
            WHERE task_id = ?
            "#,
        )
        .bind(task_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(StatsSummary {
            total_attempts,
            avg_response_time: round2(avg_response_time.unwrap_or(0.0)),
            avg_content_size: round2(avg_content_size.unwrap_or(0.0)),
            first_attempt_at,
            last_attempt_at,
            success_rate_percent: success_rate(successful, total_results),
        })
    }

    /// Delete result and statistics rows recorded more than `days` days ago.
    pub async fn purge_older_than(&self, days: u32) -> Result<PurgeReport, AppError> {
        let cutoff = Utc::now() - TimeDelta::days(i64::from(days));
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let results = sqlx::query("DELETE FROM extraction_results WHERE scraped_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let stats = sqlx::query("DELETE FROM scrape_stats WHERE scraped_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        let report = PurgeReport {
            results_deleted: results.rows_affected(),
            stats_deleted: stats.rows_affected(),
        };
        tracing::info!(
            days,
            results = report.results_deleted,
            stats = report.stats_deleted,
            "Purged old scrape data"
        );
        Ok(report)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

/// SQLite integers are signed; sizes beyond `i64::MAX` saturate.
fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ResultRow {
    id: i64,
    task_id: i64,
    url: String,
    status: String,
    title: Option<String>,
    content: Option<String>,
    structured_data: Option<String>,
    error_message: Option<String>,
    response_time: f64,
    status_code: Option<i64>,
    content_size: i64,
    scraped_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for StoredResult {
    type Error = AppError;

    fn try_from(row: ResultRow) -> Result<Self, AppError> {
        let status: ExtractionStatus = row.status.parse().map_err(AppError::DatabaseError)?;
        let outcome = match status {
            ExtractionStatus::Success => ExtractionOutcome::Success {
                title: row.title,
                body: row.content.unwrap_or_default(),
                payload: match row.structured_data.as_deref() {
                    Some(json) => serde_json::from_str(json)?,
                    None => StructuredPayload::default(),
                },
            },
            ExtractionStatus::Error => ExtractionOutcome::Error {
                message: row.error_message.unwrap_or_default(),
            },
        };

        Ok(StoredResult {
            id: row.id,
            result: ExtractionResult {
                task_id: row.task_id,
                url: row.url,
                outcome,
                response_time: row.response_time,
                status_code: row.status_code.and_then(|c| u16::try_from(c).ok()),
                content_size: u64::try_from(row.content_size).unwrap_or(0),
                scraped_at: row.scraped_at,
            },
        })
    }
}

// -- Trait implementation --

impl ResultStore for ResultRepository {
    async fn save(&self, result: &ExtractionResult) -> Result<i64, AppError> {
        ResultRepository::save(self, result).await
    }

    async fn save_stats(&self, stats: &ScrapeStats) -> Result<i64, AppError> {
        ResultRepository::save_stats(self, stats).await
    }

    async fn query_results(
        &self,
        task_id: i64,
        limit: usize,
    ) -> Result<Vec<StoredResult>, AppError> {
        ResultRepository::query_results(self, task_id, limit).await
    }

    async fn query_stats_summary(&self, task_id: i64) -> Result<StatsSummary, AppError> {
        ResultRepository::query_stats_summary(self, task_id).await
    }

    async fn purge_older_than(&self, days: u32) -> Result<PurgeReport, AppError> {
        ResultRepository::purge_older_than(self, days).await
    }
}
