use chrono::{DateTime, Utc};
use gleaner_core::error::AppError;
use gleaner_core::models::{DiscoveredUpdate, NewDiscoveredUpdate};
use gleaner_core::traits::UpdateStore;
use sqlx::SqlitePool;

/// Repository for links recorded by harvesting.
///
/// The `fingerprint` column is UNIQUE; inserts use `ON CONFLICT DO NOTHING`
/// so concurrent harvesters can never record the same link twice.
#[derive(Clone)]
pub struct UpdateRepository {
    pool: SqlitePool,
}

impl UpdateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the new row id, or `None` if the fingerprint already exists.
    pub async fn insert_if_absent(
        &self,
        update: &NewDiscoveredUpdate,
    ) -> Result<Option<i64>, AppError> {
        let done = sqlx::query(
            r#"
            INSERT INTO discovered_updates
                (monitor_url, page_url, title, anchor_html, fingerprint, discovered_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(fingerprint) DO NOTHING
            "#,
        )
        .bind(&update.monitor_url)
        .bind(&update.page_url)
        .bind(&update.title)
        .bind(&update.anchor_html)
        .bind(&update.fingerprint)
        .bind(update.discovered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok((done.rows_affected() > 0).then(|| done.last_insert_rowid()))
    }

    /// Most recently discovered first.
    pub async fn list_updates(&self, limit: usize) -> Result<Vec<DiscoveredUpdate>, AppError> {
        let rows = sqlx::query_as::<_, UpdateRow>(
            r#"
            SELECT id, monitor_url, page_url, title, anchor_html, fingerprint, discovered_at
            FROM discovered_updates
            ORDER BY discovered_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete_update(&self, id: i64) -> Result<bool, AppError> {
        let done = sqlx::query("DELETE FROM discovered_updates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn delete_all_updates(&self) -> Result<u64, AppError> {
        let done = sqlx::query("DELETE FROM discovered_updates")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(done.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct UpdateRow {
    id: i64,
    monitor_url: String,
    page_url: String,
    title: String,
    anchor_html: String,
    fingerprint: String,
    discovered_at: DateTime<Utc>,
}

impl From<UpdateRow> for DiscoveredUpdate {
    fn from(row: UpdateRow) -> Self {
        DiscoveredUpdate {
            id: row.id,
            monitor_url: row.monitor_url,
            page_url: row.page_url,
            title: row.title,
            anchor_html: row.anchor_html,
            fingerprint: row.fingerprint,
            discovered_at: row.discovered_at,
        }
    }
}

impl UpdateStore for UpdateRepository {
    async fn insert_if_absent(
        &self,
        update: &NewDiscoveredUpdate,
    ) -> Result<Option<i64>, AppError> {
        UpdateRepository::insert_if_absent(self, update).await
    }

    async fn list_updates(&self, limit: usize) -> Result<Vec<DiscoveredUpdate>, AppError> {
        UpdateRepository::list_updates(self, limit).await
    }

    async fn delete_update(&self, id: i64) -> Result<bool, AppError> {
        UpdateRepository::delete_update(self, id).await
    }

    async fn delete_all_updates(&self) -> Result<u64, AppError> {
        UpdateRepository::delete_all_updates(self).await
    }
}
