use std::future::Future;

use crate::error::AppError;
use crate::models::{
    DiscoveredUpdate, ExtractionResult, FetchedPage, LinkCandidate, NewDiscoveredUpdate,
    PageContent, PurgeReport, ScrapeStats, StatsSummary, StoredResult,
};

/// Fetches a page over the network.
///
/// Any status other than 200 is an error, even if a body was returned.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, AppError>> + Send;
}

/// Derives content from raw page bytes.
///
/// Extraction never fails: malformed markup degrades to best-effort
/// (possibly empty) output. Extraction is CPU-bound and runs on the blocking
/// pool, hence `'static`.
pub trait Extractor: Send + Sync + Clone + 'static {
    /// Title, bounded body text, and structured payload, resolving relative
    /// URLs against `base_url`.
    fn extract(&self, body: &[u8], base_url: &str) -> PageContent;

    /// Every anchor on the page, resolved to an absolute URL.
    fn links(&self, body: &[u8], page_url: &str) -> Vec<LinkCandidate>;
}

/// Persists extraction results and per-attempt statistics.
pub trait ResultStore: Send + Sync + Clone {
    /// Save an extraction result. Returns the assigned row id.
    fn save(&self, result: &ExtractionResult)
    -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Save a statistics row. Returns the assigned row id.
    fn save_stats(&self, stats: &ScrapeStats)
    -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Results for a task, most recent first.
    fn query_results(
        &self,
        task_id: i64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<StoredResult>, AppError>> + Send;

    fn query_stats_summary(
        &self,
        task_id: i64,
    ) -> impl Future<Output = Result<StatsSummary, AppError>> + Send;

    /// Delete result and stat rows older than `days`.
    fn purge_older_than(&self, days: u32)
    -> impl Future<Output = Result<PurgeReport, AppError>> + Send;
}

/// Persists discovered updates, unique on fingerprint.
pub trait UpdateStore: Send + Sync + Clone {
    /// Insert unless the fingerprint is already recorded.
    ///
    /// Implementations must make the check and the write a single atomic
    /// operation. Returns the new id, or `None` when the fingerprint exists.
    fn insert_if_absent(
        &self,
        update: &NewDiscoveredUpdate,
    ) -> impl Future<Output = Result<Option<i64>, AppError>> + Send;

    /// Discovered updates, most recent first.
    fn list_updates(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DiscoveredUpdate>, AppError>> + Send;

    /// Returns true if a row was deleted.
    fn delete_update(&self, id: i64) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Returns the number of rows deleted.
    fn delete_all_updates(&self) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// A no-op store for use when persistence is not needed.
#[derive(Debug, Clone)]
pub struct NullStore;

impl ResultStore for NullStore {
    async fn save(&self, _result: &ExtractionResult) -> Result<i64, AppError> {
        Ok(0)
    }

    async fn save_stats(&self, _stats: &ScrapeStats) -> Result<i64, AppError> {
        Ok(0)
    }

    async fn query_results(
        &self,
        _task_id: i64,
        _limit: usize,
    ) -> Result<Vec<StoredResult>, AppError> {
        Ok(vec![])
    }

    async fn query_stats_summary(&self, _task_id: i64) -> Result<StatsSummary, AppError> {
        Ok(StatsSummary::default())
    }

    async fn purge_older_than(&self, _days: u32) -> Result<PurgeReport, AppError> {
        Ok(PurgeReport::default())
    }
}
