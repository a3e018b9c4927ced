use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{ExtractionOutcome, ExtractionResult, FetchedPage, PageContent};
use crate::traits::{Extractor, Fetcher, ResultStore};
use crate::util::normalize_url;

/// What the caller gets back for one URL: the attempt itself plus whether
/// it was persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub result: ExtractionResult,
    /// Row id of the stored result, if persistence succeeded.
    pub result_id: Option<i64>,
    /// Set when saving the result or its statistics failed.
    pub storage_warning: Option<String>,
}

/// Orchestrates the extraction pipeline: normalize → fetch → parse/extract →
/// assemble → save result + stats.
///
/// Generic over its collaborators via traits, so tests run without real
/// HTTP or a database.
pub struct ScrapeService<F, E, S>
where
    F: Fetcher,
    E: Extractor,
    S: ResultStore,
{
    fetcher: F,
    extractor: E,
    store: Option<S>,
    deadline: Option<Duration>,
}

impl<F, E, S> ScrapeService<F, E, S>
where
    F: Fetcher,
    E: Extractor,
    S: ResultStore,
{
    /// Create a new ScrapeService without persistence.
    pub fn new(fetcher: F, extractor: E) -> Self {
        Self {
            fetcher,
            extractor,
            store: None,
            deadline: None,
        }
    }

    /// Create a new ScrapeService that records every attempt.
    pub fn with_store(fetcher: F, extractor: E, store: S) -> Self {
        Self {
            fetcher,
            extractor,
            store: Some(store),
            deadline: None,
        }
    }

    /// Abort the fetch stage (politeness delay included) after `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run the pipeline for one URL.
    ///
    /// Never fails: transport errors become a failed [`ExtractionResult`],
    /// storage errors become a `storage_warning`.
    pub async fn scrape(
        &self,
        task_id: i64,
        url: &str,
        cancel: &CancellationToken,
    ) -> ScrapeOutcome {
        let url = normalize_url(url);
        tracing::info!(task_id, %url, "Starting scrape");

        let started = Instant::now();
        let fetched = self.fetch_with_cancel(&url, cancel).await;
        let response_time = started.elapsed().as_secs_f64();

        let result = match fetched {
            Ok(page) => self.assemble(task_id, &url, page, response_time).await,
            Err(e) => {
                let message = describe_failure(&url, &e);
                tracing::error!(task_id, %url, error = %e, "Scrape failed");
                ExtractionResult {
                    task_id,
                    url: url.clone(),
                    outcome: ExtractionOutcome::Error { message },
                    response_time,
                    status_code: e.status_code(),
                    content_size: 0,
                    scraped_at: Utc::now(),
                }
            }
        };

        let (result_id, storage_warning) = match &self.store {
            Some(store) => persist(store, &result).await,
            None => (None, None),
        };

        ScrapeOutcome {
            result,
            result_id,
            storage_warning,
        }
    }

    async fn fetch_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, AppError> {
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            res = self.fetcher.fetch(url) => res,
            () = cancel.cancelled() => Err(AppError::Cancelled),
            () = expired => Err(AppError::Timeout(deadline.map_or(0, |d| d.as_secs()))),
        }
    }

    async fn assemble(
        &self,
        task_id: i64,
        url: &str,
        page: FetchedPage,
        response_time: f64,
    ) -> ExtractionResult {
        tracing::debug!(
            %url,
            network_ms = %page.elapsed.as_millis(),
            "Fetched {} bytes",
            page.body.len()
        );

        let content_size = page.body.len();
        let content = self.extract_off_runtime(page.body, url).await;
        tracing::info!(
            task_id,
            %url,
            content_size,
            links = content.payload.links.len(),
            tables = content.payload.tables.len(),
            "Extraction complete"
        );

        ExtractionResult {
            task_id,
            url: url.to_string(),
            outcome: content.into(),
            response_time,
            status_code: Some(page.status_code),
            content_size: content_size as u64,
            scraped_at: Utc::now(),
        }
    }

    /// Parse on the blocking pool so large pages do not stall other jobs.
    async fn extract_off_runtime(&self, body: Vec<u8>, url: &str) -> PageContent {
        let extractor = self.extractor.clone();
        let base_url = url.to_string();
        match tokio::task::spawn_blocking(move || extractor.extract(&body, &base_url)).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(%url, error = %e, "Extraction task failed");
                PageContent::default()
            }
        }
    }
}

/// Save the result and its statistics. Both writes are always attempted.
async fn persist<S: ResultStore>(
    store: &S,
    result: &ExtractionResult,
) -> (Option<i64>, Option<String>) {
    let mut warnings = Vec::new();

    let result_id = match store.save(result).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(task_id = result.task_id, url = %result.url, error = %e, "Failed to store extraction result");
            warnings.push(format!("result not stored: {e}"));
            None
        }
    };

    if let Err(e) = store.save_stats(&result.stats()).await {
        tracing::warn!(task_id = result.task_id, url = %result.url, error = %e, "Failed to store scrape stats");
        warnings.push(format!("stats not stored: {e}"));
    }

    if warnings.is_empty() {
        tracing::info!(task_id = result.task_id, ?result_id, status = %result.outcome.status(), "Stored scrape result");
        (result_id, None)
    } else {
        (result_id, Some(warnings.join("; ")))
    }
}

fn describe_failure(url: &str, error: &AppError) -> String {
    match error {
        AppError::Timeout(_) => format!("Timeout error while scraping {url}"),
        AppError::ConnectionFailure(_) => format!("Connection error while scraping {url}"),
        AppError::Cancelled => format!("Scrape of {url} was cancelled"),
        other => format!("Error scraping {url}: {other}"),
    }
}
