use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::job::{ScrapeRequest, WorkerConfig};
use crate::models::ExtractionOutcome;
use crate::scrape::{ScrapeOutcome, ScrapeService};
use crate::traits::{Extractor, Fetcher, ResultStore};
use crate::util::normalize_url;

/// Events emitted by the worker pool for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WorkerEvent<'a> {
    Started {
        worker_id: &'a str,
        max_workers: usize,
        queued: usize,
    },
    JobStarted {
        task_id: i64,
        url: &'a str,
    },
    JobCompleted {
        task_id: i64,
        url: &'a str,
        result_id: Option<i64>,
    },
    JobFailed {
        task_id: i64,
        url: &'a str,
        error: &'a str,
    },
    StorageWarning {
        task_id: i64,
        warning: &'a str,
    },
    JobSkipped {
        task_id: i64,
        url: &'a str,
    },
    Stopped {
        worker_id: &'a str,
        processed: usize,
    },
}

/// Trait for receiving worker events (decoupled logging).
pub trait WorkerReporter: Send + Sync {
    fn report(&self, event: WorkerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWorkerReporter;

impl WorkerReporter for TracingWorkerReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        match event {
            WorkerEvent::Started {
                worker_id,
                max_workers,
                queued,
            } => {
                tracing::info!(%worker_id, max_workers, queued, "Worker pool started");
            }
            WorkerEvent::JobStarted { task_id, url } => {
                tracing::info!(task_id, %url, "Processing URL");
            }
            WorkerEvent::JobCompleted {
                task_id,
                url,
                result_id,
            } => {
                tracing::info!(task_id, %url, ?result_id, "URL completed");
            }
            WorkerEvent::JobFailed {
                task_id,
                url,
                error,
            } => {
                tracing::warn!(task_id, %url, %error, "URL failed");
            }
            WorkerEvent::StorageWarning { task_id, warning } => {
                tracing::warn!(task_id, %warning, "Result not fully persisted");
            }
            WorkerEvent::JobSkipped { task_id, url } => {
                tracing::info!(task_id, %url, "Skipped after cancellation");
            }
            WorkerEvent::Stopped {
                worker_id,
                processed,
            } => {
                tracing::info!(%worker_id, processed, "Worker pool stopped");
            }
        }
    }
}

/// Runs many scrape requests through one [`ScrapeService`] with at most
/// `max_workers` in flight.
///
/// Each URL's fetch → extract → store sequence completes as a unit; there is
/// no ordering across URLs.
pub struct WorkerPool<F, E, S>
where
    F: Fetcher,
    E: Extractor,
    S: ResultStore,
{
    service: ScrapeService<F, E, S>,
    config: WorkerConfig,
}

impl<F, E, S> WorkerPool<F, E, S>
where
    F: Fetcher,
    E: Extractor,
    S: ResultStore,
{
    /// The service gets the configured per-URL deadline applied.
    pub fn new(service: ScrapeService<F, E, S>, config: WorkerConfig) -> Self {
        let service = service.with_deadline(config.job_deadline);
        Self { service, config }
    }

    /// Process every request, returning outcomes in completion order.
    ///
    /// Once `cancel` fires, in-flight fetches end as cancelled results and
    /// requests that have not started are skipped.
    pub async fn run<WR: WorkerReporter>(
        &self,
        requests: Vec<ScrapeRequest>,
        cancel: CancellationToken,
        reporter: &WR,
    ) -> Vec<ScrapeOutcome> {
        reporter.report(WorkerEvent::Started {
            worker_id: &self.config.worker_id,
            max_workers: self.config.max_workers,
            queued: requests.len(),
        });

        let outcomes: Vec<ScrapeOutcome> = stream::iter(requests)
            .map(|request| {
                let cancel = cancel.clone();
                async move { self.process(request, &cancel, reporter).await }
            })
            .buffer_unordered(self.config.max_workers)
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await;

        reporter.report(WorkerEvent::Stopped {
            worker_id: &self.config.worker_id,
            processed: outcomes.len(),
        });

        outcomes
    }

    async fn process<WR: WorkerReporter>(
        &self,
        request: ScrapeRequest,
        cancel: &CancellationToken,
        reporter: &WR,
    ) -> Option<ScrapeOutcome> {
        let url = normalize_url(&request.url);
        if cancel.is_cancelled() {
            reporter.report(WorkerEvent::JobSkipped {
                task_id: request.task_id,
                url: &url,
            });
            return None;
        }

        reporter.report(WorkerEvent::JobStarted {
            task_id: request.task_id,
            url: &url,
        });

        let outcome = self.service.scrape(request.task_id, &url, cancel).await;

        match &outcome.result.outcome {
            ExtractionOutcome::Success { .. } => reporter.report(WorkerEvent::JobCompleted {
                task_id: request.task_id,
                url: &outcome.result.url,
                result_id: outcome.result_id,
            }),
            ExtractionOutcome::Error { message } => reporter.report(WorkerEvent::JobFailed {
                task_id: request.task_id,
                url: &outcome.result.url,
                error: message,
            }),
        }

        if let Some(warning) = &outcome.storage_warning {
            reporter.report(WorkerEvent::StorageWarning {
                task_id: request.task_id,
                warning,
            });
        }

        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::error::AppError;
    use crate::models::{FetchedPage, PageContent};
    use crate::testutil::*;

    fn requests(n: usize) -> Vec<ScrapeRequest> {
        (0..n)
            .map(|i| ScrapeRequest::new(1, format!("https://example.com/{i}")))
            .collect()
    }

    /// Fetcher that records the peak number of concurrent calls.
    #[derive(Clone, Default)]
    struct ConcurrencyGauge {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Fetcher for ConcurrencyGauge {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage, AppError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(mock_page("<html>ok</html>"))
        }
    }

    #[tokio::test]
    async fn processes_every_request_and_stores_each() {
        let store = MockStore::empty();
        let service = ScrapeService::with_store(
            MockFetcher::new("<html>ok</html>"),
            MockExtractor::new(PageContent::default()),
            store.clone(),
        );
        let pool = WorkerPool::new(service, WorkerConfig::default().with_max_workers(3));
        let reporter = MockReporter::new();

        let outcomes = pool
            .run(requests(5), CancellationToken::new(), &reporter)
            .await;

        assert_eq!(outcomes.len(), 5);
        assert_eq!(store.saved.lock().unwrap().len(), 5);
        assert_eq!(store.saved_stats.lock().unwrap().len(), 5);
        let events = reporter.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("Started"));
        assert_eq!(events.last().map(String::as_str), Some("Stopped"));
        assert_eq!(events.iter().filter(|e| *e == "JobCompleted").count(), 5);
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_max_workers() {
        let gauge = ConcurrencyGauge::default();
        let service = ScrapeService::<_, _, crate::traits::NullStore>::new(
            gauge.clone(),
            MockExtractor::new(PageContent::default()),
        );
        let pool = WorkerPool::new(service, WorkerConfig::default().with_max_workers(2));

        let start = Instant::now();
        let outcomes = pool
            .run(requests(6), CancellationToken::new(), &TracingWorkerReporter)
            .await;

        assert_eq!(outcomes.len(), 6);
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 2);
        // Three waves of two requests, 30ms each.
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn failures_are_reported_and_still_returned() {
        let service = ScrapeService::<_, _, crate::traits::NullStore>::new(
            MockFetcher::with_responses(vec![
                Err(AppError::HttpStatus { status_code: 500 }),
                Err(AppError::HttpStatus { status_code: 500 }),
            ]),
            MockExtractor::new(PageContent::default()),
        );
        let pool = WorkerPool::new(service, WorkerConfig::default().with_max_workers(1));
        let reporter = MockReporter::new();

        let outcomes = pool
            .run(requests(2), CancellationToken::new(), &reporter)
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.result.outcome.is_success()));
        let events = reporter.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| *e == "JobFailed").count(), 2);
    }

    #[tokio::test]
    async fn cancelled_pool_skips_pending_requests() {
        let store = MockStore::empty();
        let service = ScrapeService::with_store(
            MockFetcher::new("<html>ok</html>"),
            MockExtractor::new(PageContent::default()),
            store.clone(),
        );
        let pool = WorkerPool::new(service, WorkerConfig::default());
        let reporter = MockReporter::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcomes = pool.run(requests(3), cancel, &reporter).await;

        assert!(outcomes.is_empty());
        assert!(store.saved.lock().unwrap().is_empty());
        let events = reporter.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| *e == "JobSkipped").count(), 3);
    }

    #[tokio::test]
    async fn storage_warnings_are_reported() {
        let service = ScrapeService::with_store(
            MockFetcher::new("<html>ok</html>"),
            MockExtractor::new(PageContent::default()),
            MockStore::with_save_error(AppError::DatabaseError("read-only".into())),
        );
        let pool = WorkerPool::new(service, WorkerConfig::default());
        let reporter = MockReporter::new();

        let outcomes = pool
            .run(requests(1), CancellationToken::new(), &reporter)
            .await;

        assert!(outcomes[0].storage_warning.is_some());
        let events = reporter.events.lock().unwrap();
        assert!(events.iter().any(|e| e == "StorageWarning"));
    }

    #[tokio::test]
    async fn events_name_the_normalized_url() {
        let service = ScrapeService::<_, _, crate::traits::NullStore>::new(
            MockFetcher::new("<html>ok</html>"),
            MockExtractor::new(PageContent::default()),
        );
        let pool = WorkerPool::new(service, WorkerConfig::default());
        let reporter = MockReporter::new();

        pool.run(
            vec![ScrapeRequest::new(1, "example.com/a")],
            CancellationToken::new(),
            &reporter,
        )
        .await;

        let urls = reporter.urls.lock().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().all(|(_, url)| url == "https://example.com/a"));
    }

    #[tokio::test]
    async fn skipped_events_name_the_normalized_url() {
        let service = ScrapeService::<_, _, crate::traits::NullStore>::new(
            MockFetcher::new("<html>ok</html>"),
            MockExtractor::new(PageContent::default()),
        );
        let pool = WorkerPool::new(service, WorkerConfig::default());
        let reporter = MockReporter::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        pool.run(vec![ScrapeRequest::new(1, "example.com/b")], cancel, &reporter)
            .await;

        let urls = reporter.urls.lock().unwrap();
        assert_eq!(
            urls.as_slice(),
            [("JobSkipped".to_string(), "https://example.com/b".to_string())]
        );
    }
}
