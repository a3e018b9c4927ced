//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{
    DiscoveredUpdate, ExtractionResult, FetchedPage, LinkCandidate, NewDiscoveredUpdate,
    PageContent, PurgeReport, ScrapeStats, StatsSummary, StoredResult,
};
use crate::traits::{Extractor, Fetcher, ResultStore, UpdateStore};
use crate::worker::{WorkerEvent, WorkerReporter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// A 200 response carrying `html`.
pub fn mock_page(html: &str) -> FetchedPage {
    FetchedPage {
        body: html.as_bytes().to_vec(),
        status_code: 200,
        elapsed: Duration::from_millis(5),
    }
}

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default page.
    responses: Arc<Mutex<Vec<Result<FetchedPage, AppError>>>>,
    delay: Option<Duration>,
    /// Every URL passed to `fetch`, in call order.
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(mock_page(html))])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<FetchedPage, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            delay: None,
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep for `delay` before answering, to simulate a slow host.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(mock_page("<html><body>default</body></html>"))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor returning fixed content and a fixed link list.
#[derive(Clone)]
pub struct MockExtractor {
    content: PageContent,
    links: Vec<LinkCandidate>,
}

impl MockExtractor {
    pub fn new(content: PageContent) -> Self {
        Self {
            content,
            links: Vec::new(),
        }
    }

    pub fn with_links(links: Vec<LinkCandidate>) -> Self {
        Self {
            content: PageContent::default(),
            links,
        }
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, _body: &[u8], _base_url: &str) -> PageContent {
        self.content.clone()
    }

    fn links(&self, _body: &[u8], _page_url: &str) -> Vec<LinkCandidate> {
        self.links.clone()
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Mock result store that records every save.
#[derive(Clone, Default)]
pub struct MockStore {
    pub saved: Arc<Mutex<Vec<ExtractionResult>>>,
    pub saved_stats: Arc<Mutex<Vec<ScrapeStats>>>,
    save_error: Arc<Mutex<Option<AppError>>>,
}

impl MockStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store whose first result save fails. Stats saves still succeed.
    pub fn with_save_error(error: AppError) -> Self {
        Self {
            save_error: Arc::new(Mutex::new(Some(error))),
            ..Self::default()
        }
    }
}

impl ResultStore for MockStore {
    async fn save(&self, result: &ExtractionResult) -> Result<i64, AppError> {
        if let Some(e) = self.save_error.lock().unwrap().take() {
            return Err(e);
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(result.clone());
        Ok(saved.len() as i64)
    }

    async fn save_stats(&self, stats: &ScrapeStats) -> Result<i64, AppError> {
        let mut saved = self.saved_stats.lock().unwrap();
        saved.push(stats.clone());
        Ok(saved.len() as i64)
    }

    async fn query_results(
        &self,
        task_id: i64,
        limit: usize,
    ) -> Result<Vec<StoredResult>, AppError> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, r)| r.task_id == task_id)
            .take(limit)
            .map(|(i, r)| StoredResult {
                id: i as i64 + 1,
                result: r.clone(),
            })
            .collect())
    }

    async fn query_stats_summary(&self, task_id: i64) -> Result<StatsSummary, AppError> {
        let stats = self.saved_stats.lock().unwrap();
        let rows: Vec<_> = stats.iter().filter(|s| s.task_id == task_id).collect();
        Ok(StatsSummary {
            total_attempts: rows.len() as i64,
            ..StatsSummary::default()
        })
    }

    async fn purge_older_than(&self, _days: u32) -> Result<PurgeReport, AppError> {
        Ok(PurgeReport::default())
    }
}

// ---------------------------------------------------------------------------
// MockUpdateStore
// ---------------------------------------------------------------------------

/// In-memory update store, unique on fingerprint.
#[derive(Clone, Default)]
pub struct MockUpdateStore {
    rows: Arc<Mutex<Vec<DiscoveredUpdate>>>,
    insert_error: Arc<Mutex<Option<AppError>>>,
}

impl MockUpdateStore {
    /// Store whose first insert fails; later inserts behave normally.
    pub fn failing_once(error: AppError) -> Self {
        Self {
            insert_error: Arc::new(Mutex::new(Some(error))),
            ..Self::default()
        }
    }

    /// Recorded page URLs in insertion order.
    pub fn page_urls(&self) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.page_url.clone())
            .collect()
    }
}

impl UpdateStore for MockUpdateStore {
    async fn insert_if_absent(&self, update: &NewDiscoveredUpdate) -> Result<Option<i64>, AppError> {
        if let Some(e) = self.insert_error.lock().unwrap().take() {
            return Err(e);
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.fingerprint == update.fingerprint) {
            return Ok(None);
        }
        let id = rows.len() as i64 + 1;
        rows.push(DiscoveredUpdate::from_new(id, update.clone()));
        Ok(Some(id))
    }

    async fn list_updates(&self, limit: usize) -> Result<Vec<DiscoveredUpdate>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().rev().take(limit).cloned().collect())
    }

    async fn delete_update(&self, id: i64) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|u| u.id != id);
        Ok(rows.len() < before)
    }

    async fn delete_all_updates(&self) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let count = rows.len() as u64;
        rows.clear();
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock worker reporter that records events.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
    /// `(label, url)` for every event that names a URL.
    pub urls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerReporter for MockReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        let label = match &event {
            WorkerEvent::Started { .. } => "Started",
            WorkerEvent::JobStarted { .. } => "JobStarted",
            WorkerEvent::JobCompleted { .. } => "JobCompleted",
            WorkerEvent::JobFailed { .. } => "JobFailed",
            WorkerEvent::StorageWarning { .. } => "StorageWarning",
            WorkerEvent::JobSkipped { .. } => "JobSkipped",
            WorkerEvent::Stopped { .. } => "Stopped",
        };
        let url = match &event {
            WorkerEvent::JobStarted { url, .. }
            | WorkerEvent::JobCompleted { url, .. }
            | WorkerEvent::JobFailed { url, .. }
            | WorkerEvent::JobSkipped { url, .. } => Some(*url),
            _ => None,
        };
        if let Some(url) = url {
            self.urls
                .lock()
                .unwrap()
                .push((label.to_string(), url.to_string()));
        }
        self.events.lock().unwrap().push(label.to_string());
    }
}
