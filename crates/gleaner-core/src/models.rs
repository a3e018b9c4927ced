use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Raw page returned by a [`Fetcher`](crate::traits::Fetcher).
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: Vec<u8>,
    pub status_code: u16,
    /// Time spent on the HTTP exchange itself (request sent to body read).
    pub elapsed: Duration,
}

/// A hyperlink recorded in the structured payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: String,
    pub text: String,
}

/// An image recorded in the structured payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    pub url: String,
    pub alt: String,
}

/// Rows of cell text for one table.
pub type Table = Vec<Vec<String>>;

/// Bounded collections derived from one parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredPayload {
    /// Meta `name`/`property` to `content`; later duplicates win.
    pub meta: BTreeMap<String, String>,
    pub links: Vec<PageLink>,
    pub images: Vec<PageImage>,
    pub tables: Vec<Table>,
}

/// Everything an [`Extractor`](crate::traits::Extractor) derives from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub title: Option<String>,
    pub body: String,
    pub payload: StructuredPayload,
}

/// Outcome status as persisted in the result store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Success,
    Error,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Success => "success",
            ExtractionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(ExtractionStatus::Success),
            "error" => Ok(ExtractionStatus::Error),
            _ => Err(format!("Unknown extraction status: {}", s)),
        }
    }
}

/// What one fetch-and-extract attempt produced.
///
/// A successful attempt carries the extracted content; a failed one carries
/// only the error detail. The two never coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExtractionOutcome {
    Success {
        title: Option<String>,
        body: String,
        payload: StructuredPayload,
    },
    Error {
        message: String,
    },
}

impl ExtractionOutcome {
    pub fn status(&self) -> ExtractionStatus {
        match self {
            ExtractionOutcome::Success { .. } => ExtractionStatus::Success,
            ExtractionOutcome::Error { .. } => ExtractionStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success { .. })
    }
}

impl From<PageContent> for ExtractionOutcome {
    fn from(content: PageContent) -> Self {
        ExtractionOutcome::Success {
            title: content.title,
            body: content.body,
            payload: content.payload,
        }
    }
}

/// One fetch-and-extract attempt for one URL. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub task_id: i64,
    pub url: String,
    pub outcome: ExtractionOutcome,
    /// Seconds from the start of the fetch stage until it finished or failed.
    pub response_time: f64,
    /// Absent if no response was ever received.
    pub status_code: Option<u16>,
    pub content_size: u64,
    pub scraped_at: DateTime<Utc>,
}

impl ExtractionResult {
    /// The statistics row recorded alongside this result.
    pub fn stats(&self) -> ScrapeStats {
        ScrapeStats {
            task_id: self.task_id,
            url: self.url.clone(),
            response_time: self.response_time,
            content_size: self.content_size,
            status_code: self.status_code,
            scraped_at: self.scraped_at,
        }
    }
}

/// An extraction result read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredResult {
    pub id: i64,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

/// Per-attempt operational statistics, used only for aggregate reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeStats {
    pub task_id: i64,
    pub url: String,
    pub response_time: f64,
    pub content_size: u64,
    pub status_code: Option<u16>,
    pub scraped_at: DateTime<Utc>,
}

/// Aggregate statistics for one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_attempts: i64,
    pub avg_response_time: f64,
    pub avg_content_size: f64,
    pub first_attempt_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub success_rate_percent: f64,
}

/// Rows removed by a retention purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub results_deleted: u64,
    pub stats_deleted: u64,
}

/// A same-domain link found on a monitored page, enumerated before dedup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Absolute URL, resolved against the monitored page.
    pub url: String,
    /// Visible anchor text.
    pub title: String,
    /// Outer HTML of the anchor element.
    pub anchor_html: String,
    /// Visible text of the anchor's immediate container.
    pub context_text: String,
}

/// DTO for inserting a discovered update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDiscoveredUpdate {
    pub monitor_url: String,
    pub page_url: String,
    pub title: String,
    pub anchor_html: String,
    pub fingerprint: String,
    pub discovered_at: DateTime<Utc>,
}

/// A discovered update recorded once per unique fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredUpdate {
    pub id: i64,
    pub monitor_url: String,
    pub page_url: String,
    pub title: String,
    pub anchor_html: String,
    pub fingerprint: String,
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveredUpdate {
    pub fn from_new(id: i64, update: NewDiscoveredUpdate) -> Self {
        Self {
            id,
            monitor_url: update.monitor_url,
            page_url: update.page_url,
            title: update.title,
            anchor_html: update.anchor_html,
            fingerprint: update.fingerprint,
            discovered_at: update.discovered_at,
        }
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
