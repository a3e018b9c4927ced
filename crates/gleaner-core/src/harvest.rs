use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{DiscoveredUpdate, NewDiscoveredUpdate};
use crate::recency::is_recent;
use crate::traits::{Extractor, Fetcher, UpdateStore};
use crate::util::{fingerprint, normalize_url, same_host};

/// A newly recorded update plus its informational recency flag.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestedUpdate {
    #[serde(flatten)]
    pub update: DiscoveredUpdate,
    pub recent: bool,
}

/// Summary of one harvesting pass over a monitored page.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub monitor_url: String,
    /// Same-domain links considered for recording.
    pub candidates: usize,
    pub new_updates: Vec<HarvestedUpdate>,
    pub message: String,
}

impl HarvestReport {
    pub fn new_count(&self) -> usize {
        self.new_updates.len()
    }

    pub fn recent_count(&self) -> usize {
        self.new_updates.iter().filter(|u| u.recent).count()
    }
}

/// Link-harvesting pipeline: fetch a monitored page, enumerate its
/// same-domain links, and record each one the store has not seen before.
pub struct HarvestService<F, E, U>
where
    F: Fetcher,
    E: Extractor,
    U: UpdateStore,
{
    fetcher: F,
    extractor: E,
    store: U,
}

impl<F, E, U> HarvestService<F, E, U>
where
    F: Fetcher,
    E: Extractor,
    U: UpdateStore,
{
    pub fn new(fetcher: F, extractor: E, store: U) -> Self {
        Self {
            fetcher,
            extractor,
            store,
        }
    }

    /// Run one harvesting pass.
    ///
    /// Transport failures are returned as errors. Links whose fingerprint is
    /// already recorded are dropped silently; a failed insert is logged and
    /// the pass continues with the next link.
    pub async fn harvest(
        &self,
        monitor_url: &str,
        cancel: &CancellationToken,
    ) -> Result<HarvestReport, AppError> {
        let monitor_url = normalize_url(monitor_url);
        tracing::info!(url = %monitor_url, "Harvesting links");

        let page = tokio::select! {
            res = self.fetcher.fetch(&monitor_url) => res?,
            () = cancel.cancelled() => return Err(AppError::Cancelled),
        };

        let today = Utc::now().date_naive();
        let candidates: Vec<_> = self
            .extractor
            .links(&page.body, &monitor_url)
            .into_iter()
            .filter(|link| same_host(&link.url, &monitor_url))
            .collect();

        let mut new_updates = Vec::new();
        for link in &candidates {
            let recent = is_recent(&link.title, today) || is_recent(&link.context_text, today);
            let update = NewDiscoveredUpdate {
                monitor_url: monitor_url.clone(),
                page_url: link.url.clone(),
                title: link.title.clone(),
                anchor_html: link.anchor_html.clone(),
                fingerprint: fingerprint(&link.url),
                discovered_at: Utc::now(),
            };

            match self.store.insert_if_absent(&update).await {
                Ok(Some(id)) => {
                    tracing::debug!(id, url = %update.page_url, recent, "New update recorded");
                    new_updates.push(HarvestedUpdate {
                        update: DiscoveredUpdate::from_new(id, update),
                        recent,
                    });
                }
                Ok(None) => {
                    tracing::debug!(url = %update.page_url, fingerprint = %&update.fingerprint[..8], "Already seen");
                }
                Err(e) => {
                    tracing::warn!(url = %update.page_url, error = %e, "Failed to record update");
                }
            }
        }

        let report = HarvestReport {
            message: summarize(&monitor_url, &new_updates),
            monitor_url,
            candidates: candidates.len(),
            new_updates,
        };
        tracing::info!(
            url = %report.monitor_url,
            candidates = report.candidates,
            new = report.new_count(),
            recent = report.recent_count(),
            "Harvest complete"
        );
        Ok(report)
    }
}

fn summarize(monitor_url: &str, new_updates: &[HarvestedUpdate]) -> String {
    let recent = new_updates.iter().filter(|u| u.recent).count();
    match new_updates.len() {
        0 => format!("No new updates found on {monitor_url}"),
        1 => format!("Found 1 new update on {monitor_url} ({recent} recent)"),
        n => format!("Found {n} new updates on {monitor_url} ({recent} recent)"),
    }
}
