use std::time::{Duration, Instant};

use gleaner_core::error::AppError;
use gleaner_core::models::FetchedPage;
use gleaner_core::traits::Fetcher;
use reqwest::{Client, StatusCode};

/// Identification header sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Hard timeout for the extraction path.
pub const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard timeout for the lighter link-harvesting path.
pub const HARVEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP fetcher using reqwest.
///
/// Downloads raw page bytes with a fixed browser User-Agent and a hard
/// timeout. Only a 200 response counts as success; any other status is an
/// [`AppError::HttpStatus`] even when a body was returned.
///
/// The politeness delay is not applied here; wrap the fetcher in a
/// [`PoliteFetcher`](gleaner_core::throttle::PoliteFetcher) for that.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    /// Fetcher for page extraction (30s timeout).
    pub fn for_extraction() -> Result<Self, AppError> {
        Self::with_timeout(EXTRACTION_TIMEOUT)
    }

    /// Fetcher for link harvesting (10s timeout).
    pub fn for_harvesting() -> Result<Self, AppError> {
        Self::with_timeout(HARVEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn classify(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::ConnectionFailure(e.to_string())
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(%url, status = status.as_u16(), "Non-200 response");
            return Err(AppError::HttpStatus {
                status_code: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(FetchedPage {
            body: body.to_vec(),
            status_code: status.as_u16(),
            elapsed: started.elapsed(),
        })
    }
}
