//! Randomized politeness delay in front of every fetch.
//!
//! Wraps any [`Fetcher`] and pauses for a uniformly random duration before
//! each request so a target server never sees a burst of back-to-back hits.
//!
//! # Example
//!
//! ```rust,no_run
//! use gleaner_core::throttle::{PoliteFetcher, PolitenessConfig};
//! # use gleaner_core::error::AppError;
//! # use gleaner_core::models::FetchedPage;
//! # use gleaner_core::traits::Fetcher;
//! # #[derive(Clone)] struct MyFetcher;
//! # impl Fetcher for MyFetcher {
//! #     async fn fetch(&self, _: &str) -> Result<FetchedPage, AppError> { todo!() }
//! # }
//! // Sleeps between 1s and 3s before delegating to the inner fetcher.
//! let fetcher = PoliteFetcher::new(MyFetcher, PolitenessConfig::default());
//! ```

use std::time::Duration;

use rand::Rng;

use crate::error::AppError;
use crate::models::FetchedPage;
use crate::traits::Fetcher;

/// Bounds of the pre-request pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl PolitenessConfig {
    /// A pause drawn uniformly from `[min_delay, max_delay]`.
    ///
    /// The bounds are swapped if given in the wrong order.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        if min_delay <= max_delay {
            Self {
                min_delay,
                max_delay,
            }
        } else {
            Self {
                min_delay: max_delay,
                max_delay: min_delay,
            }
        }
    }

    /// No pause at all.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draw the pause for a single request.
    pub fn sample(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if min == max {
            return self.min_delay;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

impl Default for PolitenessConfig {
    /// 1 to 3 seconds.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(3))
    }
}

/// A [`Fetcher`] wrapper that sleeps a random politeness delay before
/// every request.
///
/// The configuration is fixed at construction; callers cannot skip the
/// delay per request. The sleep is an ordinary future, so dropping the
/// fetch (cancellation, deadline) also abandons the pause.
#[derive(Debug, Clone)]
pub struct PoliteFetcher<F> {
    inner: F,
    config: PolitenessConfig,
}

impl<F: Fetcher> PoliteFetcher<F> {
    pub fn new(inner: F, config: PolitenessConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> PolitenessConfig {
        self.config
    }
}

impl<F: Fetcher> Fetcher for PoliteFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let pause = self.config.sample();
        if !pause.is_zero() {
            tracing::debug!(%url, pause_ms = %pause.as_millis(), "Politeness delay");
            tokio::time::sleep(pause).await;
        }
        self.inner.fetch(url).await
    }
}
