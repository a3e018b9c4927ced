pub mod error;
pub mod harvest;
pub mod job;
pub mod models;
pub mod recency;
pub mod scrape;
pub mod throttle;
pub mod traits;
pub mod util;
pub mod worker;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::AppError;
pub use harvest::{HarvestReport, HarvestService, HarvestedUpdate};
pub use job::{ScrapeRequest, WorkerConfig};
pub use models::{
    DiscoveredUpdate, ExtractionOutcome, ExtractionResult, ExtractionStatus, FetchedPage,
    LinkCandidate, NewDiscoveredUpdate, PageContent, PageImage, PageLink, PurgeReport,
    ScrapeStats, StatsSummary, StoredResult, StructuredPayload, Table, compute_hash,
};
pub use scrape::{ScrapeOutcome, ScrapeService};
pub use throttle::{PoliteFetcher, PolitenessConfig};
pub use traits::{Extractor, Fetcher, NullStore, ResultStore, UpdateStore};
pub use worker::{TracingWorkerReporter, WorkerEvent, WorkerPool, WorkerReporter};
