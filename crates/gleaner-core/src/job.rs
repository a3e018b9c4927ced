use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of work handed over by the task layer: scrape `url` for `task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub task_id: i64,
    pub url: String,
}

impl ScrapeRequest {
    pub fn new(task_id: i64, url: impl Into<String>) -> Self {
        Self {
            task_id,
            url: url.into(),
        }
    }
}

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    /// Maximum number of URLs in flight at once.
    pub max_workers: usize,
    /// Upper bound on the fetch stage of a single URL.
    pub job_deadline: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", &Uuid::new_v4().to_string()[..8]),
            max_workers: 4,
            job_deadline: Duration::from_secs(90),
        }
    }
}

impl WorkerConfig {
    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    pub fn with_job_deadline(mut self, deadline: Duration) -> Self {
        self.job_deadline = deadline;
        self
    }
}
