use chrono::{DateTime, Utc};
use gleaner_core::models::{
    ExtractionOutcome, ExtractionResult, NewDiscoveredUpdate, PageLink, StructuredPayload,
};
use gleaner_core::util::fingerprint;
use gleaner_db::{Database, DatabaseConfig};
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

/// Fresh in-memory database with migrations applied.
///
/// A single never-recycled connection keeps the in-memory database alive
/// for the whole test.
pub async fn setup_test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");
    db
}

/// File-backed database with a multi-connection pool, for concurrency tests.
///
/// The `TempDir` must be kept in scope for the test duration.
pub async fn setup_file_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("gleaner-test.db").display());
    let config = DatabaseConfig {
        max_connections: 8,
        ..DatabaseConfig::new(url)
    };

    let db = Database::connect(&config)
        .await
        .expect("Failed to open file database");
    db.migrate().await.expect("Failed to run migrations");
    (db, dir)
}

pub fn success_result(task_id: i64, url: &str, scraped_at: DateTime<Utc>) -> ExtractionResult {
    ExtractionResult {
        task_id,
        url: url.into(),
        outcome: ExtractionOutcome::Success {
            title: Some("Example".into()),
            body: "Example body".into(),
            payload: StructuredPayload {
                links: vec![PageLink {
                    url: "https://example.com/a".into(),
                    text: "A".into(),
                }],
                ..StructuredPayload::default()
            },
        },
        response_time: 0.5,
        status_code: Some(200),
        content_size: 1200,
        scraped_at,
    }
}

pub fn error_result(task_id: i64, url: &str, scraped_at: DateTime<Utc>) -> ExtractionResult {
    ExtractionResult {
        task_id,
        url: url.into(),
        outcome: ExtractionOutcome::Error {
            message: format!("Timeout error while scraping {url}"),
        },
        response_time: 30.0,
        status_code: None,
        content_size: 0,
        scraped_at,
    }
}

pub fn new_update(page_url: &str) -> NewDiscoveredUpdate {
    NewDiscoveredUpdate {
        monitor_url: "https://example.com".into(),
        page_url: page_url.into(),
        title: "A post".into(),
        anchor_html: format!("<a href=\"{page_url}\">A post</a>"),
        fingerprint: fingerprint(page_url),
        discovered_at: Utc::now(),
    }
}
