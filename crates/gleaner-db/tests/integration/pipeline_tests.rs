//! End-to-end runs of the real fetcher and extractor against fixture pages
//! served from a local axum server, persisting into SQLite.

use axum::{Router, http::StatusCode, response::Html, routing::get};
use gleaner_client::{HtmlExtractor, ReqwestFetcher};
use gleaner_core::models::ExtractionOutcome;
use gleaner_core::{HarvestService, ScrapeRequest, ScrapeService, WorkerConfig, WorkerPool};
use gleaner_core::testutil::MockReporter;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::common::setup_test_db;

const MONITOR_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Notices</title></head>
<body>
    <ul>
        <li><a href="/notices/1">Latest notice</a></li>
        <li><a href="notices/2">Timetable</a></li>
        <li><a href="https://elsewhere.example/promo">Partner offer</a></li>
    </ul>
</body>
</html>"#;

const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Water outage</title>
    <meta name="description" content="Service notice">
</head>
<body>
    <nav><a href="/">Home</a></nav>
    <div class="content">Sidebar</div>
    <article>
        <p>Supply will be interrupted on Monday.</p>
        <script>trackVisit();</script>
    </article>
</body>
</html>"#;

async fn start_fixture_server() -> String {
    let app = Router::new()
        .route("/", get(|| async { Html(MONITOR_PAGE) }))
        .route("/article", get(|| async { Html(ARTICLE_PAGE) }))
        .route("/gone", get(|| async { (StatusCode::GONE, "gone") }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn harvesting_twice_records_links_once() {
    let server = start_fixture_server().await;
    let db = setup_test_db().await;
    let harvester = HarvestService::new(
        ReqwestFetcher::for_harvesting().unwrap(),
        HtmlExtractor::new(),
        db.update_repo(),
    );
    let cancel = CancellationToken::new();

    let first = harvester.harvest(&server, &cancel).await.unwrap();
    let second = harvester.harvest(&server, &cancel).await.unwrap();

    assert_eq!(first.candidates, 2);
    assert_eq!(first.new_count(), 2);
    assert_eq!(first.recent_count(), 1);
    assert_eq!(second.new_count(), 0);

    let stored = db.update_repo().list_updates(10).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|u| u.page_url.starts_with(&server)));
    assert!(stored.iter().all(|u| !u.page_url.contains("elsewhere")));
}

#[tokio::test]
async fn scraping_persists_every_attempt() {
    let server = start_fixture_server().await;
    let db = setup_test_db().await;
    let scraper = ScrapeService::with_store(
        ReqwestFetcher::for_extraction().unwrap(),
        HtmlExtractor::new(),
        db.result_repo(),
    );
    let cancel = CancellationToken::new();
    let url = format!("{server}/article");

    let first = scraper.scrape(1, &url, &cancel).await;
    scraper.scrape(1, &url, &cancel).await;

    assert!(first.storage_warning.is_none());
    match &first.result.outcome {
        ExtractionOutcome::Success {
            title,
            body,
            payload,
        } => {
            assert_eq!(title.as_deref(), Some("Water outage"));
            assert_eq!(body, "Supply will be interrupted on Monday.");
            assert_eq!(payload.meta["description"], "Service notice");
            assert_eq!(payload.links[0].url, format!("{server}/"));
        }
        ExtractionOutcome::Error { message } => panic!("scrape failed: {message}"),
    }

    let stored = db.result_repo().query_results(1, 10).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].id, first.result_id.unwrap());
}

#[tokio::test]
async fn worker_pool_records_successes_and_failures() {
    let server = start_fixture_server().await;
    let db = setup_test_db().await;
    let scraper = ScrapeService::with_store(
        ReqwestFetcher::for_extraction().unwrap(),
        HtmlExtractor::new(),
        db.result_repo(),
    );
    let pool = WorkerPool::new(scraper, WorkerConfig::default().with_max_workers(2));
    let requests = vec![
        ScrapeRequest::new(4, format!("{server}/")),
        ScrapeRequest::new(4, format!("{server}/article")),
        ScrapeRequest::new(4, format!("{server}/gone")),
    ];

    let outcomes = pool
        .run(requests, CancellationToken::new(), &MockReporter::new())
        .await;

    assert_eq!(outcomes.len(), 3);
    let gone = outcomes
        .iter()
        .find(|o| o.result.url.ends_with("/gone"))
        .unwrap();
    assert_eq!(gone.result.status_code, Some(410));

    let summary = db.result_repo().query_stats_summary(4).await.unwrap();
    assert_eq!(summary.total_attempts, 3);
    assert_eq!(summary.success_rate_percent, 66.67);
}
