use chrono::{TimeDelta, Utc};
use gleaner_core::models::{ExtractionOutcome, PageImage, StructuredPayload};
use gleaner_core::traits::ResultStore;

use crate::common::{error_result, setup_test_db, success_result};

#[tokio::test]
async fn save_and_query_round_trip() {
    let db = setup_test_db().await;
    let repo = db.result_repo();

    let mut result = success_result(1, "https://example.com", Utc::now());
    if let ExtractionOutcome::Success { payload, .. } = &mut result.outcome {
        payload.meta.insert("description".into(), "Example site".into());
        payload.images.push(PageImage {
            url: "https://example.com/logo.png".into(),
            alt: String::new(),
        });
        payload.tables.push(vec![vec!["h1".into(), "h2".into()]]);
    }

    let id = repo.save(&result).await.unwrap();
    let stored = repo.query_results(1, 10).await.unwrap();

    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].result, result);
}

#[tokio::test]
async fn failed_attempt_round_trip() {
    let db = setup_test_db().await;
    let repo = db.result_repo();

    let result = error_result(2, "https://down.example", Utc::now());
    repo.save(&result).await.unwrap();

    let stored = repo.query_results(2, 10).await.unwrap();
    assert_eq!(stored[0].result, result);
    assert_eq!(stored[0].result.status_code, None);
}

#[tokio::test]
async fn query_is_newest_first_with_limit() {
    let db = setup_test_db().await;
    let repo = db.result_repo();
    let base = Utc::now() - TimeDelta::hours(1);

    for i in 0..5 {
        let url = format!("https://example.com/{i}");
        repo.save(&success_result(1, &url, base + TimeDelta::minutes(i)))
            .await
            .unwrap();
    }
    repo.save(&success_result(9, "https://other.task", Utc::now()))
        .await
        .unwrap();

    let stored = repo.query_results(1, 3).await.unwrap();

    let urls: Vec<_> = stored.iter().map(|s| s.result.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://example.com/4",
            "https://example.com/3",
            "https://example.com/2",
        ]
    );
}

#[tokio::test]
async fn unknown_task_has_no_results() {
    let db = setup_test_db().await;
    assert!(db.result_repo().query_results(42, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn stats_summary_aggregates_attempts() {
    let db = setup_test_db().await;
    let repo = db.result_repo();
    let first = Utc::now() - TimeDelta::minutes(10);
    let last = Utc::now();

    let attempts = [
        success_result(1, "https://example.com/a", first),
        success_result(1, "https://example.com/b", first + TimeDelta::minutes(5)),
        error_result(1, "https://example.com/c", last),
    ];
    for attempt in &attempts {
        repo.save(attempt).await.unwrap();
        repo.save_stats(&attempt.stats()).await.unwrap();
    }

    let summary = repo.query_stats_summary(1).await.unwrap();

    assert_eq!(summary.total_attempts, 3);
    assert_eq!(summary.success_rate_percent, 66.67);
    // (0.5 + 0.5 + 30.0) / 3
    assert_eq!(summary.avg_response_time, 10.33);
    assert_eq!(summary.avg_content_size, 800.0);
    assert_eq!(summary.first_attempt_at, Some(first));
    assert_eq!(summary.last_attempt_at, Some(last));
}

#[tokio::test]
async fn stats_summary_for_empty_task_is_zero() {
    let db = setup_test_db().await;

    let summary = db.result_repo().query_stats_summary(7).await.unwrap();

    assert_eq!(summary.total_attempts, 0);
    assert_eq!(summary.success_rate_percent, 0.0);
    assert_eq!(summary.avg_response_time, 0.0);
    assert!(summary.first_attempt_at.is_none());
    assert!(summary.last_attempt_at.is_none());
}

#[tokio::test]
async fn purge_removes_only_old_rows() {
    let db = setup_test_db().await;
    let repo = db.result_repo();
    let now = Utc::now();

    for age in [0, 10, 40] {
        let result = success_result(1, "https://example.com", now - TimeDelta::days(age));
        repo.save(&result).await.unwrap();
        repo.save_stats(&result.stats()).await.unwrap();
    }

    let report = repo.purge_older_than(30).await.unwrap();

    assert_eq!(report.results_deleted, 1);
    assert_eq!(report.stats_deleted, 1);
    assert_eq!(repo.query_results(1, 10).await.unwrap().len(), 2);
    assert_eq!(repo.query_stats_summary(1).await.unwrap().total_attempts, 2);
}

#[tokio::test]
async fn purge_with_nothing_old_is_a_no_op() {
    let db = setup_test_db().await;
    let repo = db.result_repo();
    repo.save(&success_result(1, "https://example.com", Utc::now()))
        .await
        .unwrap();

    let report = repo.purge_older_than(30).await.unwrap();

    assert_eq!(report.results_deleted, 0);
    assert_eq!(report.stats_deleted, 0);
}

#[tokio::test]
async fn works_through_the_store_trait() {
    async fn record<S: ResultStore>(store: &S) -> usize {
        let result = success_result(5, "https://example.com", Utc::now());
        store.save(&result).await.unwrap();
        store.save_stats(&result.stats()).await.unwrap();
        store.query_results(5, 10).await.unwrap().len()
    }

    let db = setup_test_db().await;
    assert_eq!(record(&db.result_repo()).await, 1);
}

#[tokio::test]
async fn empty_payload_is_stored_as_empty() {
    let db = setup_test_db().await;
    let repo = db.result_repo();
    let mut result = success_result(3, "https://example.com", Utc::now());
    result.outcome = ExtractionOutcome::Success {
        title: None,
        body: String::new(),
        payload: StructuredPayload::default(),
    };

    repo.save(&result).await.unwrap();

    assert_eq!(repo.query_results(3, 1).await.unwrap()[0].result, result);
}

#[tokio::test]
async fn health_check_succeeds() {
    let db = setup_test_db().await;
    db.result_repo().health_check().await.unwrap();
}
