use chrono::{TimeDelta, Utc};

use crate::common::{new_update, setup_file_db, setup_test_db};

#[tokio::test]
async fn duplicate_fingerprint_is_not_recorded() {
    let db = setup_test_db().await;
    let repo = db.update_repo();

    let first = repo
        .insert_if_absent(&new_update("https://example.com/post"))
        .await
        .unwrap();
    // Same link seen again later, with a fragment the fingerprint ignores.
    let again = repo
        .insert_if_absent(&new_update("https://example.com/post#comments"))
        .await
        .unwrap();

    assert!(first.is_some());
    assert_eq!(again, None);
    assert_eq!(repo.list_updates(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_is_newest_first_with_limit() {
    let db = setup_test_db().await;
    let repo = db.update_repo();
    let base = Utc::now() - TimeDelta::hours(1);

    for i in 0..4 {
        let mut update = new_update(&format!("https://example.com/{i}"));
        update.discovered_at = base + TimeDelta::minutes(i);
        repo.insert_if_absent(&update).await.unwrap();
    }

    let listed = repo.list_updates(2).await.unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].page_url, "https://example.com/3");
    assert_eq!(listed[1].page_url, "https://example.com/2");
    assert_eq!(listed[0].title, "A post");
}

#[tokio::test]
async fn delete_one_and_all() {
    let db = setup_test_db().await;
    let repo = db.update_repo();

    let id = repo
        .insert_if_absent(&new_update("https://example.com/a"))
        .await
        .unwrap()
        .unwrap();
    repo.insert_if_absent(&new_update("https://example.com/b"))
        .await
        .unwrap();
    repo.insert_if_absent(&new_update("https://example.com/c"))
        .await
        .unwrap();

    assert!(repo.delete_update(id).await.unwrap());
    assert!(!repo.delete_update(id).await.unwrap());
    assert_eq!(repo.delete_all_updates().await.unwrap(), 2);
    assert!(repo.list_updates(10).await.unwrap().is_empty());

    // A deleted link counts as new again.
    assert!(
        repo.insert_if_absent(&new_update("https://example.com/a"))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn concurrent_inserts_record_exactly_once() {
    let (db, _dir) = setup_file_db().await;

    let attempts = (0..8).map(|_| {
        let repo = db.update_repo();
        tokio::spawn(async move {
            repo.insert_if_absent(&new_update("https://example.com/race"))
                .await
        })
    });
    let outcomes = futures::future::join_all(attempts).await;

    let inserted = outcomes
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .filter(Option::is_some)
        .count();
    assert_eq!(inserted, 1);
    assert_eq!(db.update_repo().list_updates(10).await.unwrap().len(), 1);
}
