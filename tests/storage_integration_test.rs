//! Integration tests for the storage backends
//!
//! Tests can be filtered by database backend using the DATABASE_BACKEND environment variable:
//! - `DATABASE_BACKEND=sqlite cargo test` - Run only SQLite tests
//! - `DATABASE_BACKEND=postgres cargo test` - Run only PostgreSQL tests (needs DATABASE_URL)
//! - By default, SQLite always runs and PostgreSQL runs when DATABASE_URL is set

use smartlinks::models::{ClickMetadata, LinkChanges, LinkFilter, NewLink};
use smartlinks::storage::{PostgresStorage, SqliteStorage, Storage, StorageError};
use std::sync::Arc;

/// Get the database backend to test from environment variable
fn should_test_backend(backend: &str) -> bool {
    match std::env::var("DATABASE_BACKEND") {
        Ok(val) => val.to_lowercase() == backend.to_lowercase(),
        Err(_) => true,
    }
}

/// Helper to create SQLite test storage
async fn create_sqlite_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

/// Helper to create PostgreSQL test storage
async fn create_postgres_storage() -> Option<Arc<dyn Storage>> {
    let db_url = std::env::var("DATABASE_URL").ok()?;
    if !db_url.starts_with("postgres") {
        return None;
    }
    let storage = PostgresStorage::new(&db_url, 5).await.ok()?;
    storage.init().await.ok()?;
    Some(Arc::new(storage))
}

/// Keywords unique per run so PostgreSQL tests can share a database
fn unique(prefix: &str) -> String {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

fn new_link(keyword: &str, category: &str) -> NewLink {
    NewLink {
        keyword: keyword.to_string(),
        url: format!("https://example.com/{keyword}"),
        title: Some(format!("Title for {keyword}")),
        description: None,
        category: category.to_string(),
        created_by: "tester".to_string(),
    }
}

async fn check_create_and_lookup(storage: Arc<dyn Storage>) {
    let keyword = unique("lookup");
    let created = storage
        .create_link(&new_link(&keyword, "General"))
        .await
        .unwrap();

    assert!(created.is_active);
    assert_eq!(created.created_at, created.updated_at);

    let by_keyword = storage.get_link_by_keyword(&keyword).await.unwrap().unwrap();
    assert_eq!(by_keyword, created);

    let by_id = storage.get_link(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.keyword, keyword);
    assert_eq!(by_id.url, format!("https://example.com/{keyword}"));

    assert!(storage
        .get_link_by_keyword(&keyword.to_uppercase())
        .await
        .unwrap()
        .is_none());
}

async fn check_duplicate_keyword(storage: Arc<dyn Storage>) {
    let keyword = unique("dup");
    storage
        .create_link(&new_link(&keyword, "General"))
        .await
        .unwrap();

    let filter = LinkFilter {
        search: Some(keyword.clone()),
        ..Default::default()
    };
    let before = storage.list_links(&filter, 100, 0).await.unwrap().len();

    let err = storage
        .create_link(&new_link(&keyword, "Other"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateKeyword(k) if k == keyword));

    let after = storage.list_links(&filter, 100, 0).await.unwrap().len();
    assert_eq!(before, after);
}

async fn check_concurrent_creation(storage: Arc<dyn Storage>) {
    let keyword = unique("race");

    let mut handles = vec![];
    for _ in 0..10 {
        let storage = Arc::clone(&storage);
        let keyword = keyword.clone();
        handles.push(tokio::spawn(async move {
            storage.create_link(&new_link(&keyword, "General")).await
        }));
    }

    let mut created = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(StorageError::DuplicateKeyword(_)) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1, "exactly one concurrent create should win");
    assert_eq!(duplicates, 9);
}

async fn check_update(storage: Arc<dyn Storage>) {
    let first = unique("first");
    let second = unique("second");
    let a = storage.create_link(&new_link(&first, "General")).await.unwrap();
    storage.create_link(&new_link(&second, "General")).await.unwrap();

    let updated = storage
        .update_link(
            a.id,
            &LinkChanges {
                url: Some("https://example.org/new".to_string()),
                title: Some(String::new()),
                category: Some("Docs".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.url, "https://example.org/new");
    assert_eq!(updated.title, None);
    assert_eq!(updated.category, "Docs");
    assert_eq!(updated.keyword, first);

    let err = storage
        .update_link(
            a.id,
            &LinkChanges {
                keyword: Some(second.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateKeyword(_)));

    let err = storage
        .update_link(
            i64::MAX,
            &LinkChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

async fn check_clicks(storage: Arc<dyn Storage>) {
    let link = storage
        .create_link(&new_link(&unique("clicks"), "General"))
        .await
        .unwrap();

    let metadata = ClickMetadata {
        ip_address: Some("198.51.100.7".to_string()),
        user_agent: Some("integration".to_string()),
        referrer: None,
    };
    let event = storage.insert_click(link.id, &metadata, 1_000).await.unwrap();
    assert_eq!(event.link_id, link.id);
    storage.insert_click(link.id, &metadata, 2_000).await.unwrap();

    assert_eq!(storage.count_clicks(link.id, None).await.unwrap(), 2);
    assert_eq!(storage.count_clicks(link.id, Some(1_500)).await.unwrap(), 1);

    let err = storage
        .insert_click(i64::MAX, &metadata, 3_000)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn test_create_and_lookup_sqlite() {
    if should_test_backend("sqlite") {
        check_create_and_lookup(create_sqlite_storage().await).await;
    }
}

#[tokio::test]
async fn test_duplicate_keyword_sqlite() {
    if should_test_backend("sqlite") {
        check_duplicate_keyword(create_sqlite_storage().await).await;
    }
}

#[tokio::test]
async fn test_concurrent_creation_sqlite() {
    if should_test_backend("sqlite") {
        check_concurrent_creation(create_sqlite_storage().await).await;
    }
}

#[tokio::test]
async fn test_update_sqlite() {
    if should_test_backend("sqlite") {
        check_update(create_sqlite_storage().await).await;
    }
}

#[tokio::test]
async fn test_clicks_sqlite() {
    if should_test_backend("sqlite") {
        check_clicks(create_sqlite_storage().await).await;
    }
}

async fn check_search_matches_wildcards_literally(storage: Arc<dyn Storage>) {
    let base = unique("wild");
    let underscored = format!("{base}_x");
    let dashed = format!("{base}-x");
    storage.create_link(&new_link(&underscored, "General")).await.unwrap();
    storage.create_link(&new_link(&dashed, "General")).await.unwrap();

    let search = |term: String| LinkFilter {
        search: Some(term),
        ..Default::default()
    };

    let found = storage.list_links(&search(underscored.clone()), 100, 0).await.unwrap();
    let keywords: Vec<&str> = found.iter().map(|l| l.keyword.as_str()).collect();
    assert_eq!(keywords, vec![underscored.as_str()]);

    let mut percent = new_link(&unique("pct"), "General");
    percent.title = Some(format!("{base} 50% off"));
    let percent = storage.create_link(&percent).await.unwrap();
    let mut plain = new_link(&unique("pct"), "General");
    plain.title = Some(format!("{base} 500 off"));
    storage.create_link(&plain).await.unwrap();

    let found = storage
        .list_links(&search(format!("{base} 50%")), 100, 0)
        .await
        .unwrap();
    let ids: Vec<i64> = found.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![percent.id]);
}

async fn check_click_counts(storage: Arc<dyn Storage>) {
    let clicked = storage
        .create_link(&new_link(&unique("counted"), "General"))
        .await
        .unwrap();
    let idle = storage
        .create_link(&new_link(&unique("idle"), "General"))
        .await
        .unwrap();
    for _ in 0..3 {
        storage
            .insert_click(clicked.id, &ClickMetadata::default(), 1_700_000_000)
            .await
            .unwrap();
    }

    let counts = storage.click_counts(&[clicked.id, idle.id]).await.unwrap();
    assert_eq!(counts, vec![(clicked.id, 3)]);
    assert!(storage.click_counts(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_matches_wildcards_literally_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_search_matches_wildcards_literally(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_click_counts_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    check_click_counts(create_sqlite_storage().await).await;
}

#[tokio::test]
async fn test_search_matches_wildcards_literally_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    if let Some(storage) = create_postgres_storage().await {
        check_search_matches_wildcards_literally(storage).await;
    }
}

#[tokio::test]
async fn test_click_counts_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    if let Some(storage) = create_postgres_storage().await {
        check_click_counts(storage).await;
    }
}

#[tokio::test]
async fn test_list_filters_and_pagination_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    let storage = create_sqlite_storage().await;

    let mut ids = vec![];
    for (keyword, category) in [
        ("alpha", "Development"),
        ("beta", "Development"),
        ("gamma", "HR"),
        ("delta", "Development"),
    ] {
        ids.push(storage.create_link(&new_link(keyword, category)).await.unwrap().id);
    }
    storage
        .update_link(
            ids[1],
            &LinkChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Newest first
    let all = storage.list_links(&LinkFilter::default(), 100, 0).await.unwrap();
    let keywords: Vec<&str> = all.iter().map(|l| l.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["delta", "gamma", "beta", "alpha"]);

    let active_dev = storage
        .list_links(
            &LinkFilter {
                category: Some("Development".to_string()),
                is_active: Some(true),
                search: None,
            },
            100,
            0,
        )
        .await
        .unwrap();
    let keywords: Vec<&str> = active_dev.iter().map(|l| l.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["delta", "alpha"]);

    let page = storage.list_links(&LinkFilter::default(), 2, 2).await.unwrap();
    let keywords: Vec<&str> = page.iter().map(|l| l.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["beta", "alpha"]);

    let searched = storage
        .list_links(
            &LinkFilter {
                search: Some("Title for gam".to_string()),
                ..Default::default()
            },
            100,
            0,
        )
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].keyword, "gamma");
}

#[tokio::test]
async fn test_create_and_lookup_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    if let Some(storage) = create_postgres_storage().await {
        check_create_and_lookup(storage).await;
    }
}

#[tokio::test]
async fn test_duplicate_keyword_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    if let Some(storage) = create_postgres_storage().await {
        check_duplicate_keyword(storage).await;
    }
}

#[tokio::test]
async fn test_concurrent_creation_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    if let Some(storage) = create_postgres_storage().await {
        check_concurrent_creation(storage).await;
    }
}

#[tokio::test]
async fn test_update_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    if let Some(storage) = create_postgres_storage().await {
        check_update(storage).await;
    }
}

#[tokio::test]
async fn test_clicks_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    if let Some(storage) = create_postgres_storage().await {
        check_clicks(storage).await;
    }
}
