//! Concurrent API integration tests
//!
//! These tests verify that the full application stays correct under parallel
//! requests: keyword uniqueness on create and one click per redirect.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use smartlinks::config::Config;
use smartlinks::storage::{SqliteStorage, Storage};
use smartlinks::suggest::MockSuggestionGateway;
use smartlinks::{build_app, App};
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create the application over in-memory storage
async fn create_test_app() -> App {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    let storage: Arc<dyn Storage> = Arc::new(storage);

    build_app(storage, Arc::new(MockSuggestionGateway::new()), &Config::default())
}

fn create_request(keyword: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/links")
        .header("content-type", "application/json")
        .body(Body::from(format!(
            r#"{{"keyword": "{keyword}", "url": "https://example.com/{keyword}"}}"#
        )))
        .unwrap()
}

#[tokio::test]
async fn test_concurrent_keyword_creation() {
    let app = create_test_app().await;

    let mut handles = vec![];
    for _ in 0..10 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            router.oneshot(create_request("concurrent")).await.unwrap()
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap().status() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 1, "Only one request should create the keyword");
    assert_eq!(conflicts, 9);
}

#[tokio::test]
async fn test_concurrent_distinct_keywords() {
    let app = create_test_app().await;

    let mut handles = vec![];
    for i in 0..20 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            router
                .oneshot(create_request(&format!("link-{i}")))
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().status(), StatusCode::CREATED);
    }

    assert_eq!(app.storage.total_links().await.unwrap(), 20);
}

#[tokio::test]
async fn test_hundred_parallel_redirects_record_hundred_clicks() {
    let app = create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(create_request("hot"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let link: Value = serde_json::from_slice(&body).unwrap();
    let link_id = link["id"].as_i64().unwrap();

    let mut handles = vec![];
    for _ in 0..100 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .uri("/go/hot")
                .body(Body::empty())
                .unwrap();
            router.oneshot(request).await.unwrap()
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "https://example.com/hot"
        );
    }

    app.recorder.flush().await;
    assert_eq!(app.storage.count_clicks(link_id, None).await.unwrap(), 100);
    assert_eq!(app.storage.total_clicks().await.unwrap(), 100);
}
