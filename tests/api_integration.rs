//! End-to-end API tests over the full application router

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use smartlinks::config::Config;
use smartlinks::storage::{SqliteStorage, Storage};
use smartlinks::suggest::{MockSuggestionGateway, Suggestion, SuggestionError, SuggestionGateway};
use smartlinks::{build_app, App};
use std::sync::Arc;
use tower::ServiceExt;

async fn create_test_app_with(gateway: Arc<dyn SuggestionGateway>) -> App {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    let storage: Arc<dyn Storage> = Arc::new(storage);

    build_app(storage, gateway, &Config::default())
}

async fn create_test_app() -> App {
    create_test_app_with(Arc::new(MockSuggestionGateway::new())).await
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    router.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

struct DownGateway;

#[async_trait::async_trait]
impl SuggestionGateway for DownGateway {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn suggest(&self, _url: &str) -> Result<Suggestion, SuggestionError> {
        Err(SuggestionError::Unavailable("timed out".to_string()))
    }
}

#[tokio::test]
async fn test_github_example_end_to_end() {
    let app = create_test_app().await;
    let router = &app.router;

    let response = send(
        router,
        "POST",
        "/api/links",
        Some(json!({ "keyword": "github", "url": "https://github.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let link = json_body(response).await;
    assert_eq!(link["keyword"], "github");
    assert_eq!(link["category"], "General");
    assert_eq!(link["created_by"], "anonymous");
    assert_eq!(link["is_active"], true);

    let stats = json_body(send(router, "GET", "/api/analytics/stats", None).await).await;
    let clicks_before = stats["total_clicks"].as_i64().unwrap();

    let response = send(router, "GET", "/go/github", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://github.com"
    );

    app.recorder.flush().await;
    let stats = json_body(send(router, "GET", "/api/analytics/stats", None).await).await;
    assert_eq!(stats["total_clicks"].as_i64().unwrap(), clicks_before + 1);
    assert_eq!(stats["total_links"], 1);
    assert_eq!(stats["categories"][0]["category"], "General");

    let response = send(router, "GET", "/go/unknown", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_invalid_and_duplicate() {
    let app = create_test_app().await;
    let router = &app.router;

    let body = json!({ "keyword": "docs", "url": "https://docs.example.com" });
    assert_eq!(
        send(router, "POST", "/api/links", Some(body.clone())).await.status(),
        StatusCode::CREATED
    );

    let response = send(router, "POST", "/api/links", Some(body)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(json_body(response).await["error"]
        .as_str()
        .unwrap()
        .contains("docs"));

    for invalid in [
        json!({ "keyword": "has space", "url": "https://example.com" }),
        json!({ "keyword": "ok", "url": "ftp://example.com" }),
        json!({ "keyword": "ok", "url": "not a url" }),
        json!({ "keyword": "", "url": "https://example.com" }),
    ] {
        let response = send(router, "POST", "/api/links", Some(invalid)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let links = json_body(send(router, "GET", "/api/links", None).await).await;
    assert_eq!(links.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_deactivate_and_activate() {
    let app = create_test_app().await;
    let router = &app.router;

    let created = json_body(
        send(
            router,
            "POST",
            "/api/links",
            Some(json!({ "keyword": "wiki", "url": "https://wiki.example.com", "category": "Productivity" })),
        )
        .await,
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    send(
        router,
        "POST",
        "/api/links",
        Some(json!({ "keyword": "taken", "url": "https://example.com" })),
    )
    .await;

    // Resolve once so the keyword is cached
    assert_eq!(send(router, "GET", "/go/wiki", None).await.status(), StatusCode::FOUND);

    let response = send(
        router,
        "PATCH",
        &format!("/api/links/{id}"),
        Some(json!({ "url": "https://wiki.example.org/home", "title": "Team wiki" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["url"], "https://wiki.example.org/home");
    assert_eq!(updated["title"], "Team wiki");
    assert_eq!(updated["category"], "Productivity");

    let response = send(router, "GET", "/go/wiki", None).await;
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://wiki.example.org/home"
    );

    let response = send(
        router,
        "PUT",
        &format!("/api/links/{id}"),
        Some(json!({ "keyword": "taken" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        router,
        "PATCH",
        &format!("/api/links/{id}"),
        Some(json!({ "url": "javascript:alert(1)" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        router,
        "PATCH",
        "/api/links/9999",
        Some(json!({ "title": "nobody" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(router, "POST", &format!("/api/links/{id}/deactivate"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["is_active"], false);
    assert_eq!(send(router, "GET", "/go/wiki", None).await.status(), StatusCode::NOT_FOUND);

    // Inactive links are hidden from the default listing but still fetchable
    let links = json_body(send(router, "GET", "/api/links", None).await).await;
    assert!(links.as_array().unwrap().iter().all(|l| l["keyword"] != "wiki"));
    let all = json_body(send(router, "GET", "/api/links?all=true", None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(
        send(router, "GET", &format!("/api/links/{id}"), None).await.status(),
        StatusCode::OK
    );

    let response = send(router, "POST", &format!("/api/links/{id}/activate"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(send(router, "GET", "/go/wiki", None).await.status(), StatusCode::FOUND);

    let response = send(router, "DELETE", &format!("/api/links/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        send(router, "POST", "/api/links/9999/deactivate", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_list_filters_by_category() {
    let app = create_test_app().await;
    let router = &app.router;

    for (keyword, category) in [("repo", "Development"), ("ci", "Development"), ("pto", "HR")] {
        send(
            router,
            "POST",
            "/api/links",
            Some(json!({ "keyword": keyword, "url": "https://example.com", "category": category })),
        )
        .await;
    }

    let links = json_body(send(router, "GET", "/api/links?category=Development", None).await).await;
    let keywords: Vec<&str> = links
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["keyword"].as_str().unwrap())
        .collect();
    assert_eq!(keywords, vec!["ci", "repo"]);

    let page = json_body(send(router, "GET", "/api/links?limit=1&offset=1", None).await).await;
    assert_eq!(page.as_array().unwrap().len(), 1);
    assert_eq!(page[0]["keyword"], "ci");
}

#[tokio::test]
async fn test_keyword_lookup_and_analytics() {
    let app = create_test_app().await;
    let router = &app.router;

    send(
        router,
        "POST",
        "/api/links",
        Some(json!({ "keyword": "slack", "url": "https://slack.com" })),
    )
    .await;
    for _ in 0..3 {
        send(router, "GET", "/go/slack", None).await;
    }
    app.recorder.flush().await;

    let response = send(router, "GET", "/api/keywords/slack", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["keyword"], "slack");
    assert_eq!(body["click_count"], 3);

    let response = send(router, "GET", "/api/keywords/slack/analytics?days=7", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total_clicks"], 3);
    assert_eq!(body["period_days"], 7);

    let response = send(router, "GET", "/api/analytics/trends?days=7", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total_period_clicks"], 3);

    assert_eq!(
        send(router, "GET", "/api/keywords/missing", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;

    let response = send(&app.router, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["total_links"], 0);
}

#[tokio::test]
async fn test_analyze_url() {
    let app = create_test_app().await;
    let router = &app.router;

    let response = send(
        router,
        "POST",
        "/api/ai/analyze-url",
        Some(json!({ "url": "https://github.com/rust-lang/rust" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "mock");
    assert_eq!(body["keyword"], "github");
    assert_eq!(body["category"], "Development");

    let response = send(router, "POST", "/api/ai/analyze-url", Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_url_degrades_when_gateway_is_down() {
    let app = create_test_app_with(Arc::new(DownGateway)).await;

    let response = send(
        &app.router,
        "POST",
        "/api/ai/analyze-url",
        Some(json!({ "url": "https://intranet.example.com/benefits" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["keyword"], "intranet");
    assert_eq!(body["category"], "General");
}

#[tokio::test]
async fn test_suggest_keywords_and_smart_create() {
    let app = create_test_app().await;
    let router = &app.router;

    send(
        router,
        "POST",
        "/api/links",
        Some(json!({ "keyword": "github", "url": "https://github.com" })),
    )
    .await;

    let response = send(
        router,
        "POST",
        "/api/ai/suggest-keywords",
        Some(json!({ "text": "GitHub code review guide" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let suggestions: Vec<&str> = body["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(suggestions, vec!["code", "review", "guide", "code2", "code3"]);

    let response = send(router, "POST", "/api/ai/suggest-keywords", Some(json!({ "text": " " }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        router,
        "POST",
        "/api/ai/smart-create",
        Some(json!({ "url": "https://github.com/org/repo" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["keyword_available"], true);
    assert_eq!(body["suggested_link"]["keyword"], "code");
    assert_eq!(body["suggested_link"]["url"], "https://github.com/org/repo");
    assert_eq!(body["all_keyword_suggestions"][0], "github");

    // Preview only
    let links = json_body(send(router, "GET", "/api/links", None).await).await;
    assert_eq!(links.as_array().unwrap().len(), 1);
}

async fn raw_request(router: &Router, method: &str, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_malformed_json_bodies_are_bad_requests() {
    let app = create_test_app().await;
    let router = &app.router;

    let response = send(router, "POST", "/api/links", Some(json!({ "keyword": "x" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"]
        .as_str()
        .unwrap()
        .contains("url"));

    let response = raw_request(router, "POST", "/api/links", r#"{"keyword":"x","url":"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let created = send(
        router,
        "POST",
        "/api/links",
        Some(json!({ "keyword": "jira", "url": "https://jira.example.com" })),
    )
    .await;
    let id = json_body(created).await["id"].as_i64().unwrap();

    let response = send(
        router,
        "PATCH",
        &format!("/api/links/{id}"),
        Some(json!({ "is_active": "yes" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let response = raw_request(router, "POST", "/api/ai/analyze-url", "not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enhanced_create_fills_blank_fields() {
    let app = create_test_app().await;
    let router = &app.router;

    let response = send(
        router,
        "POST",
        "/api/links/enhanced",
        Some(json!({
            "keyword": "repo",
            "url": "https://github.com/org/repo",
            "title": "Main repo",
            "use_ai": true
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let link = json_body(response).await;
    assert_eq!(link["title"], "Main repo");
    assert_eq!(
        link["description"],
        "Platform for version control and collaborative software development"
    );
    assert_eq!(link["category"], "Development");

    let response = send(
        router,
        "POST",
        "/api/links/enhanced",
        Some(json!({ "keyword": "plain", "url": "https://github.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let link = json_body(response).await;
    assert!(link["title"].is_null());
    assert_eq!(link["category"], "General");

    let response = send(
        router,
        "POST",
        "/api/links/enhanced",
        Some(json!({ "keyword": "repo", "url": "https://github.com", "use_ai": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_enhanced_create_with_gateway_down() {
    let app = create_test_app_with(Arc::new(DownGateway)).await;

    let response = send(
        &app.router,
        "POST",
        "/api/links/enhanced",
        Some(json!({
            "keyword": "repo",
            "url": "https://github.com/org/repo",
            "category": "Engineering",
            "use_ai": true
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let link = json_body(response).await;
    assert_eq!(link["keyword"], "repo");
    assert!(link["title"].is_null());
    assert!(link["description"].is_null());
    assert_eq!(link["category"], "Engineering");
}

#[tokio::test]
async fn test_list_rows_carry_click_counts() {
    let app = create_test_app().await;
    let router = &app.router;

    for keyword in ["hot", "cold"] {
        send(
            router,
            "POST",
            "/api/links",
            Some(json!({ "keyword": keyword, "url": format!("https://{keyword}.example.com") })),
        )
        .await;
    }
    for _ in 0..2 {
        assert_eq!(send(router, "GET", "/go/hot", None).await.status(), StatusCode::FOUND);
    }
    app.recorder.flush().await;

    let links = json_body(send(router, "GET", "/api/links", None).await).await;
    let counts: Vec<(&str, i64)> = links
        .as_array()
        .unwrap()
        .iter()
        .map(|l| (l["keyword"].as_str().unwrap(), l["click_count"].as_i64().unwrap()))
        .collect();
    assert_eq!(counts, vec![("cold", 0), ("hot", 2)]);
}

#[tokio::test]
async fn test_performance_and_insights_endpoints() {
    let app = create_test_app().await;
    let router = &app.router;

    for keyword in ["wiki", "idle"] {
        send(
            router,
            "POST",
            "/api/links",
            Some(json!({ "keyword": keyword, "url": format!("https://{keyword}.example.com") })),
        )
        .await;
    }
    for _ in 0..3 {
        send(router, "GET", "/go/wiki", None).await;
    }
    app.recorder.flush().await;

    let response = send(router, "GET", "/api/analytics/performance", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["this_week_top"][0]["keyword"], "wiki");
    assert_eq!(body["this_week_top"][0]["clicks"], 3);
    assert_eq!(body["this_week_top"].as_array().unwrap().len(), 1);
    assert!(body["last_week_top"].as_array().unwrap().is_empty());
    assert_eq!(body["category_performance"][0]["avg_clicks_per_link"], 1.5);

    let response = send(router, "GET", "/api/analytics/insights", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["stats"]["total_clicks"], 3);
    assert_eq!(body["stats"]["unused_links"], 1);
    assert!(body["stats"]["most_popular_hour"].is_i64());
    assert!(body["insights"]
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i["type"] == "warning"));
}

#[tokio::test]
async fn test_gateway_check() {
    let app = create_test_app().await;
    let response = send(&app.router, "GET", "/api/ai/test", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["backend"], "mock");

    let app = create_test_app_with(Arc::new(DownGateway)).await;
    let response = send(&app.router, "GET", "/api/ai/test", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(json_body(response).await["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

async fn cors_allow_origin(allowed_origins: Vec<String>, origin: &str) -> Option<String> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    let config = Config {
        allowed_origins,
        ..Config::default()
    };
    let app = build_app(Arc::new(storage), Arc::new(MockSuggestionGateway::new()), &config);

    let request = Request::builder()
        .uri("/health")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    response
        .headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_origins() {
    let listed = vec!["https://intranet.example.com".to_string()];
    assert_eq!(
        cors_allow_origin(listed.clone(), "https://intranet.example.com").await.as_deref(),
        Some("https://intranet.example.com")
    );
    assert_eq!(cors_allow_origin(listed, "https://evil.example.com").await, None);

    // Nothing usable configured: any origin rather than none
    let unusable = vec!["bad\norigin".to_string()];
    assert_eq!(
        cors_allow_origin(unusable, "https://intranet.example.com").await.as_deref(),
        Some("*")
    );
}
