use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::analytics::{AnalyticsAggregator, LinkClicks};
use crate::links::{LinkError, LinkService, DEFAULT_LIST_LIMIT};
use crate::models::{CreateLinkRequest, Link, LinkFilter, UpdateLinkRequest};
use crate::suggest::SuggestionGateway;

pub struct AppState {
    pub links: LinkService,
    pub analytics: AnalyticsAggregator,
    pub suggestions: Arc<dyn SuggestionGateway>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// JSON body extractor whose rejections are 400 `{"error": ..}` responses
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(api_error(StatusCode::BAD_REQUEST, rejection.body_text())),
        }
    }
}

impl From<LinkError> for ErrorResponse {
    fn from(err: LinkError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Map a link error onto its HTTP status; storage details stay in the log
pub fn link_error(err: LinkError) -> ApiError {
    match err {
        LinkError::InvalidInput(_) => (StatusCode::BAD_REQUEST, Json(err.into())),
        LinkError::DuplicateKeyword(_) => (StatusCode::CONFLICT, Json(err.into())),
        LinkError::NotFound => (StatusCode::NOT_FOUND, Json(err.into())),
        LinkError::Storage(e) => {
            error!(error = %e, "Storage failure");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    /// Defaults to active links only
    pub is_active: Option<bool>,
    /// Include active and inactive links, overriding `is_active`
    #[serde(default)]
    pub all: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

/// Create a new link
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateLinkRequest>,
) -> Result<(StatusCode, Json<Link>), ApiError> {
    let link = state.links.create(payload).await.map_err(link_error)?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[derive(Debug, Deserialize)]
pub struct EnhancedCreateRequest {
    #[serde(flatten)]
    pub link: CreateLinkRequest,
    /// Fill blank title, description and category from the suggestion gateway
    #[serde(default)]
    pub use_ai: bool,
}

/// Create a link, optionally pre-filled by the suggestion gateway
pub async fn create_enhanced_link(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<EnhancedCreateRequest>,
) -> Result<(StatusCode, Json<Link>), ApiError> {
    let link = if payload.use_ai {
        state
            .links
            .create_with_suggestions(payload.link, state.suggestions.as_ref())
            .await
    } else {
        state.links.create(payload.link).await
    }
    .map_err(link_error)?;

    Ok((StatusCode::CREATED, Json(link)))
}

/// List links newest first, each with its click count
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LinkClicks>>, ApiError> {
    let filter = LinkFilter {
        category: query.category,
        is_active: if query.all {
            None
        } else {
            Some(query.is_active.unwrap_or(true))
        },
        search: query.search,
    };

    let links = state
        .links
        .list(&filter, query.limit, query.offset)
        .await
        .map_err(link_error)?;

    let links = state
        .analytics
        .with_click_counts(links)
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(links))
}

pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Link>, ApiError> {
    let link = state.links.get(id).await.map_err(link_error)?;
    Ok(Json(link))
}

/// Look up a link by keyword, active or not, with its click count
pub async fn get_link_by_keyword(
    State(state): State<Arc<AppState>>,
    Path(keyword): Path<String>,
) -> Result<Json<LinkClicks>, ApiError> {
    let link = state
        .links
        .get_by_keyword(&keyword)
        .await
        .map_err(link_error)?;

    let click_count = state
        .analytics
        .count_for_link(link.id, None)
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(LinkClicks { link, click_count }))
}

/// Partially update a link; absent fields are left unchanged
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateLinkRequest>,
) -> Result<Json<Link>, ApiError> {
    let link = state.links.update(id, payload).await.map_err(link_error)?;
    Ok(Json(link))
}

pub async fn deactivate_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Link>, ApiError> {
    let link = state.links.deactivate(id).await.map_err(link_error)?;
    Ok(Json(link))
}

pub async fn activate_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Link>, ApiError> {
    let link = state.links.activate(id).await.map_err(link_error)?;
    Ok(Json(link))
}

/// Health check endpoint; 503 when the store cannot be queried
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    #[derive(Serialize)]
    struct HealthResponse {
        status: &'static str,
        database: &'static str,
        total_links: i64,
        timestamp: i64,
    }

    match state.analytics.total_links().await {
        Ok(total_links) => Json(HealthResponse {
            status: "healthy",
            database: "connected",
            total_links,
            timestamp: chrono::Utc::now().timestamp(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unhealthy", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
