//! Suggestion API handlers.
//!
//! Gateway failures never fail these requests: the response carries the
//! URL-derived defaults with `success: false` instead.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::handlers::{api_error, link_error, ApiError, ApiJson, AppState};
use crate::models::validate_url;
use crate::suggest::{
    pick_available_keyword, suggest_available_keywords, suggest_with_fallback, SuggestionOutcome,
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestKeywordsRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestKeywordsResponse {
    pub suggestions: Vec<String>,
    pub text_analyzed: String,
}

#[derive(Debug, Serialize)]
pub struct GatewayCheckResponse {
    pub success: bool,
    pub backend: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestedLink {
    pub keyword: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SmartCreateResponse {
    pub ai_analysis: SuggestionOutcome,
    pub suggested_link: SuggestedLink,
    pub all_keyword_suggestions: Vec<String>,
    pub keyword_available: bool,
}

/// Connectivity check for the suggestion backend; 503 when it cannot answer
pub async fn check_gateway(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GatewayCheckResponse>, ApiError> {
    let gateway = state.suggestions.as_ref();
    match gateway.check().await {
        Ok(message) => Ok(Json(GatewayCheckResponse {
            success: true,
            backend: gateway.name(),
            message,
        })),
        Err(e) => {
            warn!(backend = gateway.name(), error = %e, "Suggestion backend check failed");
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

fn require_url(raw: &str) -> Result<String, ApiError> {
    if raw.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "URL is required"));
    }
    validate_url(raw).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Suggest title, description, category and keywords for a URL
pub async fn analyze_url(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<AnalyzeUrlRequest>,
) -> Result<Json<SuggestionOutcome>, ApiError> {
    let url = require_url(&payload.url)?;
    let outcome = suggest_with_fallback(state.suggestions.as_ref(), &url).await;
    Ok(Json(outcome))
}

/// Keyword ideas from free text that do not collide with stored keywords
pub async fn suggest_keywords(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SuggestKeywordsRequest>,
) -> Result<Json<SuggestKeywordsResponse>, ApiError> {
    let text = payload.text.trim().to_string();
    if text.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Text is required"));
    }

    let suggestions = suggest_available_keywords(state.links.storage().as_ref(), &text)
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(SuggestKeywordsResponse {
        suggestions,
        text_analyzed: text,
    }))
}

/// Preview of a link for a URL. Nothing is persisted.
pub async fn smart_create(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<AnalyzeUrlRequest>,
) -> Result<Json<SmartCreateResponse>, ApiError> {
    let url = require_url(&payload.url)?;
    let outcome = suggest_with_fallback(state.suggestions.as_ref(), &url).await;

    let candidates = outcome.suggestion.keywords.clone();
    let keyword = pick_available_keyword(state.links.storage().as_ref(), &candidates)
        .await
        .map_err(|e| link_error(e.into()))?;

    let suggested_link = SuggestedLink {
        keyword: keyword.clone(),
        url,
        title: outcome.suggestion.title.clone(),
        description: outcome.suggestion.description.clone(),
        category: outcome.suggestion.category.clone(),
    };

    Ok(Json(SmartCreateResponse {
        ai_analysis: outcome,
        suggested_link,
        all_keyword_suggestions: candidates,
        keyword_available: keyword.is_some(),
    }))
}
