//! Analytics API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::handlers::{link_error, ApiError, AppState};
use crate::analytics::aggregator::{DEFAULT_PERIOD_DAYS, MAX_PERIOD_DAYS};
use crate::analytics::models::{LinkAnalytics, Performance, Trends, UsageInsights};
use crate::analytics::AnalyticsSnapshot;

#[derive(Debug, Deserialize)]
pub struct StatsQueryParams {
    /// Number of top links (default: 10, max: 100)
    #[serde(default = "default_top")]
    pub top: i64,

    /// Number of recent clicks (default: 10, max: 100)
    #[serde(default = "default_recent")]
    pub recent: i64,
}

fn default_top() -> i64 {
    10
}

fn default_recent() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct PeriodQueryParams {
    /// Days to cover, ending today (default: 30, max: 365)
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    DEFAULT_PERIOD_DAYS
}

/// Totals, top links, recent clicks and per-category breakdown
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQueryParams>,
) -> Result<Json<AnalyticsSnapshot>, ApiError> {
    let snapshot = state
        .analytics
        .stats(params.top.clamp(1, 100), params.recent.clamp(1, 100))
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(snapshot))
}

pub async fn get_trends(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PeriodQueryParams>,
) -> Result<Json<Trends>, ApiError> {
    let trends = state
        .analytics
        .trends(params.days.clamp(1, MAX_PERIOD_DAYS))
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(trends))
}

/// Clicks over time for one keyword
pub async fn get_keyword_analytics(
    State(state): State<Arc<AppState>>,
    Path(keyword): Path<String>,
    Query(params): Query<PeriodQueryParams>,
) -> Result<Json<LinkAnalytics>, ApiError> {
    let link = state
        .links
        .get_by_keyword(&keyword)
        .await
        .map_err(link_error)?;

    let analytics = state
        .analytics
        .link_analytics(&link, params.days)
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(analytics))
}

/// This week's top links against last week's, and per-category averages
pub async fn get_performance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Performance>, ApiError> {
    let performance = state
        .analytics
        .performance()
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(performance))
}

pub async fn get_insights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsageInsights>, ApiError> {
    let insights = state
        .analytics
        .insights()
        .await
        .map_err(|e| link_error(e.into()))?;

    Ok(Json(insights))
}
