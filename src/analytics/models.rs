//! Data models for analytics

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{Link, RecentClick};

/// A link together with the number of clicks it has received
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LinkClicks {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub link: Link,
    pub click_count: i64,
}

/// Per-category totals over active links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CategoryStats {
    pub category: String,
    pub link_count: i64,
    pub click_count: i64,
}

/// Clicks for one UTC day. `day` is the Unix timestamp of midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyClicks {
    pub day: i64,
    pub clicks: i64,
    pub unique_links: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HourlyClicks {
    pub hour: i64,
    pub clicks: i64,
}

/// Overview computed from a single consistent read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub total_links: i64,
    pub total_clicks: i64,
    pub top_links: Vec<LinkClicks>,
    pub recent_clicks: Vec<RecentClick>,
    pub categories: Vec<CategoryStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkAnalytics {
    pub keyword: String,
    pub total_clicks: i64,
    pub created_at: i64,
    pub period_days: i64,
    pub clicks_over_time: Vec<DailyClicks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trends {
    pub period_days: i64,
    pub daily_trends: Vec<DailyClicks>,
    pub hourly_trends: Vec<HourlyClicks>,
    pub total_period_clicks: i64,
}

/// Clicks a link received inside a time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PeriodClicks {
    pub keyword: String,
    pub title: Option<String>,
    pub clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub total_links: i64,
    pub total_clicks: i64,
    pub avg_clicks_per_link: f64,
}

/// Rolling week-over-week comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performance {
    pub this_week_top: Vec<PeriodClicks>,
    pub last_week_top: Vec<PeriodClicks>,
    pub category_performance: Vec<CategoryPerformance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Suggestion,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_links: i64,
    pub total_clicks: i64,
    pub avg_clicks_per_link: f64,
    /// Active links that were never clicked
    pub unused_links: i64,
    /// Midnight (UTC) of the day with the most clicks
    pub most_active_day: Option<i64>,
    /// UTC hour of day with the most clicks
    pub most_popular_hour: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageInsights {
    pub insights: Vec<Insight>,
    pub stats: UsageStats,
}
