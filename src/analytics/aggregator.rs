//! Read-side analytics computed on demand from links and click events.
//!
//! Counts come from querying the append-only click log rather than from
//! running counters, so concurrent redirects can never lose an update.
//! All totals cover active links only.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::models::{
    AnalyticsSnapshot, CategoryPerformance, CategoryStats, Insight, InsightKind, LinkAnalytics,
    LinkClicks, Performance, Trends, UsageInsights, UsageStats,
};
use crate::models::{Link, RecentClick};
use crate::storage::Storage;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;
const PERFORMANCE_TOP_LIMIT: i64 = 10;
pub const DEFAULT_PERIOD_DAYS: i64 = 30;
pub const MAX_PERIOD_DAYS: i64 = 365;

pub struct AnalyticsAggregator {
    storage: Arc<dyn Storage>,
}

impl AnalyticsAggregator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn total_links(&self) -> Result<i64> {
        self.storage.total_links().await
    }

    pub async fn total_clicks(&self) -> Result<i64> {
        self.storage.total_clicks().await
    }

    /// Click count for one link, optionally only clicks at or after `since`
    pub async fn count_for_link(&self, link_id: i64, since: Option<i64>) -> Result<i64> {
        self.storage.count_clicks(link_id, since).await
    }

    pub async fn top_links(&self, limit: i64) -> Result<Vec<LinkClicks>> {
        self.storage.top_links(limit.max(0)).await
    }

    /// Attach lifetime click counts to a page of links, keeping its order
    pub async fn with_click_counts(&self, links: Vec<Link>) -> Result<Vec<LinkClicks>> {
        let ids: Vec<i64> = links.iter().map(|link| link.id).collect();
        let counts: HashMap<i64, i64> = self.storage.click_counts(&ids).await?.into_iter().collect();

        Ok(links
            .into_iter()
            .map(|link| {
                let click_count = counts.get(&link.id).copied().unwrap_or(0);
                LinkClicks { link, click_count }
            })
            .collect())
    }

    pub async fn category_breakdown(&self) -> Result<Vec<CategoryStats>> {
        self.storage.category_breakdown().await
    }

    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<RecentClick>> {
        self.storage.recent_clicks(limit.max(0)).await
    }

    /// Overview read from a single consistent snapshot
    pub async fn stats(&self, top_limit: i64, recent_limit: i64) -> Result<AnalyticsSnapshot> {
        self.storage
            .analytics_snapshot(top_limit.max(0), recent_limit.max(0))
            .await
    }

    /// Total clicks plus a per-day series for the last `days` days
    pub async fn link_analytics(&self, link: &Link, days: i64) -> Result<LinkAnalytics> {
        let days = days.clamp(1, MAX_PERIOD_DAYS);
        let since = period_start(chrono::Utc::now().timestamp(), days);

        let total_clicks = self.storage.count_clicks(link.id, None).await?;
        let clicks_over_time = self.storage.daily_clicks(Some(link.id), since).await?;

        Ok(LinkAnalytics {
            keyword: link.keyword.clone(),
            total_clicks,
            created_at: link.created_at,
            period_days: days,
            clicks_over_time,
        })
    }

    /// Daily totals for the period and the hourly breakdown of the current UTC day
    pub async fn trends(&self, days: i64) -> Result<Trends> {
        let days = days.clamp(1, MAX_PERIOD_DAYS);
        let now = chrono::Utc::now().timestamp();

        let daily_trends = self
            .storage
            .daily_clicks(None, period_start(now, days))
            .await?;
        let hourly_trends = self.storage.hourly_clicks(period_start(now, 1)).await?;
        let total_period_clicks = daily_trends.iter().map(|d| d.clicks).sum();

        Ok(Trends {
            period_days: days,
            daily_trends,
            hourly_trends,
            total_period_clicks,
        })
    }

    /// Top links over the last seven days against the seven days before,
    /// plus per-category averages
    pub async fn performance(&self) -> Result<Performance> {
        let now = chrono::Utc::now().timestamp();
        let week_ago = now - SECONDS_PER_WEEK;

        let this_week_top = self
            .storage
            .top_links_between(week_ago, i64::MAX, PERFORMANCE_TOP_LIMIT)
            .await?;
        let last_week_top = self
            .storage
            .top_links_between(week_ago - SECONDS_PER_WEEK, week_ago, PERFORMANCE_TOP_LIMIT)
            .await?;

        let category_performance = self
            .storage
            .category_breakdown()
            .await?
            .into_iter()
            .map(|c| CategoryPerformance {
                avg_clicks_per_link: ratio(c.click_count, c.link_count),
                category: c.category,
                total_links: c.link_count,
                total_clicks: c.click_count,
            })
            .collect();

        Ok(Performance {
            this_week_top,
            last_week_top,
            category_performance,
        })
    }

    /// Usage summary over active links with plain-language observations
    pub async fn insights(&self) -> Result<UsageInsights> {
        let total_links = self.storage.total_links().await?;
        let total_clicks = self.storage.total_clicks().await?;
        let unused_links = self.storage.unused_links().await?;

        // Earliest day wins a tie, as does the earliest hour
        let most_active_day = self
            .storage
            .daily_clicks(None, 0)
            .await?
            .into_iter()
            .fold(None, |best: Option<(i64, i64)>, d| match best {
                Some((_, clicks)) if clicks >= d.clicks => best,
                _ => Some((d.day, d.clicks)),
            })
            .map(|(day, _)| day);
        let most_popular_hour = self
            .storage
            .hourly_clicks(0)
            .await?
            .into_iter()
            .fold(None, |best: Option<(i64, i64)>, h| match best {
                Some((_, clicks)) if clicks >= h.clicks => best,
                _ => Some((h.hour, h.clicks)),
            })
            .map(|(hour, _)| hour);

        let stats = UsageStats {
            total_links,
            total_clicks,
            avg_clicks_per_link: ratio(total_clicks, total_links),
            unused_links,
            most_active_day,
            most_popular_hour,
        };

        Ok(UsageInsights {
            insights: describe_usage(&stats),
            stats,
        })
    }
}

fn ratio(clicks: i64, links: i64) -> f64 {
    if links > 0 {
        clicks as f64 / links as f64
    } else {
        0.0
    }
}

fn describe_usage(stats: &UsageStats) -> Vec<Insight> {
    let mut insights = Vec::new();

    if stats.total_clicks > 0 {
        if stats.avg_clicks_per_link > 5.0 {
            insights.push(Insight {
                kind: InsightKind::Positive,
                title: "Great Engagement".to_string(),
                message: format!(
                    "Links average {:.1} clicks each.",
                    stats.avg_clicks_per_link
                ),
            });
        } else if stats.avg_clicks_per_link < 1.0 {
            insights.push(Insight {
                kind: InsightKind::Suggestion,
                title: "Boost Usage".to_string(),
                message: "Consider sharing go-links in team channels or documentation."
                    .to_string(),
            });
        }
    }

    if stats.unused_links > 0 {
        insights.push(Insight {
            kind: InsightKind::Warning,
            title: "Unused Links".to_string(),
            message: format!(
                "{} active links have never been clicked. Consider retiring or promoting them.",
                stats.unused_links
            ),
        });
    }

    if let Some(hour) = stats.most_popular_hour {
        let (title, message) = if (9..=17).contains(&hour) {
            ("Peak Usage", format!("Most clicks happen at {hour}:00 UTC, during work hours."))
        } else {
            ("After Hours Activity", format!("Most clicks happen at {hour}:00 UTC, outside work hours."))
        };
        insights.push(Insight {
            kind: InsightKind::Info,
            title: title.to_string(),
            message,
        });
    }

    insights
}

/// Midnight UTC starting a window of `days` days that ends today
fn period_start(now: i64, days: i64) -> i64 {
    let today = now - now.rem_euclid(SECONDS_PER_DAY);
    today - (days - 1) * SECONDS_PER_DAY
}
