use crate::analytics::models::{
    AnalyticsSnapshot, CategoryStats, DailyClicks, HourlyClicks, LinkClicks, PeriodClicks,
};
use crate::models::{ClickEvent, ClickMetadata, Link, LinkChanges, LinkFilter, NewLink, RecentClick};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("keyword '{0}' already exists")]
    DuplicateKeyword(String),
    #[error("link not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Other(err.into())
    }
}

/// Returns true when the error was raised by a UNIQUE constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// `%term%` for a LIKE with `ESCAPE '\'`, matching `%` and `_` literally
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a link. Keyword uniqueness is enforced by the database, so two
    /// concurrent creates for the same keyword cannot both succeed.
    async fn create_link(&self, link: &NewLink) -> StorageResult<Link>;

    async fn get_link(&self, id: i64) -> Result<Option<Link>>;

    /// Exact, case-sensitive lookup regardless of `is_active`
    async fn get_link_by_keyword(&self, keyword: &str) -> Result<Option<Link>>;

    /// List links newest first (ties broken by id)
    async fn list_links(&self, filter: &LinkFilter, limit: i64, offset: i64) -> Result<Vec<Link>>;

    /// Apply a partial update and refresh `updated_at`
    async fn update_link(&self, id: i64, changes: &LinkChanges) -> StorageResult<Link>;

    /// Append one click event. Fails with `NotFound` when the link row is gone.
    async fn insert_click(
        &self,
        link_id: i64,
        metadata: &ClickMetadata,
        clicked_at: i64,
    ) -> StorageResult<ClickEvent>;

    /// Clicks for one link, optionally only those at or after `since`
    async fn count_clicks(&self, link_id: i64, since: Option<i64>) -> Result<i64>;

    /// `(link_id, clicks)` for the given links. Links without clicks are omitted.
    async fn click_counts(&self, link_ids: &[i64]) -> Result<Vec<(i64, i64)>>;

    /// Most recent clicks on active links, newest first
    async fn recent_clicks(&self, limit: i64) -> Result<Vec<RecentClick>>;

    /// Number of active links
    async fn total_links(&self) -> Result<i64>;

    /// Number of clicks on active links
    async fn total_clicks(&self) -> Result<i64>;

    /// Active links by click count descending, oldest first on ties
    async fn top_links(&self, limit: i64) -> Result<Vec<LinkClicks>>;

    /// Active links ranked by clicks in `[since, until)`. Links with no
    /// clicks in the window are left out.
    async fn top_links_between(&self, since: i64, until: i64, limit: i64)
        -> Result<Vec<PeriodClicks>>;

    async fn category_breakdown(&self) -> Result<Vec<CategoryStats>>;

    /// Active links that have never been clicked
    async fn unused_links(&self) -> Result<i64>;

    /// Clicks per UTC day since `since`, optionally for a single link
    async fn daily_clicks(&self, link_id: Option<i64>, since: i64) -> Result<Vec<DailyClicks>>;

    /// Clicks per hour of day since `since`
    async fn hourly_clicks(&self, since: i64) -> Result<Vec<HourlyClicks>>;

    /// Totals, top links, recent clicks and categories read in one transaction
    async fn analytics_snapshot(&self, top_limit: i64, recent_limit: i64)
        -> Result<AnalyticsSnapshot>;
}
