use crate::analytics::models::{
    AnalyticsSnapshot, CategoryStats, DailyClicks, HourlyClicks, LinkClicks, PeriodClicks,
};
use crate::models::{ClickEvent, ClickMetadata, Link, LinkChanges, LinkFilter, NewLink, RecentClick};
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Upper bound on how long a cached miss is served
pub const MISS_TTL_SECS: u64 = 5;

/// Found links live for the configured TTL, misses for at most `MISS_TTL_SECS`
struct KeywordExpiry {
    hit_ttl: Duration,
    miss_ttl: Duration,
}

impl KeywordExpiry {
    fn ttl_for(&self, value: &Option<Link>) -> Option<Duration> {
        match value {
            Some(_) => Some(self.hit_ttl),
            None => Some(self.miss_ttl),
        }
    }
}

impl Expiry<String, Option<Link>> for KeywordExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Option<Link>,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.ttl_for(value)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Option<Link>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.ttl_for(value)
    }
}

/// Storage wrapper that caches keyword lookups on the redirect path.
///
/// Writers store the post-write link (or evict) while holding the write
/// generation lock and bump the generation. A reader that missed only fills
/// the cache when no write finished while it was querying, so a lookup that
/// raced a write can never leave the pre-write row behind.
///
/// Writes made by another process (the admin CLI) bypass this cache and are
/// seen once the entry expires: the configured TTL for found links and
/// `MISS_TTL_SECS` for misses.
pub struct CachedStorage {
    /// Underlying storage implementation
    inner: Arc<dyn Storage>,
    /// Keyword -> link (or known absence)
    read_cache: Cache<String, Option<Link>>,
    /// Bumped after every write that can change a keyword's resolution
    generation: Mutex<u64>,
}

impl CachedStorage {
    pub fn new(inner: Arc<dyn Storage>, max_cache_entries: u64, ttl_secs: u64) -> Self {
        let hit_ttl = Duration::from_secs(ttl_secs);
        let read_cache = Cache::builder()
            .max_capacity(max_cache_entries)
            .expire_after(KeywordExpiry {
                hit_ttl,
                miss_ttl: hit_ttl.min(Duration::from_secs(MISS_TTL_SECS)),
            })
            .build();

        Self {
            inner,
            read_cache,
            generation: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Storage for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn create_link(&self, link: &NewLink) -> StorageResult<Link> {
        let created = self.inner.create_link(link).await?;

        let mut generation = self.generation.lock().await;
        *generation += 1;
        // Replaces a cached miss for the same keyword
        self.read_cache
            .insert(created.keyword.clone(), Some(created.clone()))
            .await;

        Ok(created)
    }

    async fn get_link(&self, id: i64) -> Result<Option<Link>> {
        self.inner.get_link(id).await
    }

    async fn get_link_by_keyword(&self, keyword: &str) -> Result<Option<Link>> {
        if let Some(cached) = self.read_cache.get(keyword).await {
            return Ok(cached);
        }

        let observed = *self.generation.lock().await;
        let result = self.inner.get_link_by_keyword(keyword).await?;

        let generation = self.generation.lock().await;
        if *generation == observed {
            self.read_cache
                .insert(keyword.to_string(), result.clone())
                .await;
        }

        Ok(result)
    }

    async fn list_links(&self, filter: &LinkFilter, limit: i64, offset: i64) -> Result<Vec<Link>> {
        self.inner.list_links(filter, limit, offset).await
    }

    async fn update_link(&self, id: i64, changes: &LinkChanges) -> StorageResult<Link> {
        let previous = self.inner.get_link(id).await?;

        let result = self.inner.update_link(id, changes).await;

        let mut generation = self.generation.lock().await;
        *generation += 1;
        if let Some(previous) = &previous {
            self.read_cache.invalidate(&previous.keyword).await;
        }
        match &result {
            Ok(updated) => {
                self.read_cache
                    .insert(updated.keyword.clone(), Some(updated.clone()))
                    .await;
            }
            Err(_) => {
                if let Some(keyword) = &changes.keyword {
                    self.read_cache.invalidate(keyword).await;
                }
            }
        }

        result
    }

    async fn insert_click(
        &self,
        link_id: i64,
        metadata: &ClickMetadata,
        clicked_at: i64,
    ) -> StorageResult<ClickEvent> {
        self.inner.insert_click(link_id, metadata, clicked_at).await
    }

    async fn count_clicks(&self, link_id: i64, since: Option<i64>) -> Result<i64> {
        self.inner.count_clicks(link_id, since).await
    }

    async fn click_counts(&self, link_ids: &[i64]) -> Result<Vec<(i64, i64)>> {
        self.inner.click_counts(link_ids).await
    }

    async fn recent_clicks(&self, limit: i64) -> Result<Vec<RecentClick>> {
        self.inner.recent_clicks(limit).await
    }

    async fn total_links(&self) -> Result<i64> {
        self.inner.total_links().await
    }

    async fn total_clicks(&self) -> Result<i64> {
        self.inner.total_clicks().await
    }

    async fn top_links(&self, limit: i64) -> Result<Vec<LinkClicks>> {
        self.inner.top_links(limit).await
    }

    async fn top_links_between(
        &self,
        since: i64,
        until: i64,
        limit: i64,
    ) -> Result<Vec<PeriodClicks>> {
        self.inner.top_links_between(since, until, limit).await
    }

    async fn category_breakdown(&self) -> Result<Vec<CategoryStats>> {
        self.inner.category_breakdown().await
    }

    async fn unused_links(&self) -> Result<i64> {
        self.inner.unused_links().await
    }

    async fn daily_clicks(&self, link_id: Option<i64>, since: i64) -> Result<Vec<DailyClicks>> {
        self.inner.daily_clicks(link_id, since).await
    }

    async fn hourly_clicks(&self, since: i64) -> Result<Vec<HourlyClicks>> {
        self.inner.hourly_clicks(since).await
    }

    async fn analytics_snapshot(
        &self,
        top_limit: i64,
        recent_limit: i64,
    ) -> Result<AnalyticsSnapshot> {
        self.inner.analytics_snapshot(top_limit, recent_limit).await
    }
}
