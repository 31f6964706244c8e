use crate::analytics::models::{
    AnalyticsSnapshot, CategoryStats, DailyClicks, HourlyClicks, LinkClicks, PeriodClicks,
};
use crate::models::{ClickEvent, ClickMetadata, Link, LinkChanges, LinkFilter, NewLink, RecentClick};
use crate::storage::trait_def::{is_unique_violation, like_pattern, now_secs};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{SqliteExecutor, SqlitePool};
use std::sync::Arc;

const LINK_COLUMNS: &str = "id, keyword, url, title, description, category, created_by, created_at, updated_at, is_active";

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

async fn fetch_total_links<'e, E: SqliteExecutor<'e>>(executor: E) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE is_active = 1")
        .fetch_one(executor)
        .await
}

async fn fetch_total_clicks<'e, E: SqliteExecutor<'e>>(executor: E) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM clicks c
        JOIN links l ON l.id = c.link_id
        WHERE l.is_active = 1
        "#,
    )
    .fetch_one(executor)
    .await
}

async fn fetch_top_links<'e, E: SqliteExecutor<'e>>(
    executor: E,
    limit: i64,
) -> sqlx::Result<Vec<LinkClicks>> {
    sqlx::query_as::<_, LinkClicks>(
        r#"
        SELECT l.id, l.keyword, l.url, l.title, l.description, l.category, l.created_by,
               l.created_at, l.updated_at, l.is_active, COUNT(c.id) AS click_count
        FROM links l
        LEFT JOIN clicks c ON c.link_id = l.id
        WHERE l.is_active = 1
        GROUP BY l.id
        ORDER BY click_count DESC, l.created_at ASC, l.id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await
}

async fn fetch_recent_clicks<'e, E: SqliteExecutor<'e>>(
    executor: E,
    limit: i64,
) -> sqlx::Result<Vec<RecentClick>> {
    sqlx::query_as::<_, RecentClick>(
        r#"
        SELECT c.id, c.link_id, l.keyword, l.title, c.clicked_at, c.ip_address
        FROM clicks c
        JOIN links l ON l.id = c.link_id
        WHERE l.is_active = 1
        ORDER BY c.clicked_at DESC, c.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await
}

async fn fetch_category_breakdown<'e, E: SqliteExecutor<'e>>(
    executor: E,
) -> sqlx::Result<Vec<CategoryStats>> {
    sqlx::query_as::<_, CategoryStats>(
        r#"
        SELECT l.category AS category,
               COUNT(DISTINCT l.id) AS link_count,
               COUNT(c.id) AS click_count
        FROM links l
        LEFT JOIN clicks c ON c.link_id = l.id
        WHERE l.is_active = 1
        GROUP BY l.category
        ORDER BY click_count DESC, l.category ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                keyword TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                title TEXT,
                description TEXT,
                category TEXT NOT NULL DEFAULT 'General',
                created_by TEXT NOT NULL DEFAULT 'anonymous',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                link_id INTEGER NOT NULL REFERENCES links(id),
                clicked_at INTEGER NOT NULL,
                ip_address TEXT,
                user_agent TEXT,
                referrer TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_links_category ON links(category)",
            "CREATE INDEX IF NOT EXISTS idx_links_created_at ON links(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_clicks_link_id ON clicks(link_id)",
            "CREATE INDEX IF NOT EXISTS idx_clicks_clicked_at ON clicks(clicked_at)",
        ] {
            sqlx::query(statement).execute(self.pool.as_ref()).await?;
        }

        Ok(())
    }

    async fn create_link(&self, link: &NewLink) -> StorageResult<Link> {
        let now = now_secs();

        let result = sqlx::query(
            r#"
            INSERT INTO links (keyword, url, title, description, category, created_by, created_at, updated_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(keyword) DO NOTHING
            "#,
        )
        .bind(&link.keyword)
        .bind(&link.url)
        .bind(&link.title)
        .bind(&link.description)
        .bind(&link.category)
        .bind(&link.created_by)
        .bind(now)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::DuplicateKeyword(link.keyword.clone()));
        }

        let created = self
            .get_link(result.last_insert_rowid())
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(created)
    }

    async fn get_link(&self, id: i64) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn get_link_by_keyword(&self, keyword: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE keyword = ?"
        ))
        .bind(keyword)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn list_links(&self, filter: &LinkFilter, limit: i64, offset: i64) -> Result<Vec<Link>> {
        let search = filter.search.as_deref().map(like_pattern);

        let links = sqlx::query_as::<_, Link>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR is_active = ?2)
              AND (?3 IS NULL
                   OR keyword LIKE ?3 ESCAPE '\'
                   OR title LIKE ?3 ESCAPE '\'
                   OR description LIKE ?3 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            LIMIT ?4 OFFSET ?5
            "#
        ))
        .bind(&filter.category)
        .bind(filter.is_active)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn update_link(&self, id: i64, changes: &LinkChanges) -> StorageResult<Link> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET keyword = COALESCE(?1, keyword),
                url = COALESCE(?2, url),
                title = NULLIF(COALESCE(?3, title), ''),
                description = NULLIF(COALESCE(?4, description), ''),
                category = COALESCE(?5, category),
                is_active = COALESCE(?6, is_active),
                updated_at = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&changes.keyword)
        .bind(&changes.url)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.category)
        .bind(changes.is_active)
        .bind(now_secs())
        .bind(id)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::DuplicateKeyword(changes.keyword.clone().unwrap_or_default())
            } else {
                StorageError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_link(id).await?.ok_or(StorageError::NotFound)
    }

    async fn insert_click(
        &self,
        link_id: i64,
        metadata: &ClickMetadata,
        clicked_at: i64,
    ) -> StorageResult<ClickEvent> {
        let result = sqlx::query(
            r#"
            INSERT INTO clicks (link_id, clicked_at, ip_address, user_agent, referrer)
            SELECT id, ?, ?, ?, ? FROM links WHERE id = ?
            "#,
        )
        .bind(clicked_at)
        .bind(&metadata.ip_address)
        .bind(&metadata.user_agent)
        .bind(&metadata.referrer)
        .bind(link_id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(ClickEvent {
            id: result.last_insert_rowid(),
            link_id,
            clicked_at,
            ip_address: metadata.ip_address.clone(),
            user_agent: metadata.user_agent.clone(),
            referrer: metadata.referrer.clone(),
        })
    }

    async fn count_clicks(&self, link_id: i64, since: Option<i64>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM clicks
            WHERE link_id = ?1 AND (?2 IS NULL OR clicked_at >= ?2)
            "#,
        )
        .bind(link_id)
        .bind(since)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn click_counts(&self, link_ids: &[i64]) -> Result<Vec<(i64, i64)>> {
        if link_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT link_id, COUNT(*)
            FROM clicks
            WHERE link_id IN (SELECT value FROM json_each(?))
            GROUP BY link_id
            "#,
        )
        .bind(serde_json::to_string(link_ids)?)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn recent_clicks(&self, limit: i64) -> Result<Vec<RecentClick>> {
        Ok(fetch_recent_clicks(self.pool.as_ref(), limit).await?)
    }

    async fn total_links(&self) -> Result<i64> {
        Ok(fetch_total_links(self.pool.as_ref()).await?)
    }

    async fn total_clicks(&self) -> Result<i64> {
        Ok(fetch_total_clicks(self.pool.as_ref()).await?)
    }

    async fn top_links(&self, limit: i64) -> Result<Vec<LinkClicks>> {
        Ok(fetch_top_links(self.pool.as_ref(), limit).await?)
    }

    async fn top_links_between(
        &self,
        since: i64,
        until: i64,
        limit: i64,
    ) -> Result<Vec<PeriodClicks>> {
        let rows = sqlx::query_as::<_, PeriodClicks>(
            r#"
            SELECT l.keyword, l.title, COUNT(c.id) AS clicks
            FROM links l
            JOIN clicks c ON c.link_id = l.id
            WHERE l.is_active = 1 AND c.clicked_at >= ?1 AND c.clicked_at < ?2
            GROUP BY l.id
            ORDER BY clicks DESC, l.created_at ASC, l.id ASC
            LIMIT ?3
            "#,
        )
        .bind(since)
        .bind(until)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn category_breakdown(&self) -> Result<Vec<CategoryStats>> {
        Ok(fetch_category_breakdown(self.pool.as_ref()).await?)
    }

    async fn unused_links(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM links l
            WHERE l.is_active = 1
              AND NOT EXISTS (SELECT 1 FROM clicks c WHERE c.link_id = l.id)
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn daily_clicks(&self, link_id: Option<i64>, since: i64) -> Result<Vec<DailyClicks>> {
        let rows = sqlx::query_as::<_, DailyClicks>(
            r#"
            SELECT (c.clicked_at / 86400) * 86400 AS day,
                   COUNT(*) AS clicks,
                   COUNT(DISTINCT c.link_id) AS unique_links
            FROM clicks c
            JOIN links l ON l.id = c.link_id
            WHERE c.clicked_at >= ?1
              AND ((?2 IS NULL AND l.is_active = 1) OR c.link_id = ?2)
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(since)
        .bind(link_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn hourly_clicks(&self, since: i64) -> Result<Vec<HourlyClicks>> {
        let rows = sqlx::query_as::<_, HourlyClicks>(
            r#"
            SELECT (c.clicked_at % 86400) / 3600 AS hour, COUNT(*) AS clicks
            FROM clicks c
            JOIN links l ON l.id = c.link_id
            WHERE c.clicked_at >= ? AND l.is_active = 1
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn analytics_snapshot(
        &self,
        top_limit: i64,
        recent_limit: i64,
    ) -> Result<AnalyticsSnapshot> {
        let mut tx = self.pool.begin().await?;

        let total_links = fetch_total_links(&mut *tx).await?;
        let total_clicks = fetch_total_clicks(&mut *tx).await?;
        let top_links = fetch_top_links(&mut *tx, top_limit).await?;
        let recent_clicks = fetch_recent_clicks(&mut *tx, recent_limit).await?;
        let categories = fetch_category_breakdown(&mut *tx).await?;

        tx.commit().await?;

        Ok(AnalyticsSnapshot {
            total_links,
            total_clicks,
            top_links,
            recent_clicks,
            categories,
        })
    }
}
