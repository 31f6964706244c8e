use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Request details captured best-effort when a keyword resolves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Click joined with the keyword of the link it belongs to, for activity feeds
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecentClick {
    pub id: i64,
    pub link_id: i64,
    pub keyword: String,
    pub title: Option<String>,
    pub clicked_at: i64,
    pub ip_address: Option<String>,
}
