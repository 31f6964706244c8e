use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_CREATOR: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Link {
    pub id: i64,
    pub keyword: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_active: bool,
}

/// A validated link ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub keyword: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub created_by: String,
}

/// Validated partial update. `None` leaves a column untouched; for `title`
/// and `description` an empty string clears the column.
#[derive(Debug, Clone, Default)]
pub struct LinkChanges {
    pub keyword: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl LinkChanges {
    pub fn is_empty(&self) -> bool {
        self.keyword.is_none()
            && self.url.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkFilter {
    pub category: Option<String>,
    pub is_active: Option<bool>,
    /// Substring match over keyword, title and description
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkRequest {
    pub keyword: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLinkRequest {
    pub keyword: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}
