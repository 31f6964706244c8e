//! Link lifecycle: validation in front of the storage layer.
//!
//! Links are never removed; deactivation is the only way to retire a keyword
//! from resolution, which keeps every click pointing at an existing link.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::models::{
    validate_keyword, validate_url, CreateLinkRequest, Link, LinkChanges, LinkFilter, NewLink,
    UpdateLinkRequest, ValidationError, DEFAULT_CATEGORY, DEFAULT_CREATOR,
};
use crate::storage::{Storage, StorageError};
use crate::suggest::{suggest_with_fallback, SuggestionGateway};

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error("keyword '{0}' already exists")]
    DuplicateKeyword(String),
    #[error("link not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<StorageError> for LinkError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateKeyword(keyword) => LinkError::DuplicateKeyword(keyword),
            StorageError::NotFound => LinkError::NotFound,
            StorageError::Other(e) => LinkError::Storage(e),
        }
    }
}

pub type LinkResult<T> = Result<T, LinkError>;

/// Trim optional free text, treating blank values as absent
fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct LinkService {
    storage: Arc<dyn Storage>,
}

impl LinkService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub async fn create(&self, request: CreateLinkRequest) -> LinkResult<Link> {
        let keyword = validate_keyword(&request.keyword)?;
        let url = validate_url(&request.url)?;

        let new_link = NewLink {
            keyword,
            url,
            title: clean_text(request.title),
            description: clean_text(request.description),
            category: clean_text(request.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            created_by: clean_text(request.created_by)
                .unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
        };

        let link = self.storage.create_link(&new_link).await?;
        info!(link_id = link.id, keyword = %link.keyword, "Created link");

        Ok(link)
    }

    /// Create a link after filling a blank title, description or category
    /// from the suggestion gateway. Fields the caller supplied are kept, and
    /// a gateway failure leaves the request as it was.
    pub async fn create_with_suggestions(
        &self,
        mut request: CreateLinkRequest,
        gateway: &dyn SuggestionGateway,
    ) -> LinkResult<Link> {
        validate_keyword(&request.keyword)?;
        let url = validate_url(&request.url)?;

        let outcome = suggest_with_fallback(gateway, &url).await;
        if outcome.success {
            let suggestion = outcome.suggestion;
            request.title = clean_text(request.title).or(suggestion.title);
            request.description = clean_text(request.description).or(suggestion.description);
            request.category = clean_text(request.category).or(suggestion.category);
        }

        self.create(request).await
    }

    pub async fn get(&self, id: i64) -> LinkResult<Link> {
        self.storage.get_link(id).await?.ok_or(LinkError::NotFound)
    }

    /// Exact lookup of a trimmed keyword, active or not
    pub async fn get_by_keyword(&self, keyword: &str) -> LinkResult<Link> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(LinkError::NotFound);
        }

        self.storage
            .get_link_by_keyword(keyword)
            .await?
            .ok_or(LinkError::NotFound)
    }

    pub async fn list(&self, filter: &LinkFilter, limit: i64, offset: i64) -> LinkResult<Vec<Link>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let offset = offset.max(0);

        let filter = LinkFilter {
            category: clean_text(filter.category.clone()),
            is_active: filter.is_active,
            search: clean_text(filter.search.clone()),
        };

        Ok(self.storage.list_links(&filter, limit, offset).await?)
    }

    pub async fn update(&self, id: i64, request: UpdateLinkRequest) -> LinkResult<Link> {
        let changes = LinkChanges {
            keyword: request.keyword.as_deref().map(validate_keyword).transpose()?,
            url: request.url.as_deref().map(validate_url).transpose()?,
            title: request.title.map(|v| v.trim().to_string()),
            description: request.description.map(|v| v.trim().to_string()),
            category: clean_text(request.category),
            is_active: request.is_active,
        };

        if changes.is_empty() {
            return self.get(id).await;
        }

        let link = self.storage.update_link(id, &changes).await?;
        info!(link_id = link.id, keyword = %link.keyword, "Updated link");

        Ok(link)
    }

    pub async fn deactivate(&self, id: i64) -> LinkResult<Link> {
        self.set_active(id, false).await
    }

    pub async fn activate(&self, id: i64) -> LinkResult<Link> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: i64, is_active: bool) -> LinkResult<Link> {
        let changes = LinkChanges {
            is_active: Some(is_active),
            ..Default::default()
        };

        let link = self.storage.update_link(id, &changes).await?;
        info!(link_id = link.id, keyword = %link.keyword, is_active, "Changed link state");

        Ok(link)
    }

    /// Insert the starter links, skipping keywords that already exist.
    /// Returns the links that were created.
    pub async fn seed_samples(&self) -> LinkResult<Vec<Link>> {
        let samples = [
            ("github", "https://github.com", "GitHub", "Code repository platform", "Development"),
            ("docs", "https://docs.google.com", "Google Docs", "Document creation and collaboration", "Productivity"),
            ("slack", "https://slack.com", "Slack", "Team communication platform", "Communication"),
        ];

        let mut created = Vec::new();
        for (keyword, url, title, description, category) in samples {
            let request = CreateLinkRequest {
                keyword: keyword.to_string(),
                url: url.to_string(),
                title: Some(title.to_string()),
                description: Some(description.to_string()),
                category: Some(category.to_string()),
                created_by: None,
            };

            match self.create(request).await {
                Ok(link) => created.push(link),
                Err(LinkError::DuplicateKeyword(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(created)
    }
}
