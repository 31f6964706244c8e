//! Link metadata suggestions for a target URL.
//!
//! A `SuggestionGateway` is best-effort: it may be unavailable or return any
//! subset of fields. `suggest_with_fallback` turns whatever it produced into a
//! complete suggestion using deterministic defaults derived from the URL, so
//! link creation behaves the same whichever backend is configured.

pub mod keywords;
pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::{SuggestionBackend, SuggestionConfig};
use crate::models::DEFAULT_CATEGORY;

pub use keywords::{
    candidate_words, pick_available_keyword, sanitize_keyword, suggest_available_keywords,
    suggest_keywords,
};
pub use mock::MockSuggestionGateway;
pub use openai::OpenAiSuggestionGateway;

pub const MAX_KEYWORD_SUGGESTIONS: usize = 5;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("suggestion service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub keyword: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[async_trait]
pub trait SuggestionGateway: Send + Sync {
    /// Short backend identifier reported to API clients
    fn name(&self) -> &'static str;

    async fn suggest(&self, url: &str) -> Result<Suggestion, SuggestionError>;

    /// Confirm the backend answers, returning a short status line
    async fn check(&self) -> Result<String, SuggestionError> {
        self.suggest("https://example.com").await?;
        Ok(format!("{} backend answered", self.name()))
    }
}

/// Outcome of asking a gateway, after defaults were applied
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionOutcome {
    /// False when the gateway failed and only defaults were used
    pub success: bool,
    pub source: &'static str,
    #[serde(flatten)]
    pub suggestion: Suggestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Construct the gateway selected by configuration
pub fn build_gateway(config: &SuggestionConfig) -> anyhow::Result<Arc<dyn SuggestionGateway>> {
    match config.backend {
        SuggestionBackend::Mock => {
            info!("Using mock suggestion backend");
            Ok(Arc::new(MockSuggestionGateway::new()))
        }
        SuggestionBackend::Openai => {
            let openai = config.openai.as_ref().ok_or_else(|| {
                anyhow::anyhow!("OpenAI settings are required for the openai suggestion backend")
            })?;
            info!(model = %openai.model, "Using OpenAI suggestion backend");
            Ok(Arc::new(OpenAiSuggestionGateway::new(openai)?))
        }
    }
}

/// Ask the gateway and complete the answer with URL-derived defaults.
/// Never fails: an unavailable gateway yields the defaults alone.
pub async fn suggest_with_fallback(gateway: &dyn SuggestionGateway, url: &str) -> SuggestionOutcome {
    match gateway.suggest(url).await {
        Ok(suggestion) => SuggestionOutcome {
            success: true,
            source: gateway.name(),
            suggestion: complete(suggestion, url),
            error: None,
        },
        Err(e) => {
            warn!(backend = gateway.name(), error = %e, "Suggestion gateway failed, using defaults");
            SuggestionOutcome {
                success: false,
                source: "fallback",
                suggestion: complete(Suggestion::default(), url),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Fill missing fields deterministically and normalize keyword candidates
fn complete(suggestion: Suggestion, url: &str) -> Suggestion {
    let mut keywords: Vec<String> = Vec::new();
    for candidate in suggestion.keyword.iter().chain(suggestion.keywords.iter()) {
        if let Some(k) = sanitize_keyword(candidate) {
            if !keywords.contains(&k) {
                keywords.push(k);
            }
        }
    }
    if keywords.is_empty() {
        keywords.extend(keyword_from_url(url));
    }
    keywords.truncate(MAX_KEYWORD_SUGGESTIONS);

    let host = host_of(url);
    let title = non_blank(suggestion.title)
        .or_else(|| host.as_deref().map(mock::title_from_domain));
    let description = non_blank(suggestion.description)
        .or_else(|| host.as_deref().map(|h| format!("Link to {h}")));
    let category = non_blank(suggestion.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Suggestion {
        keyword: keywords.first().cloned(),
        keywords,
        title,
        description,
        category: Some(category),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Host without a leading `www.`
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then(|| host.to_lowercase())
}

/// Deterministic keyword candidate: first host label, else first path segment
pub fn keyword_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;

    let from_host = host_of(url)
        .and_then(|host| host.split('.').next().map(str::to_string))
        .filter(|label| label.parse::<u8>().is_err())
        .and_then(|label| sanitize_keyword(&label));

    from_host.or_else(|| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .and_then(sanitize_keyword)
    })
}
