//! Keyword and target URL validation applied before anything reaches storage.

use thiserror::Error;
use url::Url;

pub const MAX_KEYWORD_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid keyword: {0}")]
    InvalidKeyword(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

pub fn normalize_keyword(keyword: &str) -> &str {
    keyword.trim()
}

/// Validate a keyword and return its normalized form.
///
/// Keywords are compared case-sensitively. Allowed characters are ASCII
/// letters, digits, `-`, `_` and `.`, which keeps every keyword a single
/// unambiguous path segment.
pub fn validate_keyword(keyword: &str) -> Result<String, ValidationError> {
    let keyword = normalize_keyword(keyword);

    if keyword.is_empty() {
        return Err(ValidationError::InvalidKeyword(
            "keyword cannot be empty".to_string(),
        ));
    }

    if keyword.chars().count() > MAX_KEYWORD_LENGTH {
        return Err(ValidationError::InvalidKeyword(format!(
            "keyword must be at most {MAX_KEYWORD_LENGTH} characters"
        )));
    }

    if keyword == "." || keyword == ".." {
        return Err(ValidationError::InvalidKeyword(
            "keyword cannot be a relative path segment".to_string(),
        ));
    }

    if let Some(bad) = keyword
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ValidationError::InvalidKeyword(format!(
            "keyword contains unsupported character {bad:?}; use letters, digits, '-', '_' or '.'"
        )));
    }

    Ok(keyword.to_string())
}

/// Validate a redirect target and return it trimmed but otherwise as given.
pub fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let parsed = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(raw.to_string()),
        _ => Err(ValidationError::InvalidUrl("URL must have a host".to_string())),
    }
}
