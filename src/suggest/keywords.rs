use std::collections::HashSet;

use crate::models::validate_keyword;
use crate::storage::Storage;

use super::MAX_KEYWORD_SUGGESTIONS;

const COMMON_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "a", "an", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "can", "this", "that", "these", "those", "http", "https",
    "www", "com",
];

/// Turn free text into a valid keyword: lowercase, separators become `-`,
/// unsupported characters are dropped.
pub fn sanitize_keyword(candidate: &str) -> Option<String> {
    let mut out = String::with_capacity(candidate.len());
    for c in candidate.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            out.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '/') && !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches(|c| c == '-' || c == '.');
    validate_keyword(trimmed).ok()
}

/// Distinct lowercase words of 2..=15 ASCII letters, common words removed
pub fn candidate_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
    {
        let len = word.chars().count();
        if (2..=15).contains(&len)
            && word.chars().all(|c| c.is_ascii_alphabetic())
            && !COMMON_WORDS.contains(&word.as_str())
            && !words.contains(&word)
        {
            words.push(word);
        }
    }
    words
}

/// Up to five keyword ideas from free text, skipping `taken` keywords.
/// Pads with numbered variants of the first words when the text is short.
pub fn suggest_keywords(text: &str, taken: &HashSet<String>) -> Vec<String> {
    let mut keywords: Vec<String> = candidate_words(text)
        .into_iter()
        .filter(|w| !taken.contains(w))
        .take(MAX_KEYWORD_SUGGESTIONS)
        .collect();

    if keywords.len() < MAX_KEYWORD_SUGGESTIONS {
        let bases: Vec<String> = if keywords.is_empty() {
            vec!["link".to_string()]
        } else {
            keywords.iter().take(2).cloned().collect()
        };

        'outer: for base in bases {
            for i in 2..10 {
                let variant = format!("{base}{i}");
                if !taken.contains(&variant) && !keywords.contains(&variant) {
                    keywords.push(variant);
                    if keywords.len() >= MAX_KEYWORD_SUGGESTIONS {
                        break 'outer;
                    }
                }
            }
        }
    }

    keywords
}

/// `suggest_keywords` against the keywords already stored. Only the
/// candidates that `suggest_keywords` could return are looked up.
pub async fn suggest_available_keywords(
    storage: &dyn Storage,
    text: &str,
) -> anyhow::Result<Vec<String>> {
    let mut taken = HashSet::new();
    let mut free = Vec::new();
    for word in candidate_words(text) {
        if storage.get_link_by_keyword(&word).await?.is_some() {
            taken.insert(word);
        } else {
            free.push(word);
        }
    }

    let bases = if free.is_empty() {
        vec!["link".to_string()]
    } else {
        free.into_iter().take(2).collect()
    };
    for base in bases {
        for i in 2..10 {
            let variant = format!("{base}{i}");
            if storage.get_link_by_keyword(&variant).await?.is_some() {
                taken.insert(variant);
            }
        }
    }

    Ok(suggest_keywords(text, &taken))
}

/// First candidate not yet used by any link, then `base2`..`base9` variants
/// of the first candidate. `None` when everything is taken.
pub async fn pick_available_keyword(
    storage: &dyn Storage,
    candidates: &[String],
) -> anyhow::Result<Option<String>> {
    for candidate in candidates {
        if storage.get_link_by_keyword(candidate).await?.is_none() {
            return Ok(Some(candidate.clone()));
        }
    }

    if let Some(base) = candidates.first() {
        for i in 2..10 {
            let variant = format!("{base}{i}");
            if storage.get_link_by_keyword(&variant).await?.is_none() {
                return Ok(Some(variant));
            }
        }
    }

    Ok(None)
}
