//! Offline suggestion backend.
//!
//! Answers are derived only from the URL text, so the same URL always yields
//! the same suggestion and no network access is needed.

use async_trait::async_trait;
use url::Url;

use super::keywords::candidate_words;
use super::{host_of, Suggestion, SuggestionError, SuggestionGateway, MAX_KEYWORD_SUGGESTIONS};
use crate::models::DEFAULT_CATEGORY;

struct KnownDomain {
    domain: &'static str,
    title: &'static str,
    description: &'static str,
    category: &'static str,
    keywords: &'static [&'static str],
}

const KNOWN_DOMAINS: &[KnownDomain] = &[
    KnownDomain {
        domain: "github.com",
        title: "GitHub - Code Repository Platform",
        description: "Platform for version control and collaborative software development",
        category: "Development",
        keywords: &["github", "code", "repo", "git", "dev-tools"],
    },
    KnownDomain {
        domain: "docs.google.com",
        title: "Google Docs - Document Collaboration",
        description: "Create and edit documents online with real-time collaboration",
        category: "Productivity",
        keywords: &["docs", "google-docs", "document", "collaborate", "write"],
    },
    KnownDomain {
        domain: "drive.google.com",
        title: "Google Drive - Cloud Storage",
        description: "Store, sync, and share files across all your devices",
        category: "Productivity",
        keywords: &["drive", "storage", "files", "cloud", "sync"],
    },
    KnownDomain {
        domain: "calendar.google.com",
        title: "Google Calendar - Schedule Management",
        description: "Organize your schedule and share events with others",
        category: "Productivity",
        keywords: &["calendar", "schedule", "meeting", "event", "plan"],
    },
    KnownDomain {
        domain: "slack.com",
        title: "Slack - Team Communication",
        description: "Messaging platform for teams and workplace collaboration",
        category: "Communication",
        keywords: &["slack", "chat", "team", "message", "communicate"],
    },
    KnownDomain {
        domain: "zoom.us",
        title: "Zoom - Video Conferencing",
        description: "Video meetings and webinars for remote collaboration",
        category: "Communication",
        keywords: &["zoom", "video", "meeting", "call", "conference"],
    },
    KnownDomain {
        domain: "notion.so",
        title: "Notion - All-in-One Workspace",
        description: "Notes, docs, tasks, and databases in one collaborative workspace",
        category: "Productivity",
        keywords: &["notion", "notes", "workspace", "organize", "docs"],
    },
    KnownDomain {
        domain: "figma.com",
        title: "Figma - Design Platform",
        description: "Collaborative interface design and prototyping tool",
        category: "Development",
        keywords: &["figma", "design", "ui", "prototype", "collaborate"],
    },
    KnownDomain {
        domain: "trello.com",
        title: "Trello - Project Management",
        description: "Organize projects with boards, lists, and cards",
        category: "Productivity",
        keywords: &["trello", "project", "board", "organize", "task"],
    },
    KnownDomain {
        domain: "linkedin.com",
        title: "LinkedIn - Professional Network",
        description: "Professional networking and career development platform",
        category: "HR",
        keywords: &["linkedin", "network", "career", "professional", "jobs"],
    },
];

/// Category -> indicative substrings; the first category with the highest
/// hit count wins
const CATEGORY_HINTS: &[(&str, &[&str])] = &[
    ("Development", &["code", "dev", "git", "api", "programming", "software", "tech"]),
    ("Productivity", &["doc", "file", "note", "organize", "plan", "manage", "tool"]),
    ("Communication", &["chat", "message", "mail", "talk", "meet", "call", "social"]),
    ("HR", &["hire", "job", "career", "employee", "work", "recruit", "people"]),
    ("Marketing", &["market", "campaign", "brand", "promo", "ads", "analytics", "social"]),
    ("Finance", &["money", "pay", "bank", "finance", "budget", "invoice", "expense"]),
];

#[derive(Debug, Default, Clone)]
pub struct MockSuggestionGateway;

impl MockSuggestionGateway {
    pub fn new() -> Self {
        Self
    }

    fn analyze(&self, url: &Url, host: &str) -> Suggestion {
        if let Some(known) = KNOWN_DOMAINS.iter().find(|d| d.domain == host) {
            return Suggestion {
                keyword: known.keywords.first().map(|k| k.to_string()),
                keywords: known.keywords.iter().map(|k| k.to_string()).collect(),
                title: Some(known.title.to_string()),
                description: Some(known.description.to_string()),
                category: Some(known.category.to_string()),
            };
        }

        let title = title_from_domain(host);
        let keywords = generate_keywords(url, host, &title);

        Suggestion {
            keyword: keywords.first().cloned(),
            keywords,
            title: Some(title),
            description: Some(format!("Web resource hosted on {host}")),
            category: Some(predict_category(url.as_str())),
        }
    }
}

#[async_trait]
impl SuggestionGateway for MockSuggestionGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn suggest(&self, url: &str) -> Result<Suggestion, SuggestionError> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| SuggestionError::Unavailable(format!("cannot analyze URL: {e}")))?;
        let host = host_of(url)
            .ok_or_else(|| SuggestionError::Unavailable("URL has no host".to_string()))?;

        Ok(self.analyze(&parsed, &host))
    }
}

/// "my-app.example.com" -> "My App - Web Application"
pub fn title_from_domain(host: &str) -> String {
    let base = host.split('.').next().unwrap_or(host);

    let mut title = base
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let suffix = if host.contains("app") {
        " - Web Application"
    } else if host.contains("docs") {
        " - Documentation"
    } else if host.contains("api") {
        " - API Service"
    } else if host.contains("blog") {
        " - Blog"
    } else {
        " - Website"
    };
    title.push_str(suffix);
    title
}

fn predict_category(text: &str) -> String {
    let text = text.to_lowercase();

    let mut best: Option<(&str, usize)> = None;
    for (category, hints) in CATEGORY_HINTS {
        let score: usize = hints.iter().map(|hint| text.matches(hint).count()).sum();
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((category, score));
        }
    }

    best.map(|(category, _)| category.to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

fn generate_keywords(url: &Url, host: &str, title: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    let base = host.split('.').next().unwrap_or_default().to_lowercase();
    if base.len() >= 2 && base.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        keywords.push(base.clone());
    }

    let path_text = url.path().replace('/', " ");
    for word in candidate_words(title)
        .into_iter()
        .filter(|w| w.len() <= 12 && w != "website")
        .chain(candidate_words(&path_text).into_iter().filter(|w| w.len() <= 12))
    {
        if keywords.len() >= MAX_KEYWORD_SUGGESTIONS {
            break;
        }
        if !keywords.contains(&word) {
            keywords.push(word);
        }
    }

    let stem = if base.is_empty() { "link".to_string() } else { base };
    while keywords.len() < 3 {
        keywords.push(format!("{stem}{}", keywords.len()));
    }

    keywords
}
