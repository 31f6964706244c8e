use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Suggestion, SuggestionError, SuggestionGateway};
use crate::config::OpenAiConfig;

const SYSTEM_PROMPT: &str = "You help employees create short internal go-links. \
Given a URL, answer with a JSON object with the fields: \
\"title\" (short human readable title), \
\"description\" (one sentence), \
\"category\" (one of Development, Productivity, Communication, HR, Marketing, Finance, General), \
\"keywords\" (array of up to 5 short lowercase keywords using only letters, digits, '-', '_' or '.').";

/// Chat-completions client for any OpenAI-compatible endpoint
pub struct OpenAiSuggestionGateway {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelAnswer {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    keywords: Vec<String>,
}

impl OpenAiSuggestionGateway {
    pub fn new(config: &OpenAiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("smartlinks/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client for suggestion backend")?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl SuggestionGateway for OpenAiSuggestionGateway {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn suggest(&self, url: &str) -> Result<Suggestion, SuggestionError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("URL: {url}") },
            ],
        });

        let completion = self.chat(&body).await?;
        debug!(model = %self.model, "Received suggestion completion");
        parse_completion(completion)
    }

    async fn check(&self) -> Result<String, SuggestionError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 10,
            "messages": [{ "role": "user", "content": "Reply with the word: ready" }],
        });

        let completion = self.chat(&body).await?;
        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(format!("{} answered: {}", self.model, reply.trim()))
    }
}

impl OpenAiSuggestionGateway {
    async fn chat(&self, body: &serde_json::Value) -> Result<ChatCompletion, SuggestionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SuggestionError::Unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestionError::Unavailable(format!(
                "backend responded with {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SuggestionError::Unavailable(format!("malformed response: {e}")))
    }
}

fn parse_completion(completion: ChatCompletion) -> Result<Suggestion, SuggestionError> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| SuggestionError::Unavailable("empty completion".to_string()))?;

    parse_answer(&content)
}

/// Models sometimes wrap JSON in a markdown fence
fn parse_answer(content: &str) -> Result<Suggestion, SuggestionError> {
    let trimmed = content.trim();
    let json_text = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    let answer: ModelAnswer = serde_json::from_str(json_text.trim())
        .map_err(|e| SuggestionError::Unavailable(format!("completion is not valid JSON: {e}")))?;

    Ok(Suggestion {
        keyword: answer.keywords.first().cloned(),
        keywords: answer.keywords,
        title: answer.title,
        description: answer.description,
        category: answer.category,
    })
}
