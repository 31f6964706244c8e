use anyhow::Context;
use axum::http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub clicks: ClickConfig,
    pub suggestion: SuggestionConfig,
    pub redirect_status: RedirectMode,
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickConfig {
    /// Capacity of the pending click queue; clicks beyond it are dropped
    pub buffer_size: usize,
    pub trusted_proxy_mode: TrustedProxyMode,
    /// Number of trusted proxies in front of the service (X-Forwarded-For hops to skip)
    pub num_trusted_proxies: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    /// Use only the socket address
    None,
    /// Forwarded / X-Forwarded-For / X-Real-IP
    Standard,
    /// CF-Connecting-IP
    Cloudflare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionConfig {
    pub backend: SuggestionBackend,
    pub openai: Option<OpenAiConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionBackend {
    Mock,
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// HTTP status used for `/go/{keyword}` redirects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RedirectMode {
    /// 302 Found
    #[default]
    Found,
    /// 307 Temporary Redirect
    Temporary,
}

impl RedirectMode {
    pub fn status_code(self) -> StatusCode {
        match self {
            RedirectMode::Found => StatusCode::FOUND,
            RedirectMode::Temporary => StatusCode::TEMPORARY_REDIRECT,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            url: "sqlite://./smartlinks.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl_secs: 60,
        }
    }
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            buffer_size: 10_000,
            trusted_proxy_mode: TrustedProxyMode::Standard,
            num_trusted_proxies: None,
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            backend: SuggestionBackend::Mock,
            openai: None,
        }
    }
}

impl OpenAiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
}

fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend = match std::env::var("DATABASE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DatabaseConfig::default().url);
        let max_connections =
            parse_env("DATABASE_MAX_CONNECTIONS", DatabaseConfig::default().max_connections)?;

        let server_defaults = ServerConfig::default();
        let host = std::env::var("HOST").unwrap_or(server_defaults.host);
        let port = parse_env("PORT", server_defaults.port)?;

        let redirect_status = match std::env::var("REDIRECT_STATUS").ok().as_deref() {
            None | Some("302") => RedirectMode::Found,
            Some("307") => RedirectMode::Temporary,
            Some(other) => {
                tracing::warn!(
                    "Unknown REDIRECT_STATUS '{other}', falling back to 302. Supported values: 302, 307"
                );
                RedirectMode::Found
            }
        };

        let allowed_origins = match std::env::var("ALLOWED_ORIGINS") {
            Ok(raw) => parse_allowed_origins(&raw)?,
            Err(_) => Vec::new(),
        };

        let cache = CacheConfig {
            max_entries: parse_env("CACHE_MAX_ENTRIES", CacheConfig::default().max_entries)?,
            ttl_secs: parse_env("CACHE_TTL_SECS", CacheConfig::default().ttl_secs)?,
        };

        let trusted_proxy_mode = match std::env::var("TRUSTED_PROXY_MODE")
            .unwrap_or_else(|_| "standard".to_string())
            .to_lowercase()
            .as_str()
        {
            "none" => TrustedProxyMode::None,
            "standard" => TrustedProxyMode::Standard,
            "cloudflare" => TrustedProxyMode::Cloudflare,
            other => {
                tracing::warn!(
                    "Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'standard'. Supported values: none, standard, cloudflare"
                );
                TrustedProxyMode::Standard
            }
        };

        let num_trusted_proxies = match std::env::var("NUM_TRUSTED_PROXIES") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .with_context(|| format!("NUM_TRUSTED_PROXIES has an invalid value '{raw}'"))?,
            ),
            Err(_) => None,
        };

        let clicks = ClickConfig {
            buffer_size: parse_env("CLICK_BUFFER_SIZE", ClickConfig::default().buffer_size)?,
            trusted_proxy_mode,
            num_trusted_proxies,
        };

        let suggestion_backend = match std::env::var("SUGGESTION_BACKEND")
            .unwrap_or_else(|_| "mock".to_string())
            .to_lowercase()
            .as_str()
        {
            "mock" => SuggestionBackend::Mock,
            "openai" => SuggestionBackend::Openai,
            other => {
                tracing::warn!(
                    "Unknown SUGGESTION_BACKEND '{other}', falling back to 'mock'. Supported values: mock, openai"
                );
                SuggestionBackend::Mock
            }
        };

        let openai = if matches!(suggestion_backend, SuggestionBackend::Openai) {
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set when SUGGESTION_BACKEND=openai")?;
            let base_url = std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| OpenAiConfig::DEFAULT_BASE_URL.to_string());
            let model = std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| OpenAiConfig::DEFAULT_MODEL.to_string());
            let timeout_secs =
                parse_env("SUGGESTION_TIMEOUT_SECS", OpenAiConfig::DEFAULT_TIMEOUT_SECS)?;

            Some(OpenAiConfig {
                api_key,
                base_url,
                model,
                timeout_secs,
            })
        } else {
            None
        };

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            cache,
            clicks,
            suggestion: SuggestionConfig {
                backend: suggestion_backend,
                openai,
            },
            redirect_status,
            allowed_origins,
        })
    }
}

/// Comma-separated origins. `*` or an empty list allows any origin; an
/// entry that cannot be sent as a header value is an error.
pub fn parse_allowed_origins(raw: &str) -> anyhow::Result<Vec<String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map(|_| origin.to_string())
                .with_context(|| format!("ALLOWED_ORIGINS has an invalid origin '{origin}'"))
        })
        .collect()
}
