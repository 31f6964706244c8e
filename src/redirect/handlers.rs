use axum::{
    extract::{ConnectInfo, Path, State},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Extensions, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::error;

use super::resolver::{Resolution, Resolver};
use crate::analytics::extract_client_ip;
use crate::api::ErrorResponse;
use crate::config::{ClickConfig, RedirectMode};
use crate::models::ClickMetadata;

pub struct RedirectState {
    pub resolver: Resolver,
    pub redirect_mode: RedirectMode,
    pub clicks: ClickConfig,
}

/// Redirect a keyword to its target URL
pub async fn redirect_keyword(
    State(state): State<Arc<RedirectState>>,
    Path(keyword): Path<String>,
    headers: HeaderMap,
    extensions: Extensions,
) -> Response {
    // Absent when the router is not served with connect info
    let socket_ip = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let metadata = ClickMetadata {
        ip_address: extract_client_ip(&headers, socket_ip, &state.clicks).map(|ip| ip.to_string()),
        user_agent: header_text(&headers, header::USER_AGENT),
        referrer: header_text(&headers, header::REFERER),
    };

    match state.resolver.resolve(&keyword, metadata).await {
        Ok(Resolution::Redirect { url, .. }) => redirect_response(state.redirect_mode, &url),
        Ok(Resolution::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No active link for keyword '{}'", keyword.trim()),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(keyword = %keyword, error = %e, "Failed to resolve keyword");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to resolve keyword".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn redirect_response(mode: RedirectMode, url: &str) -> Response {
    // Stored URLs are validated on write; re-serializing through `Url`
    // percent-encodes anything a header value cannot carry
    let location = HeaderValue::from_str(url).or_else(|_| {
        url::Url::parse(url)
            .map_err(anyhow::Error::from)
            .and_then(|parsed| HeaderValue::from_str(parsed.as_str()).map_err(anyhow::Error::from))
    });

    match location {
        Ok(location) => (mode.status_code(), [(header::LOCATION, location)]).into_response(),
        Err(e) => {
            error!(url, error = %e, "Stored URL cannot be used as a Location header");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Stored URL is not redirectable".to_string(),
                }),
            )
                .into_response()
        }
    }
}
