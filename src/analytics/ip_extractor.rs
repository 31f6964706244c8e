//! Client IP extraction from HTTP headers
//!
//! Which headers are believed depends on `TrustedProxyMode`:
//! - `Cloudflare` reads `CF-Connecting-IP`
//! - `Standard` reads `Forwarded`, then `X-Forwarded-For`, then `X-Real-IP`
//! - `None` only uses the socket address

use axum::http::HeaderMap;
use std::net::IpAddr;

use crate::config::{ClickConfig, TrustedProxyMode};

/// Extract the client IP address, falling back to the socket address.
/// Returns `None` only when no source yields an address.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_ip: Option<IpAddr>,
    config: &ClickConfig,
) -> Option<IpAddr> {
    let from_headers = match config.trusted_proxy_mode {
        TrustedProxyMode::Cloudflare => header_ip(headers, "cf-connecting-ip"),
        TrustedProxyMode::Standard => extract_from_forwarded(headers)
            .or_else(|| extract_from_x_forwarded_for(headers, config.num_trusted_proxies))
            .or_else(|| header_ip(headers, "x-real-ip")),
        TrustedProxyMode::None => None,
    };

    from_headers.or(socket_ip)
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Parse the first `for=` parameter of an RFC 7239 Forwarded header
fn extract_from_forwarded(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers.get("forwarded")?.to_str().ok()?;

    for element in forwarded.split(',') {
        for param in element.split(';') {
            let param = param.trim();
            let Some(value) = param
                .strip_prefix("for=")
                .or_else(|| param.strip_prefix("For="))
            else {
                continue;
            };

            let value = value.trim_matches('"');
            // IPv6 is bracketed, optionally followed by a port
            let candidate = if let Some(rest) = value.strip_prefix('[') {
                rest.split(']').next().unwrap_or(rest)
            } else {
                value.split(':').next().unwrap_or(value)
            };

            if let Ok(ip) = candidate.parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    None
}

/// Parse X-Forwarded-For. With a trusted hop count, skip that many entries
/// from the right; otherwise take the leftmost address.
fn extract_from_x_forwarded_for(
    headers: &HeaderMap,
    num_trusted_proxies: Option<usize>,
) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;

    let ips: Vec<IpAddr> = xff
        .split(',')
        .filter_map(|s| s.trim().parse::<IpAddr>().ok())
        .collect();

    match num_trusted_proxies {
        Some(trusted) if ips.len() > trusted => Some(ips[ips.len() - trusted - 1]),
        _ => ips.first().copied(),
    }
}
