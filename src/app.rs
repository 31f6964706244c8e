//! Assembles the HTTP application from its components.

use axum::{http::HeaderValue, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::analytics::ClickRecorder;
use crate::api::create_api_router;
use crate::config::Config;
use crate::redirect::{create_redirect_router, Resolver};
use crate::storage::{CachedStorage, Storage};
use crate::suggest::SuggestionGateway;

pub struct App {
    pub router: Router,
    /// Flushed in tests, shut down by the server after the listener stops
    pub recorder: Arc<ClickRecorder>,
    /// Cached view of the store shared by every route
    pub storage: Arc<dyn Storage>,
}

/// Build the redirect and API routes over one cached store and one recorder.
/// Must be called inside a Tokio runtime.
pub fn build_app(
    storage: Arc<dyn Storage>,
    suggestions: Arc<dyn SuggestionGateway>,
    config: &Config,
) -> App {
    let storage: Arc<dyn Storage> = Arc::new(CachedStorage::new(
        storage,
        config.cache.max_entries,
        config.cache.ttl_secs,
    ));

    let recorder = Arc::new(ClickRecorder::new(
        Arc::clone(&storage),
        config.clicks.buffer_size,
    ));
    let resolver = Resolver::new(Arc::clone(&storage), Arc::clone(&recorder));

    let router = Router::new()
        .merge(create_redirect_router(
            resolver,
            config.redirect_status,
            config.clicks.clone(),
        ))
        .merge(create_api_router(Arc::clone(&storage), suggestions))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.allowed_origins)),
        );

    App {
        router,
        recorder,
        storage,
    }
}

/// Any origin when none are configured, otherwise only the listed ones
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    if origins.is_empty() {
        warn!("No usable CORS origin configured, allowing any origin");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
