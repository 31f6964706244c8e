use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::analytics::AnalyticsAggregator;
use crate::links::LinkService;
use crate::storage::Storage;
use crate::suggest::SuggestionGateway;

use super::analytics::{
    get_insights, get_keyword_analytics, get_performance, get_stats, get_trends,
};
use super::handlers::{
    activate_link, create_enhanced_link, create_link, deactivate_link, get_link,
    get_link_by_keyword, health_check, list_links, update_link, AppState,
};
use super::suggest::{analyze_url, check_gateway, smart_create, suggest_keywords};

pub fn create_api_router(
    storage: Arc<dyn Storage>,
    suggestions: Arc<dyn SuggestionGateway>,
) -> Router {
    let state = Arc::new(AppState {
        links: LinkService::new(Arc::clone(&storage)),
        analytics: AnalyticsAggregator::new(storage),
        suggestions,
    });

    let link_routes = Router::new()
        .route("/links", post(create_link).get(list_links))
        .route("/links/enhanced", post(create_enhanced_link))
        .route(
            "/links/{id}",
            get(get_link)
                .patch(update_link)
                .put(update_link)
                .delete(deactivate_link),
        )
        .route("/links/{id}/deactivate", post(deactivate_link))
        .route("/links/{id}/activate", post(activate_link))
        .route("/keywords/{keyword}", get(get_link_by_keyword))
        .route("/keywords/{keyword}/analytics", get(get_keyword_analytics));

    let analytics_routes = Router::new()
        .route("/analytics/stats", get(get_stats))
        .route("/analytics/trends", get(get_trends))
        .route("/analytics/performance", get(get_performance))
        .route("/analytics/insights", get(get_insights));

    let suggestion_routes = Router::new()
        .route("/ai/analyze-url", post(analyze_url))
        .route("/ai/suggest-keywords", post(suggest_keywords))
        .route("/ai/smart-create", post(smart_create))
        .route("/ai/test", get(check_gateway));

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api",
            link_routes.merge(analytics_routes).merge(suggestion_routes),
        )
        .with_state(state)
}
