use axum::{routing::get, Router};
use std::sync::Arc;

use crate::config::{ClickConfig, RedirectMode};

use super::handlers::{redirect_keyword, RedirectState};
use super::resolver::Resolver;

pub fn create_redirect_router(
    resolver: Resolver,
    redirect_mode: RedirectMode,
    clicks: ClickConfig,
) -> Router {
    let state = Arc::new(RedirectState {
        resolver,
        redirect_mode,
        clicks,
    });

    Router::new()
        .route("/go/{keyword}", get(redirect_keyword))
        .with_state(state)
}
