//! Full application router: gated index, CRUD, SMS relay, health, static assets.

use crate::routes::{common_routes, entity_routes, index_routes, sms_routes};
use crate::state::AppState;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Unmatched paths are served from the static directory without authentication.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.static_dir.as_path());
    Router::new()
        .merge(index_routes(&state))
        .merge(common_routes())
        .merge(entity_routes(&state))
        .merge(sms_routes())
        .fallback_service(static_files)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
