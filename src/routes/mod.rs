mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::auth::require_auth;
use crate::handlers::{index, send_sms};
use crate::state::AppState;
use axum::{middleware, routing::get, routing::post, Router};

/// `GET /` serves the app shell only to callers with a verified bearer token.
pub fn index_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

pub fn sms_routes() -> Router<AppState> {
    Router::new().route("/send-sms", post(send_sms))
}
