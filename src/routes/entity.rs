//! Entity CRUD routes built from the resolved model.
//! Each exposed entity gets concrete `/{segment}` and `/{segment}/:id` routes carrying its own state,
//! so unknown single-segment paths fall through to the static file server.

use crate::config::{Operation, ResolvedEntity};
use crate::handlers::entity::{create, delete, list, read, update, EntityState};
use crate::state::AppState;
use axum::{routing::MethodRouter, Router};
use std::sync::Arc;

fn collection_methods(entity: &ResolvedEntity) -> Option<MethodRouter<EntityState>> {
    let mut m: MethodRouter<EntityState> = MethodRouter::new();
    let mut any = false;
    if entity.allows(Operation::List) {
        m = m.get(list);
        any = true;
    }
    if entity.allows(Operation::Create) {
        m = m.post(create);
        any = true;
    }
    any.then_some(m)
}

fn item_methods(entity: &ResolvedEntity) -> Option<MethodRouter<EntityState>> {
    let mut m: MethodRouter<EntityState> = MethodRouter::new();
    let mut any = false;
    if entity.allows(Operation::Read) {
        m = m.get(read);
        any = true;
    }
    if entity.allows(Operation::Update) {
        m = m.put(update).patch(update);
        any = true;
    }
    if entity.allows(Operation::Delete) {
        m = m.delete(delete);
        any = true;
    }
    any.then_some(m)
}

/// Router for one exposed entity, or None when it allows no operations.
fn routes_for(state: &AppState, segment: &str, entity: &ResolvedEntity) -> Option<Router<AppState>> {
    let mut router = Router::new();
    let mut any = false;
    if let Some(m) = collection_methods(entity) {
        router = router.route(&format!("/{}", segment), m);
        any = true;
    }
    if let Some(m) = item_methods(entity) {
        router = router.route(&format!("/{}/:id", segment), m);
        any = true;
    }
    if !any {
        return None;
    }
    tracing::debug!(path = %segment, table = %entity.table_name, "mounting entity routes");
    Some(router.with_state(EntityState {
        pool: state.pool.clone(),
        entity: Arc::new(entity.clone()),
    }))
}

pub fn entity_routes(state: &AppState) -> Router<AppState> {
    let mut segments: Vec<_> = state.model.entity_by_path.iter().collect();
    segments.sort_by(|a, b| a.0.cmp(b.0));
    segments
        .into_iter()
        .filter_map(|(segment, entity)| routes_for(state, segment, entity))
        .fold(Router::new(), |acc, r| acc.merge(r))
}
