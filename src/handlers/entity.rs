//! Entity CRUD handlers: list, create, read, update, delete.
//! Each exposed entity gets its own router whose state carries the entity metadata.

use crate::case::object_keys_to_snake_case;
use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::response;
use crate::service::{CrudService, RequestValidator, DEFAULT_LIMIT};
use crate::sql::{ListQuery, SortKey};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct EntityState {
    pub pool: PgPool,
    pub entity: Arc<ResolvedEntity>,
}

fn parse_id(id_str: &str) -> Result<Value, AppError> {
    let n: i32 = id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))?;
    Ok(Value::Number(n.into()))
}

/// JSON object body with camelCase keys -> map keyed by database column names.
fn body_to_columns(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(object_keys_to_snake_case(m)),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn parse_count(name: &str, raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", name)))
}

/// Comma-separated API field names, `-` prefix for descending. Only whitelisted fields are accepted.
pub fn parse_sort(entity: &ResolvedEntity, raw: &str) -> Result<Vec<SortKey>, AppError> {
    let mut keys = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (descending, field) = match part.strip_prefix('-') {
            Some(f) => (true, f),
            None => (false, part),
        };
        if !entity.sortable.contains(field) {
            return Err(AppError::BadRequest(format!("sorting not allowed on '{}'", field)));
        }
        let column = entity
            .column_by_api_name(field)
            .ok_or_else(|| AppError::BadRequest(format!("unknown sort field '{}'", field)))?;
        keys.push(SortKey {
            column: column.name.clone(),
            descending,
        });
    }
    Ok(keys)
}

/// Query string -> list query: sort, limit/count, offset, `q` free-text search,
/// and exact-match filters on entity fields. Anything else is ignored.
pub fn parse_list_query(entity: &ResolvedEntity, params: HashMap<String, String>) -> Result<ListQuery, AppError> {
    let mut list = ListQuery {
        limit: DEFAULT_LIMIT,
        ..Default::default()
    };
    for (k, v) in params {
        if k == entity.sort_param {
            list.sort = parse_sort(entity, &v)?;
            continue;
        }
        match k.as_str() {
            "limit" | "count" => list.limit = parse_count(&k, &v)?,
            "offset" => list.offset = parse_count(&k, &v)?,
            "q" => list.search = Some(v).filter(|t| !t.trim().is_empty()),
            _ => {
                if let Some(c) = entity.column_by_api_name(&k) {
                    list.filters.push((c.name.clone(), Value::String(v)));
                }
            }
        }
    }
    list.filters.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(list)
}

pub async fn list(
    State(state): State<EntityState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let list = parse_list_query(&state.entity, params)?;
    let page = CrudService::list(&state.pool, &state.entity, list).await?;
    Ok(response::list(page))
}

pub async fn create(
    State(state): State<EntityState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_columns(body)?;
    RequestValidator::validate(&body, &state.entity)?;
    let row = CrudService::create(&state.pool, &state.entity, &body).await?;
    tracing::info!(table = %state.entity.table_name, id = %row["id"], "record created");
    Ok(response::created(row))
}

pub async fn read(
    State(state): State<EntityState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, &state.entity, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", state.entity.table_name, id_str)))?;
    Ok(response::ok(row))
}

pub async fn update(
    State(state): State<EntityState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let body = body_to_columns(body)?;
    RequestValidator::validate(&body, &state.entity)?;
    let row = CrudService::update(&state.pool, &state.entity, &id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", state.entity.table_name, id_str)))?;
    Ok(response::ok(row))
}

pub async fn delete(
    State(state): State<EntityState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if !CrudService::delete(&state.pool, &state.entity, &id).await? {
        return Err(AppError::NotFound(format!("{} {}", state.entity.table_name, id_str)));
    }
    tracing::info!(table = %state.entity.table_name, id = %id_str, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, resolve};

    fn shares() -> ResolvedEntity {
        resolve(&builtin_config().unwrap())
            .unwrap()
            .entity_by_path("shares")
            .unwrap()
            .clone()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn sort_accepts_whitelisted_field_in_both_directions() {
        let e = shares();
        assert_eq!(
            parse_sort(&e, "bikeType").unwrap(),
            vec![SortKey { column: "bike_type".into(), descending: false }]
        );
        assert_eq!(
            parse_sort(&e, "-bikeType").unwrap(),
            vec![SortKey { column: "bike_type".into(), descending: true }]
        );
    }

    #[test]
    fn sort_rejects_fields_outside_whitelist() {
        let e = shares();
        assert!(matches!(parse_sort(&e, "costToRent"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_sort(&e, "bikeType,address"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn list_query_defaults() {
        let list = parse_list_query(&shares(), HashMap::new()).unwrap();
        assert_eq!(list.limit, DEFAULT_LIMIT);
        assert_eq!(list.offset, 0);
        assert!(list.sort.is_empty());
        assert!(list.filters.is_empty());
        assert_eq!(list.search, None);
    }

    #[test]
    fn list_query_reads_paging_filters_and_ignores_unknowns() {
        let list = parse_list_query(
            &shares(),
            params(&[
                ("orderby", "bikeType"),
                ("count", "5"),
                ("offset", "10"),
                ("isRented", "false"),
                ("bikeType", "road"),
                ("utm_source", "newsletter"),
            ]),
        )
        .unwrap();
        assert_eq!(list.limit, 5);
        assert_eq!(list.offset, 10);
        assert_eq!(list.sort.len(), 1);
        assert_eq!(
            list.filters,
            vec![
                ("bike_type".to_string(), Value::String("road".into())),
                ("is_rented".to_string(), Value::String("false".into())),
            ]
        );
    }

    #[test]
    fn list_query_reads_free_text_search() {
        let list = parse_list_query(&shares(), params(&[("q", "cruiser")])).unwrap();
        assert_eq!(list.search.as_deref(), Some("cruiser"));
        assert!(list.filters.is_empty());

        let blank = parse_list_query(&shares(), params(&[("q", "  ")])).unwrap();
        assert_eq!(blank.search, None);
    }

    #[test]
    fn list_query_rejects_bad_limit() {
        assert!(parse_list_query(&shares(), params(&[("limit", "-1")])).is_err());
    }

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("42").unwrap(), Value::from(42));
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("99999999999"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn bodies_must_be_objects() {
        let m = body_to_columns(serde_json::json!({ "costToRent": 10 })).unwrap();
        assert_eq!(m.get("cost_to_rent"), Some(&Value::from(10)));
        assert!(body_to_columns(serde_json::json!([1, 2])).is_err());
    }
}
