//! Generic CRUD execution against PostgreSQL.

use crate::case::object_keys_to_camel_case;
use crate::config::{ColumnType, ResolvedEntity};
use crate::error::AppError;
use crate::sql::{count, delete, insert, select_by_id, select_list, to_bind_text, update, ListQuery, QueryBuf};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// One page of a list plus the total matching row count.
#[derive(Debug)]
pub struct Page {
    pub rows: Vec<Value>,
    pub offset: u32,
    pub total: i64,
}

pub struct CrudService;

impl CrudService {
    /// List rows with filters (exact match) and sort keys. Limit is clamped to [`MAX_LIMIT`].
    pub async fn list(pool: &PgPool, entity: &ResolvedEntity, mut list: ListQuery) -> Result<Page, AppError> {
        list.limit = list.limit.min(MAX_LIMIT);
        let total_q = count(entity, &list);
        let total: i64 = Self::bind(sqlx::query_scalar(&total_q.sql), &total_q.params)
            .fetch_one(pool)
            .await?;
        let q = select_list(entity, &list);
        let rows = Self::query_many(pool, entity, &q).await?;
        Ok(Page {
            rows,
            offset: list.offset,
            total,
        })
    }

    /// Fetch one row by primary key.
    pub async fn read(pool: &PgPool, entity: &ResolvedEntity, id: &Value) -> Result<Option<Value>, AppError> {
        Self::query_optional(pool, entity, &select_by_id(entity, id)).await
    }

    /// Insert one row; body keys are database column names. Returns created row.
    pub async fn create(pool: &PgPool, entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<Value, AppError> {
        Self::query_optional(pool, entity, &insert(entity, body))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by id. Returns updated row, or None when the id does not exist.
    pub async fn update(
        pool: &PgPool,
        entity: &ResolvedEntity,
        id: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        Self::query_optional(pool, entity, &update(entity, id, body)).await
    }

    /// Delete one row by id. Returns false when nothing was deleted.
    pub async fn delete(pool: &PgPool, entity: &ResolvedEntity, id: &Value) -> Result<bool, AppError> {
        let q = delete(entity, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = Self::bind(sqlx::query(&q.sql), &q.params)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    async fn query_optional(pool: &PgPool, entity: &ResolvedEntity, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = Self::bind(sqlx::query(&q.sql), &q.params)
            .fetch_optional(pool)
            .await?;
        row.map(|r| row_to_json(entity, &r)).transpose()
    }

    async fn query_many(pool: &PgPool, entity: &ResolvedEntity, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = Self::bind(sqlx::query(&q.sql), &q.params).fetch_all(pool).await?;
        rows.iter().map(|r| row_to_json(entity, r)).collect()
    }

    fn bind<'q, Q: BindText<'q>>(mut query: Q, params: &[Value]) -> Q {
        for p in params {
            query = query.bind_text(to_bind_text(p));
        }
        query
    }
}

/// Lets [`CrudService::bind`] feed text parameters to both `query` and `query_scalar`.
trait BindText<'q> {
    fn bind_text(self, v: Option<String>) -> Self;
}

impl<'q> BindText<'q> for sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    fn bind_text(self, v: Option<String>) -> Self {
        self.bind(v)
    }
}

impl<'q, O> BindText<'q> for sqlx::query::QueryScalar<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    fn bind_text(self, v: Option<String>) -> Self {
        self.bind(v)
    }
}

/// Decode a row by the entity's column types and return it with camelCase keys.
fn row_to_json(entity: &ResolvedEntity, row: &PgRow) -> Result<Value, AppError> {
    use sqlx::Column;
    let mut map = Map::new();
    for col in sqlx::Row::columns(row) {
        let name = col.name();
        let column_type = entity
            .column(name)
            .map(|c| c.column_type)
            .unwrap_or(ColumnType::Text);
        map.insert(name.to_string(), cell_to_value(row, name, column_type)?);
    }
    object_keys_to_camel_case(&mut map);
    Ok(Value::Object(map))
}

fn cell_to_value(row: &PgRow, name: &str, column_type: ColumnType) -> Result<Value, AppError> {
    use sqlx::Row;
    Ok(match column_type {
        ColumnType::Serial | ColumnType::Integer => row
            .try_get::<Option<i32>, _>(name)?
            .map(Value::from)
            .unwrap_or(Value::Null),
        ColumnType::Numeric => row
            .try_get::<Option<f64>, _>(name)?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnType::Boolean => row
            .try_get::<Option<bool>, _>(name)?
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        ColumnType::Timestamptz => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
            .map(|d| Value::String(d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)))
            .unwrap_or(Value::Null),
        ColumnType::Text | ColumnType::Varchar => row
            .try_get::<Option<String>, _>(name)?
            .map(Value::String)
            .unwrap_or(Value::Null),
    })
}
