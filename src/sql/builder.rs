//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from resolved entity.

use crate::config::{ColumnInfo, ColumnType, ResolvedEntity, UPDATED_AT};
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from the catalog).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub(crate) fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

fn entity_table(entity: &ResolvedEntity) -> String {
    qualified_table(&entity.schema_name, &entity.table_name)
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its typed placeholder, e.g. `$2::integer`.
    fn push_param(&mut self, v: Value, column: &ColumnInfo) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), column.cast_type())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    /// Database column name.
    pub column: String,
    pub descending: bool,
}

/// Parameters of a list query. Filter and sort columns are database names already checked against the entity.
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub filters: Vec<(String, Value)>,
    /// Case-insensitive substring match across every text column.
    pub search: Option<String>,
    pub sort: Vec<SortKey>,
    pub limit: u32,
    pub offset: u32,
}

/// SELECT list: numeric columns come back as float8 so they decode straight into JSON numbers.
fn select_column_list(entity: &ResolvedEntity) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            match c.column_type {
                ColumnType::Numeric => format!("{}::float8 AS {}", q, q),
                _ => q,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, entity: &ResolvedEntity, list: &ListQuery) -> String {
    let mut parts = Vec::new();
    for (col, val) in &list.filters {
        let Some(c) = entity.column(col) else { continue };
        let ph = q.push_param(val.clone(), c);
        parts.push(format!("{} = {}", quoted(col), ph));
    }
    if let Some(term) = list.search.as_deref() {
        let text_cols: Vec<&ColumnInfo> = entity
            .columns
            .iter()
            .filter(|c| matches!(c.column_type, ColumnType::Text | ColumnType::Varchar))
            .collect();
        if !text_cols.is_empty() {
            q.params.push(Value::String(format!("%{}%", escape_like(term))));
            let ph = format!("${}::text", q.params.len());
            let any = text_cols
                .iter()
                .map(|c| format!("{} ILIKE {}", quoted(&c.name), ph))
                .collect::<Vec<_>>()
                .join(" OR ");
            parts.push(format!("({})", any));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Escape LIKE wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn pk_column(entity: &ResolvedEntity) -> ColumnInfo {
    entity
        .pk()
        .cloned()
        .unwrap_or_else(|| ColumnInfo::new(&entity.pk_column, ColumnType::Integer))
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = pk_column(entity);
    let ph = q.push_param(id.clone(), &pk);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(entity),
        entity_table(entity),
        quoted(&pk.name),
        ph
    );
    q
}

/// SELECT list with exact-match filters, requested sort keys then pk as tiebreaker, LIMIT/OFFSET.
pub fn select_list(entity: &ResolvedEntity, list: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, entity, list);

    let mut order: Vec<String> = list
        .sort
        .iter()
        .filter(|k| entity.column(&k.column).is_some() && k.column != entity.pk_column)
        .map(|k| format!("{} {}", quoted(&k.column), if k.descending { "DESC" } else { "ASC" }))
        .collect();
    let pk_desc = list
        .sort
        .iter()
        .any(|k| k.column == entity.pk_column && k.descending);
    order.push(format!("{} {}", quoted(&entity.pk_column), if pk_desc { "DESC" } else { "ASC" }));

    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        select_column_list(entity),
        entity_table(entity),
        where_clause,
        order.join(", "),
        list.limit,
        list.offset
    );
    q
}

/// COUNT(*) over the same filters as [`select_list`].
/// COUNT(*) under the same filters and search as [`select_list`]; sort and paging are ignored.
pub fn count(entity: &ResolvedEntity, list: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, entity, list);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", entity_table(entity), where_clause);
    q
}

/// INSERT: only writable columns present in body. Absent columns fall back to their DB default (NULL if none).
pub fn insert(entity: &ResolvedEntity, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.columns.iter().filter(|c| c.writable) {
        let Some(val) = body.get(&c.name) else { continue };
        placeholders.push(q.push_param(val.clone(), c));
        cols.push(quoted(&c.name));
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", entity_table(entity), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            entity_table(entity),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only writable columns present in body, and always bump updated_at.
pub fn update(entity: &ResolvedEntity, id: &Value, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in entity.columns.iter().filter(|c| c.writable) {
        let Some(val) = body.get(&c.name) else { continue };
        let ph = q.push_param(val.clone(), c);
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    if entity.column(UPDATED_AT).is_some() {
        sets.push(format!("{} = NOW()", quoted(UPDATED_AT)));
    }
    let pk = pk_column(entity);
    let id_ph = q.push_param(id.clone(), &pk);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        entity_table(entity),
        sets.join(", "),
        quoted(&pk.name),
        id_ph,
        select_column_list(entity)
    );
    q
}

/// DELETE by id.
pub fn delete(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = pk_column(entity);
    let ph = q.push_param(id.clone(), &pk);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        entity_table(entity),
        quoted(&pk.name),
        ph,
        quoted(&pk.name)
    );
    q
}
