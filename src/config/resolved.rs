//! Resolved entity model: catalog validated and flattened for runtime use.

use crate::case::to_camel_case;
use crate::config::{ColumnType, Operation};
use std::collections::{HashMap, HashSet};

/// Columns every table gets, maintained by the server rather than the client.
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    /// Database column name (snake_case).
    pub name: String,
    /// Field name used in JSON bodies and query strings (camelCase).
    pub api_name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub length: Option<u32>,
    /// Raw SQL default, if any. Serial and timestamp columns rely on it.
    pub default: Option<String>,
    pub is_pk: bool,
    /// Whether clients may set this column through create/update.
    pub writable: bool,
}

impl ColumnInfo {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        ColumnInfo {
            name: name.to_string(),
            api_name: to_camel_case(name),
            column_type,
            nullable: true,
            length: None,
            default: None,
            is_pk: false,
            writable: true,
        }
    }

    /// PostgreSQL type used for DDL.
    pub fn ddl_type(&self) -> String {
        match self.column_type {
            ColumnType::Serial => "SERIAL".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Varchar => format!("VARCHAR({})", self.max_length().unwrap_or_default()),
            ColumnType::Numeric => "NUMERIC".into(),
            ColumnType::Boolean => "BOOLEAN".into(),
            ColumnType::Timestamptz => "TIMESTAMPTZ".into(),
        }
    }

    /// PostgreSQL type used to cast bound text parameters (`$1::integer`).
    pub fn cast_type(&self) -> &'static str {
        match self.column_type {
            ColumnType::Serial | ColumnType::Integer => "integer",
            ColumnType::Text | ColumnType::Varchar => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamptz => "timestamptz",
        }
    }

    pub fn max_length(&self) -> Option<u32> {
        match self.column_type {
            ColumnType::Varchar => Some(self.length.unwrap_or(crate::config::DEFAULT_VARCHAR_LENGTH)),
            _ => None,
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some() || matches!(self.column_type, ColumnType::Serial)
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub table_id: String,
    pub schema_name: String,
    pub table_name: String,
    pub comment: Option<String>,
    /// None when the table is not exposed over HTTP.
    pub path_segment: Option<String>,
    pub pk_column: String,
    pub columns: Vec<ColumnInfo>,
    pub operations: HashSet<Operation>,
    pub sort_param: String,
    /// API field names allowed in the sort parameter.
    pub sortable: HashSet<String>,
}

impl ResolvedEntity {
    pub fn allows(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_by_api_name(&self, api_name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.api_name == api_name)
    }

    pub fn pk(&self) -> Option<&ColumnInfo> {
        self.column(&self.pk_column)
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    /// Every table in the catalog, exposed or not. Schema sync walks this list.
    pub entities: Vec<ResolvedEntity>,
    pub entity_by_path: HashMap<String, ResolvedEntity>,
}

impl ResolvedModel {
    pub fn entity_by_path(&self, path: &str) -> Option<&ResolvedEntity> {
        self.entity_by_path.get(path)
    }

    pub fn entity(&self, table_id: &str) -> Option<&ResolvedEntity> {
        self.entities.iter().find(|e| e.table_id == table_id)
    }
}
