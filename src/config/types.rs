//! Raw catalog types matching `catalog.json`: tables, columns and the API entities exposed over them.

use serde::{Deserialize, Serialize};

/// Length used for `varchar` columns that do not declare one.
pub const DEFAULT_VARCHAR_LENGTH: u32 = 255;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Serial,
    Integer,
    Text,
    Varchar,
    Numeric,
    Boolean,
    Timestamptz,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ColumnType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Only meaningful for `varchar`; defaults to [`DEFAULT_VARCHAR_LENGTH`].
    #[serde(default)]
    pub length: Option<u32>,
    /// Raw SQL default expression, e.g. `NOW()` or `false`.
    #[serde(default)]
    pub default: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    pub id: String,
    pub name: String,
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Read,
    Create,
    Update,
    Delete,
}

/// Sort contract for list endpoints: which query parameter carries the keys and which API fields are allowed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default = "default_sort_param")]
    pub param: String,
    pub attributes: Vec<String>,
}

fn default_sort_param() -> String {
    "orderby".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiEntityConfig {
    pub entity_id: String,
    pub path_segment: String,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub sort: Option<SortConfig>,
}

/// Whole catalog in one struct.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub api_entities: Vec<ApiEntityConfig>,
}

fn default_schema() -> String {
    "public".into()
}
