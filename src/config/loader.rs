//! Load the entity catalog and resolve it into the runtime model.

use crate::config::resolved::{ColumnInfo, ResolvedEntity, ResolvedModel, CREATED_AT, UPDATED_AT};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// The catalog shipped with the server: shares (exposed) and bikes (declared only).
pub fn builtin_config() -> Result<FullConfig, ConfigError> {
    serde_json::from_str(BUILTIN_CATALOG).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Build resolved model from full config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let api_by_table: HashMap<&str, &ApiEntityConfig> = config
        .api_entities
        .iter()
        .map(|api| (api.entity_id.as_str(), api))
        .collect();

    let mut entities = Vec::new();
    let mut entity_by_path = HashMap::new();

    for table in &config.tables {
        let mut columns: Vec<ColumnInfo> = table
            .columns
            .iter()
            .map(|c| {
                let is_pk = c.name == table.primary_key;
                ColumnInfo {
                    nullable: c.nullable && !is_pk,
                    length: c.length,
                    default: c.default.clone(),
                    is_pk,
                    writable: !is_pk,
                    ..ColumnInfo::new(&c.name, c.type_)
                }
            })
            .collect();
        for name in [CREATED_AT, UPDATED_AT] {
            columns.push(ColumnInfo {
                nullable: false,
                default: Some("NOW()".into()),
                writable: false,
                ..ColumnInfo::new(name, ColumnType::Timestamptz)
            });
        }

        let api = api_by_table.get(table.id.as_str());
        let operations: HashSet<Operation> = api
            .map(|a| a.operations.iter().copied().collect())
            .unwrap_or_default();
        let (sort_param, sortable) = match api.and_then(|a| a.sort.as_ref()) {
            Some(sort) => (sort.param.clone(), sort.attributes.iter().cloned().collect()),
            None => ("orderby".to_string(), HashSet::new()),
        };

        let entity = ResolvedEntity {
            table_id: table.id.clone(),
            schema_name: config.schema.clone(),
            table_name: table.name.clone(),
            comment: table.comment.clone(),
            path_segment: api.map(|a| a.path_segment.clone()),
            pk_column: table.primary_key.clone(),
            columns,
            operations,
            sort_param,
            sortable,
        };
        if let Some(path) = &entity.path_segment {
            entity_by_path.insert(path.clone(), entity.clone());
        }
        entities.push(entity);
    }

    Ok(ResolvedModel {
        entities,
        entity_by_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ResolvedModel {
        resolve(&builtin_config().unwrap()).unwrap()
    }

    #[test]
    fn shares_are_exposed_with_full_crud() {
        let model = model();
        let shares = model.entity_by_path("shares").unwrap();
        assert_eq!(shares.table_name, "shares");
        for op in [
            Operation::List,
            Operation::Read,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
        ] {
            assert!(shares.allows(op), "{:?} should be allowed", op);
        }
        assert_eq!(shares.sort_param, "orderby");
        assert!(shares.sortable.contains("bikeType"));
        assert_eq!(shares.sortable.len(), 1);
    }

    #[test]
    fn bike_ownership_is_declared_but_not_routed() {
        let model = model();
        assert!(model.entity_by_path("bikes").is_none());
        let bikes = model.entity("bike_ownership").unwrap();
        assert_eq!(bikes.table_name, "bikes");
        assert!(bikes.path_segment.is_none());
        assert!(bikes.operations.is_empty());
        assert!(bikes.column("user_id").is_some());
    }

    #[test]
    fn system_columns_are_added_and_read_only() {
        let model = model();
        let shares = model.entity_by_path("shares").unwrap();
        for name in ["id", "created_at", "updated_at"] {
            let col = shares.column(name).unwrap();
            assert!(!col.writable, "{} must not be writable", name);
            assert!(col.has_default());
        }
        assert_eq!(shares.column("created_at").unwrap().api_name, "createdAt");
        assert!(shares.column("bike_type").unwrap().writable);
    }

    #[test]
    fn api_names_are_camel_case() {
        let model = model();
        let shares = model.entity_by_path("shares").unwrap();
        let col = shares.column_by_api_name("costToRent").unwrap();
        assert_eq!(col.name, "cost_to_rent");
        assert_eq!(col.cast_type(), "integer");
        assert_eq!(
            shares.column_by_api_name("shortDescription").unwrap().ddl_type(),
            "VARCHAR(255)"
        );
    }
}
