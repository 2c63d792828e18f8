//! Catalog validation: referential integrity and API consistency.

use crate::case::to_camel_case;
use crate::config::{ColumnType, FullConfig};
use crate::config::resolved::{CREATED_AT, UPDATED_AT};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    if config.schema.trim().is_empty() {
        return Err(ConfigError::Validation("schema name must not be empty".into()));
    }

    let mut table_ids = HashSet::new();
    let mut table_names = HashSet::new();
    for t in &config.tables {
        if !table_ids.insert(t.id.as_str()) {
            return Err(ConfigError::Validation(format!("duplicate table id '{}'", t.id)));
        }
        if !table_names.insert(t.name.as_str()) {
            return Err(ConfigError::Validation(format!("duplicate table name '{}'", t.name)));
        }

        let mut column_names = HashSet::new();
        for c in &t.columns {
            if c.name == CREATED_AT || c.name == UPDATED_AT {
                return Err(ConfigError::Validation(format!(
                    "table {}: column '{}' is managed by the server",
                    t.id, c.name
                )));
            }
            if !column_names.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "table {}: duplicate column '{}'",
                    t.id, c.name
                )));
            }
        }

        let pk = t
            .columns
            .iter()
            .find(|c| c.name == t.primary_key)
            .ok_or_else(|| ConfigError::InvalidPrimaryKey {
                table_id: t.id.clone(),
                column: t.primary_key.clone(),
            })?;
        if !matches!(pk.type_, ColumnType::Serial | ColumnType::Integer) {
            return Err(ConfigError::InvalidPrimaryKey {
                table_id: t.id.clone(),
                column: t.primary_key.clone(),
            });
        }
    }

    let mut path_segments = HashSet::new();
    for api in &config.api_entities {
        let table = config
            .tables
            .iter()
            .find(|t| t.id == api.entity_id)
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "table",
                id: api.entity_id.clone(),
            })?;
        if !path_segments.insert(api.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(api.path_segment.clone()));
        }
        if let Some(sort) = &api.sort {
            let api_names: HashSet<String> = table
                .columns
                .iter()
                .map(|c| to_camel_case(&c.name))
                .chain([to_camel_case(CREATED_AT), to_camel_case(UPDATED_AT)])
                .collect();
            for attr in &sort.attributes {
                if !api_names.contains(attr) {
                    return Err(ConfigError::MissingReference {
                        kind: "sort attribute",
                        id: format!("{}.{}", api.path_segment, attr),
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_config;

    #[test]
    fn builtin_catalog_is_valid() {
        let config = builtin_config().unwrap();
        validate(&config).unwrap();
    }

    #[test]
    fn rejects_sort_attribute_outside_table() {
        let mut config = builtin_config().unwrap();
        config.api_entities[0]
            .sort
            .as_mut()
            .unwrap()
            .attributes
            .push("colour".into());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingReference { kind: "sort attribute", .. })
        ));
    }

    #[test]
    fn rejects_duplicate_path_segment() {
        let mut config = builtin_config().unwrap();
        let dup = config.api_entities[0].clone();
        config.api_entities.push(dup);
        assert!(matches!(validate(&config), Err(ConfigError::DuplicatePathSegment(_))));
    }

    #[test]
    fn rejects_text_primary_key() {
        let mut config = builtin_config().unwrap();
        config.tables[0].primary_key = "address".into();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidPrimaryKey { .. })));
    }

    #[test]
    fn rejects_user_declared_timestamp_columns() {
        let mut config = builtin_config().unwrap();
        let mut col = config.tables[1].columns[1].clone();
        col.name = "updated_at".into();
        config.tables[1].columns.push(col);
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }
}
