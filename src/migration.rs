//! Schema sync: CREATE SCHEMA / CREATE TABLE IF NOT EXISTS for every catalog table.
//! Never drops, truncates or alters existing tables.

use crate::config::{ResolvedEntity, ResolvedModel};
use crate::error::AppError;
use crate::sql::{qualified_table, quoted};
use sqlx::PgPool;

/// DDL for one entity. Idempotent.
pub fn create_table_sql(entity: &ResolvedEntity) -> String {
    let mut col_defs: Vec<String> = Vec::new();
    for c in &entity.columns {
        let mut def = format!("{} {}", quoted(&c.name), c.ddl_type());
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(ref d) = c.default {
            def.push_str(" DEFAULT ");
            def.push_str(d);
        }
        col_defs.push(def);
    }
    col_defs.push(format!("PRIMARY KEY ({})", quoted(&entity.pk_column)));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(&entity.schema_name, &entity.table_name),
        col_defs.join(",\n  ")
    )
}

/// `COMMENT ON TABLE` for entities that carry a comment.
pub fn comment_sql(entity: &ResolvedEntity) -> Option<String> {
    entity.comment.as_ref().map(|comment| {
        format!(
            "COMMENT ON TABLE {} IS '{}'",
            qualified_table(&entity.schema_name, &entity.table_name),
            comment.replace('\'', "''")
        )
    })
}

/// Ensure schemas and tables exist for the whole model, exposed or not.
pub async fn sync_schema(pool: &PgPool, model: &ResolvedModel) -> Result<(), AppError> {
    let mut schemas: Vec<&str> = model.entities.iter().map(|e| e.schema_name.as_str()).collect();
    schemas.sort_unstable();
    schemas.dedup();
    for schema in schemas {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
            .execute(pool)
            .await?;
    }

    for entity in &model.entities {
        let sql = create_table_sql(entity);
        tracing::debug!(sql = %sql, "schema sync");
        sqlx::query(&sql).execute(pool).await?;
        // A missing comment is not worth failing startup over.
        if let Some(stmt) = comment_sql(entity) {
            if let Err(e) = sqlx::query(&stmt).execute(pool).await {
                tracing::warn!(table = %entity.table_name, error = %e, "table comment not applied");
            }
        }
        tracing::info!(table = %entity.table_name, "table ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, resolve};

    #[test]
    fn share_table_ddl() {
        let model = resolve(&builtin_config().unwrap()).unwrap();
        let sql = create_table_sql(model.entity("share").unwrap());
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "public"."shares" ("#));
        assert!(sql.contains(r#""id" SERIAL NOT NULL"#));
        assert!(sql.contains(r#""cost_to_rent" INTEGER,"#));
        assert!(sql.contains(r#""bike_type" VARCHAR(255),"#));
        assert!(sql.contains(r#""lat" NUMERIC,"#));
        assert!(sql.contains(r#""date_one" TIMESTAMPTZ,"#));
        assert!(sql.contains(r#""created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()"#));
        assert!(sql.contains(r#"PRIMARY KEY ("id")"#));
        assert!(!sql.to_uppercase().contains("DROP"));
    }

    #[test]
    fn comment_statement_escapes_quotes() {
        let model = resolve(&builtin_config().unwrap()).unwrap();
        let mut share = model.entity("share").unwrap().clone();
        assert_eq!(
            comment_sql(&share).as_deref(),
            Some(r#"COMMENT ON TABLE "public"."shares" IS 'Bicycle-sharing listings'"#)
        );
        share.comment = Some("rider's listings".into());
        assert!(comment_sql(&share).unwrap().ends_with("IS 'rider''s listings'"));
        share.comment = None;
        assert_eq!(comment_sql(&share), None);
    }

    #[test]
    fn bikes_table_is_synced_too() {
        let model = resolve(&builtin_config().unwrap()).unwrap();
        let sql = create_table_sql(model.entity("bike_ownership").unwrap());
        assert!(sql.contains(r#""public"."bikes""#));
        assert!(sql.contains(r#""owned_bikes" TEXT"#));
    }
}
