//! Request validation from column types.

use crate::config::{ColumnType, ResolvedEntity};
use crate::error::AppError;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Check each writable column present in `body` (database names) against its type.
    /// Unknown and read-only keys are not checked here; the SQL builder drops them.
    pub fn validate(body: &Map<String, Value>, entity: &ResolvedEntity) -> Result<(), AppError> {
        for c in entity.columns.iter().filter(|c| c.writable) {
            if let Some(v) = body.get(&c.name) {
                validate_field(&c.api_name, c.column_type, c.max_length(), v)?;
            }
        }
        Ok(())
    }
}

fn validate_field(
    field: &str,
    column_type: ColumnType,
    max_length: Option<u32>,
    v: &Value,
) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    match column_type {
        ColumnType::Serial | ColumnType::Integer => {
            let fits = v
                .as_i64()
                .map(|n| i32::try_from(n).is_ok())
                .unwrap_or(false);
            if !fits {
                return Err(AppError::Validation(format!("{} must be an integer", field)));
            }
        }
        ColumnType::Numeric => {
            let ok = match v {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
                _ => false,
            };
            if !ok {
                return Err(AppError::Validation(format!("{} must be a number", field)));
            }
        }
        ColumnType::Boolean => {
            if !v.is_boolean() {
                return Err(AppError::Validation(format!("{} must be a boolean", field)));
            }
        }
        ColumnType::Text | ColumnType::Varchar => {
            let Some(s) = v.as_str() else {
                return Err(AppError::Validation(format!("{} must be a string", field)));
            };
            if let Some(max) = max_length {
                if s.chars().count() > max as usize {
                    return Err(AppError::Validation(format!(
                        "{} must be at most {} characters",
                        field, max
                    )));
                }
            }
        }
        ColumnType::Timestamptz => {
            if !v.as_str().is_some_and(is_timestamp) {
                return Err(AppError::Validation(format!(
                    "{} must be a date or date-time",
                    field
                )));
            }
        }
    }
    Ok(())
}

/// RFC 3339, a date-time without offset (`T` or space separated), or a bare date.
/// Values without an offset are read in the database session time zone.
fn is_timestamp(s: &str) -> bool {
    let s = s.trim();
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .any(|f| chrono::NaiveDateTime::parse_from_str(s, f).is_ok())
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
