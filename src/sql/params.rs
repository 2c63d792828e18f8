//! Convert serde_json::Value into text parameters; the SQL side casts each one to its column type.

use serde_json::Value;

/// Text form of a JSON value as PostgreSQL parses it for `$n::<type>`. `null` binds as SQL NULL.
pub fn to_bind_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}
