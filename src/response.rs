//! Response helpers for the CRUD surface: bare JSON records, list ranges.

use crate::service::Page;
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub fn created(row: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(row))
}

pub fn ok(row: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(row))
}

/// `items {first}-{last}/{total}`, or `items */{total}` for an empty page.
pub fn content_range(offset: u32, len: usize, total: i64) -> String {
    if len == 0 {
        format!("items */{}", total)
    } else {
        format!("items {}-{}/{}", offset, offset as usize + len - 1, total)
    }
}

/// JSON array of rows with a `Content-Range` header describing the page.
pub fn list(page: Page) -> impl IntoResponse {
    let range = content_range(page.offset, page.rows.len(), page.total);
    (
        StatusCode::OK,
        [(header::CONTENT_RANGE, range)],
        Json(Value::Array(page.rows)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ranges() {
        assert_eq!(content_range(0, 10, 42), "items 0-9/42");
        assert_eq!(content_range(40, 2, 42), "items 40-41/42");
        assert_eq!(content_range(0, 0, 0), "items */0");
        assert_eq!(content_range(100, 0, 42), "items */42");
    }
}
