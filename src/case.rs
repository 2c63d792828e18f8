//! Field naming at the API boundary: columns are snake_case, JSON fields camelCase.

use serde_json::{Map, Value};

/// `cost_to_rent` -> `costToRent`.
pub fn to_camel_case(s: &str) -> String {
    let mut parts = s.split('_').filter(|p| !p.is_empty());
    let mut out: String = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `bikeType` -> `bike_type`. A leading capital gets no underscore.
pub fn to_snake_case(s: &str) -> String {
    s.chars().fold(String::with_capacity(s.len() + 4), |mut out, c| {
        if c.is_uppercase() && !out.is_empty() {
            out.push('_');
        }
        out.extend(c.to_lowercase());
        out
    })
}

/// Rename a row's keys to camelCase in place.
pub fn object_keys_to_camel_case(obj: &mut Map<String, Value>) {
    let renamed: Map<String, Value> = std::mem::take(obj)
        .into_iter()
        .map(|(k, v)| (to_camel_case(&k), v))
        .collect();
    *obj = renamed;
}

/// Convert all keys of a JSON object from camelCase to snake_case, returning a new map.
pub fn object_keys_to_snake_case(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter().map(|(k, v)| (to_snake_case(&k), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_identifiers_both_ways() {
        assert_eq!(to_camel_case("cost_to_rent"), "costToRent");
        assert_eq!(to_camel_case("lat"), "lat");
        assert_eq!(to_snake_case("uploadedPicture"), "uploaded_picture");
        assert_eq!(to_snake_case("isPaid"), "is_paid");
        assert_eq!(to_snake_case(&to_camel_case("date_two")), "date_two");
    }

    #[test]
    fn converts_object_keys() {
        let mut row = json!({ "bike_type": "road", "id": 1 });
        object_keys_to_camel_case(row.as_object_mut().unwrap());
        assert_eq!(row, json!({ "bikeType": "road", "id": 1 }));

        let body = json!({ "costToRent": 10, "address": "1 Main St" });
        let snake = object_keys_to_snake_case(body.as_object().unwrap().clone());
        assert_eq!(Value::Object(snake), json!({ "cost_to_rent": 10, "address": "1 Main St" }));
    }
}
