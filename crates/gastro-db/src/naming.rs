//! # Key Naming
//!
//! The application speaks camelCase (`minStock`, `costPerUnit`); stored
//! documents use snake_case (`min_stock`, `cost_per_unit`). Conversion
//! happens here and nowhere else.
//!
//! ```text
//! Ingredient ──serde──► {"minStock": 15} ──to_storage──► {"min_stock": 15}
//!                                                             │ SQLite
//! Ingredient ◄──serde── {"minStock": 15} ◄──from_storage──────┘
//! ```
//!
//! Only object keys are rewritten; string values are left alone.

use serde_json::{Map, Value};

/// `costPerUnit` → `cost_per_unit`
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `cost_per_unit` → `costPerUnit`
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rewrites every object key in `value` to snake_case, recursively.
pub fn to_storage(value: Value) -> Value {
    rewrite_keys(value, &to_snake_case)
}

/// Rewrites every object key in `value` to camelCase, recursively.
pub fn from_storage(value: Value) -> Value {
    rewrite_keys(value, &to_camel_case)
}

fn rewrite_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (convert(&k), rewrite_keys(v, convert)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| rewrite_keys(v, convert)).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_conversion() {
        assert_eq!(to_snake_case("costPerUnit"), "cost_per_unit");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_camel_case("cost_per_unit"), "costPerUnit");
        assert_eq!(to_camel_case("estimated_depletion_date"), "estimatedDepletionDate");
        assert_eq!(to_camel_case("id"), "id");
    }

    #[test]
    fn test_nested_documents() {
        let app = json!({
            "id": "p_cafe_leche",
            "imageUrl": "https://example.com/cafeConLeche.jpg",
            "recipe": [{"ingredientId": "ing_cafe", "quantity": 0.008}]
        });
        let stored = to_storage(app.clone());
        assert_eq!(stored["image_url"], "https://example.com/cafeConLeche.jpg");
        assert_eq!(stored["recipe"][0]["ingredient_id"], "ing_cafe");
        assert_eq!(from_storage(stored), app);
    }
}
