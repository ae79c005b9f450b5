//! Decoding of Firestore's typed JSON values into plain JSON.
//!
//! The REST API wraps every value in a single-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Profiles are
//! handled as plain JSON maps, so documents are unwrapped on read.

use serde_json::{Map, Number, Value};

/// Unwrap every field of a document's `fields` object.
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Unwrap one typed value.
///
/// Unknown wrappers decode to their inner value unchanged.
pub fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return value.clone();
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            inner.clone()
        }
        // 64-bit integers travel as strings.
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .unwrap_or_else(|_| inner.clone()),
            other => other.clone(),
        },
        "doubleValue" => match inner {
            Value::String(s) => s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| inner.clone()),
            other => other.clone(),
        },
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => inner.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_value(&json!({"stringValue": "Male"})), json!("Male"));
        assert_eq!(decode_value(&json!({"integerValue": "29"})), json!(29));
        assert_eq!(decode_value(&json!({"doubleValue": 172.5})), json!(172.5));
        assert_eq!(decode_value(&json!({"booleanValue": true})), json!(true));
        assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
        assert_eq!(
            decode_value(&json!({"timestampValue": "2024-05-01T10:00:00Z"})),
            json!("2024-05-01T10:00:00Z")
        );
    }

    #[test]
    fn test_decode_arrays_and_maps() {
        let value = json!({
            "mapValue": {"fields": {
                "foodAllergies": {"arrayValue": {"values": [
                    {"stringValue": "Peanut"},
                    {"stringValue": "Shellfish"}
                ]}},
                "dietaryPreferences": {"arrayValue": {}}
            }}
        });
        assert_eq!(
            decode_value(&value),
            json!({"foodAllergies": ["Peanut", "Shellfish"], "dietaryPreferences": []})
        );
    }

    #[test]
    fn test_unparseable_integer_is_kept_as_text() {
        assert_eq!(decode_value(&json!({"integerValue": "abc"})), json!("abc"));
    }
}
