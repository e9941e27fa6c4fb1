//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type, e.g. `{"stringValue": "x"}` or `{"integerValue": "42"}` (64-bit
//! integers travel as strings). Documents are stored with plain
//! `serde_json` fields and translated at the HTTP boundary.

use serde_json::{json, Map, Value};

use appointly_common::services::Fields;

/// Encodes a plain JSON value as a Firestore `Value`.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encodes a document's top-level fields.
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Decodes a Firestore `Value` back to plain JSON.
///
/// Timestamps and references decode to their string form, geo points to
/// `{latitude, longitude}`.
pub fn decode_value(value: &Value) -> Result<Value, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| format!("expected a typed value object, got {}", value))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| "empty typed value".to_string())?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" | "geoPointValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("bad integerValue {}: {}", s, e)),
            Value::Number(_) => Ok(inner.clone()),
            other => Err(format!("bad integerValue {}", other)),
        },
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(fields) => decode_fields(fields)?,
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(format!("unsupported Firestore value type {}", other)),
    }
}

/// Decodes a document's `fields` object.
pub fn decode_fields(fields: &Value) -> Result<Fields, String> {
    let Some(map) = fields.as_object() else {
        return Err(format!("expected fields object, got {}", fields));
    };
    map.iter()
        .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}
