//! Conversion between `serde_json::Value` and `yrs::Any`.
//!
//! The store keeps every record (a node, an edge, a registry entry, ...) as
//! a single opaque `Any` blob inside a CRDT map keyed by id — conflicting
//! concurrent edits to *different* records merge cleanly at the map-entry
//! level, which is the granularity this document model actually needs
//! (spec §3 calls record-internal shape "opaque to the core" almost
//! everywhere). Field-level CRDT merge inside one node is not attempted.

use std::collections::HashMap;
use yrs::Any;

pub fn json_to_any(value: &serde_json::Value) -> Any {
    match value {
        serde_json::Value::Null => Any::Null,
        serde_json::Value::Bool(b) => Any::Bool(*b),
        serde_json::Value::Number(n) => {
            // Integer-valued numbers must round-trip as `Any::BigInt`, not
            // `Any::Number` (f64) -- `any_to_json` rebuilds an f64-backed
            // `Number` via `from_f64`, and serde_json refuses to deserialize
            // that into an integer-typed field (e.g. `DocMeta.version: u32`,
            // `EdgeData.bundle_count: Option<usize>`).
            if let Some(i) = n.as_i64() {
                Any::BigInt(i)
            } else if let Some(u) = n.as_u64() {
                Any::BigInt(u as i64)
            } else {
                Any::Number(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Any::String(s.as_str().into()),
        serde_json::Value::Array(items) => {
            let converted: Vec<Any> = items.iter().map(json_to_any).collect();
            Any::Array(converted.into())
        }
        serde_json::Value::Object(fields) => {
            let converted: HashMap<String, Any> =
                fields.iter().map(|(k, v)| (k.clone(), json_to_any(v))).collect();
            Any::Map(Box::new(converted))
        }
    }
}

pub fn any_to_json(any: &Any) -> serde_json::Value {
    match any {
        Any::Null | Any::Undefined => serde_json::Value::Null,
        Any::Bool(b) => serde_json::Value::Bool(*b),
        Any::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Any::BigInt(i) => serde_json::Value::Number((*i).into()),
        Any::String(s) => serde_json::Value::String(s.to_string()),
        Any::Array(items) => serde_json::Value::Array(items.iter().map(any_to_json).collect()),
        Any::Map(fields) => {
            serde_json::Value::Object(fields.iter().map(|(k, v)| (k.clone(), any_to_json(v))).collect())
        }
        Any::Buffer(_) => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_nested_structures() {
        let value = json!({
            "a": 1.0,
            "b": [true, false, null],
            "c": { "nested": "text" },
        });
        let any = json_to_any(&value);
        let back = any_to_json(&any);
        assert_eq!(value, back);
    }

    #[test]
    fn integer_numbers_round_trip_as_integers_not_floats() {
        let value = json!({ "version": 4, "bundleCount": 3 });
        let any = json_to_any(&value);
        assert!(matches!(any, Any::Map(_)));
        let back = any_to_json(&any);
        assert_eq!(back, value);
        // An integer JSON number must deserialize into an integer-typed
        // field after the round-trip, not fail on a float-backed Number.
        #[derive(serde::Deserialize)]
        struct Versioned {
            version: u32,
        }
        let versioned: Versioned = serde_json::from_value(back).unwrap();
        assert_eq!(versioned.version, 4);
    }
}
