//! The CRDT-backed storage substrate underneath `adapter` (SPEC_FULL §4.0).
//!
//! `Store` wraps a single `yrs::Doc`. It exposes typed, id-keyed
//! get/set/remove helpers over `yrs::MapRef`/`ArrayRef` so `adapter` never
//! has to speak `yrs` directly. Root-level shared refs are looked up by a
//! flat string name (`doc.get_or_insert_map(name)`), the same pattern
//! `yrs` documents for a document with more than one independent root
//! collection.

pub mod any_json;
pub mod ordered;

use serde::de::DeserializeOwned;
use serde::Serialize;
use yrs::{Array, ArrayRef, Doc, Map, MapRef, ReadTxn, Transact, TransactionMut, Value};

pub struct Store {
    pub doc: Doc,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self { doc: Doc::new() }
    }

    pub fn root_map(&self, name: &str) -> MapRef {
        self.doc.get_or_insert_map(name)
    }

    pub fn root_array(&self, name: &str) -> ArrayRef {
        self.doc.get_or_insert_array(name)
    }

    pub fn transact_mut(&self) -> TransactionMut<'_> {
        self.doc.transact_mut()
    }

    pub fn transact(&self) -> yrs::Transaction<'_> {
        self.doc.transact()
    }
}

fn value_as_any(value: Value) -> Option<yrs::Any> {
    match value {
        Value::Any(any) => Some(any),
        _ => None,
    }
}

/// Read a typed record at `key` out of `map`.
pub fn map_get<T: DeserializeOwned>(map: &MapRef, txn: &impl ReadTxn, key: &str) -> Option<T> {
    let value = map.get(txn, key)?;
    let any = value_as_any(value)?;
    let json = any_json::any_to_json(&any);
    serde_json::from_value(json).ok()
}

/// Write a typed record at `key` into `map`.
pub fn map_set<T: Serialize>(map: &MapRef, txn: &mut TransactionMut, key: &str, value: &T) {
    let json = serde_json::to_value(value).expect("record must be serializable");
    let any = any_json::json_to_any(&json);
    map.insert(txn, key.to_string(), any);
}

pub fn map_remove(map: &MapRef, txn: &mut TransactionMut, key: &str) -> bool {
    map.remove(txn, key).is_some()
}

/// All records in `map`, in CRDT-internal (unspecified) iteration order —
/// callers that need a stable order re-sort using an explicit ordering
/// array (see `array_get_all`/`Page::nodes` insertion order, which is
/// tracked separately).
pub fn map_get_all<T: DeserializeOwned>(map: &MapRef, txn: &impl ReadTxn) -> Vec<(String, T)> {
    map.iter(txn)
        .filter_map(|(key, value)| {
            let any = value_as_any(value)?;
            let json = any_json::any_to_json(&any);
            serde_json::from_value(json).ok().map(|v| (key.to_string(), v))
        })
        .collect()
}

pub fn array_push<T: Serialize>(array: &ArrayRef, txn: &mut TransactionMut, value: &T) {
    let json = serde_json::to_value(value).expect("record must be serializable");
    let any = any_json::json_to_any(&json);
    array.push_back(txn, any);
}

pub fn array_get_all<T: DeserializeOwned>(array: &ArrayRef, txn: &impl ReadTxn) -> Vec<T> {
    array
        .iter(txn)
        .filter_map(|value| {
            let any = value_as_any(value)?;
            let json = any_json::any_to_json(&any);
            serde_json::from_value(json).ok()
        })
        .collect()
}

pub fn array_set_all<T: Serialize>(array: &ArrayRef, txn: &mut TransactionMut, values: &[T]) {
    let len = array.len(txn);
    if len > 0 {
        array.remove_range(txn, 0, len);
    }
    for value in values {
        array_push(array, txn, value);
    }
}
