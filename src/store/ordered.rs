//! An id-keyed `MapRef` paired with an `ArrayRef` that tracks insertion
//! order — the building block every id-ordered slice of the document model
//! (nodes, edges, pin constraints, each registry) is built from, so order
//! (spec §3: "parent-before-children order in the page's insertion
//! sequence") survives round trips through the CRDT store even though
//! CRDT maps themselves have no defined iteration order.

use super::{any_json, Store};
use serde::de::DeserializeOwned;
use serde::Serialize;
use yrs::{Array, ArrayRef, Map, MapRef, ReadTxn, TransactionMut, Value};

pub struct OrderedCollection {
    pub map: MapRef,
    pub order: ArrayRef,
}

impl OrderedCollection {
    pub fn new(store: &Store, map_name: &str, order_name: &str) -> Self {
        Self { map: store.root_map(map_name), order: store.root_array(order_name) }
    }

    fn order_ids(&self, txn: &impl ReadTxn) -> Vec<String> {
        self.order
            .iter(txn)
            .filter_map(|v| match v {
                Value::Any(yrs::Any::String(s)) => Some(s.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn get_all<T: DeserializeOwned>(&self, txn: &impl ReadTxn) -> Vec<T> {
        self.order_ids(txn)
            .into_iter()
            .filter_map(|id| self.get(txn, &id))
            .collect()
    }

    pub fn get<T: DeserializeOwned>(&self, txn: &impl ReadTxn, id: &str) -> Option<T> {
        let value = self.map.get(txn, id)?;
        let Value::Any(any) = value else { return None };
        serde_json::from_value(any_json::any_to_json(&any)).ok()
    }

    pub fn contains(&self, txn: &impl ReadTxn, id: &str) -> bool {
        self.map.get(txn, id).is_some()
    }

    pub fn len(&self, txn: &impl ReadTxn) -> usize {
        self.order_ids(txn).len()
    }

    /// Insert or overwrite the record at `id`, appending to the order if new.
    pub fn upsert<T: Serialize>(&self, txn: &mut TransactionMut, id: &str, value: &T) {
        let is_new = self.map.get(txn, id).is_none();
        let json = serde_json::to_value(value).expect("record must be serializable");
        self.map.insert(txn, id.to_string(), any_json::json_to_any(&json));
        if is_new {
            self.order.push_back(txn, yrs::Any::String(id.into()));
        }
    }

    pub fn remove(&self, txn: &mut TransactionMut, id: &str) -> bool {
        let removed = self.map.remove(txn, id).is_some();
        if removed {
            let ids = self.order_ids(txn);
            if let Some(pos) = ids.iter().position(|x| x == id) {
                self.order.remove_range(txn, pos as u32, 1);
            }
        }
        removed
    }

    /// Replace the whole collection, preserving the order of `values`.
    pub fn replace_all<T, I>(&self, txn: &mut TransactionMut, values: I, id_of: impl Fn(&T) -> String)
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let existing = self.order_ids(txn);
        if !existing.is_empty() {
            self.order.remove_range(txn, 0, existing.len() as u32);
        }
        for id in &existing {
            self.map.remove(txn, id);
        }
        for value in values {
            let id = id_of(&value);
            self.upsert(txn, &id, &value);
        }
    }
}
