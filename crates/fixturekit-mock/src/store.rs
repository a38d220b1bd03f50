//! Identity map of made records.
//!
//! `make`/`make_list` push every record of a built graph here, keyed by
//! (type, id). The first record registered under a key wins, so a record
//! shared by several graphs is stored once.

use std::collections::HashMap;
use std::rc::Rc;

use fixturekit_core::{Graph, Record};
use serde_json::Value;

/// Identity key: type name plus the id rendered as a string.
type StoreKey = (String, String);

fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// In-memory store of made records.
#[derive(Debug, Default)]
pub struct Store {
    /// Records in registration order
    records: Vec<Rc<Record>>,
    index: HashMap<StoreKey, usize>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `record`. Returns `false` if it has no id (fragments) or the
    /// key is already taken.
    pub fn push(&mut self, record: Rc<Record>) -> bool {
        let Some(id) = record.id() else {
            return false;
        };
        let key = (record.type_name().to_string(), id_key(id));
        if self.index.contains_key(&key) {
            tracing::trace!(type_name = %key.0, id = %key.1, "Record already in store");
            return false;
        }
        self.index.insert(key, self.records.len());
        self.records.push(record);
        true
    }

    /// Register every record of `graph`: roots, sideloads and embedded
    /// records. Returns how many were new.
    pub fn push_graph(&mut self, graph: &Graph) -> usize {
        let added = graph
            .all_records()
            .into_iter()
            .filter(|record| self.push(Rc::clone(record)))
            .count();
        tracing::debug!(added, total = self.records.len(), "Registered made records");
        added
    }

    /// Look up a record without any side effects.
    pub fn peek(&self, type_name: &str, id: impl Into<Value>) -> Option<&Rc<Record>> {
        let key = (type_name.to_string(), id_key(&id.into()));
        self.index.get(&key).map(|&idx| &self.records[idx])
    }

    /// Every record of `type_name`, in registration order.
    pub fn all<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Rc<Record>> + 'a {
        self.records
            .iter()
            .filter(move |record| record.type_name() == type_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixturekit_core::{FieldValue, Sideloads};
    use serde_json::json;

    fn record(type_name: &str, id: Value) -> Rc<Record> {
        Rc::new(Record::new(type_name, Some(id)))
    }

    #[test]
    fn test_push_and_peek() {
        let mut store = Store::new();
        let user = record("user", json!(1));
        assert!(store.push(Rc::clone(&user)));
        assert!(!store.push(record("user", json!(1))));

        let found = store.peek("user", 1).unwrap();
        assert!(Rc::ptr_eq(found, &user));
        // String and numeric ids share a key.
        assert!(store.peek("user", "1").is_some());
        assert!(store.peek("user", 2).is_none());
        assert!(store.peek("company", 1).is_none());
    }

    #[test]
    fn test_fragments_are_not_stored() {
        let mut store = Store::new();
        assert!(!store.push(Rc::new(Record::new("billing-address", None))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_push_graph_registers_everything() {
        let company = record("company", json!(1));
        let salary = record("salary", json!(1));
        let mut manager = Record::new("manager", Some(json!(1)));
        manager.set("salary", FieldValue::Inline(Rc::clone(&salary)));
        let mut sideloads = Sideloads::new();
        sideloads.push("companies", Rc::clone(&company));

        let mut store = Store::new();
        let graph = Graph::single(Rc::new(manager), sideloads);
        assert_eq!(store.push_graph(&graph), 3);
        assert_eq!(store.push_graph(&graph), 0);

        let types: Vec<_> = store.all("salary").map(|r| r.type_name()).collect();
        assert_eq!(types, vec!["salary"]);
        assert_eq!(store.len(), 3);

        store.clear();
        assert!(store.is_empty());
        assert!(store.peek("company", 1).is_none());
    }
}
