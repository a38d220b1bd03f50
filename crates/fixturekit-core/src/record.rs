//! Built records and the graph that owns them.
//!
//! Records are immutable once built and shared through `Rc`: a prebuilt record
//! passed as an override is adopted by reference, so sideload deduplication is
//! by identity (`Rc::ptr_eq`), never by deep equality.

use std::rc::Rc;

use serde_json::Value;

/// A foreign-key stub pointing at a built record.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub id: Value,
    /// Concrete type of the referenced record
    pub type_name: String,
    /// Emit the type discriminator alongside the id
    pub polymorphic: bool,
}

impl Reference {
    /// Reference `record`, or `None` when it has no identity (fragments).
    pub fn to(record: &Record, polymorphic: bool) -> Option<Self> {
        Some(Self {
            id: record.id.clone()?,
            type_name: record.type_name.clone(),
            polymorphic,
        })
    }
}

/// A resolved field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain attribute, or a terminal foreign key supplied verbatim
    Attr(Value),
    /// `belongsTo` reference
    Ref(Reference),
    /// `hasMany` references
    Refs(Vec<Reference>),
    /// Embedded `belongsTo` record
    Inline(Rc<Record>),
    /// Embedded `hasMany` records
    InlineMany(Vec<Rc<Record>>),
}

/// A built fixture record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    id: Option<Value>,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(type_name: impl Into<String>, id: Option<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            id,
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Primary-key value; `None` for fragments.
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Set a field, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// The attribute value of `name`, if it is a plain attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self.field(name)? {
            FieldValue::Attr(v) => Some(v),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Embedded records directly below this one.
    pub fn inline_children(&self) -> impl Iterator<Item = &Rc<Record>> {
        self.fields.iter().flat_map(|(_, value)| match value {
            FieldValue::Inline(child) => std::slice::from_ref(child).iter(),
            FieldValue::InlineMany(children) => children.iter(),
            _ => (&[]).iter(),
        })
    }
}

/// Sideloaded records grouped by collection key, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Sideloads {
    buckets: Vec<(String, Vec<Rc<Record>>)>,
}

impl Sideloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` under `key` unless that exact record is already there.
    ///
    /// Returns `false` for a duplicate.
    pub fn push(&mut self, key: &str, record: Rc<Record>) -> bool {
        let idx = match self.buckets.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.buckets.push((key.to_string(), Vec::new()));
                self.buckets.len() - 1
            }
        };
        let bucket = &mut self.buckets[idx].1;
        if bucket.iter().any(|existing| Rc::ptr_eq(existing, &record)) {
            return false;
        }
        bucket.push(record);
        true
    }

    /// Append every record of `other`, preserving its order.
    pub fn merge(&mut self, other: &Sideloads) {
        for (key, records) in &other.buckets {
            for record in records {
                self.push(key, Rc::clone(record));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[Rc<Record>]> {
        self.buckets
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, records)| records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rc<Record>])> {
        self.buckets
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(k, records)| (k.as_str(), records.as_slice()))
    }

    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

/// Root record(s) plus everything they sideload.
#[derive(Debug, Clone)]
pub struct Graph {
    pub roots: Vec<Rc<Record>>,
    pub sideloads: Sideloads,
    /// Built as a list (`build_list`), even when it holds one record
    pub is_list: bool,
}

impl Graph {
    pub fn single(root: Rc<Record>, sideloads: Sideloads) -> Self {
        Self {
            roots: vec![root],
            sideloads,
            is_list: false,
        }
    }

    pub fn list(roots: Vec<Rc<Record>>, sideloads: Sideloads) -> Self {
        Self {
            roots,
            sideloads,
            is_list: true,
        }
    }

    /// Every record reachable from the graph: roots, sideloads and their
    /// embedded descendants, each visited once.
    pub fn all_records(&self) -> Vec<Rc<Record>> {
        let mut seen: Vec<Rc<Record>> = Vec::new();
        let mut stack: Vec<Rc<Record>> = self.roots.clone();
        for (_, records) in self.sideloads.iter() {
            stack.extend(records.iter().cloned());
        }
        stack.reverse();
        while let Some(record) = stack.pop() {
            if seen.iter().any(|r| Rc::ptr_eq(r, &record)) {
                continue;
            }
            let mut children: Vec<_> = record.inline_children().cloned().collect();
            children.reverse();
            stack.extend(children);
            seen.push(record);
        }
        seen
    }
}
