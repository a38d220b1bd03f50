//! Build results: pre-unwrap accessors, `add`, and `unwrap`.

use std::fmt;
use std::rc::Rc;

use fixturekit_core::{
    DocumentStyle, FieldInput, Graph, Record, Result, Schema, Sideloads, inflect,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::render;

/// Read a single field for `get`: `id` and the primary-key field both yield
/// the id.
fn get_field(schema: &dyn Schema, record: &Record, key: &str) -> Option<Value> {
    let pk = schema.primary_key_field_for(record.type_name());
    if key == "id" || pk.as_deref() == Some(key) {
        return record.id().cloned();
    }
    record
        .field(key)
        .map(|value| render::field_value(schema, value))
}

/// Sideload `other`'s roots (and its sideloads) into `target`.
fn add_graph(schema: &dyn Schema, target: &mut Sideloads, other: &Graph) {
    for root in &other.roots {
        let key = schema.plural_key_for(root.type_name());
        if !target.push(&key, Rc::clone(root)) {
            tracing::trace!(key = %key, id = ?root.id(), "Added record already sideloaded");
        }
    }
    target.merge(&other.sideloads);
}

fn merge_meta(slot: &mut Option<Value>, meta: Value) {
    if let (Some(Value::Object(existing)), Value::Object(extra)) = (slot.as_mut(), &meta) {
        existing.extend(extra.clone());
        return;
    }
    *slot = Some(meta);
}

fn unwrap_graph(schema: &dyn Schema, root_key: &str, graph: &Graph, meta: Option<&Value>) -> Value {
    tracing::trace!(root_key, records = graph.roots.len(), "Unwrapping fixture");
    match schema.config().style {
        DocumentStyle::Rest => render::rest_document(schema, root_key, graph, meta),
        DocumentStyle::JsonApi => render::json_api_document(schema, graph, meta),
    }
}

/// A single built record plus everything it sideloads.
#[derive(Clone)]
pub struct BuildResult {
    schema: Rc<dyn Schema>,
    graph: Graph,
    meta: Option<Value>,
}

impl fmt::Debug for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildResult")
            .field("record", self.record())
            .field("sideloads", &self.graph.sideloads)
            .finish()
    }
}

impl BuildResult {
    pub(crate) fn new(schema: Rc<dyn Schema>, graph: Graph) -> Self {
        Self {
            schema,
            graph,
            meta: None,
        }
    }

    /// The root record.
    pub fn record(&self) -> &Rc<Record> {
        &self.graph.roots[0]
    }

    pub fn type_name(&self) -> &str {
        self.record().type_name()
    }

    pub fn id(&self) -> Option<&Value> {
        self.record().id()
    }

    /// Read one field of the root record before unwrapping.
    ///
    /// Forbidden fields are readable here; custom attributes come back
    /// structured; relationship stubs render as the id or `{id, type}`.
    pub fn get(&self, key: &str) -> Option<Value> {
        get_field(self.schema.as_ref(), self.record(), key)
    }

    /// The whole root record, `id` first.
    pub fn to_value(&self) -> Value {
        render::record_value(self.schema.as_ref(), self.record())
    }

    /// Deserialize the root record (as [`to_value`](Self::to_value) renders it).
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }

    pub fn sideloads(&self) -> &Sideloads {
        &self.graph.sideloads
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Sideload another prebuilt result into this one.
    pub fn add(&mut self, other: impl Into<Graph>) -> &mut Self {
        add_graph(self.schema.as_ref(), &mut self.graph.sideloads, &other.into());
        self
    }

    /// Attach a top-level `meta` object (merged with any earlier one).
    pub fn add_meta(&mut self, meta: Value) -> &mut Self {
        merge_meta(&mut self.meta, meta);
        self
    }

    /// Flatten into a response document.
    ///
    /// REST: `{ rootKey: {...}, sideloadKey: [...] }`, sideload keys in
    /// first-seen order. JSON-API: `{ data: {...}, included: [...] }`.
    pub fn unwrap(&self) -> Value {
        let root_key = self.schema.payload_key_for(self.type_name());
        unwrap_graph(self.schema.as_ref(), &root_key, &self.graph, self.meta.as_ref())
    }
}

/// A list of built records plus everything they sideload.
#[derive(Clone)]
pub struct BuildListResult {
    schema: Rc<dyn Schema>,
    type_name: String,
    graph: Graph,
    meta: Option<Value>,
}

impl fmt::Debug for BuildListResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildListResult")
            .field("type_name", &self.type_name)
            .field("records", &self.graph.roots)
            .field("sideloads", &self.graph.sideloads)
            .finish()
    }
}

impl BuildListResult {
    pub(crate) fn new(schema: Rc<dyn Schema>, type_name: String, graph: Graph) -> Self {
        Self {
            schema,
            type_name,
            graph,
            meta: None,
        }
    }

    /// The requested type (a named fixture resolves to its owning type).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn records(&self) -> &[Rc<Record>] {
        &self.graph.roots
    }

    pub fn len(&self) -> usize {
        self.graph.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.roots.is_empty()
    }

    pub fn ids(&self) -> Vec<Value> {
        self.graph
            .roots
            .iter()
            .filter_map(|record| record.id().cloned())
            .collect()
    }

    /// The record at `index`, rendered like [`BuildResult::to_value`].
    pub fn get(&self, index: usize) -> Option<Value> {
        let record = self.graph.roots.get(index)?;
        Some(render::record_value(self.schema.as_ref(), record))
    }

    /// One field of the record at `index`.
    pub fn get_field(&self, index: usize, key: &str) -> Option<Value> {
        get_field(self.schema.as_ref(), self.graph.roots.get(index)?, key)
    }

    /// Every record, in build order.
    pub fn get_all(&self) -> Vec<Value> {
        self.graph
            .roots
            .iter()
            .map(|record| render::record_value(self.schema.as_ref(), record))
            .collect()
    }

    pub fn deserialize_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.get_all()
            .into_iter()
            .map(|value| Ok(serde_json::from_value(value)?))
            .collect()
    }

    pub fn sideloads(&self) -> &Sideloads {
        &self.graph.sideloads
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn add(&mut self, other: impl Into<Graph>) -> &mut Self {
        add_graph(self.schema.as_ref(), &mut self.graph.sideloads, &other.into());
        self
    }

    pub fn add_meta(&mut self, meta: Value) -> &mut Self {
        merge_meta(&mut self.meta, meta);
        self
    }

    /// Flatten into a response document keyed by the plural payload key
    /// (`comicBooks`).
    pub fn unwrap(&self) -> Value {
        let root_key = inflect::pluralize(&self.schema.payload_key_for(&self.type_name));
        unwrap_graph(self.schema.as_ref(), &root_key, &self.graph, self.meta.as_ref())
    }
}

impl From<BuildResult> for Graph {
    fn from(result: BuildResult) -> Self {
        result.graph
    }
}

impl From<&BuildResult> for Graph {
    fn from(result: &BuildResult) -> Self {
        result.graph.clone()
    }
}

impl From<BuildListResult> for Graph {
    fn from(result: BuildListResult) -> Self {
        result.graph
    }
}

impl From<&BuildListResult> for Graph {
    fn from(result: &BuildListResult) -> Self {
        result.graph.clone()
    }
}

impl From<BuildResult> for FieldInput {
    fn from(result: BuildResult) -> Self {
        FieldInput::Graph(result.graph)
    }
}

impl From<&BuildResult> for FieldInput {
    fn from(result: &BuildResult) -> Self {
        FieldInput::Graph(result.graph.clone())
    }
}

impl From<BuildListResult> for FieldInput {
    fn from(result: BuildListResult) -> Self {
        FieldInput::Graph(result.graph)
    }
}

impl From<&BuildListResult> for FieldInput {
    fn from(result: &BuildListResult) -> Self {
        FieldInput::Graph(result.graph.clone())
    }
}

/// Several prebuilt results as one `hasMany` value.
///
/// ```ignore
/// let user = fg.build_with("user", &[], Overrides::new().set("hats", graphs([&hat1, &hat2])))?;
/// ```
pub fn graphs<G: Into<Graph>>(results: impl IntoIterator<Item = G>) -> FieldInput {
    FieldInput::Graphs(results.into_iter().map(Into::into).collect())
}
