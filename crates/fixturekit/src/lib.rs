//! fixturekit - fixture graphs for client-side model tests.
//!
//! fixturekit fabricates records from declarative type definitions and renders
//! them as the response documents a REST (or JSON-API) backend would send:
//!
//! - `build`/`build_list`: records with sequential ids, traits and overrides
//! - related records either embedded inline or sideloaded under plural keys
//! - `make`/`make_list`: the same, registered in an in-memory store
//! - request mocks answering simulated requests with built documents
//!
//! # Quick Start
//!
//! ```
//! use fixturekit::prelude::*;
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::default()
//!     .with(
//!         TypeDefinition::new("user")
//!             .sequence("name", |n| json!(format!("User{n}")))
//!             .relationship(RelationshipInfo::belongs_to("company", "company")),
//!     )
//!     .with(TypeDefinition::new("company").attr("name", "Silly corp"));
//!
//! let mut fg = FactoryGuy::new(registry);
//! let user = fg
//!     .build_with("user", &[], Overrides::new().set("company", Fabricate::related()))
//!     .unwrap();
//!
//! assert_eq!(
//!     user.unwrap(),
//!     json!({
//!         "user": {"id": 1, "name": "User1", "company": 1},
//!         "companies": [{"id": 1, "name": "Silly corp"}]
//!     })
//! );
//! ```

use std::rc::Rc;

pub use fixturekit_build::{BuildListResult, BuildResult, FixtureBuilder, graphs, render};
pub use fixturekit_core::{
    AttributeDefault, AttributeInfo, DocumentStyle, EmbedMode, Error, Fabricate, FactoryConfig,
    FieldInput, FieldValue, Graph, InvalidOverrideKind, KeyStyle, Overrides, Record, Reference,
    RelationshipInfo, RelationshipKind, Result, Schema, SchemaRegistry, Sequences, Sideloads,
    TypeDefinition, inflect,
};
pub use fixturekit_mock::{Method, MockHandle, MockRegistry, MockRequest, MockResponse, Store};
use serde_json::Value;

/// A fixture session: schema, counters, store and mocks.
///
/// Create one per test (or call [`reset`](Self::reset) between tests) so
/// ids start from the beginning again.
#[derive(Debug)]
pub struct FactoryGuy {
    registry: Rc<SchemaRegistry>,
    builder: FixtureBuilder,
    store: Store,
    mocks: MockRegistry,
}

impl FactoryGuy {
    pub fn new(registry: SchemaRegistry) -> Self {
        let registry = Rc::new(registry);
        let schema: Rc<dyn Schema> = registry.clone();
        Self {
            registry,
            builder: FixtureBuilder::new(schema),
            store: Store::new(),
            mocks: MockRegistry::new(),
        }
    }

    /// Prefix mock paths with `namespace`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.mocks = MockRegistry::new().with_namespace(namespace);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn builder(&self) -> &FixtureBuilder {
        &self.builder
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn mocks(&self) -> &MockRegistry {
        &self.mocks
    }

    /// Override the root payload key of every type (until [`reset`](Self::reset)).
    pub fn set_payload_key_fn(&self, f: impl Fn(&str) -> String + 'static) {
        self.registry.set_payload_key_fn(f);
    }

    /// Forget counters, made records, mocks and the payload-key override.
    pub fn reset(&mut self) {
        tracing::debug!(
            records = self.store.len(),
            mocks = self.mocks.len(),
            "Resetting fixture session"
        );
        self.builder.reset();
        self.store.clear();
        self.mocks.clear();
        self.registry.clear_payload_key_fn();
    }

    pub fn build(&mut self, name: &str) -> Result<BuildResult> {
        self.builder.build(name, &[], Overrides::new())
    }

    pub fn build_with(
        &mut self,
        name: &str,
        traits: &[&str],
        overrides: Overrides,
    ) -> Result<BuildResult> {
        self.builder.build(name, traits, overrides)
    }

    pub fn build_list(&mut self, name: &str, count: usize) -> Result<BuildListResult> {
        self.builder.build_list(name, count, &[], Overrides::new())
    }

    pub fn build_list_with(
        &mut self,
        name: &str,
        count: usize,
        traits: &[&str],
        overrides: Overrides,
    ) -> Result<BuildListResult> {
        self.builder.build_list(name, count, traits, overrides)
    }

    /// Build one record per override set.
    pub fn build_list_each(&mut self, name: &str, each: Vec<Overrides>) -> Result<BuildListResult> {
        self.builder.build_list_each(name, each)
    }

    pub fn make(&mut self, name: &str) -> Result<BuildResult> {
        self.make_with(name, &[], Overrides::new())
    }

    /// Build, then register every record of the graph in the store.
    pub fn make_with(
        &mut self,
        name: &str,
        traits: &[&str],
        overrides: Overrides,
    ) -> Result<BuildResult> {
        let result = self.builder.build(name, traits, overrides)?;
        self.store.push_graph(result.graph());
        Ok(result)
    }

    pub fn make_list(&mut self, name: &str, count: usize) -> Result<BuildListResult> {
        self.make_list_with(name, count, &[], Overrides::new())
    }

    pub fn make_list_with(
        &mut self,
        name: &str,
        count: usize,
        traits: &[&str],
        overrides: Overrides,
    ) -> Result<BuildListResult> {
        let result = self.builder.build_list(name, count, traits, overrides)?;
        self.store.push_graph(result.graph());
        Ok(result)
    }

    /// Mock `GET /<plural>/<id>` with a freshly built record.
    pub fn mock_find_record(
        &mut self,
        name: &str,
        traits: &[&str],
        overrides: Overrides,
    ) -> Result<MockHandle> {
        let result = self.builder.build(name, traits, overrides)?;
        self.mock_find_record_for(&result)
    }

    /// Mock `GET /<plural>/<id>` with a prebuilt record.
    pub fn mock_find_record_for(&mut self, result: &BuildResult) -> Result<MockHandle> {
        self.mocks.mock_find_record(self.registry.as_ref(), result)
    }

    /// Mock `GET /<plural>` with `count` freshly built records.
    pub fn mock_find_all(&mut self, name: &str, count: usize) -> Result<MockHandle> {
        let result = self.builder.build_list(name, count, &[], Overrides::new())?;
        Ok(self.mocks.mock_find_all(self.registry.as_ref(), &result))
    }

    /// Mock `GET /<plural>` with a prebuilt list.
    pub fn mock_find_all_for(&mut self, result: &BuildListResult) -> MockHandle {
        self.mocks.mock_find_all(self.registry.as_ref(), result)
    }

    /// Mock `GET /<plural>?<params>`, answered with an empty list until
    /// [`MockHandle::returns_document`] supplies one.
    pub fn mock_query(&mut self, name: &str, params: Value) -> Result<MockHandle> {
        let result = self.builder.build_list(name, 0, &[], Overrides::new())?;
        Ok(self.mocks.mock_query(self.registry.as_ref(), &result, params))
    }

    pub fn mock_create(&mut self, name: &str) -> Result<MockHandle> {
        self.mocks.mock_create(self.registry.as_ref(), name)
    }

    pub fn mock_update(&mut self, name: &str, id: impl Into<Value>) -> Result<MockHandle> {
        self.mocks.mock_update(self.registry.as_ref(), name, id.into())
    }

    pub fn mock_delete(&mut self, name: &str, id: impl Into<Value>) -> Result<MockHandle> {
        self.mocks.mock_delete(self.registry.as_ref(), name, &id.into())
    }

    /// Answer a simulated request; `None` when no mock matches.
    pub fn handle(&mut self, request: &MockRequest) -> Option<MockResponse> {
        self.mocks.handle(&mut self.builder, request)
    }
}

/// Everything needed to define fixtures and build them.
///
/// ```
/// use fixturekit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AttributeInfo, BuildListResult, BuildResult, DocumentStyle, EmbedMode, Error, Fabricate,
        FactoryConfig, FactoryGuy, FieldInput, KeyStyle, MockRequest, MockResponse, Overrides,
        RelationshipInfo, Result, Schema, SchemaRegistry, TypeDefinition, graphs,
    };
}
