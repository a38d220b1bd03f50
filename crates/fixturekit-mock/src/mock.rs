//! Request mocks.
//!
//! A [`MockRegistry`] answers simulated requests with unwrapped fixture
//! documents. Nothing touches the network: a test builds a [`MockRequest`]
//! (what its adapter would have sent), hands it to the registry and gets back
//! the [`MockResponse`] of the most recently registered matching mock.
//!
//! Paths follow REST conventions, using the schema's sideload keys:
//! `/<plural>` for collections and `/<plural>/<id>` for members.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use fixturekit_build::{BuildListResult, BuildResult, FixtureBuilder};
use fixturekit_core::{DocumentStyle, Error, Result, Schema, inflect};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// HTTP method of a simulated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Parse a method name, case-insensitively.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as an adapter would have sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    pub method: Method,
    pub path: String,
    pub query: Map<String, Value>,
    pub body: Option<Value>,
}

impl MockRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Map::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Set query parameters (non-object values are ignored).
    #[must_use]
    pub fn query(mut self, params: Value) -> Self {
        if let Value::Object(params) = params {
            self.query = params;
        }
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// The answer to a [`MockRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
}

impl MockResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// How a mock produces its body.
#[derive(Debug)]
enum Responder {
    /// A prebuilt document (find/query mocks)
    Document { document: Value, root_key: String },
    /// The request's record echoed back with an id (create/update mocks)
    Echo {
        type_name: String,
        payload_key: String,
        primary_key: String,
        id: Option<Value>,
    },
    /// `204 No Content` (delete mocks)
    Empty,
}

#[derive(Debug)]
struct MockState {
    method: Method,
    path: String,
    style: DocumentStyle,
    /// Declared field name -> payload key
    keys: HashMap<String, String>,
    query: Option<Map<String, Value>>,
    matcher: Option<Map<String, Value>>,
    returns: Map<String, Value>,
    failure: Option<(u16, Value)>,
    responder: Responder,
    calls: usize,
}

/// A registered mock. Cloning the handle shares the mock.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Rc<RefCell<MockState>>,
}

impl MockHandle {
    fn new(
        method: Method,
        path: String,
        style: DocumentStyle,
        keys: HashMap<String, String>,
        responder: Responder,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                method,
                path,
                style,
                keys,
                query: None,
                matcher: None,
                returns: Map::new(),
                failure: None,
                responder,
                calls: 0,
            })),
        }
    }

    /// Only answer requests whose record contains these attributes.
    ///
    /// Relationships match by id: `{"company": 1}` matches both `1` and
    /// `{"id": 1, "type": "company"}` in the request.
    #[must_use]
    pub fn match_attrs(self, attrs: Value) -> Self {
        match attrs {
            Value::Object(attrs) => self.state.borrow_mut().matcher = Some(attrs),
            other => tracing::warn!(value = %other, "match_attrs expects an object; ignored"),
        }
        self
    }

    /// Merge extra attributes into the response record(s).
    #[must_use]
    pub fn returns(self, attrs: Value) -> Self {
        match attrs {
            Value::Object(attrs) => self.state.borrow_mut().returns.extend(attrs),
            other => tracing::warn!(value = %other, "returns expects an object; ignored"),
        }
        self
    }

    /// Replace the response document (find and query mocks).
    #[must_use]
    pub fn returns_document(self, document: Value) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let root_key = match &state.responder {
                Responder::Document { root_key, .. } => root_key.clone(),
                _ => String::new(),
            };
            state.responder = Responder::Document { document, root_key };
        }
        self
    }

    /// Answer with an error response.
    #[must_use]
    pub fn fails(self, status: u16, errors: Value) -> Self {
        self.state.borrow_mut().failure = Some((status, errors));
        self
    }

    /// Undo [`fails`](Self::fails).
    #[must_use]
    pub fn succeeds(self) -> Self {
        self.state.borrow_mut().failure = None;
        self
    }

    pub fn times_called(&self) -> usize {
        self.state.borrow().calls
    }

    pub fn method(&self) -> Method {
        self.state.borrow().method
    }

    pub fn path(&self) -> String {
        self.state.borrow().path.clone()
    }

    fn matches(&self, request: &MockRequest) -> bool {
        let state = self.state.borrow();
        if state.method != request.method || state.path != request.path {
            return false;
        }
        if let Some(query) = &state.query {
            if !subset_matches(query, &request.query) {
                return false;
            }
        }
        match &state.matcher {
            None => true,
            Some(matcher) => {
                request_record(request, state.style, payload_key_of(&state.responder))
                    .is_some_and(|record| record_matches(matcher, &record.fields, &state.keys))
            }
        }
    }

    fn respond(&self, builder: &mut FixtureBuilder, request: &MockRequest) -> MockResponse {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.calls += 1;
        tracing::debug!(
            method = %state.method,
            path = %state.path,
            calls = state.calls,
            "Mock matched request"
        );

        if let Some((status, errors)) = &state.failure {
            return MockResponse {
                status: *status,
                body: json!({ "errors": errors }),
            };
        }

        let returns = keyed(&state.returns, &state.keys);
        match &state.responder {
            Responder::Document { document, root_key } => {
                let mut document = document.clone();
                merge_returns(&mut document, root_key, state.style, &returns);
                MockResponse::ok(document)
            }
            Responder::Echo {
                type_name,
                payload_key,
                primary_key,
                id,
            } => {
                let RequestRecord {
                    mut fields,
                    relationships,
                } = request_record(request, state.style, Some(payload_key)).unwrap_or_default();
                fields.extend(returns);
                let supplied = fields.remove(primary_key).or_else(|| fields.remove("id"));
                let id = match (id, supplied) {
                    (Some(id), _) => id.clone(),
                    (None, Some(supplied)) => supplied,
                    (None, None) => Value::from(builder.next_id(type_name)),
                };
                MockResponse::ok(match state.style {
                    DocumentStyle::Rest => rest_echo(payload_key, primary_key, id, fields),
                    DocumentStyle::JsonApi => json_api_echo(type_name, id, fields, relationships),
                })
            }
            Responder::Empty => MockResponse {
                status: 204,
                body: Value::Null,
            },
        }
    }
}

fn payload_key_of(responder: &Responder) -> Option<&str> {
    match responder {
        Responder::Echo { payload_key, .. } => Some(payload_key),
        _ => None,
    }
}

/// The record carried by a request body, flattened to `key -> value`.
#[derive(Debug, Default)]
struct RequestRecord {
    /// Attributes and relationships; JSON-API linkage becomes `{id, type}`
    fields: Map<String, Value>,
    /// JSON-API `relationships` exactly as sent
    relationships: Map<String, Value>,
}

/// REST: `body[payload_key]` when present, otherwise the body itself.
/// JSON-API: `body.data`, with `id`, `attributes` and relationship linkage
/// merged into one map.
fn request_record(
    request: &MockRequest,
    style: DocumentStyle,
    payload_key: Option<&str>,
) -> Option<RequestRecord> {
    let body = request.body.as_ref()?;
    match style {
        DocumentStyle::Rest => {
            let record = match payload_key.and_then(|key| body.get(key)) {
                Some(Value::Object(record)) => record,
                _ => body.as_object()?,
            };
            Some(RequestRecord {
                fields: record.clone(),
                relationships: Map::new(),
            })
        }
        DocumentStyle::JsonApi => {
            let data = body.get("data")?.as_object()?;
            let mut fields = Map::new();
            if let Some(id) = data.get("id") {
                fields.insert("id".to_string(), id.clone());
            }
            if let Some(Value::Object(attributes)) = data.get("attributes") {
                fields.extend(attributes.clone());
            }
            let relationships = match data.get("relationships") {
                Some(Value::Object(relationships)) => relationships.clone(),
                _ => Map::new(),
            };
            for (key, relationship) in &relationships {
                let linkage = relationship.get("data").map_or(Value::Null, stub);
                fields.insert(key.clone(), linkage);
            }
            Some(RequestRecord {
                fields,
                relationships,
            })
        }
    }
}

/// JSON-API linkage `{type, id}` as the `{id, type}` stub used for matching.
fn stub(linkage: &Value) -> Value {
    match linkage {
        Value::Array(items) => items.iter().map(stub).collect(),
        Value::Object(object) => json!({
            "id": object.get("id").cloned().unwrap_or(Value::Null),
            "type": object.get("type").cloned().unwrap_or(Value::Null),
        }),
        other => other.clone(),
    }
}

/// Rename declared field names to their payload keys.
fn keyed(fields: &Map<String, Value>, keys: &HashMap<String, String>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(field, value)| {
            let key = keys.get(field).cloned().unwrap_or_else(|| field.clone());
            (key, value.clone())
        })
        .collect()
}

/// Match `matcher` (declared field names) against a request record
/// (payload keys). A field is looked up under its payload key first.
fn record_matches(
    matcher: &Map<String, Value>,
    record: &Map<String, Value>,
    keys: &HashMap<String, String>,
) -> bool {
    matcher.iter().all(|(field, expected)| {
        keys.get(field)
            .and_then(|key| record.get(key))
            .or_else(|| record.get(field))
            .is_some_and(|found| values_match(expected, found))
    })
}

fn rest_echo(payload_key: &str, primary_key: &str, id: Value, fields: Map<String, Value>) -> Value {
    let mut record = Map::new();
    record.insert(primary_key.to_string(), id);
    record.extend(fields);
    let mut document = Map::new();
    document.insert(payload_key.to_string(), Value::Object(record));
    Value::Object(document)
}

fn json_api_echo(
    type_name: &str,
    id: Value,
    fields: Map<String, Value>,
    relationships: Map<String, Value>,
) -> Value {
    let attributes: Map<String, Value> = fields
        .into_iter()
        .filter(|(key, _)| !relationships.contains_key(key))
        .collect();
    let mut resource = Map::new();
    resource.insert("type".to_string(), Value::String(type_name.to_string()));
    resource.insert("id".to_string(), Value::String(id_string(&id)));
    resource.insert("attributes".to_string(), Value::Object(attributes));
    if !relationships.is_empty() {
        resource.insert("relationships".to_string(), Value::Object(relationships));
    }
    json!({ "data": resource })
}

fn merge_returns(
    document: &mut Value,
    root_key: &str,
    style: DocumentStyle,
    returns: &Map<String, Value>,
) {
    if returns.is_empty() {
        return;
    }
    let extend = |target: &mut Value| {
        let target = match style {
            DocumentStyle::Rest => Some(target),
            DocumentStyle::JsonApi => target.get_mut("attributes"),
        };
        if let Some(Value::Object(target)) = target {
            target.extend(returns.clone());
        }
    };
    let key = match style {
        DocumentStyle::Rest => root_key,
        DocumentStyle::JsonApi => "data",
    };
    match document.get_mut(key) {
        Some(Value::Array(records)) => records.iter_mut().for_each(extend),
        Some(record) => extend(record),
        None => {}
    }
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Does every entry of `expected` match the same key of `actual`?
pub fn subset_matches(expected: &Map<String, Value>, actual: &Map<String, Value>) -> bool {
    expected
        .iter()
        .all(|(key, value)| actual.get(key).is_some_and(|found| values_match(value, found)))
}

/// Loose equality used for request matching.
///
/// Records compare by id, ids compare by their string form, and other
/// objects match as subsets.
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .zip(actual)
                    .all(|(e, a)| values_match(e, a))
        }
        (Value::Object(expected), Value::Object(actual)) => {
            match (expected.get("id"), actual.get("id")) {
                (Some(e), Some(a)) => ids_equal(e, a),
                _ => subset_matches(expected, actual),
            }
        }
        (Value::Object(record), id) | (id, Value::Object(record)) => {
            record.get("id").is_some_and(|record_id| ids_equal(record_id, id))
        }
        (e, a) => ids_equal(e, a),
    }
}

fn ids_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(_) | Value::Number(_), Value::String(_) | Value::Number(_)) => {
            id_string(a) == id_string(b)
        }
        _ => a == b,
    }
}

/// Declared attribute and relationship names of `type_name` mapped to the
/// keys the schema serializes them under.
fn payload_keys(schema: &dyn Schema, type_name: &str) -> HashMap<String, String> {
    let Some(definition) = schema.definition(type_name) else {
        return HashMap::new();
    };
    let attributes = definition
        .attributes
        .iter()
        .map(|attr| (attr.name.clone(), schema.key_for_attribute(type_name, &attr.name)));
    let relationships = definition
        .relationships
        .iter()
        .map(|rel| (rel.name.clone(), schema.key_for_relationship(type_name, &rel.name)));
    attributes.chain(relationships).collect()
}

/// Registered mocks, newest first when matching.
#[derive(Debug, Default)]
pub struct MockRegistry {
    namespace: String,
    mocks: Vec<MockHandle>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every path with `namespace` (e.g. `/api/v1`).
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into().trim_end_matches('/').to_string();
        self
    }

    /// `/<plural>` for `type_name`.
    pub fn collection_path(&self, schema: &dyn Schema, type_name: &str) -> String {
        format!("{}/{}", self.namespace, schema.plural_key_for(type_name))
    }

    /// `/<plural>/<id>` for `type_name`.
    pub fn member_path(&self, schema: &dyn Schema, type_name: &str, id: &Value) -> String {
        format!("{}/{}", self.collection_path(schema, type_name), id_string(id))
    }

    fn register(&mut self, mock: MockHandle) -> MockHandle {
        tracing::debug!(method = %mock.method(), path = %mock.path(), "Registered mock");
        self.mocks.push(mock.clone());
        mock
    }

    /// `GET /<plural>/<id>` answered with `result`.
    pub fn mock_find_record(&mut self, schema: &dyn Schema, result: &BuildResult) -> Result<MockHandle> {
        let id = result
            .id()
            .ok_or_else(|| Error::Custom(format!("'{}' records have no id", result.type_name())))?;
        let path = self.member_path(schema, result.type_name(), id);
        let root_key = schema.payload_key_for(result.type_name());
        let style = schema.config().style;
        let keys = payload_keys(schema, result.type_name());
        Ok(self.register(MockHandle::new(
            Method::Get,
            path,
            style,
            keys,
            Responder::Document {
                document: result.unwrap(),
                root_key,
            },
        )))
    }

    /// `GET /<plural>` answered with `result`.
    pub fn mock_find_all(&mut self, schema: &dyn Schema, result: &BuildListResult) -> MockHandle {
        let path = self.collection_path(schema, result.type_name());
        let root_key = inflect::pluralize(&schema.payload_key_for(result.type_name()));
        let style = schema.config().style;
        let keys = payload_keys(schema, result.type_name());
        self.register(MockHandle::new(
            Method::Get,
            path,
            style,
            keys,
            Responder::Document {
                document: result.unwrap(),
                root_key,
            },
        ))
    }

    /// `GET /<plural>?<params>` answered with `result`. The request's query
    /// must contain `params`.
    pub fn mock_query(
        &mut self,
        schema: &dyn Schema,
        result: &BuildListResult,
        params: Value,
    ) -> MockHandle {
        let mock = self.mock_find_all(schema, result);
        if let Value::Object(params) = params {
            mock.state.borrow_mut().query = Some(params);
        }
        mock
    }

    /// `POST /<plural>`: echoes the request's record with a fresh id.
    pub fn mock_create(&mut self, schema: &dyn Schema, type_name: &str) -> Result<MockHandle> {
        self.echo(schema, Method::Post, type_name, None)
    }

    /// `PUT /<plural>/<id>`: echoes the request's record.
    pub fn mock_update(
        &mut self,
        schema: &dyn Schema,
        type_name: &str,
        id: Value,
    ) -> Result<MockHandle> {
        self.echo(schema, Method::Put, type_name, Some(id))
    }

    /// `DELETE /<plural>/<id>`: `204` with an empty body.
    pub fn mock_delete(
        &mut self,
        schema: &dyn Schema,
        type_name: &str,
        id: &Value,
    ) -> Result<MockHandle> {
        let type_name = schema.resolve(type_name)?.definition.name.clone();
        let path = self.member_path(schema, &type_name, id);
        let style = schema.config().style;
        let keys = payload_keys(schema, &type_name);
        Ok(self.register(MockHandle::new(
            Method::Delete,
            path,
            style,
            keys,
            Responder::Empty,
        )))
    }

    fn echo(
        &mut self,
        schema: &dyn Schema,
        method: Method,
        type_name: &str,
        id: Option<Value>,
    ) -> Result<MockHandle> {
        let type_name = schema.resolve(type_name)?.definition.name.clone();
        let primary_key = schema
            .primary_key_field_for(&type_name)
            .ok_or_else(|| Error::missing_primary_key(&type_name))?;
        let path = match &id {
            Some(id) => self.member_path(schema, &type_name, id),
            None => self.collection_path(schema, &type_name),
        };
        let payload_key = schema.payload_key_for(&type_name);
        let style = schema.config().style;
        let keys = payload_keys(schema, &type_name);
        Ok(self.register(MockHandle::new(
            method,
            path,
            style,
            keys,
            Responder::Echo {
                type_name,
                payload_key,
                primary_key,
                id,
            },
        )))
    }

    /// Answer `request` with the newest matching mock, if any.
    pub fn handle(
        &self,
        builder: &mut FixtureBuilder,
        request: &MockRequest,
    ) -> Option<MockResponse> {
        let Some(mock) = self.mocks.iter().rev().find(|mock| mock.matches(request)) else {
            tracing::debug!(method = %request.method, path = %request.path, "No mock matched request");
            return None;
        };
        Some(mock.respond(builder, request))
    }

    pub fn len(&self) -> usize {
        self.mocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.mocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixturekit_core::{
        FactoryConfig, Overrides, RelationshipInfo, SchemaRegistry, TypeDefinition,
    };

    fn setup(config: FactoryConfig) -> (FixtureBuilder, MockRegistry) {
        let registry = SchemaRegistry::new(config)
            .with(
                TypeDefinition::new("user")
                    .sequence("name", |n| json!(format!("User{n}")))
                    .relationship(RelationshipInfo::belongs_to("company", "company")),
            )
            .with(TypeDefinition::new("company").attr("name", "Silly corp"))
            .with(TypeDefinition::new("cat").primary_key("catId"));
        (FixtureBuilder::new(Rc::new(registry)), MockRegistry::new())
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::from_str("post"), Some(Method::Post));
        assert_eq!(Method::from_str("TRACE"), None);
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_values_match() {
        assert!(values_match(&json!(1), &json!("1")));
        assert!(values_match(&json!({"id": 1, "type": "company"}), &json!(1)));
        assert!(values_match(&json!(2), &json!({"id": "2"})));
        assert!(values_match(&json!([1, 2]), &json!([{"id": 1}, "2"])));
        assert!(!values_match(&json!([1, 2]), &json!([1])));
        assert!(values_match(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!values_match(&json!(true), &json!("true")));
    }

    #[test]
    fn test_find_record() {
        let (mut builder, mut mocks) = setup(FactoryConfig::default());
        let user = builder.build("user", &[], Overrides::new()).unwrap();
        let schema = Rc::clone(builder.schema());
        let mock = mocks.mock_find_record(schema.as_ref(), &user).unwrap();
        assert_eq!(mock.path(), "/users/1");

        let response = mocks
            .handle(&mut builder, &MockRequest::get("/users/1"))
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"user": {"id": 1, "name": "User1"}}));
        assert_eq!(mock.times_called(), 1);

        assert!(mocks.handle(&mut builder, &MockRequest::get("/users/2")).is_none());
        assert_eq!(mock.times_called(), 1);
    }

    #[test]
    fn test_find_all_returns_and_query() {
        let (mut builder, mut mocks) = setup(FactoryConfig::default());
        let users = builder.build_list("user", 2, &[], Overrides::new()).unwrap();
        let schema = Rc::clone(builder.schema());
        let all = mocks
            .mock_find_all(schema.as_ref(), &users)
            .returns(json!({"style": "funny"}));
        let query = mocks.mock_query(schema.as_ref(), &users, json!({"name": "User1"}));

        let response = mocks
            .handle(&mut builder, &MockRequest::get("/users"))
            .unwrap();
        assert_eq!(response.body["users"][1]["style"], json!("funny"));
        assert_eq!(all.times_called(), 1);

        let request = MockRequest::get("/users").query(json!({"name": "User1", "page": 2}));
        mocks.handle(&mut builder, &request).unwrap();
        assert_eq!(query.times_called(), 1);
        assert_eq!(all.times_called(), 1);
    }

    #[test]
    fn test_create_echoes_with_new_id() {
        let (mut builder, mut mocks) = setup(FactoryConfig::default());
        let schema = Rc::clone(builder.schema());
        let mock = mocks
            .mock_create(schema.as_ref(), "user")
            .unwrap()
            .match_attrs(json!({"name": "Bob", "company": 3}))
            .returns(json!({"style": "new"}));

        let request = MockRequest::post(
            "/users",
            json!({"user": {"name": "Bob", "company": {"id": "3", "type": "company"}}}),
        );
        let response = mocks.handle(&mut builder, &request).unwrap();
        assert_eq!(
            response.body,
            json!({"user": {"id": 1, "name": "Bob", "company": {"id": "3", "type": "company"}, "style": "new"}})
        );

        let other = MockRequest::post("/users", json!({"user": {"name": "Alice"}}));
        assert!(mocks.handle(&mut builder, &other).is_none());
        assert_eq!(mock.times_called(), 1);

        // Ids come from the same counters as built records.
        let user = builder.build("user", &[], Overrides::new()).unwrap();
        assert_eq!(user.id(), Some(&json!(2)));
    }

    #[test]
    fn test_update_delete_and_fails() {
        let (mut builder, mut mocks) = setup(FactoryConfig::default());
        let schema = Rc::clone(builder.schema());
        mocks
            .mock_update(schema.as_ref(), "cat", json!(5))
            .unwrap();
        let response = mocks
            .handle(&mut builder, &MockRequest::put("/cats/5", json!({"cat": {"name": "Tom"}})))
            .unwrap();
        assert_eq!(response.body, json!({"cat": {"catId": 5, "name": "Tom"}}));

        let delete = mocks.mock_delete(schema.as_ref(), "cat", &json!(5)).unwrap();
        let response = mocks
            .handle(&mut builder, &MockRequest::delete("/cats/5"))
            .unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(response.body, Value::Null);

        let delete = delete.fails(422, json!({"name": ["is taken"]}));
        let response = mocks
            .handle(&mut builder, &MockRequest::delete("/cats/5"))
            .unwrap();
        assert_eq!(response.status, 422);
        assert!(!response.is_success());
        assert_eq!(response.body, json!({"errors": {"name": ["is taken"]}}));
        assert_eq!(delete.times_called(), 2);

        assert!(matches!(
            mocks.mock_create(schema.as_ref(), "ghost"),
            Err(Error::UnknownType(_))
        ));
    }

    #[test]
    fn test_namespace_and_json_api_echo() {
        let (mut builder, _) = setup(FactoryConfig::new().style(DocumentStyle::JsonApi));
        let mut mocks = MockRegistry::new().with_namespace("/api/v1/");
        let schema = Rc::clone(builder.schema());
        let mock = mocks.mock_create(schema.as_ref(), "company").unwrap();
        assert_eq!(mock.path(), "/api/v1/companies");

        let response = mocks
            .handle(
                &mut builder,
                &MockRequest::post(
                    "/api/v1/companies",
                    json!({"data": {"type": "companies", "attributes": {"name": "Acme"}}}),
                ),
            )
            .unwrap();
        assert_eq!(
            response.body,
            json!({"data": {"type": "company", "id": "1", "attributes": {"name": "Acme"}}})
        );
        assert_eq!(mock.times_called(), 1);
    }

    #[test]
    fn test_json_api_update_matches_relationship_linkage() {
        let (mut builder, mut mocks) = setup(FactoryConfig::new().style(DocumentStyle::JsonApi));
        let schema = Rc::clone(builder.schema());
        let mock = mocks
            .mock_update(schema.as_ref(), "user", json!(4))
            .unwrap()
            .match_attrs(json!({"name": "Bob", "company": 3}));

        let body = |company: &str| {
            json!({"data": {
                "type": "users",
                "id": "4",
                "attributes": {"name": "Bob"},
                "relationships": {"company": {"data": {"type": "company", "id": company}}}
            }})
        };
        assert!(mocks.handle(&mut builder, &MockRequest::put("/users/4", body("2"))).is_none());

        let response = mocks
            .handle(&mut builder, &MockRequest::put("/users/4", body("3")))
            .unwrap();
        assert_eq!(
            response.body,
            json!({"data": {
                "type": "user",
                "id": "4",
                "attributes": {"name": "Bob"},
                "relationships": {"company": {"data": {"type": "company", "id": "3"}}}
            }})
        );
        assert_eq!(mock.times_called(), 1);
    }

    #[test]
    fn test_record_matches_uses_payload_keys() {
        let keys = HashMap::from([("entryType".to_string(), "entry_type_id".to_string())]);
        let matcher = json!({"entryType": 1});
        let Value::Object(matcher) = matcher else { unreachable!() };

        let record = json!({"title": "Dinner", "entry_type_id": 1});
        assert!(record_matches(&matcher, record.as_object().unwrap(), &keys));
        let record = json!({"title": "Dinner", "entryType": "1"});
        assert!(record_matches(&matcher, record.as_object().unwrap(), &keys));
        let record = json!({"title": "Dinner", "entry_type_id": 2});
        assert!(!record_matches(&matcher, record.as_object().unwrap(), &keys));
        assert!(!record_matches(&matcher, &Map::new(), &keys));
    }
}
