//! Document rendering.
//!
//! Three views of the same graph:
//!
//! - [`record_value`]: the `get` view (field names as declared, `id` first,
//!   custom attributes structured, forbidden fields present)
//! - [`rest_document`]: `{ rootKey: ..., sideloadKey: [...] }`
//! - [`json_api_document`]: `{ data: ..., included: [...] }`

use std::rc::Rc;

use fixturekit_core::{FieldValue, Graph, Record, Reference, RelationshipInfo, Schema};
use serde_json::{Map, Value, json};

/// A reference stub: the bare id, or `{id, type}` when polymorphic.
pub fn reference_value(schema: &dyn Schema, reference: &Reference) -> Value {
    if reference.polymorphic {
        json!({
            "id": reference.id,
            "type": schema.type_key_for(&reference.type_name),
        })
    } else {
        reference.id.clone()
    }
}

/// Render a record for `get`.
pub fn record_value(schema: &dyn Schema, record: &Record) -> Value {
    let mut object = Map::new();
    if let Some(id) = record.id() {
        object.insert("id".to_string(), id.clone());
    }
    for (name, value) in record.fields() {
        object.insert(name.to_string(), field_value(schema, value));
    }
    Value::Object(object)
}

/// Render one field for `get`.
pub fn field_value(schema: &dyn Schema, value: &FieldValue) -> Value {
    match value {
        FieldValue::Attr(v) => v.clone(),
        FieldValue::Ref(reference) => reference_value(schema, reference),
        FieldValue::Refs(references) => references
            .iter()
            .map(|r| reference_value(schema, r))
            .collect(),
        FieldValue::Inline(child) => record_value(schema, child),
        FieldValue::InlineMany(children) => children
            .iter()
            .map(|child| record_value(schema, child))
            .collect(),
    }
}

fn relationship<'a>(
    schema: &'a dyn Schema,
    type_name: &str,
    field: &str,
) -> Option<&'a RelationshipInfo> {
    schema.definition(type_name)?.find_relationship(field)
}

fn payload_key(schema: &dyn Schema, type_name: &str, field: &str) -> String {
    if relationship(schema, type_name, field).is_some() {
        schema.key_for_relationship(type_name, field)
    } else {
        schema.key_for_attribute(type_name, field)
    }
}

fn attribute_value(schema: &dyn Schema, type_name: &str, field: &str, value: &Value) -> Value {
    schema
        .serialize_custom_attribute(type_name, field, value)
        .unwrap_or_else(|| value.clone())
}

/// Render a record as it appears in a REST document.
///
/// The id goes under the type's primary-key field; forbidden fields are
/// dropped; keys and custom attributes go through the schema's serializer
/// hooks.
pub fn rest_record(schema: &dyn Schema, record: &Record) -> Value {
    let type_name = record.type_name();
    let mut object = Map::new();
    if let Some(id) = record.id() {
        let pk = schema
            .primary_key_field_for(type_name)
            .unwrap_or_else(|| "id".to_string());
        object.insert(pk, id.clone());
    }
    for (name, value) in record.fields() {
        if schema.is_forbidden_field(type_name, name) {
            continue;
        }
        let rendered = match value {
            FieldValue::Attr(v) => attribute_value(schema, type_name, name, v),
            FieldValue::Ref(reference) => reference_value(schema, reference),
            FieldValue::Refs(references) => references
                .iter()
                .map(|r| reference_value(schema, r))
                .collect(),
            FieldValue::Inline(child) => rest_record(schema, child),
            FieldValue::InlineMany(children) => children
                .iter()
                .map(|child| rest_record(schema, child))
                .collect(),
        };
        object.insert(payload_key(schema, type_name, name), rendered);
    }
    Value::Object(object)
}

/// Render a REST document rooted at `root_key`.
pub fn rest_document(
    schema: &dyn Schema,
    root_key: &str,
    graph: &Graph,
    meta: Option<&Value>,
) -> Value {
    let mut document = Map::new();
    let root = if graph.is_list {
        graph
            .roots
            .iter()
            .map(|record| rest_record(schema, record))
            .collect()
    } else {
        graph
            .roots
            .first()
            .map_or(Value::Null, |record| rest_record(schema, record))
    };
    document.insert(root_key.to_string(), root);

    for (key, records) in graph.sideloads.iter() {
        match document.get_mut(key) {
            // A bucket sharing the root list's key joins it, minus the roots.
            Some(Value::Array(existing)) => existing.extend(
                records
                    .iter()
                    .filter(|record| !graph.roots.iter().any(|root| Rc::ptr_eq(root, record)))
                    .map(|record| rest_record(schema, record)),
            ),
            Some(_) => {
                tracing::warn!(key, "Sideload key collides with the root record; bucket dropped");
            }
            None => {
                let rendered = records.iter().map(|record| rest_record(schema, record));
                document.insert(key.to_string(), rendered.collect());
            }
        }
    }
    if let Some(meta) = meta {
        document.insert("meta".to_string(), meta.clone());
    }
    tracing::trace!(root_key, keys = document.len(), "Rendered REST document");
    Value::Object(document)
}

/// JSON-API ids are strings.
fn id_string(id: &Value) -> Value {
    match id {
        Value::String(_) => id.clone(),
        other => Value::String(other.to_string()),
    }
}

fn linkage(type_name: &str, id: &Value) -> Value {
    json!({ "type": type_name, "id": id_string(id) })
}

/// Linkage for a foreign key supplied verbatim (a bare id or list of ids).
fn terminal_linkage(relationship: &RelationshipInfo, value: &Value) -> Value {
    let target = relationship.target.as_str();
    match value {
        Value::Null => Value::Null,
        Value::Array(ids) => ids.iter().map(|id| linkage(target, id)).collect(),
        id => linkage(target, id),
    }
}

/// Render a record as a JSON-API resource object.
pub fn json_api_resource(schema: &dyn Schema, record: &Record) -> Value {
    let type_name = record.type_name();
    let mut attributes = Map::new();
    let mut relationships = Map::new();

    for (name, value) in record.fields() {
        if schema.is_forbidden_field(type_name, name) {
            continue;
        }
        let key = payload_key(schema, type_name, name);
        match value {
            FieldValue::Attr(v) => match relationship(schema, type_name, name) {
                Some(rel) => {
                    relationships.insert(key, json!({ "data": terminal_linkage(rel, v) }));
                }
                None => {
                    attributes.insert(key, attribute_value(schema, type_name, name, v));
                }
            },
            FieldValue::Ref(r) => {
                relationships.insert(key, json!({ "data": linkage(&r.type_name, &r.id) }));
            }
            FieldValue::Refs(refs) => {
                let data: Vec<Value> = refs.iter().map(|r| linkage(&r.type_name, &r.id)).collect();
                relationships.insert(key, json!({ "data": data }));
            }
            FieldValue::Inline(child) => match child.id() {
                Some(id) => {
                    relationships.insert(key, json!({ "data": linkage(child.type_name(), id) }));
                }
                None => {
                    attributes.insert(key, rest_record(schema, child));
                }
            },
            FieldValue::InlineMany(children) => {
                if children.iter().all(|child| child.id().is_some()) {
                    let data: Vec<Value> = children
                        .iter()
                        .filter_map(|child| Some(linkage(child.type_name(), child.id()?)))
                        .collect();
                    relationships.insert(key, json!({ "data": data }));
                } else {
                    let fragments: Vec<Value> = children
                        .iter()
                        .map(|child| rest_record(schema, child))
                        .collect();
                    attributes.insert(key, Value::Array(fragments));
                }
            }
        }
    }

    let mut resource = Map::new();
    resource.insert("type".to_string(), Value::String(type_name.to_string()));
    if let Some(id) = record.id() {
        resource.insert("id".to_string(), id_string(id));
    }
    resource.insert("attributes".to_string(), Value::Object(attributes));
    if !relationships.is_empty() {
        resource.insert("relationships".to_string(), Value::Object(relationships));
    }
    Value::Object(resource)
}

/// Render a JSON-API document. Every non-root record with an id lands in
/// `included`, whether it was sideloaded or embedded.
pub fn json_api_document(schema: &dyn Schema, graph: &Graph, meta: Option<&Value>) -> Value {
    let data = if graph.is_list {
        graph
            .roots
            .iter()
            .map(|record| json_api_resource(schema, record))
            .collect()
    } else {
        graph
            .roots
            .first()
            .map_or(Value::Null, |record| json_api_resource(schema, record))
    };

    let included: Vec<Value> = graph
        .all_records()
        .iter()
        .filter(|record| {
            record.id().is_some() && !graph.roots.iter().any(|root| Rc::ptr_eq(root, *record))
        })
        .map(|record| json_api_resource(schema, record))
        .collect();

    let mut document = Map::new();
    document.insert("data".to_string(), data);
    if !included.is_empty() {
        document.insert("included".to_string(), Value::Array(included));
    }
    if let Some(meta) = meta {
        document.insert("meta".to_string(), meta.clone());
    }
    tracing::trace!(included = document.get("included").is_some(), "Rendered JSON-API document");
    Value::Object(document)
}
