//! Fixture graph construction.
//!
//! [`FixtureBuilder`] turns a type name, trait names and overrides into a
//! normalized graph: the root record, every related record it transitively
//! references, and the sideload buckets those records are hoisted into.
//!
//! Field layering, lowest to highest:
//!
//! 1. attribute and relationship defaults from the definition
//! 2. the preset of a named fixture
//! 3. traits, left to right
//! 4. explicit overrides
//!
//! Construction is atomic: on error the counters are rolled back and no
//! partial graph is returned.

use std::fmt;
use std::rc::Rc;

use fixturekit_core::{
    AttributeDefault, AttributeInfo, EmbedMode, Error, Fabricate, FieldInput, FieldValue, Graph,
    InvalidOverrideKind, Overrides, Record, Reference, RelationshipInfo, Result, Schema,
    Sequences, Sideloads, TypeDefinition,
};
use serde_json::{Map, Value};

use crate::result::{BuildListResult, BuildResult};

/// A related record plus the sideloads it brought along.
struct Child {
    record: Rc<Record>,
    nested: Sideloads,
}

/// Builds fixture graphs against a [`Schema`].
///
/// The builder owns the id and attribute sequence counters. Call
/// [`reset`](Self::reset) between independent test cases.
pub struct FixtureBuilder {
    schema: Rc<dyn Schema>,
    sequences: Sequences,
}

impl fmt::Debug for FixtureBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureBuilder")
            .field("config", self.schema.config())
            .field("sequences", &self.sequences)
            .finish()
    }
}

impl FixtureBuilder {
    /// Create a builder whose id counters start at the schema's `id_start`.
    pub fn new(schema: Rc<dyn Schema>) -> Self {
        let start = schema.config().id_start;
        Self {
            schema,
            sequences: Sequences::new(start),
        }
    }

    pub fn schema(&self) -> &Rc<dyn Schema> {
        &self.schema
    }

    pub fn sequences(&self) -> &Sequences {
        &self.sequences
    }

    /// Allocate an id outside of a build (e.g. for an echoed create request).
    pub fn next_id(&mut self, type_name: &str) -> u64 {
        self.sequences.next_id(type_name)
    }

    /// Start a fresh counter lifetime.
    pub fn reset(&mut self) {
        self.sequences.reset();
    }

    /// Build one record of `name` (a type or named fixture).
    #[tracing::instrument(level = "debug", skip(self, overrides))]
    pub fn build(
        &mut self,
        name: &str,
        traits: &[&str],
        overrides: Overrides,
    ) -> Result<BuildResult> {
        let traits = owned(traits);
        let (root, sideloads) =
            self.atomically(|builder| builder.build_node(name, &traits, &overrides))?;
        Ok(BuildResult::new(
            Rc::clone(&self.schema),
            Graph::single(root, sideloads),
        ))
    }

    /// Build `count` records sharing the same traits and overrides.
    #[tracing::instrument(level = "debug", skip(self, overrides))]
    pub fn build_list(
        &mut self,
        name: &str,
        count: usize,
        traits: &[&str],
        overrides: Overrides,
    ) -> Result<BuildListResult> {
        let traits = owned(traits);
        let each = vec![overrides; count];
        self.build_many(name, &traits, &each)
    }

    /// Build one record per override set.
    #[tracing::instrument(level = "debug", skip(self, each), fields(count = each.len()))]
    pub fn build_list_each(&mut self, name: &str, each: Vec<Overrides>) -> Result<BuildListResult> {
        self.build_many(name, &[], &each)
    }

    fn build_many(
        &mut self,
        name: &str,
        traits: &[String],
        each: &[Overrides],
    ) -> Result<BuildListResult> {
        let type_name = self.schema.resolve(name)?.definition.name.clone();
        let (roots, sideloads) = self.atomically(|builder| {
            let mut roots = Vec::with_capacity(each.len());
            let mut sideloads = Sideloads::new();
            for overrides in each {
                let (root, nested) = builder.build_node(name, traits, overrides)?;
                roots.push(root);
                sideloads.merge(&nested);
            }
            Ok((roots, sideloads))
        })?;
        tracing::debug!(type_name = %type_name, count = roots.len(), "Built fixture list");
        Ok(BuildListResult::new(
            Rc::clone(&self.schema),
            type_name,
            Graph::list(roots, sideloads),
        ))
    }

    /// Run `f`, restoring the counters if it fails.
    fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.sequences.clone();
        let result = f(self);
        if let Err(e) = &result {
            tracing::debug!(error = %e, "Fixture build failed; counters restored");
            self.sequences = snapshot;
        }
        result
    }

    fn build_node(
        &mut self,
        name: &str,
        traits: &[String],
        overrides: &Overrides,
    ) -> Result<(Rc<Record>, Sideloads)> {
        let schema = Rc::clone(&self.schema);
        let resolved = schema.resolve(name)?;
        let def = resolved.definition;

        let mut fields = Overrides::new();
        if let Some(preset) = resolved.preset {
            fields.merge(preset);
        }
        for trait_name in traits {
            let layer = def
                .find_trait(trait_name)
                .ok_or_else(|| Error::unknown_trait(&def.name, trait_name))?;
            fields.merge(layer);
        }
        fields.merge(overrides);

        let id = self.allocate_id(schema.as_ref(), def, &mut fields)?;
        let mut record = Record::new(def.name.clone(), id.clone());

        // Attributes resolved so far, visible to derived defaults.
        let mut resolved_attrs = Map::new();
        if let Some(id) = id {
            resolved_attrs.insert("id".to_string(), id);
        }
        let pk = schema.primary_key_field_for(&def.name);

        for attribute in &def.attributes {
            if pk.as_deref() == Some(attribute.name.as_str()) {
                continue;
            }
            let value = match fields.remove(&attribute.name) {
                Some(input) => Some(plain_value(def, &attribute.name, input)?),
                None => self.default_value(def, attribute, &resolved_attrs),
            };
            if let Some(value) = value {
                resolved_attrs.insert(attribute.name.clone(), value.clone());
                record.set(attribute.name.clone(), FieldValue::Attr(value));
            }
        }

        let mut sideloads = Sideloads::new();
        for relationship in &def.relationships {
            let input = match fields.remove(&relationship.name) {
                Some(input) => input,
                None => match &relationship.default {
                    Some(default) => default.clone(),
                    None => continue,
                },
            };
            let value = self.resolve_relationship(
                schema.as_ref(),
                def,
                relationship,
                input,
                &mut sideloads,
            )?;
            record.set(relationship.name.clone(), value);
        }

        for (field, input) in fields {
            tracing::warn!(
                type_name = %def.name,
                field = %field,
                "Override for an undeclared field kept as an attribute"
            );
            let value = plain_value(def, &field, input)?;
            record.set(field, FieldValue::Attr(value));
        }

        tracing::debug!(type_name = %def.name, id = ?record.id(), "Built fixture record");
        Ok((Rc::new(record), sideloads))
    }

    /// Pick the primary-key value: a supplied `id`/primary-key field, the
    /// primary-key attribute's own default, or the type's counter.
    fn allocate_id(
        &mut self,
        schema: &dyn Schema,
        def: &TypeDefinition,
        fields: &mut Overrides,
    ) -> Result<Option<Value>> {
        if def.fragment {
            return Ok(None);
        }
        let pk = schema
            .primary_key_field_for(&def.name)
            .ok_or_else(|| Error::missing_primary_key(&def.name))?;

        let supplied = fields.remove(&pk);
        let alias = if pk == "id" { None } else { fields.remove("id") };
        if let Some(input) = supplied.or(alias) {
            return plain_value(def, &pk, input).map(Some);
        }
        if let Some(attribute) = def.find_attribute(&pk) {
            if let Some(value) = self.default_value(def, attribute, &Map::new()) {
                return Ok(Some(value));
            }
        }
        Ok(Some(Value::from(self.sequences.next_id(&def.name))))
    }

    fn default_value(
        &mut self,
        def: &TypeDefinition,
        attribute: &AttributeInfo,
        resolved: &Map<String, Value>,
    ) -> Option<Value> {
        match attribute.default.as_ref()? {
            AttributeDefault::Value(value) => Some(value.clone()),
            AttributeDefault::Sequence(generate) => {
                let n = self.sequences.next_value(&def.name, &attribute.name);
                Some(generate(n))
            }
            AttributeDefault::Derived(compute) => Some(compute(resolved)),
        }
    }

    fn resolve_relationship(
        &mut self,
        schema: &dyn Schema,
        owner: &TypeDefinition,
        relationship: &RelationshipInfo,
        input: FieldInput,
        sideloads: &mut Sideloads,
    ) -> Result<FieldValue> {
        let many = relationship.kind.is_many();
        let mismatch = |kind: InvalidOverrideKind, message: String| {
            Error::invalid_override(kind, &owner.name, &relationship.name, message)
        };
        let cardinality = |given_list: bool| {
            if given_list {
                mismatch(
                    InvalidOverrideKind::ListForSingle,
                    "a list was given for a belongsTo relationship".to_string(),
                )
            } else {
                mismatch(
                    InvalidOverrideKind::SingleForList,
                    "a single value was given for a hasMany relationship".to_string(),
                )
            }
        };

        let mut children = Vec::new();
        match input {
            FieldInput::Value(Value::Null) => return Ok(FieldValue::Attr(Value::Null)),
            FieldInput::Value(Value::Object(map)) => {
                if many {
                    return Err(cardinality(false));
                }
                let spec = Fabricate::related().overrides(Overrides::from(map));
                children.push(self.build_child(schema, owner, relationship, &spec)?);
            }
            FieldInput::Value(Value::Array(items)) => {
                if !many {
                    return Err(cardinality(true));
                }
                let objects = items.iter().filter(|item| item.is_object()).count();
                if objects == 0 {
                    return Ok(FieldValue::Attr(Value::Array(items)));
                }
                if objects != items.len() {
                    return Err(mismatch(
                        InvalidOverrideKind::MixedArray,
                        "an array may hold ids or records, not both".to_string(),
                    ));
                }
                for item in items {
                    if let Value::Object(map) = item {
                        let spec = Fabricate::related().overrides(Overrides::from(map));
                        children.push(self.build_child(schema, owner, relationship, &spec)?);
                    }
                }
            }
            FieldInput::Value(scalar) => {
                if many {
                    return Err(cardinality(false));
                }
                return Ok(FieldValue::Attr(scalar));
            }
            FieldInput::Build(spec) => {
                if many {
                    return Err(cardinality(false));
                }
                children.push(self.build_child(schema, owner, relationship, &spec)?);
            }
            FieldInput::BuildMany(specs) => {
                if !many {
                    return Err(cardinality(true));
                }
                for spec in &specs {
                    children.push(self.build_child(schema, owner, relationship, spec)?);
                }
            }
            FieldInput::Graph(graph) => {
                if graph.is_list != many {
                    return Err(cardinality(graph.is_list));
                }
                adopt(schema, owner, relationship, graph, &mut children, sideloads)?;
            }
            FieldInput::Graphs(graphs) => {
                if !many {
                    return Err(cardinality(true));
                }
                for graph in graphs {
                    adopt(schema, owner, relationship, graph, &mut children, sideloads)?;
                }
            }
        }

        // Records without identity can only live inline.
        let inline = relationship.embed == EmbedMode::Embedded
            || children.iter().any(|child| child.record.id().is_none());
        for child in &children {
            if !inline && relationship.embed.sideloads() {
                let key = schema.plural_key_for(child.record.type_name());
                if sideloads.push(&key, Rc::clone(&child.record)) {
                    tracing::trace!(key = %key, id = ?child.record.id(), "Sideloaded record");
                } else {
                    tracing::trace!(key = %key, id = ?child.record.id(), "Sideload already present");
                }
            }
            sideloads.merge(&child.nested);
        }

        let records: Vec<Rc<Record>> = children.into_iter().map(|child| child.record).collect();
        if inline {
            return Ok(if many {
                FieldValue::InlineMany(records)
            } else {
                FieldValue::Inline(single(records, owner, relationship)?)
            });
        }
        let mut references: Vec<Reference> = records
            .iter()
            .filter_map(|record| Reference::to(record, relationship.polymorphic))
            .collect();
        Ok(if many {
            FieldValue::Refs(references)
        } else {
            match references.pop() {
                Some(reference) => FieldValue::Ref(reference),
                None => return Err(missing_record(owner, relationship)),
            }
        })
    }

    fn build_child(
        &mut self,
        schema: &dyn Schema,
        owner: &TypeDefinition,
        relationship: &RelationshipInfo,
        spec: &Fabricate,
    ) -> Result<Child> {
        let name = spec.name.as_deref().unwrap_or(&relationship.target);
        let concrete = schema.resolve(name)?.definition.name.clone();
        check_kind(schema, owner, relationship, &concrete)?;
        let (record, nested) = self.build_node(name, &spec.traits, &spec.overrides)?;
        Ok(Child { record, nested })
    }
}

/// Take over the roots of a prebuilt graph; its sideloads follow its last root.
fn adopt(
    schema: &dyn Schema,
    owner: &TypeDefinition,
    relationship: &RelationshipInfo,
    graph: Graph,
    children: &mut Vec<Child>,
    sideloads: &mut Sideloads,
) -> Result<()> {
    for root in &graph.roots {
        check_kind(schema, owner, relationship, root.type_name())?;
    }
    let Graph {
        roots,
        sideloads: nested,
        ..
    } = graph;
    let last = roots.len().saturating_sub(1);
    if roots.is_empty() {
        sideloads.merge(&nested);
        return Ok(());
    }
    for (idx, record) in roots.into_iter().enumerate() {
        let nested = if idx == last {
            nested.clone()
        } else {
            Sideloads::new()
        };
        children.push(Child { record, nested });
    }
    Ok(())
}

fn check_kind(
    schema: &dyn Schema,
    owner: &TypeDefinition,
    relationship: &RelationshipInfo,
    concrete: &str,
) -> Result<()> {
    if relationship.polymorphic || schema.is_kind_of(concrete, &relationship.target) {
        return Ok(());
    }
    Err(Error::invalid_override(
        InvalidOverrideKind::TypeMismatch,
        &owner.name,
        &relationship.name,
        format!("expected '{}', got '{}'", relationship.target, concrete),
    ))
}

fn single(
    records: Vec<Rc<Record>>,
    owner: &TypeDefinition,
    relationship: &RelationshipInfo,
) -> Result<Rc<Record>> {
    records
        .into_iter()
        .next()
        .ok_or_else(|| missing_record(owner, relationship))
}

fn missing_record(owner: &TypeDefinition, relationship: &RelationshipInfo) -> Error {
    Error::invalid_override(
        InvalidOverrideKind::SingleForList,
        &owner.name,
        &relationship.name,
        "no record was given for a belongsTo relationship",
    )
}

/// Attributes only accept plain JSON values.
fn plain_value(def: &TypeDefinition, field: &str, input: FieldInput) -> Result<Value> {
    match input {
        FieldInput::Value(value) => Ok(value),
        _ => Err(Error::invalid_override(
            InvalidOverrideKind::TypeMismatch,
            &def.name,
            field,
            "records can only be assigned to relationships",
        )),
    }
}

fn owned(traits: &[&str]) -> Vec<String> {
    traits.iter().map(|t| (*t).to_string()).collect()
}
