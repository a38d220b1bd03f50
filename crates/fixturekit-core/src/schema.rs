//! The schema collaborator: everything the builder and renderers need to know
//! about fixture types and their serializers.
//!
//! [`Schema`] is the seam between the fixture machinery and whatever describes
//! the models. [`SchemaRegistry`] is the in-memory implementation backed by
//! [`TypeDefinition`]s.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::config::FactoryConfig;
use crate::definition::TypeDefinition;
use crate::error::{Error, Result};
use crate::inflect;
use crate::input::Overrides;

/// A resolved type name: its definition plus the preset of a named fixture.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub definition: &'a TypeDefinition,
    pub preset: Option<&'a Overrides>,
}

/// Type and serializer metadata consumed by the builder and renderers.
///
/// Only [`definition`](Schema::definition) and [`config`](Schema::config) are
/// required; every serializer hook has a conventional default.
pub trait Schema {
    /// Look up a type by name.
    fn definition(&self, type_name: &str) -> Option<&TypeDefinition>;

    /// Rendering configuration.
    fn config(&self) -> &FactoryConfig;

    /// Look up a named fixture (e.g. `bat_man`).
    fn named_fixture(&self, _name: &str) -> Option<(&TypeDefinition, &Overrides)> {
        None
    }

    /// Resolve a type name or named fixture.
    fn resolve(&self, name: &str) -> Result<Resolved<'_>> {
        if let Some(definition) = self.definition(name) {
            return Ok(Resolved {
                definition,
                preset: None,
            });
        }
        match self.named_fixture(name) {
            Some((definition, preset)) => Ok(Resolved {
                definition,
                preset: Some(preset),
            }),
            None => Err(Error::unknown_type(name)),
        }
    }

    /// Root key of a single-record document (`comicBook`).
    fn payload_key_for(&self, type_name: &str) -> String {
        self.definition(type_name)
            .and_then(|def| def.payload_key.clone())
            .unwrap_or_else(|| inflect::camelize(type_name))
    }

    /// Sideload collection key (`super-heros`).
    fn plural_key_for(&self, type_name: &str) -> String {
        self.definition(type_name)
            .and_then(|def| def.plural_key.clone())
            .unwrap_or_else(|| inflect::pluralize(&inflect::dasherize(type_name)))
    }

    /// Discriminator written into polymorphic references (`big_hat`).
    fn type_key_for(&self, type_name: &str) -> String {
        self.config().type_keys.apply(type_name)
    }

    /// Field holding the primary key; `None` when it cannot be determined.
    fn primary_key_field_for(&self, type_name: &str) -> Option<String> {
        self.definition(type_name)?.primary_key.clone()
    }

    fn is_forbidden_field(&self, type_name: &str, field: &str) -> bool {
        self.definition(type_name)
            .is_some_and(|def| def.is_forbidden(field))
    }

    /// Serialized form of a custom attribute, or `None` when the value passes
    /// through unchanged (primitives, or attributes not declared custom).
    fn serialize_custom_attribute(
        &self,
        type_name: &str,
        field: &str,
        value: &Value,
    ) -> Option<Value> {
        if !(value.is_object() || value.is_array()) {
            return None;
        }
        let attribute = self.definition(type_name)?.find_attribute(field)?;
        if !attribute.custom {
            return None;
        }
        Some(match attribute.transform {
            Some(transform) => transform(value),
            None => Value::String(value.to_string()),
        })
    }

    /// Payload key of an attribute.
    fn key_for_attribute(&self, _type_name: &str, field: &str) -> String {
        self.config().attribute_keys.apply(field)
    }

    /// Payload key of a relationship.
    fn key_for_relationship(&self, type_name: &str, field: &str) -> String {
        let custom = self
            .definition(type_name)
            .and_then(|def| def.find_relationship(field))
            .and_then(|rel| rel.key_fn.map(|f| f(field)));
        custom.unwrap_or_else(|| self.config().attribute_keys.apply(field))
    }

    /// Is `concrete` the same type as `target`, or a descendant of it?
    fn is_kind_of(&self, concrete: &str, target: &str) -> bool {
        let mut current = concrete.to_string();
        // Parent chains are short; the bound stops accidental cycles.
        for _ in 0..32 {
            if current == target {
                return true;
            }
            match self.definition(&current).and_then(|def| def.parent.clone()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

type PayloadKeyFn = Box<dyn Fn(&str) -> String>;

/// In-memory [`Schema`] backed by [`TypeDefinition`]s.
pub struct SchemaRegistry {
    definitions: HashMap<String, TypeDefinition>,
    /// Named fixture -> owning type
    named: HashMap<String, String>,
    config: FactoryConfig,
    payload_key_fn: RefCell<Option<PayloadKeyFn>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.definitions.len())
            .field("named", &self.named.len())
            .field("config", &self.config)
            .field("payload_key_fn", &self.payload_key_fn.borrow().is_some())
            .finish()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new(FactoryConfig::default())
    }
}

impl SchemaRegistry {
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            definitions: HashMap::new(),
            named: HashMap::new(),
            config,
            payload_key_fn: RefCell::new(None),
        }
    }

    /// Register a definition (replacing any previous one of the same name).
    pub fn define(&mut self, definition: TypeDefinition) -> &mut Self {
        for (fixture, _) in &definition.named {
            if let Some(previous) = self.named.insert(fixture.clone(), definition.name.clone()) {
                if previous != definition.name {
                    tracing::warn!(
                        fixture = %fixture,
                        previous = %previous,
                        current = %definition.name,
                        "Named fixture redefined for a different type"
                    );
                }
            }
        }
        if self.definitions.contains_key(&definition.name) {
            tracing::debug!(type_name = %definition.name, "Replacing fixture definition");
        }
        self.definitions.insert(definition.name.clone(), definition);
        self
    }

    /// Builder-style [`define`](Self::define).
    #[must_use]
    pub fn with(mut self, definition: TypeDefinition) -> Self {
        self.define(definition);
        self
    }

    /// Replace the root payload key function for every type.
    pub fn set_payload_key_fn(&self, f: impl Fn(&str) -> String + 'static) {
        *self.payload_key_fn.borrow_mut() = Some(Box::new(f));
    }

    /// Restore the default root payload keys.
    pub fn clear_payload_key_fn(&self) {
        *self.payload_key_fn.borrow_mut() = None;
    }

    pub fn config_mut(&mut self) -> &mut FactoryConfig {
        &mut self.config
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Schema for SchemaRegistry {
    fn definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.definitions.get(type_name)
    }

    fn config(&self) -> &FactoryConfig {
        &self.config
    }

    fn named_fixture(&self, name: &str) -> Option<(&TypeDefinition, &Overrides)> {
        let definition = self.definitions.get(self.named.get(name)?)?;
        Some((definition, definition.find_named(name)?))
    }

    fn payload_key_for(&self, type_name: &str) -> String {
        if let Some(f) = self.payload_key_fn.borrow().as_ref() {
            return f(type_name);
        }
        self.definition(type_name)
            .and_then(|def| def.payload_key.clone())
            .unwrap_or_else(|| inflect::camelize(type_name))
    }
}
