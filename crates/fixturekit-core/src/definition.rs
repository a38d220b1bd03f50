//! Fixture definitions: attributes, relationships, traits and named presets.
//!
//! A [`TypeDefinition`] is the runtime stand-in for a model class plus its
//! serializer configuration. Definitions are plain data assembled with
//! builder-style methods and handed to a [`SchemaRegistry`](crate::SchemaRegistry).

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::input::{FieldInput, Overrides};

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationshipKind {
    /// `belongsTo`: a single related record.
    #[default]
    BelongsTo,
    /// `hasMany`: an ordered list of related records.
    HasMany,
}

impl RelationshipKind {
    /// Does this relationship hold a list?
    #[must_use]
    pub const fn is_many(self) -> bool {
        matches!(self, RelationshipKind::HasMany)
    }
}

/// How related records show up in the serialized document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmbedMode {
    /// Inline the foreign key and hoist the record into a sideload list.
    #[default]
    Reference,
    /// Inline the full record; it never appears in a sideload list.
    Embedded,
    /// Inline id/type stubs only; the record is not sideloaded.
    EmbeddedIds,
}

impl EmbedMode {
    /// Does this mode hoist records into sideload lists?
    #[must_use]
    pub const fn sideloads(self) -> bool {
        matches!(self, EmbedMode::Reference)
    }
}

/// Default value of an attribute.
#[derive(Clone)]
pub enum AttributeDefault {
    /// A constant.
    Value(Value),
    /// Generated from a per-(type, attribute) counter starting at 1.
    Sequence(Rc<dyn Fn(u64) -> Value>),
    /// Computed from the attributes resolved before it (including `id`).
    Derived(Rc<dyn Fn(&Map<String, Value>) -> Value>),
}

impl fmt::Debug for AttributeDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            AttributeDefault::Sequence(_) => f.write_str("Sequence(<fn>)"),
            AttributeDefault::Derived(_) => f.write_str("Derived(<fn>)"),
        }
    }
}

/// Metadata about a fixture attribute.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    /// Attribute name as written in overrides
    pub name: String,
    /// Value used when no preset or override supplies one
    pub default: Option<AttributeDefault>,
    /// Structured values need the serializer's custom transform
    pub custom: bool,
    /// Custom transform; when unset the value is encoded as a JSON string
    pub transform: Option<fn(&Value) -> Value>,
}

impl AttributeInfo {
    /// Create an attribute without a default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            custom: false,
            transform: None,
        }
    }

    /// Set a constant default.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(AttributeDefault::Value(value.into()));
        self
    }

    /// Default to a generated sequence value.
    pub fn sequence(mut self, generator: impl Fn(u64) -> Value + 'static) -> Self {
        self.default = Some(AttributeDefault::Sequence(Rc::new(generator)));
        self
    }

    /// Default to a value derived from the attributes resolved so far.
    pub fn derived(mut self, compute: impl Fn(&Map<String, Value>) -> Value + 'static) -> Self {
        self.default = Some(AttributeDefault::Derived(Rc::new(compute)));
        self
    }

    /// Mark as a custom attribute type, serialized with `transform` (or JSON
    /// string encoding when `None`).
    pub fn custom(mut self, transform: Option<fn(&Value) -> Value>) -> Self {
        self.custom = true;
        self.transform = transform;
        self
    }
}

/// Metadata about a relationship between fixture types.
#[derive(Debug, Clone)]
pub struct RelationshipInfo {
    /// Name of the relationship field.
    pub name: String,

    /// The declared related type (may be abstract for polymorphic relationships).
    pub target: String,

    /// Kind of relationship.
    pub kind: RelationshipKind,

    /// Serialization mode.
    pub embed: EmbedMode,

    /// Whether concrete subtypes of `target` are accepted; references then
    /// carry a type discriminator.
    pub polymorphic: bool,

    /// Custom payload key for the field.
    pub key_fn: Option<fn(&str) -> String>,

    /// Value used when no preset or override supplies one.
    pub default: Option<FieldInput>,
}

impl RelationshipInfo {
    /// Create a new relationship with required fields.
    pub fn new(name: impl Into<String>, target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind,
            embed: EmbedMode::Reference,
            polymorphic: false,
            key_fn: None,
            default: None,
        }
    }

    /// A `belongsTo` relationship.
    pub fn belongs_to(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationshipKind::BelongsTo)
    }

    /// A `hasMany` relationship.
    pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationshipKind::HasMany)
    }

    /// Set the serialization mode.
    #[must_use]
    pub fn embed(mut self, mode: EmbedMode) -> Self {
        self.embed = mode;
        self
    }

    /// Shorthand for `embed(EmbedMode::Embedded)`.
    #[must_use]
    pub fn embedded(self) -> Self {
        self.embed(EmbedMode::Embedded)
    }

    /// Enable/disable polymorphic references.
    #[must_use]
    pub fn polymorphic(mut self, value: bool) -> Self {
        self.polymorphic = value;
        self
    }

    /// Set a custom key transform for the field name.
    #[must_use]
    pub fn key(mut self, f: fn(&str) -> String) -> Self {
        self.key_fn = Some(f);
        self
    }

    /// Set the default value used when nothing else supplies one.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<FieldInput>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A fixture type: model shape plus serializer settings.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    /// Type name, dasherized by convention (`comic-book`)
    pub name: String,
    /// Parent type for polymorphic matching
    pub parent: Option<String>,
    /// Primary-key field; `None` when the strategy is unknown
    pub primary_key: Option<String>,
    /// Value objects without identity
    pub fragment: bool,
    pub attributes: Vec<AttributeInfo>,
    pub relationships: Vec<RelationshipInfo>,
    /// Named override presets applied on request
    pub traits: Vec<(String, Overrides)>,
    /// Named fixtures that build this type with a preset
    pub named: Vec<(String, Overrides)>,
    /// Fields dropped from serialized documents
    pub forbidden: Vec<String>,
    /// Root key override (default: camelized name)
    pub payload_key: Option<String>,
    /// Sideload key override (default: dasherized plural)
    pub plural_key: Option<String>,
}

impl TypeDefinition {
    /// Create a definition with an `id` primary key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            primary_key: Some("id".to_string()),
            fragment: false,
            attributes: Vec::new(),
            relationships: Vec::new(),
            traits: Vec::new(),
            named: Vec::new(),
            forbidden: Vec::new(),
            payload_key: None,
            plural_key: None,
        }
    }

    /// Declare a value-object type that carries no primary key.
    #[must_use]
    pub fn fragment(mut self) -> Self {
        self.fragment = true;
        self.primary_key = None;
        self
    }

    /// Use a custom primary-key field.
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Declare the parent type (for polymorphic relationships).
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn attribute(mut self, info: AttributeInfo) -> Self {
        self.attributes.push(info);
        self
    }

    /// Add an attribute with a constant default.
    #[must_use]
    pub fn attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attribute(AttributeInfo::new(name).default_value(value))
    }

    /// Add an attribute generated from a sequence.
    #[must_use]
    pub fn sequence(
        self,
        name: impl Into<String>,
        generator: impl Fn(u64) -> Value + 'static,
    ) -> Self {
        self.attribute(AttributeInfo::new(name).sequence(generator))
    }

    /// Add a relationship.
    #[must_use]
    pub fn relationship(mut self, info: RelationshipInfo) -> Self {
        self.relationships.push(info);
        self
    }

    /// Declare a trait.
    #[must_use]
    pub fn with_trait(mut self, name: impl Into<String>, overrides: Overrides) -> Self {
        self.traits.push((name.into(), overrides));
        self
    }

    /// Declare a named fixture of this type.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, overrides: Overrides) -> Self {
        self.named.push((name.into(), overrides));
        self
    }

    /// Exclude a field from serialized documents.
    #[must_use]
    pub fn forbid(mut self, field: impl Into<String>) -> Self {
        self.forbidden.push(field.into());
        self
    }

    /// Override the root payload key.
    #[must_use]
    pub fn payload_key(mut self, key: impl Into<String>) -> Self {
        self.payload_key = Some(key.into());
        self
    }

    /// Override the sideload (plural) key.
    #[must_use]
    pub fn plural_key(mut self, key: impl Into<String>) -> Self {
        self.plural_key = Some(key.into());
        self
    }

    pub fn find_attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn find_relationship(&self, name: &str) -> Option<&RelationshipInfo> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn find_trait(&self, name: &str) -> Option<&Overrides> {
        self.traits
            .iter()
            .find(|(trait_name, _)| trait_name == name)
            .map(|(_, overrides)| overrides)
    }

    pub fn find_named(&self, name: &str) -> Option<&Overrides> {
        self.named
            .iter()
            .find(|(fixture, _)| fixture == name)
            .map(|(_, overrides)| overrides)
    }

    /// Is `field` a declared attribute, relationship, or the primary key?
    pub fn declares(&self, field: &str) -> bool {
        field == "id"
            || self.primary_key.as_deref() == Some(field)
            || self.find_attribute(field).is_some()
            || self.find_relationship(field).is_some()
    }

    pub fn is_forbidden(&self, field: &str) -> bool {
        self.forbidden.iter().any(|f| f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relationship_kind_default() {
        assert_eq!(RelationshipKind::default(), RelationshipKind::BelongsTo);
        assert!(RelationshipKind::HasMany.is_many());
        assert!(!RelationshipKind::BelongsTo.is_many());
    }

    #[test]
    fn test_relationship_info_builder_chain() {
        let info = RelationshipInfo::has_many("hats", "hat")
            .polymorphic(true)
            .embed(EmbedMode::EmbeddedIds);

        assert_eq!(info.name, "hats");
        assert_eq!(info.target, "hat");
        assert_eq!(info.kind, RelationshipKind::HasMany);
        assert_eq!(info.embed, EmbedMode::EmbeddedIds);
        assert!(info.polymorphic);
        assert!(info.default.is_none());
        assert!(!info.embed.sideloads());
    }

    #[test]
    fn test_type_definition_lookups() {
        let def = TypeDefinition::new("user")
            .attr("style", "normal")
            .sequence("name", |n| json!(format!("User{n}")))
            .relationship(RelationshipInfo::belongs_to("company", "company"))
            .with_trait("with_company", Overrides::new())
            .forbid("password");

        assert!(def.find_attribute("style").is_some());
        assert!(def.find_attribute("company").is_none());
        assert!(def.find_relationship("company").is_some());
        assert!(def.find_trait("with_company").is_some());
        assert!(def.find_trait("with_hats").is_none());
        assert!(def.declares("id"));
        assert!(def.declares("name"));
        assert!(!def.declares("info"));
        assert!(def.is_forbidden("password"));
        assert_eq!(def.primary_key.as_deref(), Some("id"));
    }

    #[test]
    fn test_fragment_has_no_primary_key() {
        let def = TypeDefinition::new("billing-address").fragment();
        assert!(def.fragment);
        assert_eq!(def.primary_key, None);
    }

    #[test]
    fn test_attribute_default_debug() {
        let info = AttributeInfo::new("name").sequence(|n| json!(n));
        assert_eq!(format!("{:?}", info.default), "Some(Sequence(<fn>))");
        let info = AttributeInfo::new("style").default_value("normal");
        assert!(matches!(info.default, Some(AttributeDefault::Value(_))));
    }
}
