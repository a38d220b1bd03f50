//! Override inputs: what a test (or a trait) asks the builder to put in a field.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::Graph;

/// A request to build a related record.
///
/// With no type name the relationship's declared target is built; otherwise
/// the named type or named fixture (e.g. a concrete subtype on a polymorphic
/// relationship).
#[derive(Debug, Clone, Default)]
pub struct Fabricate {
    pub name: Option<String>,
    pub traits: Vec<String>,
    pub overrides: Overrides,
}

impl Fabricate {
    /// Build the given type or named fixture.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Build the relationship's declared target type.
    pub fn related() -> Self {
        Self::default()
    }

    /// Apply a trait.
    #[must_use]
    pub fn with_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.push(name.into());
        self
    }

    /// Override a field.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldInput>) -> Self {
        self.overrides.insert(field, value);
        self
    }

    /// Replace all overrides.
    #[must_use]
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Build `count` copies of this request, as a list value.
    pub fn times(self, count: usize) -> FieldInput {
        FieldInput::BuildMany(vec![self; count])
    }
}

/// A value supplied for a field by a trait, a named fixture, or a test.
#[derive(Debug, Clone)]
pub enum FieldInput {
    /// A scalar, a mapping (nested overrides for a relationship), or an array
    /// of either.
    Value(Value),
    /// A prebuilt record or list of records, adopted as-is.
    Graph(Graph),
    /// Several prebuilt records.
    Graphs(Vec<Graph>),
    /// Build one related record.
    Build(Fabricate),
    /// Build a list of related records.
    BuildMany(Vec<Fabricate>),
}

impl FieldInput {
    /// The plain JSON value, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldInput::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for FieldInput {
    fn from(value: Value) -> Self {
        FieldInput::Value(value)
    }
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

impl From<String> for FieldInput {
    fn from(value: String) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

impl From<i64> for FieldInput {
    fn from(value: i64) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

impl From<i32> for FieldInput {
    fn from(value: i32) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

impl From<u64> for FieldInput {
    fn from(value: u64) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

impl From<f64> for FieldInput {
    fn from(value: f64) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

impl From<bool> for FieldInput {
    fn from(value: bool) -> Self {
        FieldInput::Value(Value::from(value))
    }
}

impl From<Fabricate> for FieldInput {
    fn from(value: Fabricate) -> Self {
        FieldInput::Build(value)
    }
}

impl From<Vec<Fabricate>> for FieldInput {
    fn from(value: Vec<Fabricate>) -> Self {
        FieldInput::BuildMany(value)
    }
}

impl From<Graph> for FieldInput {
    fn from(value: Graph) -> Self {
        FieldInput::Graph(value)
    }
}

impl From<Vec<Graph>> for FieldInput {
    fn from(value: Vec<Graph>) -> Self {
        FieldInput::Graphs(value)
    }
}

/// Ordered field overrides. Inserting an existing field replaces its value in
/// place (last write wins).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: Vec<(String, FieldInput)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a JSON object into overrides.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::Custom(format!(
                "overrides must be a JSON object, got {other}"
            ))),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldInput>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldInput>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldInput> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldInput> {
        let idx = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: &Overrides) {
        for (field, value) in &other.entries {
            self.insert(field.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldInput)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Map<String, Value>> for Overrides {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<FieldInput>> FromIterator<(K, V)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overrides = Overrides::new();
        for (k, v) in iter {
            overrides.insert(k, v);
        }
        overrides
    }
}

impl IntoIterator for Overrides {
    type Item = (String, FieldInput);
    type IntoIter = std::vec::IntoIter<(String, FieldInput)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_replaces_in_place() {
        let overrides = Overrides::new()
            .set("name", "first")
            .set("style", "normal")
            .set("name", "second");

        let keys: Vec<_> = overrides.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "style"]);
        assert_eq!(
            overrides.get("name").and_then(FieldInput::as_value),
            Some(&json!("second"))
        );
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut base = Overrides::new().set("a", 1).set("b", 2);
        let top = Overrides::new().set("b", 20).set("c", 30);
        base.merge(&top);

        assert_eq!(base.len(), 3);
        assert_eq!(base.get("b").and_then(FieldInput::as_value), Some(&json!(20)));
        assert_eq!(base.get("c").and_then(FieldInput::as_value), Some(&json!(30)));
    }

    #[test]
    fn test_from_json() {
        let overrides = Overrides::from_json(json!({"name": "A Corp", "size": 3})).unwrap();
        assert_eq!(overrides.len(), 2);
        assert!(overrides.contains("size"));

        assert!(Overrides::from_json(json!(null)).unwrap().is_empty());
        assert!(matches!(
            Overrides::from_json(json!([1, 2])),
            Err(Error::Custom(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut overrides = Overrides::new().set("a", 1).set("b", 2);
        assert!(overrides.remove("a").is_some());
        assert!(overrides.remove("a").is_none());
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn test_fabricate_builder() {
        let spec = Fabricate::new("big-hat")
            .with_trait("square")
            .set("color", "red");
        assert_eq!(spec.name.as_deref(), Some("big-hat"));
        assert_eq!(spec.traits, vec!["square".to_string()]);
        assert!(spec.overrides.contains("color"));

        match spec.times(3) {
            FieldInput::BuildMany(list) => assert_eq!(list.len(), 3),
            other => panic!("expected BuildMany, got {other:?}"),
        }
    }
}
