//! Per-type id counters and per-attribute sequence counters.
//!
//! Counters only ever move forward within one lifetime; [`Sequences::reset`]
//! starts a fresh lifetime (one per test case).

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Sequences {
    start: u64,
    /// Next value to hand out, per key
    ids: HashMap<String, u64>,
    attributes: HashMap<(String, String), u64>,
}

impl Default for Sequences {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Sequences {
    /// Create counters whose first value is `start`.
    pub fn new(start: u64) -> Self {
        Self {
            start,
            ids: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    /// Allocate the next id for `type_name`.
    pub fn next_id(&mut self, type_name: &str) -> u64 {
        Self::advance(&mut self.ids, type_name.to_string(), self.start)
    }

    /// The last id handed out for `type_name` (0 if none).
    pub fn last_id(&self, type_name: &str) -> u64 {
        self.ids.get(type_name).map_or(0, |next| next - 1)
    }

    /// Advance the sequence behind `type_name.attribute`.
    pub fn next_value(&mut self, type_name: &str, attribute: &str) -> u64 {
        Self::advance(
            &mut self.attributes,
            (type_name.to_string(), attribute.to_string()),
            1,
        )
    }

    /// Forget every counter.
    pub fn reset(&mut self) {
        tracing::trace!(
            types = self.ids.len(),
            sequences = self.attributes.len(),
            "Resetting fixture sequences"
        );
        self.ids.clear();
        self.attributes.clear();
    }

    fn advance<K: std::hash::Hash + Eq>(map: &mut HashMap<K, u64>, key: K, start: u64) -> u64 {
        let next = map.entry(key).or_insert(start);
        let value = *next;
        *next += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_per_type_and_monotonic() {
        let mut seq = Sequences::default();
        assert_eq!(seq.next_id("user"), 1);
        assert_eq!(seq.next_id("user"), 2);
        assert_eq!(seq.next_id("company"), 1);
        assert_eq!(seq.last_id("user"), 2);
        assert_eq!(seq.last_id("project"), 0);
    }

    #[test]
    fn test_attribute_sequences_are_independent_of_ids() {
        let mut seq = Sequences::default();
        seq.next_id("dog");
        seq.next_id("dog");
        assert_eq!(seq.next_value("dog", "dogNumber"), 1);
        assert_eq!(seq.next_value("dog", "dogNumber"), 2);
        assert_eq!(seq.next_value("dog", "name"), 1);
    }

    #[test]
    fn test_reset() {
        let mut seq = Sequences::default();
        seq.next_id("user");
        seq.next_value("user", "name");
        seq.reset();
        assert_eq!(seq.next_id("user"), 1);
        assert_eq!(seq.next_value("user", "name"), 1);
    }

    #[test]
    fn test_custom_start() {
        let mut seq = Sequences::new(100);
        assert_eq!(seq.next_id("user"), 100);
        assert_eq!(seq.next_id("user"), 101);
        assert_eq!(seq.next_value("user", "name"), 1);
    }
}
