//! Cache of computed attributes.

use std::collections::BTreeMap;

use crate::stack::{Literal, Reference};

/// Write-once map of `(node id, attribute) → literal`.
///
/// Filled level by level as synthesis resolves nodes. Each key is written exactly once;
/// a second write means two nodes claimed the same id or a node was resolved twice,
/// which the graph rules out, so it panics instead of returning an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAttributes {
    entries: BTreeMap<(String, String), Literal>,
}

impl ResolvedAttributes {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attribute.
    ///
    /// # Panics
    ///
    /// Panics if the attribute was already recorded.
    pub fn insert(&mut self, node_id: &str, attribute: &str, value: Literal) {
        let key = (node_id.to_string(), attribute.to_string());
        assert!(
            !self.entries.contains_key(&key),
            "attribute {node_id}.{attribute} was resolved twice"
        );
        self.entries.insert(key, value);
    }

    /// Record every attribute a node produced.
    ///
    /// # Panics
    ///
    /// Panics if any of them was already recorded.
    pub fn insert_all(&mut self, node_id: &str, attributes: BTreeMap<String, Literal>) {
        for (attribute, value) in attributes {
            self.insert(node_id, &attribute, value);
        }
    }

    /// Look up one attribute.
    #[must_use]
    pub fn get(&self, node_id: &str, attribute: &str) -> Option<&Literal> {
        self.entries.get(&(node_id.to_string(), attribute.to_string()))
    }

    /// Look up the attribute a reference points at.
    #[must_use]
    pub fn lookup(&self, reference: &Reference) -> Option<&Literal> {
        self.get(&reference.target, &reference.attribute)
    }

    /// Number of recorded attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
