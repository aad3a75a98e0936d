//! Manager for the indexed property
//!
//! Keeps the reverse index in step with committed tree changes.

use super::property_index::PropertyIndex;
use crate::tree::{IndexChange, NodePath, NodeTree, PropertyValue};
use tracing::debug;

/// Index over the one configured property
#[derive(Debug, Clone)]
pub struct IndexManager {
    property: String,
    index: PropertyIndex,
}

impl IndexManager {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            index: PropertyIndex::new(),
        }
    }

    /// Name of the indexed property
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn is_indexed(&self, name: &str) -> bool {
        self.property == name
    }

    /// Apply the indexed-property transitions of one commit
    ///
    /// Old values are removed before new ones are added, so a path that
    /// keeps a value through a multi-value rewrite stays indexed.
    pub fn on_commit(&mut self, changes: &[IndexChange]) {
        for change in changes.iter().filter(|c| !c.is_noop()) {
            if let Some(old) = &change.old_value {
                for value in old.values() {
                    self.index.remove(value, &change.path);
                }
            }
        }
        for change in changes.iter().filter(|c| !c.is_noop()) {
            if let Some(new) = &change.new_value {
                for value in new.values() {
                    self.index.insert(value, change.path.clone());
                }
            }
        }
        debug!("Applied {} index changes for '{}'", changes.len(), self.property);
    }

    /// Paths whose indexed property carries `value`, sorted
    pub fn lookup(&self, value: &str) -> Vec<NodePath> {
        self.index.get(value)
    }

    /// Rebuild the whole index from a tree, returning the entry count
    pub fn backfill(&mut self, tree: &NodeTree) -> usize {
        self.index.clear();
        for (path, node) in tree.iter() {
            if let Some(value) = node.get_property(&self.property) {
                for v in value.values() {
                    self.index.insert(v, path.clone());
                }
            }
        }
        self.index.len()
    }

    /// Insert one recovered entry
    pub(crate) fn restore(&mut self, value: &str, path: NodePath) {
        self.index.insert(value, path);
    }

    /// The indexed value of `path` in `tree`, if any
    pub fn value_in(&self, tree: &NodeTree, path: &NodePath) -> Option<PropertyValue> {
        tree.get(path)
            .and_then(|node| node.get_property(&self.property))
            .cloned()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &NodePath)> {
        self.index.entries()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Default for IndexManager {
    fn default() -> Self {
        Self::new("colour")
    }
}
