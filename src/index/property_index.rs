//! B-Tree based property index for fast lookups

use crate::tree::NodePath;
use std::collections::{BTreeMap, BTreeSet};

/// Reverse index for one property: value -> paths carrying it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyIndex {
    /// Value -> Set of paths, kept sorted for deterministic results
    index: BTreeMap<String, BTreeSet<NodePath>>,
}

impl PropertyIndex {
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, value: &str, path: NodePath) {
        self.index.entry(value.to_string()).or_default().insert(path);
    }

    pub fn remove(&mut self, value: &str, path: &NodePath) {
        if let Some(paths) = self.index.get_mut(value) {
            paths.remove(path);
            if paths.is_empty() {
                self.index.remove(value);
            }
        }
    }

    /// Paths carrying `value`, sorted by segments
    pub fn get(&self, value: &str) -> Vec<NodePath> {
        self.index
            .get(value)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of (value, path) entries
    pub fn len(&self) -> usize {
        self.index.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All (value, path) entries in value order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &NodePath)> {
        self.index
            .iter()
            .flat_map(|(value, paths)| paths.iter().map(move |p| (value.as_str(), p)))
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }
}
