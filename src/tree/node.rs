//! Node implementation for the content tree
//!
//! A node carries one primary type, a property map and the ordered names of
//! its children. The node does not know its own path; the tree addresses it.

use super::property::{PropertyMap, PropertyValue};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A node in the content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Primary type tag (e.g. "nt:unstructured")
    pub primary_type: String,

    /// Properties in insertion order
    pub properties: PropertyMap,

    /// Child names in insertion order
    pub children: IndexSet<String>,

    /// Revision of the commit that created this node
    pub created_rev: u64,

    /// Revision of the last commit that changed this node
    pub modified_rev: u64,
}

impl Node {
    /// Create a new node with no properties and no children
    pub fn new(primary_type: impl Into<String>, revision: u64) -> Self {
        Node {
            primary_type: primary_type.into(),
            properties: PropertyMap::new(),
            children: IndexSet::new(),
            created_rev: revision,
            modified_rev: revision,
        }
    }

    /// Set a property value, returning the previous one
    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(name.into(), value.into())
    }

    pub fn get_property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Remove a property, keeping the order of the remaining ones
    pub fn remove_property(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.shift_remove(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains(name)
    }

    /// Child names in listing order
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}
