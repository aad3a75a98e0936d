//! In-memory tree storage
//!
//! Nodes are kept in a hash map keyed by path; structure lives in each
//! node's ordered child list. A node exists iff every prefix of its path
//! exists and lists the next segment as a child.

use super::change::Change;
use super::node::Node;
use super::path::NodePath;
use super::property::{PropertyMap, PropertyValue};
use super::walk::{Walk, WalkPolicy};
use crate::error::{StoreError, StoreResult};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::warn;

/// Primary type of the root node
pub const ROOT_PRIMARY_TYPE: &str = "rep:root";

/// Committed or draft tree of nodes
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: FxHashMap<NodePath, Node>,
}

impl NodeTree {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        let mut nodes = FxHashMap::default();
        nodes.insert(NodePath::root(), Node::new(ROOT_PRIMARY_TYPE, 0));
        NodeTree { nodes }
    }

    /// Rebuild a tree from recovered nodes
    ///
    /// Nodes that cannot be reached from the root are dropped. Child names
    /// without a backing node are kept as they are; walks report them
    /// according to their policy.
    pub fn from_nodes(recovered: impl IntoIterator<Item = (NodePath, Node)>) -> Self {
        let mut loaded: FxHashMap<NodePath, Node> = recovered.into_iter().collect();
        loaded
            .entry(NodePath::root())
            .or_insert_with(|| Node::new(ROOT_PRIMARY_TYPE, 0));

        let mut nodes = FxHashMap::default();
        let mut pending = vec![NodePath::root()];
        while let Some(path) = pending.pop() {
            if let Some(node) = loaded.remove(&path) {
                for name in node.child_names() {
                    if let Ok(child) = path.child(name) {
                        pending.push(child);
                    }
                }
                nodes.insert(path, node);
            }
        }

        for orphan in loaded.keys() {
            warn!("Dropping unreachable node {}", orphan);
        }

        NodeTree { nodes }
    }

    /// Resolve a path, failing at the first missing prefix
    pub fn resolve(&self, path: &NodePath) -> StoreResult<&Node> {
        let mut current = self
            .nodes
            .get(&NodePath::root())
            .ok_or_else(|| StoreError::NodeNotFound(NodePath::root()))?;

        for depth in 1..=path.depth() {
            let name = &path.segments()[depth - 1];
            let prefix = path.prefix(depth);
            if !current.has_child(name) {
                return Err(StoreError::NodeNotFound(prefix));
            }
            current = self
                .nodes
                .get(&prefix)
                .ok_or(StoreError::NodeNotFound(prefix))?;
        }

        Ok(current)
    }

    /// Direct lookup without prefix checks
    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &NodePath) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn get_node(&self, path: &NodePath) -> StoreResult<&Node> {
        self.resolve(path)
    }

    /// Child names of a node in listing order
    pub fn list_children(&self, path: &NodePath) -> StoreResult<Vec<String>> {
        Ok(self.resolve(path)?.children.iter().cloned().collect())
    }

    pub fn get_properties(&self, path: &NodePath) -> StoreResult<&PropertyMap> {
        Ok(&self.resolve(path)?.properties)
    }

    /// Lazy pre-order walk rooted at `path`
    pub fn walk(&self, path: &NodePath, policy: WalkPolicy) -> StoreResult<Walk<'_>> {
        self.resolve(path)?;
        Ok(Walk::new(self, path.clone(), policy))
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All nodes in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&NodePath, &Node)> {
        self.nodes.iter()
    }

    // ============================================================
    // Mutations
    // ============================================================

    /// Create a node under an existing parent
    pub fn add_node(&mut self, path: &NodePath, primary_type: &str, revision: u64) -> StoreResult<()> {
        let parent_path = path
            .parent()
            .ok_or_else(|| StoreError::NodeExists(NodePath::root()))?;
        let name = path
            .name()
            .ok_or_else(|| StoreError::NodeExists(NodePath::root()))?
            .to_string();

        if self.resolve(&parent_path).is_err() {
            return Err(StoreError::ParentMissing(path.clone()));
        }
        if self.nodes.contains_key(path) {
            return Err(StoreError::NodeExists(path.clone()));
        }

        let parent = self.parent_mut(&parent_path)?;
        parent.children.insert(name);
        parent.modified_rev = revision;

        self.nodes.insert(path.clone(), Node::new(primary_type, revision));
        Ok(())
    }

    /// Remove a node and its subtree, returning every removed path
    pub fn remove_node(&mut self, path: &NodePath, revision: u64) -> StoreResult<Vec<NodePath>> {
        self.resolve(path)?;
        let (parent_path, name) = match (path.parent(), path.name()) {
            (Some(parent), Some(name)) => (parent, name.to_string()),
            _ => return Err(StoreError::invalid_path("/", "the root node cannot be removed")),
        };

        let mut removed = Vec::new();
        let mut pending = vec![path.clone()];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                for child in node.child_names() {
                    if let Ok(child_path) = current.child(child) {
                        pending.push(child_path);
                    }
                }
                removed.push(current);
            }
        }

        let parent = self.parent_mut(&parent_path)?;
        parent.children.shift_remove(&name);
        parent.modified_rev = revision;

        Ok(removed)
    }

    /// Create or overwrite a property, returning the previous value
    pub fn set_property(
        &mut self,
        path: &NodePath,
        name: &str,
        value: PropertyValue,
        revision: u64,
    ) -> StoreResult<Option<PropertyValue>> {
        if name.is_empty() {
            return Err(StoreError::invalid_path(path.to_string(), "empty property name"));
        }
        let node = self.node_mut(path)?;
        node.modified_rev = revision;
        Ok(node.set_property(name, value))
    }

    /// Remove an existing property, returning its value
    pub fn remove_property(&mut self, path: &NodePath, name: &str, revision: u64) -> StoreResult<PropertyValue> {
        let node = self.node_mut(path)?;
        let old = node
            .remove_property(name)
            .ok_or_else(|| StoreError::PropertyNotFound {
                path: path.clone(),
                name: name.to_string(),
            })?;
        node.modified_rev = revision;
        Ok(old)
    }

    /// Apply a buffered change, returning the paths whose stored form changed
    pub fn apply(&mut self, change: &Change, revision: u64) -> StoreResult<BTreeSet<NodePath>> {
        let mut touched = BTreeSet::new();
        match change {
            Change::AddNode { path, primary_type } => {
                self.add_node(path, primary_type, revision)?;
                touched.insert(path.clone());
                touched.extend(path.parent());
            }
            Change::RemoveNode { path } => {
                touched.extend(self.remove_node(path, revision)?);
                touched.extend(path.parent());
            }
            Change::SetProperty { path, name, value } => {
                self.set_property(path, name, value.clone(), revision)?;
                touched.insert(path.clone());
            }
            Change::RemoveProperty { path, name } => {
                self.remove_property(path, name, revision)?;
                touched.insert(path.clone());
            }
        }
        Ok(touched)
    }

    fn node_mut(&mut self, path: &NodePath) -> StoreResult<&mut Node> {
        self.resolve(path)?;
        self.nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NodeNotFound(path.clone()))
    }

    fn parent_mut(&mut self, parent: &NodePath) -> StoreResult<&mut Node> {
        self.nodes
            .get_mut(parent)
            .ok_or_else(|| StoreError::NodeNotFound(parent.clone()))
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    #[test]
    fn test_new_tree_has_root() {
        let tree = NodeTree::new();
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.get_node(&NodePath::root()).unwrap().primary_type, ROOT_PRIMARY_TYPE);
    }

    #[test]
    fn test_add_and_get_node() {
        let mut tree = NodeTree::new();
        tree.add_node(&path("/colours"), "nt:unstructured", 1).unwrap();
        tree.add_node(&path("/colours/n001"), "nt:unstructured", 1).unwrap();

        let node = tree.get_node(&path("/colours/n001")).unwrap();
        assert_eq!(node.primary_type, "nt:unstructured");
        assert_eq!(node.child_count(), 0);
        assert_eq!(tree.list_children(&path("/colours")).unwrap(), vec!["n001"]);
        assert_eq!(tree.list_children(&NodePath::root()).unwrap(), vec!["colours"]);
    }

    #[test]
    fn test_add_node_errors() {
        let mut tree = NodeTree::new();
        tree.add_node(&path("/a"), "nt:unstructured", 1).unwrap();

        assert_eq!(
            tree.add_node(&path("/a"), "nt:unstructured", 2),
            Err(StoreError::NodeExists(path("/a")))
        );
        assert_eq!(
            tree.add_node(&path("/x/y"), "nt:unstructured", 2),
            Err(StoreError::ParentMissing(path("/x/y")))
        );
        assert_eq!(
            tree.add_node(&NodePath::root(), "nt:unstructured", 2),
            Err(StoreError::NodeExists(NodePath::root()))
        );
    }

    #[test]
    fn test_resolve_reports_first_missing_prefix() {
        let mut tree = NodeTree::new();
        tree.add_node(&path("/a"), "nt:unstructured", 1).unwrap();

        let err = tree.resolve(&path("/a/b/c")).unwrap_err();
        assert_eq!(err, StoreError::NodeNotFound(path("/a/b")));
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = NodeTree::new();
        tree.add_node(&path("/a"), "nt:unstructured", 1).unwrap();
        tree.add_node(&path("/a/b"), "nt:unstructured", 1).unwrap();
        tree.add_node(&path("/a/b/c"), "nt:unstructured", 1).unwrap();
        tree.add_node(&path("/d"), "nt:unstructured", 1).unwrap();

        let mut removed = tree.remove_node(&path("/a"), 2).unwrap();
        removed.sort();
        assert_eq!(removed, vec![path("/a"), path("/a/b"), path("/a/b/c")]);

        for gone in ["/a", "/a/b", "/a/b/c"] {
            assert!(matches!(tree.get_node(&path(gone)), Err(StoreError::NodeNotFound(_))));
        }
        assert_eq!(tree.list_children(&NodePath::root()).unwrap(), vec!["d"]);
        assert_eq!(tree.get(&NodePath::root()).unwrap().modified_rev, 2);
    }

    #[test]
    fn test_remove_root_is_rejected() {
        let mut tree = NodeTree::new();
        assert!(matches!(
            tree.remove_node(&NodePath::root(), 1),
            Err(StoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_properties() {
        let mut tree = NodeTree::new();
        let p = path("/a");
        tree.add_node(&p, "nt:unstructured", 1).unwrap();

        tree.set_property(&p, "colour", "red".into(), 2).unwrap();
        let old = tree.set_property(&p, "colour", "blue".into(), 3).unwrap();
        assert_eq!(old, Some(PropertyValue::from("red")));
        assert_eq!(tree.get(&p).unwrap().modified_rev, 3);

        tree.remove_property(&p, "colour", 4).unwrap();
        assert_eq!(
            tree.remove_property(&p, "colour", 5),
            Err(StoreError::PropertyNotFound { path: p.clone(), name: "colour".to_string() })
        );
        assert!(matches!(
            tree.set_property(&path("/missing"), "colour", "red".into(), 5),
            Err(StoreError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_apply_reports_touched_paths() {
        let mut tree = NodeTree::new();
        let touched = tree
            .apply(
                &Change::AddNode { path: path("/a"), primary_type: "nt:unstructured".to_string() },
                1,
            )
            .unwrap();
        assert_eq!(touched.into_iter().collect::<Vec<_>>(), vec![NodePath::root(), path("/a")]);
    }

    #[test]
    fn test_from_nodes_drops_orphans() {
        let mut root = Node::new(ROOT_PRIMARY_TYPE, 0);
        root.children.insert("a".to_string());
        let recovered = vec![
            (NodePath::root(), root),
            (path("/a"), Node::new("nt:unstructured", 1)),
            (path("/lost/child"), Node::new("nt:unstructured", 1)),
        ];

        let tree = NodeTree::from_nodes(recovered);
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(&path("/a")));
        assert!(!tree.contains(&path("/lost/child")));
    }
}
