//! Depth-first traversal
//!
//! The walk is lazy: nodes are looked up as the iterator advances, so a
//! caller that stops early never touches the rest of the subtree.

use super::node::Node;
use super::path::NodePath;
use super::store::NodeTree;
use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What a walk does when a listed child cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkPolicy {
    /// Yield the error and end the walk
    Abort,
    /// Log the error and continue with the next sibling
    #[default]
    Skip,
}

impl std::str::FromStr for WalkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(WalkPolicy::Abort),
            "skip" => Ok(WalkPolicy::Skip),
            other => Err(format!("unknown walk policy '{}'", other)),
        }
    }
}

/// A visited node
#[derive(Debug, Clone)]
pub struct WalkEntry<'a> {
    pub path: NodePath,
    pub node: &'a Node,
    /// Number of segments from the tree root
    pub depth: usize,
}

/// Pre-order iterator over a subtree
pub struct Walk<'a> {
    tree: &'a NodeTree,
    stack: Vec<(NodePath, usize)>,
    policy: WalkPolicy,
    finished: bool,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(tree: &'a NodeTree, start: NodePath, policy: WalkPolicy) -> Self {
        Walk {
            tree,
            stack: vec![(start.clone(), start.depth())],
            policy,
            finished: false,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = StoreResult<WalkEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some((path, depth)) = self.stack.pop() {
            let node = match self.tree.get(&path) {
                Some(node) => node,
                None => match self.policy {
                    WalkPolicy::Abort => {
                        self.finished = true;
                        return Some(Err(StoreError::NodeNotFound(path)));
                    }
                    WalkPolicy::Skip => {
                        warn!("Skipping unreadable node {}", path);
                        continue;
                    }
                },
            };

            for name in node.children.iter().rev() {
                match path.child(name) {
                    Ok(child) => self.stack.push((child, depth + 1)),
                    Err(e) => warn!("Skipping child '{}' of {}: {}", name, path, e),
                }
            }

            return Some(Ok(WalkEntry { path, node, depth }));
        }

        self.finished = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    fn sample_tree() -> NodeTree {
        let mut tree = NodeTree::new();
        for p in ["/a", "/a/b", "/a/c", "/d"] {
            tree.add_node(&path(p), "nt:unstructured", 1).unwrap();
        }
        tree
    }

    #[test]
    fn test_walk_is_preorder() {
        let tree = sample_tree();
        let visited: Vec<(String, usize)> = tree
            .walk(&NodePath::root(), WalkPolicy::Abort)
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                (e.path.to_string(), e.depth)
            })
            .collect();

        assert_eq!(
            visited,
            vec![
                ("/".to_string(), 0),
                ("/a".to_string(), 1),
                ("/a/b".to_string(), 2),
                ("/a/c".to_string(), 2),
                ("/d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_walk_subtree_depth_counts_from_root() {
        let tree = sample_tree();
        let entries: Vec<_> = tree
            .walk(&path("/a"), WalkPolicy::Skip)
            .unwrap()
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].depth, 1);
        assert_eq!(entries[1].path, path("/a/b"));
        assert_eq!(entries[1].depth, 2);
    }

    #[test]
    fn test_walk_missing_start() {
        let tree = sample_tree();
        assert!(matches!(
            tree.walk(&path("/nope"), WalkPolicy::Skip),
            Err(StoreError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_walk_dangling_child() {
        let mut root = Node::new("rep:root", 0);
        root.children.insert("ghost".to_string());
        root.children.insert("real".to_string());
        let tree = NodeTree::from_nodes(vec![
            (NodePath::root(), root),
            (path("/real"), Node::new("nt:unstructured", 1)),
        ]);

        // skip continues with the next sibling
        let skipped: Vec<_> = tree
            .walk(&NodePath::root(), WalkPolicy::Skip)
            .unwrap()
            .map(|e| e.unwrap().path.to_string())
            .collect();
        assert_eq!(skipped, vec!["/", "/real"]);

        let mut aborted = tree.walk(&NodePath::root(), WalkPolicy::Abort).unwrap();
        assert!(aborted.next().unwrap().is_ok());
        assert_eq!(
            aborted.next().unwrap().unwrap_err(),
            StoreError::NodeNotFound(path("/ghost"))
        );
        assert!(aborted.next().is_none());
    }

    #[test]
    fn test_walk_policy_from_str() {
        assert_eq!("ABORT".parse::<WalkPolicy>().unwrap(), WalkPolicy::Abort);
        assert_eq!("skip".parse::<WalkPolicy>().unwrap(), WalkPolicy::Skip);
        assert!("later".parse::<WalkPolicy>().is_err());
        assert_eq!(WalkPolicy::default(), WalkPolicy::Skip);
    }
}
