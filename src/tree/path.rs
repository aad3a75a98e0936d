//! Path parsing and normalization
//!
//! A path is an ordered sequence of non-empty segments from the root. The
//! root itself is the empty sequence and renders as `/`.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path separator
pub const SEPARATOR: char = '/';

const FORBIDDEN: &[char] = &['[', ']', '*', '|'];

/// Absolute path of a node in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// The root path
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    /// Parse a raw slash-delimited string
    ///
    /// `"/"` and `""` are the root, `"a/b"` and `"/a/b/"` both mean `/a/b`.
    /// Doubled separators, `.`/`..` and segments with `[ ] * |` or control
    /// characters are rejected.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(NodePath::root());
        }

        let inner = trimmed.strip_prefix(SEPARATOR).unwrap_or(trimmed);
        let inner = inner.strip_suffix(SEPARATOR).unwrap_or(inner);

        let mut segments = Vec::new();
        for segment in inner.split(SEPARATOR) {
            validate_segment(raw, segment)?;
            segments.push(segment.to_string());
        }

        Ok(NodePath(segments))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments from the root
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            None
        } else {
            Some(NodePath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Path of a direct child
    pub fn child(&self, name: &str) -> StoreResult<NodePath> {
        validate_segment(name, name)?;
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Ok(NodePath(segments))
    }

    /// Prefix made of the first `len` segments
    pub fn prefix(&self, len: usize) -> NodePath {
        NodePath(self.0[..len.min(self.0.len())].to_vec())
    }

    /// True if `self` is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }
}

fn validate_segment(raw: &str, segment: &str) -> StoreResult<()> {
    if segment.is_empty() {
        return Err(StoreError::invalid_path(raw, "empty path segment"));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::invalid_path(raw, "relative segments are not allowed"));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_control())
    {
        return Err(StoreError::invalid_path(
            raw,
            format!("forbidden character {:?} in segment '{}'", c, segment),
        ));
    }
    Ok(())
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{}", SEPARATOR);
        }
        for segment in &self.0 {
            write!(f, "{}{}", SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        assert!(NodePath::parse("/").unwrap().is_root());
        assert!(NodePath::parse("").unwrap().is_root());
        assert_eq!(NodePath::root().to_string(), "/");
    }

    #[test]
    fn test_parse_normalizes_slashes() {
        let absolute = NodePath::parse("/path/to/node").unwrap();
        let relative = NodePath::parse("path/to/node").unwrap();
        let trailing = NodePath::parse("/path/to/node/").unwrap();

        assert_eq!(absolute, relative);
        assert_eq!(absolute, trailing);
        assert_eq!(absolute.segments(), &["path", "to", "node"]);
        assert_eq!(absolute.to_string(), "/path/to/node");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        let err = NodePath::parse("/a//b").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
        assert!(NodePath::parse("/a//").is_err());
        assert!(matches!(NodePath::parse("//"), Err(StoreError::InvalidPath { .. })));
        assert!(NodePath::parse("///").is_err());
    }

    #[test]
    fn test_parse_rejects_forbidden_characters() {
        assert!(NodePath::parse("/a/b[1]").is_err());
        assert!(NodePath::parse("/a/*").is_err());
        assert!(NodePath::parse("/a/../b").is_err());
        assert!(NodePath::parse("/a\tb").is_err());
        // namespaced names are fine
        assert!(NodePath::parse("/oak:index/colour").is_ok());
    }

    #[test]
    fn test_parent_and_name() {
        let path = NodePath::parse("/colours/n001").unwrap();
        assert_eq!(path.name(), Some("n001"));
        assert_eq!(path.depth(), 2);

        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "/colours");
        assert_eq!(parent.parent(), Some(NodePath::root()));
        assert_eq!(NodePath::root().parent(), None);
    }

    #[test]
    fn test_ancestry() {
        let a = NodePath::parse("/a").unwrap();
        let ab = NodePath::parse("/a/b").unwrap();
        let abc = NodePath::parse("/a/b/c").unwrap();
        let ax = NodePath::parse("/ax").unwrap();

        assert!(a.is_ancestor_of(&abc));
        assert!(ab.is_ancestor_of(&abc));
        assert!(NodePath::root().is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&ax));
        assert_eq!(abc.prefix(1), a);
    }

    #[test]
    fn test_ordering_is_by_segment() {
        let mut paths: Vec<NodePath> = ["/b", "/a/c", "/a", "/a/b"]
            .iter()
            .map(|p| p.parse().unwrap())
            .collect();
        paths.sort();
        let rendered: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["/a", "/a/b", "/a/c", "/b"]);
    }
}
