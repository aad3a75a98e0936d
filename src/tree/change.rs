//! Tree changes
//!
//! `Change` is what a session buffers; `IndexChange` is what a commit hands
//! to the index once the new tree is known.

use super::path::NodePath;
use super::property::PropertyValue;

/// One buffered mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    AddNode {
        path: NodePath,
        primary_type: String,
    },
    RemoveNode {
        path: NodePath,
    },
    SetProperty {
        path: NodePath,
        name: String,
        value: PropertyValue,
    },
    RemoveProperty {
        path: NodePath,
        name: String,
    },
}

impl Change {
    /// Path the change targets
    pub fn path(&self) -> &NodePath {
        match self {
            Change::AddNode { path, .. }
            | Change::RemoveNode { path }
            | Change::SetProperty { path, .. }
            | Change::RemoveProperty { path, .. } => path,
        }
    }
}

/// Indexed-property transition of one node within a commit
#[derive(Debug, Clone, PartialEq)]
pub struct IndexChange {
    pub path: NodePath,
    pub old_value: Option<PropertyValue>,
    pub new_value: Option<PropertyValue>,
}

impl IndexChange {
    /// True when the indexed value did not move
    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}
