//! Pending changes of a session
//!
//! Besides the ordered changes, the buffer records what the session assumed
//! about the committed tree when it first touched each path. Commit checks
//! those assumptions against the head before replaying anything.

use crate::error::{StoreError, StoreResult};
use crate::tree::{Change, NodePath, NodeTree};
use rustc_hash::FxHashSet;

/// Assumption about the committed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The node exists and is the same incarnation the session saw
    Present { path: NodePath, created_rev: u64 },
    /// The path is still free
    Absent { path: NodePath },
}

impl Expectation {
    /// Check against a committed tree
    pub fn holds(&self, tree: &NodeTree) -> bool {
        match self {
            Expectation::Present { path, created_rev } => tree
                .resolve(path)
                .map(|node| node.created_rev == *created_rev)
                .unwrap_or(false),
            Expectation::Absent { path } => tree.resolve(path).is_err(),
        }
    }

    pub fn path(&self) -> &NodePath {
        match self {
            Expectation::Present { path, .. } | Expectation::Absent { path } => path,
        }
    }
}

/// Ordered changes plus the expectations they rely on
#[derive(Debug, Default)]
pub struct PendingChanges {
    changes: Vec<Change>,
    expectations: Vec<Expectation>,
    seen: FxHashSet<NodePath>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a change that already applied cleanly to the session draft
    pub fn record(&mut self, change: Change, base: &NodeTree) {
        match &change {
            Change::AddNode { path, .. } => {
                if let Some(parent) = path.parent() {
                    self.expect_present(&parent, base);
                }
                self.expect_absent(path, base);
            }
            Change::RemoveNode { path }
            | Change::SetProperty { path, .. }
            | Change::RemoveProperty { path, .. } => self.expect_present(path, base),
        }
        self.changes.push(change);
    }

    fn expect_present(&mut self, path: &NodePath, base: &NodeTree) {
        if !self.seen.insert(path.clone()) {
            return;
        }
        // nodes this session created itself are covered by their Absent entry
        if let Ok(node) = base.resolve(path) {
            self.expectations.push(Expectation::Present {
                path: path.clone(),
                created_rev: node.created_rev,
            });
        }
    }

    fn expect_absent(&mut self, path: &NodePath, base: &NodeTree) {
        if !self.seen.insert(path.clone()) {
            return;
        }
        if base.resolve(path).is_err() {
            self.expectations.push(Expectation::Absent { path: path.clone() });
        }
    }

    /// Fail with the first path whose expectation no longer holds
    pub fn validate(&self, head: &NodeTree) -> StoreResult<()> {
        match self.expectations.iter().find(|e| !e.holds(head)) {
            Some(broken) => Err(StoreError::ConflictDetected(broken.path().clone())),
            None => Ok(()),
        }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
