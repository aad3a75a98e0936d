//! Session handle
//!
//! A session reads the committed head and buffers its own writes. Writes
//! are checked against a private draft as they are made, so errors surface
//! at the call site; nothing becomes visible to others until `commit`.

use super::changeset::PendingChanges;
use crate::error::{StoreError, StoreResult};
use crate::query::QueryEngine;
use crate::repository::{Repository, Snapshot};
use crate::tree::{Change, Node, NodePath, NodeTree, PropertyMap, PropertyValue};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// A logged-in session
pub struct Session {
    id: String,
    principal: String,
    opened_at: DateTime<Utc>,
    repo: Repository,
    /// Committed snapshot the pending changes were made against
    base: Arc<Snapshot>,
    draft: Option<NodeTree>,
    pending: PendingChanges,
    closed: bool,
}

impl Session {
    pub(crate) fn new(id: String, principal: String, opened_at: DateTime<Utc>, repo: Repository) -> Self {
        let base = repo.snapshot();
        Session {
            id,
            principal,
            opened_at,
            repo,
            base,
            draft: None,
            pending: PendingChanges::new(),
            closed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Revision the pending changes are based on
    pub fn base_revision(&self) -> u64 {
        self.base.revision()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::SessionClosed(self.id.clone()))
        } else {
            Ok(())
        }
    }

    // ============================================================
    // Reads (committed state)
    // ============================================================

    /// Current committed snapshot
    pub fn snapshot(&self) -> StoreResult<Arc<Snapshot>> {
        self.ensure_open()?;
        Ok(self.repo.snapshot())
    }

    pub fn get_node(&self, path: &str) -> StoreResult<Node> {
        let path = NodePath::parse(path)?;
        Ok(self.snapshot()?.tree().get_node(&path)?.clone())
    }

    pub fn list_children(&self, path: &str) -> StoreResult<Vec<String>> {
        let path = NodePath::parse(path)?;
        self.snapshot()?.tree().list_children(&path)
    }

    pub fn get_properties(&self, path: &str) -> StoreResult<PropertyMap> {
        let path = NodePath::parse(path)?;
        Ok(self.snapshot()?.tree().get_properties(&path)?.clone())
    }

    /// Equality lookup on the indexed property
    pub fn find_by_property(&self, name: &str, value: &str) -> StoreResult<Vec<NodePath>> {
        let snapshot = self.snapshot()?;
        QueryEngine::new(&snapshot).find_by_property(name, value)
    }

    /// Run a `SELECT * FROM [type] WHERE name = 'value'` statement
    pub fn query(&self, statement: &str) -> StoreResult<Vec<NodePath>> {
        let snapshot = self.snapshot()?;
        QueryEngine::new(&snapshot).execute(statement)
    }

    // ============================================================
    // Writes (buffered until commit)
    // ============================================================

    pub fn add_node(&mut self, path: &str, primary_type: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.stage(Change::AddNode {
            path,
            primary_type: primary_type.to_string(),
        })
    }

    /// Remove a node together with its subtree
    pub fn remove_node(&mut self, path: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.stage(Change::RemoveNode { path })
    }

    pub fn set_property(&mut self, path: &str, name: &str, value: PropertyValue) -> StoreResult<()> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.stage(Change::SetProperty {
            path,
            name: name.to_string(),
            value,
        })
    }

    pub fn remove_property(&mut self, path: &str, name: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let path = NodePath::parse(path)?;
        self.stage(Change::RemoveProperty {
            path,
            name: name.to_string(),
        })
    }

    fn stage(&mut self, change: Change) -> StoreResult<()> {
        // a new write group starts from the latest commit
        if self.pending.is_empty() {
            self.base = self.repo.snapshot();
            self.draft = None;
        }
        let base = Arc::clone(&self.base);
        let draft = self.draft.get_or_insert_with(|| base.tree().clone());
        draft.apply(&change, base.revision() + 1)?;
        self.pending.record(change, base.tree());
        Ok(())
    }

    /// Publish the pending changes atomically, returning the new revision
    ///
    /// The buffer is cleared whether or not the commit succeeds, and the
    /// session moves onto the latest committed snapshot.
    pub fn commit(&mut self) -> StoreResult<u64> {
        self.ensure_open()?;
        let pending = std::mem::take(&mut self.pending);
        self.draft = None;

        if pending.is_empty() {
            self.base = self.repo.snapshot();
            return Ok(self.base.revision());
        }

        match self.repo.commit(&self.id, &pending) {
            Ok(snapshot) => {
                self.base = snapshot;
                Ok(self.base.revision())
            }
            Err(e) => {
                debug!("Session {} discarded {} changes: {}", self.id, pending.len(), e);
                self.base = self.repo.snapshot();
                Err(e)
            }
        }
    }

    /// Drop pending changes without closing the session
    pub fn discard(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        self.pending = PendingChanges::new();
        self.draft = None;
        self.base = self.repo.snapshot();
        Ok(())
    }

    /// Close the session, discarding pending changes
    pub fn logout(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        self.closed = true;
        self.pending = PendingChanges::new();
        self.draft = None;
        self.repo.sessions().release(&self.id);
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Session {} dropped while open, releasing it", self.id);
            self.closed = true;
            self.repo.sessions().release(&self.id);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("principal", &self.principal)
            .field("base_revision", &self.base.revision())
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}
