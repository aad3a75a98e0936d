//! Repository handle
//!
//! Owns the committed head snapshot, the commit lock, optional RocksDB
//! storage and the session registry. Cloning the handle is cheap; all
//! clones share the same state.

use crate::config::{Credentials, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::index::IndexManager;
use crate::persistence::{self, PersistentStorage};
use crate::session::{PendingChanges, Session, SessionInfo, SessionManager};
use crate::tree::{IndexChange, NodePath, NodeTree, Walk, WalkPolicy};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Immutable committed state: tree and index at one revision
#[derive(Debug)]
pub struct Snapshot {
    revision: u64,
    tree: NodeTree,
    index: IndexManager,
}

impl Snapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    /// Lazy pre-order walk of the subtree at `path`
    pub fn walk(&self, path: &NodePath, policy: WalkPolicy) -> StoreResult<Walk<'_>> {
        self.tree.walk(path, policy)
    }
}

struct Inner {
    config: StoreConfig,
    head: RwLock<Arc<Snapshot>>,
    commit_lock: Mutex<()>,
    storage: Option<PersistentStorage>,
    sessions: SessionManager,
}

/// Shared handle to a content repository
#[derive(Clone)]
pub struct Repository {
    inner: Arc<Inner>,
}

impl Repository {
    /// Open a repository, recovering persisted state when a data path is set
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let (storage, snapshot) = match &config.data_path {
            Some(path) => {
                let storage = PersistentStorage::open(path)?;
                let recovered = persistence::recover(&storage, &config.indexed_property)?;
                let snapshot = Snapshot {
                    revision: recovered.revision,
                    tree: recovered.tree,
                    index: recovered.index,
                };
                (Some(storage), snapshot)
            }
            None => (
                None,
                Snapshot {
                    revision: 0,
                    tree: NodeTree::new(),
                    index: IndexManager::new(config.indexed_property.clone()),
                },
            ),
        };

        info!(
            "Repository open at revision {} ({} nodes, index on '{}')",
            snapshot.revision,
            snapshot.tree.len(),
            config.indexed_property
        );

        Ok(Repository {
            inner: Arc::new(Inner {
                sessions: SessionManager::new(config.admin.clone()),
                config,
                head: RwLock::new(Arc::new(snapshot)),
                commit_lock: Mutex::new(()),
                storage,
            }),
        })
    }

    /// In-memory repository with default settings
    pub fn in_memory() -> Self {
        let config = StoreConfig::in_memory();
        let snapshot = Snapshot {
            revision: 0,
            tree: NodeTree::new(),
            index: IndexManager::new(config.indexed_property.clone()),
        };
        Repository {
            inner: Arc::new(Inner {
                sessions: SessionManager::new(config.admin.clone()),
                config,
                head: RwLock::new(Arc::new(snapshot)),
                commit_lock: Mutex::new(()),
                storage: None,
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Current committed snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.head.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn revision(&self) -> u64 {
        self.snapshot().revision
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.storage.is_some()
    }

    /// Authenticate and open a session
    pub fn login(&self, credentials: &Credentials) -> StoreResult<Session> {
        self.inner.sessions.authenticate(credentials)?;
        let info = SessionInfo {
            id: Uuid::new_v4().to_string(),
            principal: credentials.user.clone(),
            opened_at: Utc::now(),
        };
        self.inner.sessions.register(info.clone());
        Ok(Session::new(info.id, info.principal, info.opened_at, self.clone()))
    }

    /// Log in with the configured admin principal
    pub fn login_admin(&self) -> StoreResult<Session> {
        let admin = self.inner.config.admin.clone();
        self.login(&admin)
    }

    pub(crate) fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Number of sessions not yet logged out
    pub fn active_sessions(&self) -> usize {
        self.inner.sessions.active_count()
    }

    pub fn session_info(&self) -> Vec<SessionInfo> {
        self.inner.sessions.active_sessions()
    }

    /// Apply a session's changes as one new revision
    pub(crate) fn commit(&self, session_id: &str, pending: &PendingChanges) -> StoreResult<Arc<Snapshot>> {
        let _guard = self.inner.commit_lock.lock().unwrap_or_else(|e| e.into_inner());
        let head = self.snapshot();

        pending.validate(&head.tree)?;

        let revision = head.revision + 1;
        let mut tree = head.tree.clone();
        let mut touched = BTreeSet::new();
        for change in pending.changes() {
            let paths = tree.apply(change, revision).map_err(|e| {
                debug!("Replay of {:?} failed on revision {}: {}", change, head.revision, e);
                StoreError::ConflictDetected(change.path().clone())
            })?;
            touched.extend(paths);
        }

        let index_changes: Vec<IndexChange> = touched
            .iter()
            .map(|path| IndexChange {
                path: path.clone(),
                old_value: head.index.value_in(&head.tree, path),
                new_value: head.index.value_in(&tree, path),
            })
            .filter(|change| !change.is_noop())
            .collect();

        if let Some(storage) = &self.inner.storage {
            storage.write_commit(revision, &tree, &touched, &index_changes)?;
        }

        let mut index = head.index.clone();
        index.on_commit(&index_changes);

        let snapshot = Arc::new(Snapshot { revision, tree, index });
        *self.inner.head.write().unwrap_or_else(|e| e.into_inner()) = Arc::clone(&snapshot);

        debug!(
            "Session {} committed revision {} ({} changes, {} nodes touched)",
            session_id,
            revision,
            pending.len(),
            touched.len()
        );
        Ok(snapshot)
    }

    /// Flush storage; the in-memory state stays readable
    pub fn close(&self) -> StoreResult<()> {
        let open = self.active_sessions();
        if open > 0 {
            info!("Closing repository with {} open sessions", open);
        }
        if let Some(storage) = &self.inner.storage {
            storage.flush()?;
        }
        info!("Repository closed at revision {}", self.revision());
        Ok(())
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("revision", &self.revision())
            .field("persistent", &self.is_persistent())
            .field("active_sessions", &self.active_sessions())
            .finish()
    }
}
