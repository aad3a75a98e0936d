//! Session bookkeeping
//!
//! Authenticates logins and tracks which sessions are still open so that
//! every login can be matched with its release.

use crate::config::Credentials;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use std::sync::Mutex;
use tracing::debug;

/// Summary of an open session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    pub principal: String,
    pub opened_at: DateTime<Utc>,
}

/// Registry of open sessions
#[derive(Debug)]
pub struct SessionManager {
    admin: Credentials,
    active: Mutex<FxHashMap<String, SessionInfo>>,
}

impl SessionManager {
    pub fn new(admin: Credentials) -> Self {
        Self {
            admin,
            active: Mutex::new(FxHashMap::default()),
        }
    }

    /// Check credentials against the configured principal
    pub fn authenticate(&self, credentials: &Credentials) -> StoreResult<()> {
        if credentials.user == self.admin.user && credentials.password == self.admin.password {
            Ok(())
        } else {
            Err(StoreError::AuthenticationFailed(credentials.user.clone()))
        }
    }

    pub(crate) fn register(&self, info: SessionInfo) {
        debug!("Session {} opened for {}", info.id, info.principal);
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(info.id.clone(), info);
    }

    /// Forget an open session; false if it was not registered
    pub(crate) fn release(&self, id: &str) -> bool {
        let released = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some();
        if released {
            debug!("Session {} released", id);
        }
        released
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Open sessions, oldest first
    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.opened_at.cmp(&b.opened_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }
}
