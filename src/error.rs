//! Error types for store operations

use crate::tree::NodePath;
use thiserror::Error;

/// Errors raised by the path resolver, the node store, the index and sessions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Node {0} not found")]
    NodeNotFound(NodePath),

    #[error("Node {0} already exists")]
    NodeExists(NodePath),

    #[error("Parent of {0} does not exist")]
    ParentMissing(NodePath),

    #[error("Property '{name}' not found on {path}")]
    PropertyNotFound { path: NodePath, name: String },

    #[error("Unsupported predicate on property '{0}'")]
    UnsupportedPredicate(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Authentication failed for '{0}'")]
    AuthenticationFailed(String),

    #[error("Conflict on {0}: modified by a concurrent commit")]
    ConflictDetected(NodePath),

    #[error("Session {0} is closed")]
    SessionClosed(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Fatal errors abort the current command; everything else is recoverable
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::StorageUnavailable(_))
    }
}

impl From<crate::persistence::StorageError> for StoreError {
    fn from(e: crate::persistence::StorageError) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
