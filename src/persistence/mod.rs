//! Persistence layer for treestore
//!
//! RocksDB holds the committed tree, the reverse index and the last
//! revision. Recovery rebuilds the in-memory snapshot from those and
//! backfills the index when it is missing or was built for another property.

pub mod storage;

pub use storage::{PersistentStorage, StorageError, StorageResult};

use crate::index::IndexManager;
use crate::tree::{NodePath, NodeTree};
use tracing::{info, warn};

/// State recovered from disk
pub struct Recovered {
    pub tree: NodeTree,
    pub index: IndexManager,
    pub revision: u64,
}

/// Load the committed state, backfilling the index once if needed
pub fn recover(storage: &PersistentStorage, property: &str) -> StorageResult<Recovered> {
    info!("Starting recovery from {}", storage.path().display());

    let revision = storage.revision()?;
    let tree = NodeTree::from_nodes(storage.scan_nodes()?);
    info!("Recovered {} nodes at revision {}", tree.len(), revision);

    let stored_property = storage.indexed_property()?;
    let entries = storage.scan_index()?;
    let mut index = IndexManager::new(property);

    let needs_backfill = match stored_property.as_deref() {
        Some(stored) if stored == property => {
            entries.is_empty() && tree.iter().any(|(_, node)| node.has_property(property))
        }
        Some(stored) => {
            info!("Index was built for '{}', rebuilding for '{}'", stored, property);
            true
        }
        None => true,
    };

    if needs_backfill {
        let count = index.backfill(&tree);
        let rebuilt: Vec<(String, NodePath)> = index
            .entries()
            .map(|(value, path)| (value.to_string(), path.clone()))
            .collect();
        storage.write_index(property, &rebuilt)?;
        info!("Backfilled index '{}' with {} entries", property, count);
    } else {
        for (value, path) in entries {
            if tree.contains(&path) {
                index.restore(&value, path);
            } else {
                warn!("Dropping index entry {} -> {} for a missing node", value, path);
            }
        }
        info!("Recovered {} index entries for '{}'", index.len(), property);
    }

    Ok(Recovered { tree, index, revision })
}
