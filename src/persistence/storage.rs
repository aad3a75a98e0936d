//! RocksDB storage layer implementation
//!
//! Three column families: `nodes` (path -> stored node), `index`
//! (value NUL path -> empty) and `meta` (revision, indexed property name).
//! Every commit lands as one synced write batch.

use crate::tree::{IndexChange, Node, NodePath, NodeTree, PropertyMap};
use indexmap::IndexSet;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CF_NODES: &str = "nodes";
const CF_INDEX: &str = "index";
const CF_META: &str = "meta";

const META_REVISION: &[u8] = b"revision";
const META_INDEXED_PROPERTY: &[u8] = b"indexed_property";

const INDEX_KEY_SEPARATOR: u8 = 0;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family error
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// A stored key could not be decoded
    #[error("Corrupt key in '{cf}': {reason}")]
    CorruptKey { cf: &'static str, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Serialized node for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    primary_type: String,
    properties: Vec<u8>, // Serialized PropertyMap
    children: Vec<String>,
    created_rev: u64,
    modified_rev: u64,
}

impl StoredNode {
    fn encode(node: &Node) -> StorageResult<Vec<u8>> {
        let stored = StoredNode {
            primary_type: node.primary_type.clone(),
            properties: bincode::serialize(&node.properties)?,
            children: node.children.iter().cloned().collect(),
            created_rev: node.created_rev,
            modified_rev: node.modified_rev,
        };
        Ok(bincode::serialize(&stored)?)
    }

    fn decode(bytes: &[u8]) -> StorageResult<Node> {
        let stored: StoredNode = bincode::deserialize(bytes)?;
        let properties: PropertyMap = bincode::deserialize(&stored.properties)?;
        Ok(Node {
            primary_type: stored.primary_type,
            properties,
            children: stored.children.into_iter().collect::<IndexSet<_>>(),
            created_rev: stored.created_rev,
            modified_rev: stored.modified_rev,
        })
    }
}

/// RocksDB-based persistent storage
pub struct PersistentStorage {
    db: DB,
    path: PathBuf,
}

impl PersistentStorage {
    /// Open or create storage under `path`
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;

        info!("Opening persistent storage at: {}", path.display());

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_NODES, Self::cf_options()),
            ColumnFamilyDescriptor::new(CF_INDEX, Self::cf_options()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, &path, cf_descriptors)?;

        info!("Persistent storage opened successfully");

        Ok(Self { db, path })
    }

    fn cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf(&self, name: &'static str) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one commit: changed nodes, index transitions and the revision
    pub fn write_commit(
        &self,
        revision: u64,
        tree: &NodeTree,
        touched: &BTreeSet<NodePath>,
        index_changes: &[IndexChange],
    ) -> StorageResult<()> {
        let nodes = self.cf(CF_NODES)?;
        let index = self.cf(CF_INDEX)?;
        let meta = self.cf(CF_META)?;

        let mut batch = WriteBatch::default();

        for path in touched {
            let key = path.to_string();
            match tree.get(path) {
                Some(node) => batch.put_cf(nodes, key.as_bytes(), StoredNode::encode(node)?),
                None => batch.delete_cf(nodes, key.as_bytes()),
            }
        }

        // all removals before all insertions so a kept value survives
        for change in index_changes.iter().filter(|c| !c.is_noop()) {
            if let Some(old) = &change.old_value {
                for value in old.values() {
                    batch.delete_cf(index, Self::index_key(value, &change.path));
                }
            }
        }
        for change in index_changes.iter().filter(|c| !c.is_noop()) {
            if let Some(new) = &change.new_value {
                for value in new.values() {
                    batch.put_cf(index, Self::index_key(value, &change.path), b"");
                }
            }
        }

        batch.put_cf(meta, META_REVISION, bincode::serialize(&revision)?);

        self.write_synced(batch)?;
        debug!("Persisted revision {} ({} nodes touched)", revision, touched.len());
        Ok(())
    }

    /// Replace the persisted index wholesale
    pub fn write_index(&self, property: &str, entries: &[(String, NodePath)]) -> StorageResult<()> {
        let index = self.cf(CF_INDEX)?;
        let meta = self.cf(CF_META)?;

        let mut batch = WriteBatch::default();
        for item in self.db.iterator_cf(index, IteratorMode::Start) {
            let (key, _) = item?;
            batch.delete_cf(index, key);
        }
        for (value, path) in entries {
            batch.put_cf(index, Self::index_key(value, path), b"");
        }
        batch.put_cf(meta, META_INDEXED_PROPERTY, property.as_bytes());

        self.write_synced(batch)?;
        info!("Persisted {} index entries for '{}'", entries.len(), property);
        Ok(())
    }

    fn write_synced(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.write_opt(batch, &write_opts)?;
        Ok(())
    }

    /// All stored nodes (for recovery)
    pub fn scan_nodes(&self) -> StorageResult<Vec<(NodePath, Node)>> {
        let cf = self.cf(CF_NODES)?;
        let mut nodes = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let raw = std::str::from_utf8(&key).map_err(|e| StorageError::CorruptKey {
                cf: CF_NODES,
                reason: e.to_string(),
            })?;
            match NodePath::parse(raw) {
                Ok(path) => nodes.push((path, StoredNode::decode(&value)?)),
                Err(e) => warn!("Ignoring stored node with bad path {:?}: {}", raw, e),
            }
        }

        Ok(nodes)
    }

    /// All stored index entries (for recovery)
    pub fn scan_index(&self) -> StorageResult<Vec<(String, NodePath)>> {
        let cf = self.cf(CF_INDEX)?;
        let mut entries = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            entries.push(Self::decode_index_key(&key)?);
        }

        Ok(entries)
    }

    /// Revision of the last persisted commit, 0 for a fresh store
    pub fn revision(&self) -> StorageResult<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, META_REVISION)? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(0),
        }
    }

    /// Property name the persisted index was built for
    pub fn indexed_property(&self) -> StorageResult<Option<String>> {
        let cf = self.cf(CF_META)?;
        Ok(self
            .db
            .get_cf(cf, META_INDEXED_PROPERTY)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Flush all column families to disk
    pub fn flush(&self) -> StorageResult<()> {
        for name in [CF_NODES, CF_INDEX, CF_META] {
            self.db.flush_cf(self.cf(name)?)?;
        }
        debug!("Flushed storage to disk");
        Ok(())
    }

    /// Index key: value bytes, NUL, path bytes
    ///
    /// Paths never hold control characters, so the last NUL is the split point.
    fn index_key(value: &str, path: &NodePath) -> Vec<u8> {
        let mut key = value.as_bytes().to_vec();
        key.push(INDEX_KEY_SEPARATOR);
        key.extend_from_slice(path.to_string().as_bytes());
        key
    }

    fn decode_index_key(key: &[u8]) -> StorageResult<(String, NodePath)> {
        let corrupt = |reason: String| StorageError::CorruptKey { cf: CF_INDEX, reason };

        let split = key
            .iter()
            .rposition(|b| *b == INDEX_KEY_SEPARATOR)
            .ok_or_else(|| corrupt("missing separator".to_string()))?;
        let value = std::str::from_utf8(&key[..split]).map_err(|e| corrupt(e.to_string()))?;
        let raw_path = std::str::from_utf8(&key[split + 1..]).map_err(|e| corrupt(e.to_string()))?;
        let path = NodePath::parse(raw_path).map_err(|e| corrupt(e.to_string()))?;

        Ok((value.to_string(), path))
    }
}
