//! treestore
//!
//! A hierarchical content store: a tree of named nodes carrying single- or
//! multi-valued string properties, changed through isolated sessions with
//! optimistic commits, and searchable through a reverse index on one
//! configured property.
//!
//! # Architecture
//!
//! - [`tree`]: paths, nodes, the map-backed tree and lazy walks
//! - [`index`]: value -> paths reverse index, maintained at commit
//! - [`session`]: login, buffered writes, conflict detection
//! - [`repository`]: committed snapshots, the commit path, persistence hookup
//! - [`query`]: equality lookups and `SELECT` statements
//! - [`persistence`]: RocksDB storage and recovery
//! - [`console`]: verb parsing and the command dispatcher
//!
//! ## Example Usage
//!
//! ```rust
//! use treestore::{PropertyValue, Repository};
//!
//! let repo = Repository::in_memory();
//! let mut session = repo.login_admin().unwrap();
//!
//! session.add_node("/colours", "nt:unstructured").unwrap();
//! session.add_node("/colours/n001", "nt:unstructured").unwrap();
//! session
//!     .set_property("/colours/n001", "colour", PropertyValue::from("red"))
//!     .unwrap();
//! session.commit().unwrap();
//!
//! let red = session.find_by_property("colour", "red").unwrap();
//! assert_eq!(red[0].to_string(), "/colours/n001");
//! session.logout().unwrap();
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod index;
pub mod persistence;
pub mod query;
pub mod repository;
pub mod seed;
pub mod session;
pub mod tree;

pub use config::{ConfigError, Credentials, SeedConfig, StoreConfig};
pub use console::{Command, ConsoleError, Dispatcher, Outcome};
pub use error::{StoreError, StoreResult};
pub use index::IndexManager;
pub use query::QueryEngine;
pub use repository::{Repository, Snapshot};
pub use session::{Session, SessionInfo};
pub use tree::{Node, NodePath, NodeTree, PropertyValue, WalkEntry, WalkPolicy};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
