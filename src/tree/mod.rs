//! Content tree model
//!
//! Paths, property values, nodes and the map-backed tree that commits and
//! session drafts operate on.

pub mod change;
pub mod node;
pub mod path;
pub mod property;
pub mod store;
pub mod walk;

pub use change::{Change, IndexChange};
pub use node::Node;
pub use path::NodePath;
pub use property::{PropertyMap, PropertyValue};
pub use store::{NodeTree, ROOT_PRIMARY_TYPE};
pub use walk::{Walk, WalkEntry, WalkPolicy};
