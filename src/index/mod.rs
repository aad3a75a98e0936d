//! Property Indexing module
//!
//! Provides the B-Tree reverse index serving equality lookups on the
//! configured property.

pub mod manager;
pub mod property_index;

pub use manager::IndexManager;
pub use property_index::PropertyIndex;
