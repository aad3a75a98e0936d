//! Query engine
//!
//! Equality lookups served from the reverse index. Statements of the form
//! `SELECT * FROM [type] WHERE name = 'value'` go through the same path and
//! then filter on primary type.

pub mod ast;
pub mod parser;

pub use ast::{Statement, ANY_TYPE};
pub use parser::{parse_statement, ParseError, ParseResult};

use crate::error::{StoreError, StoreResult};
use crate::repository::Snapshot;
use crate::tree::NodePath;
use tracing::debug;

/// Query engine over one committed snapshot
pub struct QueryEngine<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> QueryEngine<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// Paths whose `name` property equals `value`, sorted by segments
    ///
    /// Only the indexed property can be queried; anything else would need a
    /// tree scan and fails with `UnsupportedPredicate`.
    pub fn find_by_property(&self, name: &str, value: &str) -> StoreResult<Vec<NodePath>> {
        let index = self.snapshot.index();
        if !index.is_indexed(name) {
            return Err(StoreError::UnsupportedPredicate(name.to_string()));
        }
        Ok(index.lookup(value))
    }

    /// Parse and run a statement
    pub fn execute(&self, statement: &str) -> StoreResult<Vec<NodePath>> {
        debug!("Executing query: {}", statement);

        let stmt = parse_statement(statement).map_err(|e| StoreError::InvalidQuery(e.to_string()))?;
        let hits = self.find_by_property(&stmt.property, &stmt.value)?;

        if stmt.matches_any_type() {
            return Ok(hits);
        }

        let tree = self.snapshot.tree();
        Ok(hits
            .into_iter()
            .filter(|path| {
                tree.get(path)
                    .map(|node| node.primary_type == stmt.primary_type)
                    .unwrap_or(false)
            })
            .collect())
    }
}
