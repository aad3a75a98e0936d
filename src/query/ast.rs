//! Parsed query statements

/// Primary type that matches every node
pub const ANY_TYPE: &str = "nt:base";

/// `SELECT * FROM [primary_type] WHERE property = 'value'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub primary_type: String,
    pub property: String,
    pub value: String,
}

impl Statement {
    /// True when the statement does not filter by primary type
    pub fn matches_any_type(&self) -> bool {
        self.primary_type == ANY_TYPE
    }
}
