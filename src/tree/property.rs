//! Property values for tree nodes
//!
//! A property is either a single string or an ordered list of strings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when a multi-valued property is entered on one line
pub const VALUE_SEPARATOR: char = ',';

/// Property value: single- or multi-valued string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    Single(String),
    Multi(Vec<String>),
}

impl PropertyValue {
    /// Build a value from a comma-separated list
    ///
    /// Each item is trimmed and trailing empty items are dropped. One item
    /// gives a single value, more give a multi-valued property in the order
    /// they were written.
    pub fn from_list(raw: &str) -> Self {
        let mut values: Vec<String> = raw
            .split(VALUE_SEPARATOR)
            .map(|v| v.trim().to_string())
            .collect();
        while values.len() > 1 && values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }

        if values.len() == 1 {
            PropertyValue::Single(values.remove(0))
        } else {
            PropertyValue::Multi(values)
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, PropertyValue::Multi(_))
    }

    /// Get the string if this is a single value
    pub fn as_single(&self) -> Option<&str> {
        match self {
            PropertyValue::Single(s) => Some(s),
            PropertyValue::Multi(_) => None,
        }
    }

    /// All values in order; a single value yields one item
    pub fn values(&self) -> Vec<&str> {
        match self {
            PropertyValue::Single(s) => vec![s.as_str()],
            PropertyValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// True if the value, or any element of a multi value, equals `candidate`
    pub fn contains(&self, candidate: &str) -> bool {
        match self {
            PropertyValue::Single(s) => s == candidate,
            PropertyValue::Multi(values) => values.iter().any(|v| v == candidate),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Single(s) => write!(f, "{}", s),
            PropertyValue::Multi(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Single(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Single(s.to_string())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(values: Vec<String>) -> Self {
        PropertyValue::Multi(values)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(values: Vec<&str>) -> Self {
        PropertyValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Property map keeping insertion order for deterministic listing
pub type PropertyMap = IndexMap<String, PropertyValue>;
