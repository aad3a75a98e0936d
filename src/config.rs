//! Store configuration
//!
//! Defaults, overridden by a YAML file, overridden in turn by command-line
//! flags in the binary.

use crate::tree::WalkPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("admin", "admin")
    }
}

/// Initial content created on an empty store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    /// Top-level node holding the seeded children
    pub container: String,
    pub count: usize,
    pub primary_type: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            container: "unitedcolours".to_string(),
            count: 100,
            primary_type: "nt:unstructured".to_string(),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Data directory for persistence (None = in-memory only)
    pub data_path: Option<PathBuf>,
    /// Property served by the reverse index
    pub indexed_property: String,
    pub walk_policy: WalkPolicy,
    /// The one principal allowed to log in
    pub admin: Credentials,
    pub seed: SeedConfig,
    /// Default log filter when no verbosity flag is given
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            indexed_property: "colour".to_string(),
            walk_policy: WalkPolicy::default(),
            admin: Credentials::default(),
            seed: SeedConfig::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl StoreConfig {
    /// In-memory configuration without seed data
    pub fn in_memory() -> Self {
        Self {
            seed: SeedConfig {
                enabled: false,
                ..SeedConfig::default()
            },
            ..Self::default()
        }
    }

    /// Persistent configuration rooted at `path`
    pub fn with_data_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: Some(path.into()),
            ..Self::in_memory()
        }
    }

    /// Parse a YAML document; missing fields keep their defaults
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: StoreConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.indexed_property.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "indexed_property",
                reason: "must not be empty".to_string(),
            });
        }
        if self.seed.enabled && crate::tree::NodePath::parse(&self.seed.container).is_err() {
            return Err(ConfigError::Invalid {
                field: "seed.container",
                reason: format!("'{}' is not a valid path", self.seed.container),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.indexed_property, "colour");
        assert_eq!(config.walk_policy, WalkPolicy::Skip);
        assert_eq!(config.admin, Credentials::new("admin", "admin"));
        assert_eq!(config.seed.count, 100);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
data_path: /var/lib/treestore
indexed_property: shade
walk_policy: abort
seed:
  enabled: false
"#;
        let config = StoreConfig::parse(yaml).unwrap();
        assert_eq!(config.data_path, Some(PathBuf::from("/var/lib/treestore")));
        assert_eq!(config.indexed_property, "shade");
        assert_eq!(config.walk_policy, WalkPolicy::Abort);
        assert!(!config.seed.enabled);
        // untouched fields keep their defaults
        assert_eq!(config.seed.container, "unitedcolours");
        assert_eq!(config.admin.user, "admin");
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(
            StoreConfig::parse("indexed_property: ''"),
            Err(ConfigError::Invalid { field: "indexed_property", .. })
        ));
        assert!(matches!(
            StoreConfig::parse("walk_policy: sometimes"),
            Err(ConfigError::Parse(_))
        ));
    }
}
