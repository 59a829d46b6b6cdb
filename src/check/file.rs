//! Check configuration file.
//!
//! A file holds one shared `init_config` mapping and a list of `instances`:
//!
//! ```yaml
//! init_config:
//!
//! instances:
//!   - unit_names: [sshd.service]
//!   - unit_regex: ['^docker-']
//!     min_collection_interval: 30
//! ```
//!
//! Every instance is handed to its check as its own raw YAML document.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

/// Error type for loading a check configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid check configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("no instances configured")]
    NoInstances,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default)]
    init_config: Option<Value>,
    #[serde(default)]
    instances: Option<Vec<Value>>,
}

/// Raw documents of one check configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfigFile {
    /// Re-serialized `init_config`, empty when absent or null.
    pub init_config: String,
    /// One re-serialized document per instance, in file order.
    pub instances: Vec<String>,
}

impl CheckConfigFile {
    /// Reads and splits a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Splits configuration file content into raw documents.
    pub fn parse(content: &str) -> Result<Self, ConfigFileError> {
        let raw: RawFile = serde_yaml::from_str(content)?;

        let init_config = match raw.init_config {
            None | Some(Value::Null) => String::new(),
            Some(value) => serde_yaml::to_string(&value)?,
        };

        let instances = raw
            .instances
            .unwrap_or_default()
            .iter()
            .map(serde_yaml::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        if instances.is_empty() {
            return Err(ConfigFileError::NoInstances);
        }

        Ok(Self {
            init_config,
            instances,
        })
    }
}
