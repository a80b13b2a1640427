//! Engine configuration.
//!
//! Every field has a default, so hosts only spell out what they change.
//! Logging is configured separately through `init_logging`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tunables for a mind-map session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MindMapConfig {
    /// Id of the root node of a fresh map.
    pub root_id: String,
    /// Label of the root node of a fresh map.
    pub root_label: String,
    /// Label given to nodes created by drag-to-create.
    pub default_child_label: String,
    /// File name passed to the document sink on export.
    pub export_file_name: String,
    /// Reject imports with duplicate ids, dangling references or several
    /// roots. When off, only the top-level shape is checked.
    pub strict_import: bool,
}

impl Default for MindMapConfig {
    fn default() -> Self {
        Self {
            root_id: "root".to_string(),
            root_label: "React Flow Mind Map".to_string(),
            default_child_label: "New Node".to_string(),
            export_file_name: "data.json".to_string(),
            strict_import: true,
        }
    }
}

/// Configuration parse errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid mind-map config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
        }
    }
}

impl MindMapConfig {
    /// Parses a JSON object; omitted keys keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }
}
