//! Error types for the hostkeys provisioner

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HostkeysError>;

#[derive(Error, Debug)]
pub enum HostkeysError {
    #[error("Inventory file '{}' not found", .0.display())]
    InventoryNotFound(PathBuf),

    #[error("Error parsing inventory {}: {source}", path.display())]
    InventoryParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Inventory {} must be a mapping of groups, found {found}", path.display())]
    InventoryShape { path: PathBuf, found: &'static str },

    #[error("No valid groups with hosts found in inventory")]
    NoValidGroups,

    #[error("Invalid key id '{0}': must be a non-negative integer")]
    InvalidKeyId(String),

    #[error("Invalid host range in '{pattern}': {reason}")]
    InvalidRangeSpec { pattern: String, reason: String },

    #[error("Invalid {kind} name '{name}': must be a single path component")]
    InvalidName { kind: &'static str, name: String },

    #[error("Two key targets resolve to the same path: {}", .0.display())]
    DuplicateTarget(PathBuf),

    #[error("Key generator not found: {0}")]
    KeygenNotFound(String),

    #[error("Key generation failed for {}: {reason}", path.display())]
    KeyGeneration { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl HostkeysError {
    pub(crate) fn invalid_range(pattern: &str, reason: impl Into<String>) -> Self {
        HostkeysError::InvalidRangeSpec {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
