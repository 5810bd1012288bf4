//! Configuration management for the hostkeys provisioner

use crate::error::{HostkeysError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key algorithm passed to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Rsa,
    Ecdsa,
    Ed25519,
}

impl KeyType {
    /// Name understood by `ssh-keygen -t`
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Rsa => "rsa",
            KeyType::Ecdsa => "ecdsa",
            KeyType::Ed25519 => "ed25519",
        }
    }
}

/// Curve sizes `ssh-keygen -t ecdsa` accepts
const ECDSA_BITS: [u32; 3] = [256, 384, 521];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the generated key tree
    pub output_dir: PathBuf,

    /// Key generation settings
    pub keygen: KeygenConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenConfig {
    /// Generator program (None = `ssh-keygen` from PATH)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,

    /// Key algorithm
    pub key_type: KeyType,

    /// Key size in bits
    pub bits: u32,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            program: None,
            key_type: KeyType::Rsa,
            bits: 4096,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("keys"),
            keygen: KeygenConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("hostkeys").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("hostkeys.toml"))
    }

    /// Load configuration from an explicit file, the default location, or defaults.
    ///
    /// An explicitly requested file must exist; the default location is optional.
    /// Call [`Config::validate`] once command-line overrides are applied.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(HostkeysError::Config(format!(
                        "Configuration file {:?} does not exist",
                        path
                    )));
                }
                Self::from_file(path)
            }
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    debug!("No configuration file at {:?}, using defaults", default_path);
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Reject settings the generator can never satisfy
    pub fn validate(&self) -> Result<()> {
        if self.keygen.bits == 0 {
            return Err(HostkeysError::Config("keygen.bits must be greater than zero".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(HostkeysError::Config("output_dir must not be empty".into()));
        }
        if self.keygen.key_type == KeyType::Ecdsa && !ECDSA_BITS.contains(&self.keygen.bits) {
            return Err(HostkeysError::Config(format!(
                "ecdsa keys must be 256, 384 or 521 bits, got {}",
                self.keygen.bits
            )));
        }
        Ok(())
    }
}
